//! [`Fill`] implementations for standard types.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Fill, Filler};
use crate::errors::{FillError, Shape};
use crate::literal::{write_struct, Literal};

macro_rules! fill_unsigned {
    ($($ty:ty => $draw:ident),* $(,)?) => {
        $(
            impl Fill for $ty {
                fn zero() -> Self {
                    0
                }

                fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
                    Ok(filler.$draw() as $ty)
                }
            }
        )*
    };
}

macro_rules! fill_signed {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl Fill for $ty {
                fn zero() -> Self {
                    0
                }

                fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
                    Ok(<$unsigned as Fill>::fill(filler, depth)? as $ty)
                }
            }
        )*
    };
}

fill_unsigned! {
    u16 => draw_u16,
    u32 => draw_u32,
    u64 => draw_u64,
    u128 => draw_u128,
    usize => draw_u64,
}

fill_signed! {
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    i128 => u128,
    isize => u64,
}

impl Fill for u8 {
    fn zero() -> Self {
        0
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(filler.draw_u8())
    }

    fn fill_vec(filler: &mut Filler<'_>, _depth: usize) -> Result<Vec<Self>, FillError> {
        Ok(filler.fill_bytes())
    }

    fn fill_array<const N: usize>(
        filler: &mut Filler<'_>,
        depth: usize,
    ) -> Result<[Self; N], FillError> {
        if filler.remaining() < N {
            return Ok([0; N]);
        }
        let mut out = [0u8; N];
        for b in out.iter_mut() {
            *b = filler.fill_at(depth)?;
        }
        Ok(out)
    }
}

impl Fill for bool {
    fn zero() -> Self {
        false
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(filler.draw_u8() >= 128)
    }
}

impl Fill for f32 {
    fn zero() -> Self {
        0.0
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(f32::from_bits(filler.draw_u32()))
    }
}

impl Fill for f64 {
    fn zero() -> Self {
        0.0
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(f64::from_bits(filler.draw_u64()))
    }
}

impl Fill for char {
    fn zero() -> Self {
        '\0'
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(char::from_u32(filler.draw_u32()).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

/// Lossy: invalid UTF-8 becomes U+FFFD. See [`Filler::fill_bytes`].
impl Fill for String {
    fn zero() -> Self {
        String::new()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        let bytes = filler.fill_bytes();
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

impl Fill for () {
    fn zero() -> Self {}

    fn fill(_filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        Ok(())
    }
}

/// Complex number. Both widths draw their parts as two 64-bit floats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

impl<T: Literal> Literal for Complex<T> {
    fn write_literal(&self, out: &mut String) {
        write_struct(
            out,
            "Complex",
            &[("re", &self.re as &dyn Literal), ("im", &self.im as &dyn Literal)],
        );
    }
}

impl Fill for Complex64 {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        let re = f64::from_bits(filler.draw_u64());
        let im = f64::from_bits(filler.draw_u64());
        Ok(Complex::new(re, im))
    }
}

impl Fill for Complex32 {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        let wide = Complex64::fill(filler, depth)?;
        Ok(Complex::new(wide.re as f32, wide.im as f32))
    }
}

impl<T: Fill> Fill for Vec<T> {
    fn zero() -> Self {
        Vec::new()
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        T::fill_vec(filler, depth)
    }
}

impl<T: Fill> Fill for VecDeque<T> {
    fn zero() -> Self {
        VecDeque::new()
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        Ok(T::fill_vec(filler, depth)?.into())
    }
}

impl<T: Fill, const N: usize> Fill for [T; N] {
    fn zero() -> Self {
        std::array::from_fn(|_| T::zero())
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        T::fill_array::<N>(filler, depth)
    }
}

impl<K: Fill + Eq + Hash, V: Fill> Fill for HashMap<K, V> {
    fn zero() -> Self {
        HashMap::new()
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        let len = filler.collection_len();
        let mut map = HashMap::with_capacity(len);
        for _ in 0..len {
            let key = filler.fill_at(depth)?;
            let value = filler.fill_at(depth)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Fill + Ord, V: Fill> Fill for BTreeMap<K, V> {
    fn zero() -> Self {
        BTreeMap::new()
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        let len = filler.collection_len();
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = filler.fill_at(depth)?;
            let value = filler.fill_at(depth)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: Fill> Fill for Box<T> {
    fn zero() -> Self {
        Box::new(T::zero())
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        Ok(Box::new(filler.fill_at(depth)?))
    }
}

impl<T: Fill> Fill for Arc<T> {
    fn zero() -> Self {
        Arc::new(T::zero())
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        Ok(Arc::new(filler.fill_at(depth)?))
    }
}

/// Nullable pointer. Filling always produces `Some`; `None` only appears as
/// the zero value.
impl<T: Fill> Fill for Option<T> {
    fn zero() -> Self {
        None
    }

    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
        Ok(Some(filler.fill_at(depth)?))
    }

    fn replace_absent(&mut self) {
        if self.is_none() {
            *self = Some(T::zero());
        }
    }
}

macro_rules! fill_tuple {
    ($($name:ident),+) => {
        impl<$($name: Fill),+> Fill for ($($name,)+) {
            fn zero() -> Self {
                ($($name::zero(),)+)
            }

            fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError> {
                Ok(($(filler.fill_at::<$name>(depth)?,)+))
            }
        }
    };
}

fill_tuple!(A);
fill_tuple!(A, B);
fill_tuple!(A, B, C);
fill_tuple!(A, B, C, D);

// Shapes with no byte encoding. Their zero values are inert: a channel whose
// other end is already gone, a function that does nothing, a null pointer.

impl<T> Fill for Sender<T> {
    fn zero() -> Self {
        mpsc::channel().0
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::Channel)
    }
}

impl<T> Fill for SyncSender<T> {
    fn zero() -> Self {
        mpsc::sync_channel(0).0
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::Channel)
    }
}

impl<T> Fill for Receiver<T> {
    fn zero() -> Self {
        mpsc::channel().1
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::Channel)
    }
}

fn noop() {}

impl Fill for fn() {
    fn zero() -> Self {
        noop
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::Callable)
    }
}

impl<T> Fill for *const T {
    fn zero() -> Self {
        std::ptr::null()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::RawAddress)
    }
}

impl<T> Fill for *mut T {
    fn zero() -> Self {
        std::ptr::null_mut()
    }

    fn fill(filler: &mut Filler<'_>, _depth: usize) -> Result<Self, FillError> {
        filler.unsupported(Shape::RawAddress)
    }
}
