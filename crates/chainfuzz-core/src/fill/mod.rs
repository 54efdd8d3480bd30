//! Byte-driven value filling.
//!
//! A [`Filler`] turns the fuzzing engine's input bytes into typed values.
//! Types opt in by implementing [`Fill`]; primitives, strings, collections,
//! pointers and tuples are covered here, structs use [`impl_fill!`].
//!
//! # Encoding
//!
//! - Integers use a fixed width per type (`isize`/`usize` always take 8 bytes
//!   so inputs replay the same on every target). If fewer bytes remain than
//!   the width, the value is zero and nothing is consumed.
//! - `bool` is one byte, `>= 128` meaning true.
//! - `Vec<u8>` and `String` use a length-prefixed encoding, see
//!   [`Filler::fill_bytes`].
//! - `[u8; N]` is only filled when at least `N` bytes remain.
//! - Other sequences and maps draw a length byte reduced mod 10.
//! - Nesting deeper than [`MAX_FILL_DEPTH`] yields zero values.
//!
//! [`impl_fill!`]: crate::impl_fill

pub mod capability;
mod impls;

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::errors::{FillError, Shape};

pub use capability::{
    CancelContext, Capability, CapabilityValue, FuzzBuffer, FuzzReadCloser, FuzzReader,
};
pub use impls::{Complex, Complex32, Complex64};

/// Nesting limit for recursive fills.
pub const MAX_FILL_DEPTH: usize = 10;

/// Element count limit (exclusive) for non-byte sequences and maps.
pub const MAX_COLLECTION_LEN: usize = 10;

/// Size field value meaning "zero-length".
pub const EMPTY_SENTINEL: u8 = 0xFF;

/// Filler behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOptions {
    /// Fail on shapes that cannot be built from bytes instead of leaving
    /// them at their zero value.
    pub strict: bool,
}

/// Fills typed values from a byte stream.
#[derive(Debug, Clone)]
pub struct Filler<'a> {
    cursor: ByteCursor<'a>,
    options: FillOptions,
}

impl<'a> Filler<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, FillOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: FillOptions) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            options,
        }
    }

    pub fn options(&self) -> FillOptions {
        self.options
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.options.strict = strict;
    }

    pub fn cursor(&self) -> &ByteCursor<'a> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ByteCursor<'a> {
        &mut self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Fill a top-level value.
    pub fn fill<T: Fill>(&mut self) -> Result<T, FillError> {
        self.fill_at(0)
    }

    /// Fill a value nested under a parent at `depth`. Implementations of
    /// [`Fill`] call this for every child value.
    pub fn fill_at<T: Fill>(&mut self, depth: usize) -> Result<T, FillError> {
        let depth = depth + 1;
        if depth > MAX_FILL_DEPTH {
            return Ok(T::zero());
        }
        T::fill(self, depth)
    }

    pub fn draw_u8(&mut self) -> u8 {
        self.draw_width(1) as u8
    }

    pub fn draw_u16(&mut self) -> u16 {
        self.draw_width(2) as u16
    }

    pub fn draw_u32(&mut self) -> u32 {
        self.draw_width(4) as u32
    }

    pub fn draw_u64(&mut self) -> u64 {
        self.draw_width(8) as u64
    }

    pub fn draw_u128(&mut self) -> u128 {
        self.draw_width(16)
    }

    /// Little-endian value of `width` bytes, drawn one at a time. Zero, with
    /// nothing consumed, when the stream is shorter than `width`.
    fn draw_width(&mut self, width: usize) -> u128 {
        if self.cursor.remaining() < width {
            return 0;
        }
        (0..width).fold(0u128, |acc, i| {
            acc | (self.cursor.byte() as u128) << (i * 8)
        })
    }

    /// Length-prefixed byte string.
    ///
    /// Zero bytes before the size field are skipped, which lets a fuzzing
    /// engine splice in padding without shifting the content. The first
    /// non-zero byte is the size: `0xFF` means empty, anything else is the
    /// literal length. A size larger than what remains drains the stream and
    /// yields an empty result.
    ///
    /// `String` is built from these bytes with invalid UTF-8 sequences
    /// replaced by U+FFFD, so its byte length may differ from the size
    /// field. Take `Vec<u8>` when the exact bytes matter.
    pub fn fill_bytes(&mut self) -> Vec<u8> {
        let size = loop {
            if self.cursor.remaining() == 0 {
                return Vec::new();
            }
            let field = self.cursor.byte();
            if field as usize > self.cursor.remaining() {
                let drained = self.cursor.drain(self.cursor.remaining());
                trace!(
                    size = field,
                    drained,
                    "fill_bytes: size exceeds remaining input"
                );
                return Vec::new();
            }
            match field {
                0 => continue,
                EMPTY_SENTINEL => break 0,
                n => break n as usize,
            }
        };
        self.cursor.take(size).to_vec()
    }

    /// Element count for a non-byte sequence or map.
    pub fn collection_len(&mut self) -> usize {
        self.draw_u8() as usize % MAX_COLLECTION_LEN
    }

    /// Outcome for a shape with no byte encoding: an error in strict mode,
    /// the zero value otherwise.
    pub fn unsupported<T: Fill>(&self, shape: Shape) -> Result<T, FillError> {
        let type_name = std::any::type_name::<T>();
        if self.options.strict {
            return Err(FillError::UnsupportedShape { type_name, shape });
        }
        trace!(type_name, %shape, "unsupported shape left at zero value");
        Ok(T::zero())
    }

    /// Fill a capability by catalog name (`"reader"`, `"read-closer"`, ...).
    ///
    /// Unknown names are unsupported shapes: `Ok(None)` unless strict.
    /// [`CapabilityValue`] is not a step parameter; steps take the concrete
    /// carrier types.
    pub fn fill_capability(&mut self, name: &str) -> Result<Option<CapabilityValue>, FillError> {
        match Capability::from_name(name) {
            Some(cap) => Ok(Some(CapabilityValue::fill(cap, self))),
            None if self.options.strict => Err(FillError::UnsupportedShape {
                type_name: "dyn capability",
                shape: Shape::Capability(name.to_string()),
            }),
            None => {
                trace!(name, "unknown capability left empty");
                Ok(None)
            }
        }
    }
}

/// A type that can be built from fuzzer bytes.
pub trait Fill: Sized {
    /// Value used when the depth limit is hit or the shape is unsupported.
    fn zero() -> Self;

    /// Build a value. `depth` is this value's own nesting level; pass it to
    /// [`Filler::fill_at`] for children.
    fn fill(filler: &mut Filler<'_>, depth: usize) -> Result<Self, FillError>;

    /// Build a `Vec<Self>`. Overridden by `u8` for the length-prefixed
    /// encoding.
    #[doc(hidden)]
    fn fill_vec(filler: &mut Filler<'_>, depth: usize) -> Result<Vec<Self>, FillError> {
        let len = filler.collection_len();
        (0..len).map(|_| filler.fill_at(depth)).collect()
    }

    /// Build a `[Self; N]`. Overridden by `u8`, which fills only when `N`
    /// bytes remain.
    #[doc(hidden)]
    fn fill_array<const N: usize>(
        filler: &mut Filler<'_>,
        depth: usize,
    ) -> Result<[Self; N], FillError> {
        let mut failed = None;
        let out = std::array::from_fn(|_| {
            if failed.is_some() {
                return Self::zero();
            }
            filler.fill_at(depth).unwrap_or_else(|e| {
                failed = Some(e);
                Self::zero()
            })
        });
        match failed {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    /// Replace an absent value (a `None`) with an empty present one.
    fn replace_absent(&mut self) {}
}

/// Implement [`Fill`] for a struct by filling its fields in order, along
/// with a [`Literal`](crate::literal::Literal) rendering built from the
/// fields' own renderings.
///
/// ```
/// use chainfuzz_core::impl_fill;
/// use chainfuzz_core::literal::Literal;
///
/// #[derive(Debug, Clone)]
/// struct Order {
///     id: u64,
///     tags: Vec<String>,
/// }
///
/// impl_fill!(Order { id, tags });
///
/// let mut filler = chainfuzz_core::fill::Filler::new(&[1, 0, 0, 0, 0, 0, 0, 0]);
/// let order: Order = filler.fill().unwrap();
/// assert_eq!(order.id, 1);
/// assert_eq!(order.to_literal(), "Order { id: 1, tags: vec![] }");
/// ```
#[macro_export]
macro_rules! impl_fill {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::fill::Fill for $ty {
            fn zero() -> Self {
                Self {
                    $($field: $crate::fill::Fill::zero(),)*
                }
            }

            fn fill(
                filler: &mut $crate::fill::Filler<'_>,
                depth: usize,
            ) -> ::std::result::Result<Self, $crate::errors::FillError> {
                Ok(Self {
                    $($field: filler.fill_at(depth)?,)*
                })
            }
        }

        impl $crate::literal::Literal for $ty {
            fn write_literal(&self, out: &mut ::std::string::String) {
                $crate::literal::write_struct(
                    out,
                    stringify!($ty),
                    &[$((
                        stringify!($field),
                        &self.$field as &dyn $crate::literal::Literal,
                    )),*],
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widths() {
        let data: Vec<u8> = (1..=8).collect();

        let mut f = Filler::new(&data);
        assert_eq!(f.fill::<u64>().unwrap(), 0x0807_0605_0403_0201);
        assert_eq!(f.remaining(), 0);

        let mut f = Filler::new(&data);
        assert_eq!(f.fill::<u32>().unwrap(), 0x0403_0201);
        assert_eq!(f.fill::<u16>().unwrap(), 0x0605);
        assert_eq!(f.fill::<u8>().unwrap(), 7);
        assert_eq!(f.fill::<i8>().unwrap(), 8);

        let mut f = Filler::new(&data);
        assert_eq!(f.fill::<usize>().unwrap(), 0x0807_0605_0403_0201);
        let mut f = Filler::new(&data);
        assert_eq!(f.fill::<isize>().unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_short_numeric_draw_consumes_nothing() {
        let mut f = Filler::new(&[1, 2, 3]);
        assert_eq!(f.fill::<u64>().unwrap(), 0);
        assert_eq!(f.remaining(), 3);
        assert_eq!(f.fill::<u32>().unwrap(), 0);
        assert_eq!(f.remaining(), 3);
        assert_eq!(f.fill::<u16>().unwrap(), 0x0201);
        assert_eq!(f.remaining(), 1);
    }

    #[test]
    fn test_bool_threshold() {
        let mut f = Filler::new(&[127, 128, 0, 255]);
        assert!(!f.fill::<bool>().unwrap());
        assert!(f.fill::<bool>().unwrap());
        assert!(!f.fill::<bool>().unwrap());
        assert!(f.fill::<bool>().unwrap());
        assert!(!f.fill::<bool>().unwrap(), "exhausted input is false");
    }

    #[test]
    fn test_fill_bytes_literal_length() {
        for len in [1usize, 2, 17, 200, 254] {
            let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut data = vec![len as u8];
            data.extend_from_slice(&content);
            data.push(0xEE);

            let mut f = Filler::new(&data);
            assert_eq!(f.fill_bytes(), content, "length {len}");
            assert_eq!(f.remaining(), 1);
        }
    }

    #[test]
    fn test_fill_bytes_empty_sentinel() {
        let data = [0xFF, 1, 2];
        let mut f = Filler::new(&data);
        assert!(f.fill_bytes().is_empty());
        assert_eq!(f.remaining(), 2);
    }

    #[test]
    fn test_fill_bytes_skips_zero_size_fields() {
        let data = [0, 0, 0, 2, b'h', b'i'];
        let mut f = Filler::new(&data);
        assert_eq!(f.fill_bytes(), b"hi");
        assert_eq!(f.remaining(), 0);
    }

    #[test]
    fn test_fill_bytes_oversized_drains() {
        let data = [9, 1, 2, 3];
        let mut f = Filler::new(&data);
        assert!(f.fill_bytes().is_empty());
        assert_eq!(f.remaining(), 0);
    }

    #[test]
    fn test_fill_bytes_exhausted() {
        let mut f = Filler::new(&[0, 0]);
        assert!(f.fill_bytes().is_empty());
        assert_eq!(f.remaining(), 0);
    }

    #[test]
    fn test_string_uses_length_encoding() {
        let mut data = vec![5];
        data.extend_from_slice(b"hello");
        let mut f = Filler::new(&data);
        assert_eq!(f.fill::<String>().unwrap(), "hello");

        let mut f = Filler::new(&[2, 0xC3, 0x28]);
        assert_eq!(f.fill::<String>().unwrap(), "\u{FFFD}(");
    }

    #[test]
    fn test_byte_array_requires_full_width() {
        let mut f = Filler::new(&[1, 2, 3]);
        let arr: [u8; 4] = f.fill().unwrap();
        assert_eq!(arr, [0; 4]);
        assert_eq!(f.remaining(), 3);

        let arr: [u8; 3] = f.fill().unwrap();
        assert_eq!(arr, [1, 2, 3]);
    }

    #[test]
    fn test_vec_length_mod_ten() {
        // Length byte 23 -> 3 elements of u16.
        let data = [23, 1, 0, 2, 0, 3, 0];
        let mut f = Filler::new(&data);
        let v: Vec<u16> = f.fill().unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn test_depth_limit_yields_zero() {
        // Eleven levels of Box around a u8: the innermost value sits past the
        // depth limit and stays zero without consuming input.
        type Deep = Box<Box<Box<Box<Box<Box<Box<Box<Box<Box<u8>>>>>>>>>>;
        let mut f = Filler::new(&[42]);
        let v: Deep = f.fill().unwrap();
        assert_eq!(**********v, 0);
        assert_eq!(f.remaining(), 1);

        type Shallow = Box<Box<Box<Box<Box<Box<Box<Box<Box<u8>>>>>>>>>;
        let mut f = Filler::new(&[42]);
        let v: Shallow = f.fill().unwrap();
        assert_eq!(*********v, 42);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    crate::impl_fill!(Point { x, y, label });

    #[test]
    fn test_struct_fields_in_order() {
        let data = [1, 0, 0, 0, 2, 0, 0, 0, 1, b'p'];
        let mut f = Filler::new(&data);
        let p: Point = f.fill().unwrap();
        assert_eq!(
            p,
            Point {
                x: 1,
                y: 2,
                label: "p".to_string()
            }
        );
        assert_eq!(Point::zero().label, "");
    }

    #[test]
    fn test_unsupported_strict_and_lenient() {
        let mut f = Filler::new(&[]);
        let lenient: Result<fn(), FillError> = f.fill();
        assert!(lenient.is_ok());

        f.set_strict(true);
        let strict: Result<fn(), FillError> = f.fill();
        assert!(matches!(
            strict,
            Err(FillError::UnsupportedShape {
                shape: Shape::Callable,
                ..
            })
        ));
    }

    #[test]
    fn test_fill_capability_by_name() {
        let data = [3, b'a', b'b', b'c'];
        let mut f = Filler::new(&data);
        let value = f.fill_capability("reader").unwrap();
        assert!(matches!(value, Some(CapabilityValue::Reader(_))));

        assert!(f.fill_capability("hasher").unwrap().is_none());
        f.set_strict(true);
        let err = f.fill_capability("hasher").unwrap_err();
        assert!(err.to_string().contains("'hasher'"));
    }
}
