//! Rust expressions for filled values.
//!
//! Reproducers print every argument as source that type-checks against the
//! step's parameter type: `vec![..]` rather than `[..]`, owned strings at any
//! depth, named constants for non-finite floats, and map constructors with
//! entries in a stable order.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Write;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

/// A value that can be written back as a Rust expression.
///
/// Every step parameter type implements this. [`impl_fill!`] derives it for
/// structs together with [`Fill`](crate::fill::Fill).
///
/// [`impl_fill!`]: crate::impl_fill
pub trait Literal {
    fn write_literal(&self, out: &mut String);

    fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }
}

/// Write `Name { a: .., b: .. }`.
pub fn write_struct(out: &mut String, name: &str, fields: &[(&str, &dyn Literal)]) {
    out.push_str(name);
    if fields.is_empty() {
        out.push_str(" {}");
        return;
    }
    out.push_str(" { ");
    for (i, (field, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(field);
        out.push_str(": ");
        value.write_literal(out);
    }
    out.push_str(" }");
}

fn write_seq<'a, T: Literal + 'a>(
    out: &mut String,
    open: &str,
    items: impl IntoIterator<Item = &'a T>,
    close: &str,
) {
    out.push_str(open);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_literal(out);
    }
    out.push_str(close);
}

/// Map entries sorted by their rendering so `HashMap` output is stable.
fn write_map<'a, K: Literal + 'a, V: Literal + 'a>(
    out: &mut String,
    ctor: &str,
    entries: impl IntoIterator<Item = (&'a K, &'a V)>,
) {
    let mut rendered: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("({}, {})", k.to_literal(), v.to_literal()))
        .collect();
    rendered.sort();
    out.push_str(ctor);
    out.push_str("::from([");
    out.push_str(&rendered.join(", "));
    out.push_str("])");
}

macro_rules! literal_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Literal for $ty {
                fn write_literal(&self, out: &mut String) {
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

literal_display!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool);

macro_rules! literal_float {
    ($($ty:ident),*) => {
        $(
            impl Literal for $ty {
                fn write_literal(&self, out: &mut String) {
                    if self.is_nan() {
                        out.push_str(concat!(stringify!($ty), "::NAN"));
                    } else if *self == $ty::INFINITY {
                        out.push_str(concat!(stringify!($ty), "::INFINITY"));
                    } else if *self == $ty::NEG_INFINITY {
                        out.push_str(concat!(stringify!($ty), "::NEG_INFINITY"));
                    } else {
                        let _ = write!(out, "{:?}", self);
                    }
                }
            }
        )*
    };
}

literal_float!(f32, f64);

impl Literal for char {
    fn write_literal(&self, out: &mut String) {
        let _ = write!(out, "{:?}", self);
    }
}

impl Literal for String {
    fn write_literal(&self, out: &mut String) {
        let _ = write!(out, "String::from({:?})", self);
    }
}

impl Literal for () {
    fn write_literal(&self, out: &mut String) {
        out.push_str("()");
    }
}

impl<T: Literal> Literal for Vec<T> {
    fn write_literal(&self, out: &mut String) {
        write_seq(out, "vec![", self, "]");
    }
}

impl<T: Literal> Literal for VecDeque<T> {
    fn write_literal(&self, out: &mut String) {
        write_seq(out, "VecDeque::from(vec![", self, "])");
    }
}

impl<T: Literal, const N: usize> Literal for [T; N] {
    fn write_literal(&self, out: &mut String) {
        write_seq(out, "[", self, "]");
    }
}

impl<K: Literal, V: Literal, S> Literal for HashMap<K, V, S> {
    fn write_literal(&self, out: &mut String) {
        write_map(out, "HashMap", self);
    }
}

impl<K: Literal, V: Literal> Literal for BTreeMap<K, V> {
    fn write_literal(&self, out: &mut String) {
        write_map(out, "BTreeMap", self);
    }
}

impl<T: Literal> Literal for Box<T> {
    fn write_literal(&self, out: &mut String) {
        out.push_str("Box::new(");
        (**self).write_literal(out);
        out.push(')');
    }
}

impl<T: Literal> Literal for Arc<T> {
    fn write_literal(&self, out: &mut String) {
        out.push_str("Arc::new(");
        (**self).write_literal(out);
        out.push(')');
    }
}

impl<T: Literal> Literal for Option<T> {
    fn write_literal(&self, out: &mut String) {
        match self {
            Some(v) => {
                out.push_str("Some(");
                v.write_literal(out);
                out.push(')');
            }
            None => out.push_str("None"),
        }
    }
}

macro_rules! literal_tuple {
    ($($name:ident),+) => {
        impl<$($name: Literal),+> Literal for ($($name,)+) {
            #[allow(non_snake_case)]
            fn write_literal(&self, out: &mut String) {
                let ($($name,)+) = self;
                let parts = [$($name.to_literal()),+];
                out.push('(');
                out.push_str(&parts.join(", "));
                if parts.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
        }
    };
}

literal_tuple!(A);
literal_tuple!(A, B);
literal_tuple!(A, B, C);
literal_tuple!(A, B, C, D);

// Inert zero values of shapes that have no byte encoding.

impl<T> Literal for Sender<T> {
    fn write_literal(&self, out: &mut String) {
        out.push_str("std::sync::mpsc::channel().0");
    }
}

impl<T> Literal for SyncSender<T> {
    fn write_literal(&self, out: &mut String) {
        out.push_str("std::sync::mpsc::sync_channel(0).0");
    }
}

impl<T> Literal for Receiver<T> {
    fn write_literal(&self, out: &mut String) {
        out.push_str("std::sync::mpsc::channel().1");
    }
}

impl Literal for fn() {
    fn write_literal(&self, out: &mut String) {
        out.push_str("((|| {}) as fn())");
    }
}

impl<T> Literal for *const T {
    fn write_literal(&self, out: &mut String) {
        out.push_str("std::ptr::null()");
    }
}

impl<T> Literal for *mut T {
    fn write_literal(&self, out: &mut String) {
        out.push_str("std::ptr::null_mut()");
    }
}
