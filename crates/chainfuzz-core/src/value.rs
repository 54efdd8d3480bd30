//! Type-erased argument and return values.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::literal::Literal;

/// Runtime identity of a value's type, used to index the reuse tables.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view of any value a step can take or return.
pub trait ArgValue: Any + Send {
    fn clone_boxed(&self) -> Box<dyn ArgValue>;
    fn type_key(&self) -> TypeKey;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> ArgValue for T
where
    T: Any + Clone + fmt::Debug + Send,
{
    fn clone_boxed(&self) -> Box<dyn ArgValue> {
        Box::new(self.clone())
    }

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

fn render_debug<T: Any + fmt::Debug>(value: &dyn Any) -> String {
    value
        .downcast_ref::<T>()
        .map(|v| format!("{:?}", v))
        .unwrap_or_default()
}

fn render_literal<T: Any + Literal>(value: &dyn Any) -> String {
    value
        .downcast_ref::<T>()
        .map(Literal::to_literal)
        .unwrap_or_default()
}

/// An owned value of some step parameter or return type.
pub struct Value {
    inner: Box<dyn ArgValue>,
    render: fn(&dyn Any) -> String,
}

impl Value {
    /// Wrap a value rendered with its `Debug` output. Used for step return
    /// values, which reproducers refer to by name.
    pub fn new<T: Any + Clone + fmt::Debug + Send>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            render: render_debug::<T>,
        }
    }

    /// Wrap a value rendered as a Rust expression.
    pub fn literal<T: Any + Clone + fmt::Debug + Send + Literal>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            render: render_literal::<T>,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.inner.type_key()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.as_any_mut().downcast_mut()
    }

    /// Take the concrete value back out, or return `self` unchanged on a
    /// type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.inner.into_any().downcast::<T>() {
            Ok(b) => Ok(*b),
            Err(_) => unreachable!("type checked above"),
        }
    }

    /// Source rendering for repro output.
    pub fn render(&self) -> String {
        (self.render)(self.inner.as_any())
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            render: self.render,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_type_key_identity() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<i32>());
        assert_ne!(TypeKey::of::<Box<u32>>(), TypeKey::of::<u32>());

        let mut table = HashMap::new();
        table.insert(TypeKey::of::<String>(), 1);
        assert_eq!(table.get(&Value::new(String::new()).type_key()), Some(&1));
        assert_eq!(TypeKey::of::<u8>().name(), "u8");
    }

    #[test]
    fn test_downcast() {
        let v = Value::new(7i64);
        assert!(v.is::<i64>());
        assert_eq!(v.downcast_ref::<i64>(), Some(&7));
        assert_eq!(v.downcast_ref::<u64>(), None);

        let v = match v.downcast::<u64>() {
            Ok(_) => panic!("wrong type accepted"),
            Err(v) => v,
        };
        assert_eq!(v.downcast::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = Value::new(vec![1u8, 2]);
        let b = a.clone();
        a.downcast_mut::<Vec<u8>>().unwrap().push(3);
        assert_eq!(b.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_render_literals() {
        assert_eq!(Value::literal(42i64).render(), "42");
        assert_eq!(Value::literal("a".to_string()).render(), "String::from(\"a\")");
        assert_eq!(Value::literal(Some(vec![1u8])).render(), "Some(vec![1])");
        assert_eq!(format!("{:?}", Value::literal(f64::NAN)), "f64::NAN");
    }

    #[test]
    fn test_render_survives_clone_and_mutation() {
        let mut v = Value::literal(vec![String::from("a")]);
        v.downcast_mut::<Vec<String>>().unwrap().push(String::from("b"));
        assert_eq!(
            v.clone().render(),
            "vec![String::from(\"a\"), String::from(\"b\")]"
        );
        // Debug rendering for values built without a literal form.
        assert_eq!(Value::new(Some(vec![1u8])).render(), "Some([1])");
    }
}
