//! Steps: named callables the chain executor can invoke.
//!
//! A [`Step`] erases a typed closure into a uniform
//! `Vec<Value> -> Vec<Value>` contract plus a [`Signature`] describing its
//! parameter and return types. Closures with up to eight [`Fill`]able
//! parameters are adapted by [`Step::new`]:
//!
//! ```
//! use chainfuzz_core::Step;
//!
//! let add = Step::new("add", |a: u32, b: u32| (a.wrapping_add(b),));
//! let reset = Step::new("reset", || ());
//! assert_eq!(add.arity(), 2);
//! assert_eq!(reset.signature().returns.len(), 0);
//! ```
//!
//! Return values are written as tuples: `()` for none, `(x,)` for one.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::FillError;
use crate::fill::{Fill, Filler};
use crate::literal::Literal;
use crate::value::{TypeKey, Value};

/// Bounds every step parameter must satisfy.
pub trait Param: Fill + Literal + Any + Clone + fmt::Debug + Send {}

impl<T: Fill + Literal + Any + Clone + fmt::Debug + Send> Param for T {}

/// Bounds every step return value must satisfy.
pub trait Ret: Any + Clone + fmt::Debug + Send {}

impl<T: Any + Clone + fmt::Debug + Send> Ret for T {}

/// Type-erased entry point of a step.
pub type Invoke = Arc<dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync>;

/// How to produce and sanitize one parameter.
#[derive(Clone, Copy)]
pub struct ParamSpec {
    pub key: TypeKey,
    /// Fill a fresh value of the parameter type.
    pub fill: fn(&mut Filler<'_>) -> Result<Value, FillError>,
    /// Replace an absent value with an empty present one.
    pub substitute_absent: fn(&mut Value),
}

impl ParamSpec {
    pub fn of<T: Param>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            fill: fill_value::<T>,
            substitute_absent: substitute_absent::<T>,
        }
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamSpec({})", self.key)
    }
}

fn fill_value<T: Param>(filler: &mut Filler<'_>) -> Result<Value, FillError> {
    filler.fill::<T>().map(Value::literal)
}

fn substitute_absent<T: Param>(value: &mut Value) {
    if let Some(v) = value.downcast_mut::<T>() {
        v.replace_absent();
    }
}

/// Parameter and return types of a step.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<ParamSpec>,
    pub returns: Vec<TypeKey>,
}

/// Return values of a typed step closure.
pub trait Outputs {
    fn keys() -> Vec<TypeKey>;
    fn into_values(self) -> Vec<Value>;
}

impl Outputs for () {
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! outputs_tuple {
    ($($name:ident),+) => {
        impl<$($name: Ret),+> Outputs for ($($name,)+) {
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$(Value::new($name)),+]
            }
        }
    };
}

outputs_tuple!(A);
outputs_tuple!(A, B);
outputs_tuple!(A, B, C);
outputs_tuple!(A, B, C, D);

/// A typed closure that can be adapted into a [`Step`]. `Args` is the tuple
/// of parameter types and only serves to keep the impls apart.
pub trait StepFunction<Args>: Send + Sync + 'static {
    fn signature() -> Signature;
    fn into_invoke(self, name: &str) -> Invoke;
}

fn take_arg<T: Param>(step: &str, position: usize, args: &mut std::vec::IntoIter<Value>) -> T {
    let Some(value) = args.next() else {
        panic!("malformed plan: step {} is missing argument {}", step, position);
    };
    match value.downcast::<T>() {
        Ok(v) => v,
        Err(v) => panic!(
            "malformed plan: step {} argument {} expects {} but got {}",
            step,
            position,
            std::any::type_name::<T>(),
            v.type_key()
        ),
    }
}

macro_rules! step_function {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> StepFunction<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Outputs,
            $($arg: Param,)*
        {
            fn signature() -> Signature {
                Signature {
                    params: vec![$(ParamSpec::of::<$arg>()),*],
                    returns: R::keys(),
                }
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_invoke(self, name: &str) -> Invoke {
                let name = name.to_string();
                let arity = <F as StepFunction<($($arg,)*)>>::signature().params.len();
                Arc::new(move |args: Vec<Value>| {
                    assert_eq!(
                        args.len(),
                        arity,
                        "malformed plan: step {} takes {} arguments",
                        name,
                        arity
                    );
                    let mut args = args.into_iter();
                    let mut position = 0;
                    $(
                        let $arg: $arg = take_arg(&name, position, &mut args);
                        position += 1;
                    )*
                    (self)($($arg),*).into_values()
                })
            }
        }
    };
}

step_function!();
step_function!(A1);
step_function!(A1, A2);
step_function!(A1, A2, A3);
step_function!(A1, A2, A3, A4);
step_function!(A1, A2, A3, A4, A5);
step_function!(A1, A2, A3, A4, A5, A6);
step_function!(A1, A2, A3, A4, A5, A6, A7);
step_function!(A1, A2, A3, A4, A5, A6, A7, A8);

/// A named operation in the step catalog.
#[derive(Clone)]
pub struct Step {
    name: String,
    signature: Signature,
    invoke: Invoke,
}

impl Step {
    /// Adapt a typed closure.
    pub fn new<Args, F: StepFunction<Args>>(name: impl Into<String>, f: F) -> Self {
        let name = name.into();
        let invoke = f.into_invoke(&name);
        Self {
            name,
            signature: F::signature(),
            invoke,
        }
    }

    /// Build a step from an already erased callable. The callable must
    /// return exactly `signature.returns.len()` values of the declared types.
    pub fn from_parts(name: impl Into<String>, signature: Signature, invoke: Invoke) -> Self {
        Self {
            name: name.into(),
            signature,
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.signature.params.len()
    }

    /// Invoke with resolved arguments. Panics raised by the step propagate.
    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}
