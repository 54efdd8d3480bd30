//! Error types for value filling and chain execution.
//!
//! Exhausted input is never an error (draws fall back to zero) and panics
//! raised by steps are never converted into errors. What remains is small:
//! shapes the filler cannot build, and chains with nothing to run.

/// Category of a value the filler cannot construct from bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `Sender`, `SyncSender`, `Receiver`.
    Channel,
    /// Function pointers and closures.
    Callable,
    /// Raw pointers.
    RawAddress,
    /// A capability name outside the supported catalog.
    Capability(String),
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Channel => write!(f, "channel"),
            Shape::Callable => write!(f, "callable"),
            Shape::RawAddress => write!(f, "raw address"),
            Shape::Capability(name) => write!(f, "capability '{}'", name),
        }
    }
}

/// Errors from filling a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    /// Only returned in strict mode. Lenient filling leaves the zero value.
    UnsupportedShape {
        type_name: &'static str,
        shape: Shape,
    },
}

impl std::fmt::Display for FillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillError::UnsupportedShape { type_name, shape } => {
                write!(f, "cannot fill {} of type {}", shape, type_name)
            }
        }
    }
}

impl std::error::Error for FillError {}

/// Errors from running a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzError {
    /// The step catalog was empty.
    NoSteps,
    /// Filling a fresh argument failed (strict mode only).
    Fill(FillError),
}

impl std::fmt::Display for FuzzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuzzError::NoSteps => write!(f, "chain requires at least one step"),
            FuzzError::Fill(e) => write!(f, "argument fill failed: {}", e),
        }
    }
}

impl std::error::Error for FuzzError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FuzzError::Fill(e) => Some(e),
            FuzzError::NoSteps => None,
        }
    }
}

impl From<FillError> for FuzzError {
    fn from(e: FillError) -> Self {
        FuzzError::Fill(e)
    }
}
