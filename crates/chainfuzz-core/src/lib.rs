//! Chainfuzz core runtime
//!
//! Turns an opaque fuzzing input into typed values and sequences of calls:
//!
//! - **Value filling**: deterministic, never-failing construction of typed
//!   values from bytes ([`fill`])
//! - **Chaining**: decode a call plan, wire earlier inputs and outputs into
//!   later calls, optionally run a window of calls concurrently ([`chain`])
//! - **Reproducers**: print a resolved chain as ordinary Rust ([`repro`],
//!   with argument values written by [`literal`])
//!
//! A typical harness:
//!
//! ```
//! use chainfuzz_core::{Fuzzer, Step};
//!
//! fn harness(data: &[u8]) {
//!     let mut fz = Fuzzer::new(data);
//!     let limit: u16 = fz.fill().unwrap_or_default();
//!     let steps = vec![
//!         Step::new("push", move |x: u32| (x % (limit as u32 + 1),)),
//!         Step::new("check", |x: u32| assert!(x <= u16::MAX as u32)),
//!     ];
//!     let _ = fz.chain(&steps);
//! }
//!
//! harness(&[0, 3, 0, 201, 0, 2, 0, 1, 2, 0]);
//! ```

pub mod chain;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod fill;
pub mod literal;
pub mod repro;
pub mod report;
pub mod step;
pub mod value;

pub use chain::{ExecCall, Fuzzer, ParallelControl, Schedule};
pub use config::{ChainConfig, DEBUG_ENV_VAR};
pub use cursor::ByteCursor;
pub use errors::{FillError, FuzzError, Shape};
pub use fill::{Capability, CapabilityValue, Fill, FillOptions, Filler};
pub use literal::Literal;
pub use repro::{render_repro, Repro};
pub use report::ChainSummary;
pub use step::{Signature, Step, StepFunction};
pub use value::{TypeKey, Value};

pub use chainfuzz_plan;
pub use chainfuzz_plan::{ArgSource, Call, Plan, SourceKind};
