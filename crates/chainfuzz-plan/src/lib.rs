//! Plan model for chained step fuzzing.
//!
//! A [`Plan`] is an ordered list of [`Call`]s decoded from the raw bytes a
//! coverage-guided fuzzing engine hands us. Each call names a step (by index
//! into the step catalog) and says, per argument, whether the value should be
//! freshly filled or reused from an earlier call.
//!
//! # Architecture
//!
//! - [`model`]: `Plan`, `Call`, `ArgSource` and the decoded `SourceKind`
//! - [`decode`]: bytes → `Plan`, reporting exactly how many bytes were read
//! - [`encode`]: `Plan` → bytes, for seeding corpora and regression inputs
//!
//! Decoding never looks at the steps themselves, only at their arities, so
//! this crate has no dependency on the execution runtime.

pub mod decode;
pub mod encode;
pub mod model;

pub use decode::{call_count, decode_plan, MAX_CALLS};
pub use encode::{encode_plan, EncodeError};
pub use model::{ArgSource, Call, Plan, SourceKind};
