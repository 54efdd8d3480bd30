//! Chainfuzz
//!
//! Structured fuzzing of call sequences. A fuzz target hands raw input bytes
//! and a catalog of named steps to a [`Fuzzer`]; the bytes decide which steps
//! run, in what order, with which arguments, and whether a slice of the
//! sequence runs concurrently:
//!
//! - **Values**: [`Fill`] builds typed arguments from bytes, never failing on
//!   short input
//! - **Plans**: [`chainfuzz_plan`] decodes and encodes call sequences
//! - **Execution**: [`Fuzzer::chain`] resolves arguments, wires outputs into
//!   later calls and runs an optional parallel window
//! - **Diagnostics**: reproducers and plan dumps, switched on through
//!   [`DEBUG_ENV_VAR`]
//!
//! See [`run_chain`] for the one-call harness entry point.

use anyhow::{Context, Result};
use tracing::debug;

pub use chainfuzz_core::chain;
pub use chainfuzz_core::config;
pub use chainfuzz_core::cursor;
pub use chainfuzz_core::errors;
pub use chainfuzz_core::fill;
pub use chainfuzz_core::literal;
pub use chainfuzz_core::repro;
pub use chainfuzz_core::report;
pub use chainfuzz_core::step;
pub use chainfuzz_core::value;
pub use chainfuzz_core::{
    impl_fill, render_repro, ByteCursor, ChainConfig, ChainSummary, Fill, FillError, FillOptions,
    Filler, FuzzError, Fuzzer, Literal, ParallelControl, Schedule, Shape, Signature, Step,
    StepFunction, TypeKey, Value, DEBUG_ENV_VAR,
};
pub use chainfuzz_plan::{
    call_count, decode_plan, encode_plan, ArgSource, Call, EncodeError, Plan, SourceKind,
};

pub use chainfuzz_core;
pub use chainfuzz_plan;

/// Run one chain over `data` with diagnostics taken from the environment.
///
/// `configure` adjusts the configuration before the run, e.g. to allow a
/// parallel window. Step panics propagate unchanged.
pub fn run_chain(
    data: &[u8],
    steps: &[Step],
    configure: impl FnOnce(ChainConfig) -> ChainConfig,
) -> Result<ChainSummary> {
    let config = configure(ChainConfig::from_env()?);
    debug!(
        input_len = data.len(),
        steps = steps.len(),
        parallel = config.parallel,
        "running chain"
    );
    let mut fuzzer = Fuzzer::with_config(data, config);
    fuzzer
        .chain(steps)
        .with_context(|| format!("Chain over {} steps failed", steps.len()))
}
