//! Plan encoding.
//!
//! The inverse of [`decode_plan`](crate::decode_plan): turns a hand-written
//! plan into the bytes that decode back to it. Useful for seeding a corpus
//! with interesting call sequences or pinning a regression input.

use crate::decode::MAX_CALLS;
use crate::model::Plan;

/// Error returned when a plan cannot be expressed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// More calls than the count byte can select.
    TooManyCalls { calls: usize },
    /// A call carries a different number of records than its step's arity.
    ArityMismatch {
        call: usize,
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::TooManyCalls { calls } => {
                write!(f, "plan has {} calls, at most {} can be encoded", calls, MAX_CALLS)
            }
            EncodeError::ArityMismatch {
                call,
                expected,
                actual,
            } => write!(
                f,
                "call {} has {} argument sources but its step takes {}",
                call, actual, expected
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Encode `plan` for a catalog with the given step arities.
///
/// The count byte is chosen from the top band (`200 + n - 1`), which selects
/// exactly `n` calls for any `n` in `1..=10`. An empty plan encodes to no
/// bytes at all.
pub fn encode_plan(plan: &Plan, arities: &[usize]) -> Result<Vec<u8>, EncodeError> {
    if plan.is_empty() || arities.is_empty() {
        return Ok(Vec::new());
    }
    if plan.len() > MAX_CALLS {
        return Err(EncodeError::TooManyCalls { calls: plan.len() });
    }

    let mut out = Vec::with_capacity(1 + plan.len() * 5);
    out.push(200 + (plan.len() - 1) as u8);
    for (i, call) in plan.calls.iter().enumerate() {
        let expected = arities[call.step(arities.len())];
        if call.arg_sources.len() != expected {
            return Err(EncodeError::ArityMismatch {
                call: i,
                expected,
                actual: call.arg_sources.len(),
            });
        }
        out.push(call.step_index);
        for source in &call.arg_sources {
            out.push(source.source_type);
            out.push(source.arg_index);
        }
    }
    Ok(out)
}
