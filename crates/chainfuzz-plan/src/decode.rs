//! Byte-level plan decoding.
//!
//! Wire layout:
//!
//! ```text
//! count:u8  { step:u8  { source_type:u8 arg_index:u8 } * arity(step) } * calls
//! ```
//!
//! The number of calls is drawn from a skewed band on the first byte so that
//! most plans have 3–5 calls. A call whose records cannot be read in full is
//! dropped and decoding stops; the bytes it did read still count as consumed.

use tracing::trace;

use crate::model::{ArgSource, Call, Plan};

/// Upper bound on the number of calls in a decoded plan.
pub const MAX_CALLS: usize = 10;

/// Map the leading count byte to a number of calls.
pub fn call_count(byte: u8) -> usize {
    match byte {
        0..=63 => 3,
        64..=127 => 4,
        128..=191 => 5,
        _ => (byte % 10) as usize + 1,
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read exactly `n` bytes, or consume whatever is left and return `None`.
    fn read_exact(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            self.pos = self.data.len();
            return None;
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }
}

/// Decode a plan from `data` given the arity of every step in the catalog.
///
/// Returns the plan and the number of bytes consumed. The caller drains that
/// many bytes from its stream; anything after is left for argument filling.
pub fn decode_plan(data: &[u8], arities: &[usize]) -> (Plan, usize) {
    if arities.is_empty() {
        return (Plan::default(), 0);
    }

    let mut reader = Reader { data, pos: 0 };
    let Some(count) = reader.read_exact(1) else {
        return (Plan::default(), 0);
    };
    let wanted = call_count(count[0]);

    let mut calls = Vec::with_capacity(wanted);
    for _ in 0..wanted {
        let Some(step) = reader.read_exact(1) else {
            break;
        };
        let step_index = step[0];
        let arity = arities[step_index as usize % arities.len()];

        let Some(records) = reader.read_exact(arity * 2) else {
            trace!(
                step_index,
                arity,
                "plan decode: partial call discarded"
            );
            break;
        };
        let arg_sources = records
            .chunks_exact(2)
            .map(|pair| ArgSource::new(pair[0], pair[1]))
            .collect();
        calls.push(Call::new(step_index, arg_sources));
    }

    trace!(
        calls = calls.len(),
        wanted,
        consumed = reader.pos,
        "plan decoded"
    );
    (Plan::new(calls), reader.pos)
}
