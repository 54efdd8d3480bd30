//! Summary of one chain invocation.

use chainfuzz_plan::Plan;
use serde::{Deserialize, Serialize};

use crate::chain::{ParallelControl, Schedule};

/// What a chain decided and ran. Step panics are not recorded here; they
/// propagate to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Decoded (or supplied) plan.
    pub plan: Plan,
    /// Bytes consumed decoding the plan. Zero for supplied plans.
    pub plan_bytes: usize,
    /// Step name of each call, in plan order.
    pub steps: Vec<String>,
    /// Spin and loop settings actually used.
    pub control: ParallelControl,
    pub schedule: Schedule,
    /// Input bytes left unconsumed after the chain.
    pub remaining: usize,
    /// Reproducer text, when repro output is enabled.
    pub repro: Option<String>,
}

impl ChainSummary {
    pub fn calls(&self) -> usize {
        self.steps.len()
    }

    pub fn is_parallel(&self) -> bool {
        !self.schedule.is_sequential()
    }
}
