//! Per-chain bookkeeping: reuse tables and resolved calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::slot::OutputSlot;
use crate::value::{TypeKey, Value};

/// Fresh inputs remembered per type for later reuse.
pub const INPUT_RING_CAPACITY: usize = 10;

/// Type-indexed reuse tables for one chain invocation.
#[derive(Debug, Default)]
pub struct ExecutionState {
    inputs: HashMap<TypeKey, VecDeque<Value>>,
    outputs: HashMap<TypeKey, Vec<Arc<OutputSlot>>>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a freshly filled input, evicting the oldest of its type
    /// past [`INPUT_RING_CAPACITY`].
    pub fn record_input(&mut self, value: Value) {
        let ring = self.inputs.entry(value.type_key()).or_default();
        ring.push_back(value);
        if ring.len() > INPUT_RING_CAPACITY {
            ring.pop_front();
        }
    }

    /// Oldest remembered input of the type, left in place.
    pub fn reuse_input(&self, key: &TypeKey) -> Option<Value> {
        self.inputs.get(key)?.front().cloned()
    }

    pub fn input_count(&self, key: &TypeKey) -> usize {
        self.inputs.get(key).map_or(0, VecDeque::len)
    }

    /// Claim the first output slot of the type for an argument of call
    /// `consumer`. The slot is marked needed so its producer publishes.
    pub fn claim_output(&self, key: &TypeKey, consumer: usize) -> Option<Arc<OutputSlot>> {
        let slot = self.outputs.get(key)?.first()?;
        assert!(
            slot.call_index() < consumer,
            "output of call {} wired into earlier call {}",
            slot.call_index(),
            consumer
        );
        slot.mark_needed();
        Some(Arc::clone(slot))
    }

    /// Create one slot per declared return value of call `call`. Must run
    /// after that call's own arguments are resolved.
    pub fn register_outputs(&mut self, call: usize, returns: &[TypeKey]) -> Vec<Arc<OutputSlot>> {
        returns
            .iter()
            .enumerate()
            .map(|(ret, key)| {
                let slot = Arc::new(OutputSlot::new(*key, call, ret));
                self.outputs.entry(*key).or_default().push(Arc::clone(&slot));
                slot
            })
            .collect()
    }
}

/// A resolved argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Filled from the byte stream for this call.
    Fresh(Value),
    /// Copy of an earlier fresh input.
    Reused(Value),
    /// Return value of an earlier call, available once its slot resolves.
    Wired(Arc<OutputSlot>),
}

/// A planned call with every argument resolved.
#[derive(Debug, Clone)]
pub struct ExecCall {
    /// Position in the plan.
    pub index: usize,
    /// Index into the step catalog.
    pub step: usize,
    pub name: String,
    pub args: Vec<Argument>,
    /// One slot per declared return value, in order.
    pub outputs: Vec<Arc<OutputSlot>>,
}

impl ExecCall {
    /// Whether any later call consumes one of this call's return values.
    pub fn has_needed_outputs(&self) -> bool {
        self.outputs.iter().any(|s| s.is_needed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_evicts_oldest() {
        let mut state = ExecutionState::new();
        let key = TypeKey::of::<u32>();
        for i in 1..=11u32 {
            state.record_input(Value::new(i));
        }
        assert_eq!(state.input_count(&key), INPUT_RING_CAPACITY);
        let first = state.reuse_input(&key).unwrap();
        assert_eq!(first.downcast::<u32>().unwrap(), 2);
        // Reuse leaves the ring untouched.
        assert_eq!(state.input_count(&key), INPUT_RING_CAPACITY);
    }

    #[test]
    fn test_rings_are_per_type() {
        let mut state = ExecutionState::new();
        state.record_input(Value::new(1u32));
        assert!(state.reuse_input(&TypeKey::of::<i32>()).is_none());
        assert!(state.reuse_input(&TypeKey::of::<Option<u32>>()).is_none());
        assert!(state.reuse_input(&TypeKey::of::<u32>()).is_some());
    }

    #[test]
    fn test_claim_first_output_slot() {
        let mut state = ExecutionState::new();
        let key = TypeKey::of::<i64>();
        assert!(state.claim_output(&key, 0).is_none());

        let first = state.register_outputs(0, &[key, TypeKey::of::<bool>()]);
        let _second = state.register_outputs(1, &[key]);
        assert_eq!(first.len(), 2);

        let claimed = state.claim_output(&key, 2).unwrap();
        assert!(Arc::ptr_eq(&claimed, &first[0]));
        assert!(first[0].is_needed());
        assert!(!first[1].is_needed());
    }

    #[test]
    #[should_panic(expected = "wired into earlier call")]
    fn test_claim_rejects_backward_wiring() {
        let mut state = ExecutionState::new();
        let key = TypeKey::of::<i64>();
        state.register_outputs(3, &[key]);
        state.claim_output(&key, 1);
    }
}
