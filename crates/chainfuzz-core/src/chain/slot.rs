//! Single-assignment cells carrying a return value to later calls.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::value::{TypeKey, Value};

#[derive(Debug)]
enum SlotState {
    Pending,
    Ready(Value),
    /// The producing call panicked before it could publish.
    Abandoned,
}

/// One declared return value of one planned call.
///
/// Created before execution starts. Written at most once, by the call that
/// owns it, and only when some later argument claimed it. Readers block in
/// [`wait`](Self::wait) until the value is published or abandoned.
#[derive(Debug)]
pub struct OutputSlot {
    key: TypeKey,
    call: usize,
    ret: usize,
    needed: AtomicBool,
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl OutputSlot {
    pub fn new(key: TypeKey, call: usize, ret: usize) -> Self {
        Self {
            key,
            call,
            ret,
            needed: AtomicBool::new(false),
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Zero-based index of the producing call.
    pub fn call_index(&self) -> usize {
        self.call
    }

    /// Zero-based position among the producing call's return values.
    pub fn ret_index(&self) -> usize {
        self.ret
    }

    pub fn mark_needed(&self) {
        self.needed.store(true, Ordering::SeqCst);
    }

    pub fn is_needed(&self) -> bool {
        self.needed.load(Ordering::SeqCst)
    }

    /// Store the value and wake every waiter. Returns false if the slot was
    /// already resolved, in which case the value is dropped.
    pub fn publish(&self, value: Value) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SlotState::Pending) {
            return false;
        }
        *state = SlotState::Ready(value);
        self.ready.notify_all();
        true
    }

    /// Resolve without a value so waiters stop blocking.
    pub fn abandon(&self) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Abandoned;
            self.ready.notify_all();
        }
    }

    /// Block until resolved. `None` means the producer panicked.
    pub fn wait(&self) -> Option<Value> {
        let mut state = self.state.lock();
        while matches!(*state, SlotState::Pending) {
            self.ready.wait(&mut state);
        }
        match &*state {
            SlotState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(*self.state.lock(), SlotState::Pending)
    }
}
