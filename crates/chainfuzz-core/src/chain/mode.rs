//! Parallel window selection and concurrency controls.
//!
//! Bands are skewed so that the values fuzzing engines produce most often
//! while minimizing (`0x00`, ASCII `'0'`, a missing trailing byte) mean
//! "sequential, no looping". Stepping a selector through `'1'`, `'2'`, ...
//! walks a parallel pair backwards from the end of the plan.

use serde::{Deserialize, Serialize};

/// Spin and loop settings drawn from the three control bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelControl {
    /// Busy-wait before starting each window task after the first.
    pub spin: bool,
    /// Times each window call is invoked.
    pub loop_count: usize,
    /// Reserved for goroutine-style start ordering. Drawn, not interpreted.
    pub ordering: u8,
}

impl ParallelControl {
    pub fn from_bytes(spin_byte: u8, loop_byte: u8, ordering: u8) -> Self {
        let mut spin = spin_byte == b'0' || loop_byte < 192;
        let loop_count = match loop_byte {
            b'0' | 0..=127 => 1,
            128..=223 => 4,
            224..=249 => 16,
            250..=253 => 64,
            _ => 256,
        };
        if loop_count >= 16 {
            spin = false;
        }
        Self {
            spin,
            loop_count,
            ordering,
        }
    }

    /// Controls reported for a run without a window.
    pub fn sequential(ordering: u8) -> Self {
        Self {
            spin: false,
            loop_count: 1,
            ordering,
        }
    }

    /// Output wiring is only sound when every call runs exactly once.
    pub fn allows_output_reuse(&self) -> bool {
        self.loop_count == 1
    }
}

/// Which calls, if any, run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Schedule {
    Sequential,
    /// Inclusive range of call indices run as concurrent tasks.
    Window { start: usize, stop: usize },
}

impl Schedule {
    /// Interpret the selector byte for a plan of `calls` calls.
    pub fn select(selector: u8, calls: usize, parallel_allowed: bool) -> Self {
        if !parallel_allowed || calls < 2 {
            return Schedule::Sequential;
        }
        let (start, stop) = match selector {
            b'0' | 0..=31 => return Schedule::Sequential,
            32..=223 => parallel_pair(selector, calls),
            _ => parallel_suffix(selector, calls),
        };
        Schedule::Window { start, stop }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Schedule::Sequential)
    }

    pub fn contains(&self, call: usize) -> bool {
        match *self {
            Schedule::Sequential => false,
            Schedule::Window { start, stop } => (start..=stop).contains(&call),
        }
    }
}

/// Adjacent pair, counted backwards from the end. `'1'` selects the last
/// two calls, `'2'` the two before them, and so on, wrapping mod `calls - 1`.
pub fn parallel_pair(selector: u8, calls: usize) -> (usize, usize) {
    debug_assert!(calls >= 2);
    let offset = selector.wrapping_sub(b'1') as usize % (calls - 1);
    let stop = calls - 1 - offset;
    (stop - 1, stop)
}

/// Suffix window of two or more calls ending at the last call.
pub fn parallel_suffix(selector: u8, calls: usize) -> (usize, usize) {
    debug_assert!(calls >= 2);
    let offset = selector as usize % (calls - 1);
    (calls - 2 - offset, calls - 1)
}

/// Yield, then busy-wait for `iterations` rounds.
pub fn spin(iterations: u64) {
    std::thread::yield_now();
    let mut i = 0u64;
    while i < iterations {
        i = std::hint::black_box(i + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_bands() {
        let cases = [
            (0u8, 1usize),
            (b'0', 1),
            (127, 1),
            (128, 4),
            (223, 4),
            (224, 16),
            (249, 16),
            (250, 64),
            (253, 64),
            (254, 256),
            (255, 256),
        ];
        for (byte, want) in cases {
            assert_eq!(
                ParallelControl::from_bytes(0, byte, 0).loop_count,
                want,
                "loop byte {byte}"
            );
        }
    }

    #[test]
    fn test_spin_rules() {
        assert!(ParallelControl::from_bytes(1, 0, 0).spin);
        assert!(ParallelControl::from_bytes(255, 191, 0).spin);
        assert!(!ParallelControl::from_bytes(255, 192, 0).spin);
        assert!(ParallelControl::from_bytes(b'0', 200, 0).spin);
        // Large loop counts never spin.
        assert!(!ParallelControl::from_bytes(b'0', 224, 0).spin);
        assert!(!ParallelControl::from_bytes(b'0', 255, 0).spin);
    }

    #[test]
    fn test_output_reuse_needs_single_loop() {
        assert!(ParallelControl::from_bytes(0, 0, 0).allows_output_reuse());
        assert!(!ParallelControl::from_bytes(0, 128, 0).allows_output_reuse());
        assert!(ParallelControl::sequential(7).allows_output_reuse());
    }

    #[test]
    fn test_parallel_pair_walks_back() {
        assert_eq!(parallel_pair(b'1', 10), (8, 9));
        assert_eq!(parallel_pair(b'2', 10), (7, 8));
        assert_eq!(parallel_pair(b'9', 10), (0, 1));
        assert_eq!(parallel_pair(b'9' + 1, 10), (8, 9));
        assert_eq!(parallel_pair(0, 10), (8, 9));
        assert_eq!(parallel_pair(200, 2), (0, 1));
    }

    #[test]
    fn test_parallel_suffix() {
        assert_eq!(parallel_suffix(0, 10), (8, 9));
        assert_eq!(parallel_suffix(1, 10), (7, 9));
        assert_eq!(parallel_suffix(8, 10), (0, 9));
        assert_eq!(parallel_suffix(9, 10), (8, 9));
        assert_eq!(parallel_suffix(255, 2), (0, 1));
    }

    #[test]
    fn test_window_bounds_always_valid() {
        for calls in 2..=10 {
            for selector in 0..=255u8 {
                if let Schedule::Window { start, stop } = Schedule::select(selector, calls, true) {
                    assert!(start < stop, "selector {selector} calls {calls}");
                    assert!(stop < calls);
                }
            }
        }
    }

    #[test]
    fn test_select_bands() {
        assert_eq!(Schedule::select(0, 5, true), Schedule::Sequential);
        assert_eq!(Schedule::select(31, 5, true), Schedule::Sequential);
        assert_eq!(Schedule::select(b'0', 5, true), Schedule::Sequential);
        assert_eq!(
            Schedule::select(b'1', 5, true),
            Schedule::Window { start: 3, stop: 4 }
        );
        assert_eq!(
            Schedule::select(224, 5, true),
            Schedule::Window { start: 3, stop: 4 }
        );
        assert_eq!(Schedule::select(b'1', 5, false), Schedule::Sequential);
        assert_eq!(Schedule::select(b'1', 1, true), Schedule::Sequential);
    }

    #[test]
    fn test_contains() {
        let w = Schedule::Window { start: 1, stop: 3 };
        assert!(!w.contains(0));
        assert!(w.contains(1) && w.contains(3));
        assert!(!w.contains(4));
        assert!(!Schedule::Sequential.contains(0));
    }
}
