//! Human-readable reproducers for a resolved chain.
//!
//! Every call is printed with literal argument values. Return values consumed
//! by later calls get temporaries named `call{N}_ret{M}` (one-based), and the
//! parallel window is printed as a scoped-thread block:
//!
//! ```text
//! PLANNED STEPS: (sequential: false, loop count: 1, spin: true)
//!
//!     let (call1_ret1,) = load(
//!         [0, 0, 0, 0],
//!     );
//!     // Execute next steps in parallel.
//!     std::thread::scope(|s| {
//!         s.spawn(|| {
//!             store(
//!                 [0, 0, 0, 0],
//!                 call1_ret1.clone(),
//!             );
//!         });
//!         s.spawn(|| {
//!             load(
//!                 [0, 0, 0, 0],
//!             );
//!         });
//!     });
//! ```

use std::fmt;

use crate::chain::{Argument, ExecCall, ParallelControl, Schedule};

const INDENT: &str = "    ";

/// Displayable reproducer.
pub struct Repro<'a> {
    pub calls: &'a [ExecCall],
    pub schedule: Schedule,
    pub control: ParallelControl,
}

impl<'a> Repro<'a> {
    pub fn new(calls: &'a [ExecCall], schedule: Schedule, control: ParallelControl) -> Self {
        Self {
            calls,
            schedule,
            control,
        }
    }
}

fn temp_name(call: usize, ret: usize) -> String {
    format!("call{}_ret{}", call + 1, ret + 1)
}

impl fmt::Display for Repro<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.schedule {
            Schedule::Sequential => writeln!(f, "PLANNED STEPS: (sequential: true)")?,
            Schedule::Window { .. } => writeln!(
                f,
                "PLANNED STEPS: (sequential: false, loop count: {}, spin: {})",
                self.control.loop_count, self.control.spin
            )?,
        }
        writeln!(f)?;

        let looped = self.control.loop_count > 1;
        for call in self.calls {
            let in_window = self.schedule.contains(call.index);
            let mut depth = 1;

            if let Schedule::Window { start, .. } = self.schedule {
                if call.index == start {
                    if start != 0 {
                        writeln!(f)?;
                    }
                    writeln!(f, "{INDENT}// Execute next steps in parallel.")?;
                    writeln!(f, "{INDENT}std::thread::scope(|s| {{")?;
                }
            }
            if in_window {
                writeln!(f, "{}s.spawn(|| {{", INDENT.repeat(2))?;
                depth = 3;
                if looped {
                    writeln!(f, "{}for _ in 0..{} {{", INDENT.repeat(3), self.control.loop_count)?;
                    depth = 4;
                }
            }

            write_call(f, call, depth)?;

            if in_window {
                if looped {
                    writeln!(f, "{}}}", INDENT.repeat(3))?;
                }
                writeln!(f, "{}}});", INDENT.repeat(2))?;
            }

            if let Schedule::Window { stop, .. } = self.schedule {
                if call.index == stop {
                    writeln!(f, "{INDENT}}});")?;
                    if stop + 1 < self.calls.len() {
                        writeln!(f)?;
                        writeln!(f, "{INDENT}// Resume sequential execution.")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, call: &ExecCall, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    write!(f, "{pad}")?;
    if call.has_needed_outputs() {
        let names: Vec<String> = call
            .outputs
            .iter()
            .map(|slot| {
                if slot.is_needed() {
                    temp_name(slot.call_index(), slot.ret_index())
                } else {
                    "_".to_string()
                }
            })
            .collect();
        if names.len() == 1 {
            write!(f, "let ({},) = ", names[0])?;
        } else {
            write!(f, "let ({}) = ", names.join(", "))?;
        }
    }
    writeln!(f, "{}(", call.name)?;
    for arg in &call.args {
        let literal = match arg {
            Argument::Fresh(v) | Argument::Reused(v) => v.render(),
            Argument::Wired(slot) => {
                format!("{}.clone()", temp_name(slot.call_index(), slot.ret_index()))
            }
        };
        writeln!(f, "{pad}{INDENT}{literal},")?;
    }
    writeln!(f, "{pad});")
}

/// Render a reproducer as a string.
pub fn render_repro(calls: &[ExecCall], schedule: Schedule, control: ParallelControl) -> String {
    Repro::new(calls, schedule, control).to_string()
}
