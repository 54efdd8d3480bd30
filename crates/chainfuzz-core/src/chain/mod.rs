//! Chained step execution.
//!
//! A [`Fuzzer`] owns the input bytes for one fuzzing iteration. The harness
//! may fill a few values directly, then hands a step catalog to
//! [`Fuzzer::chain`], which consumes the rest of the input in this order:
//!
//! 1. plan bytes (see [`chainfuzz_plan::decode_plan`])
//! 2. three control bytes: spin, loop count, ordering
//! 3. argument values for every planned call, in plan order
//! 4. one selector byte choosing the parallel window
//!
//! The selector comes last so that a fuzzing engine trimming the tail of an
//! input falls back to sequential execution first.
//!
//! # Architecture
//!
//! - [`mode`]: control byte bands, window selection, spinning
//! - [`state`]: per-type reuse tables and resolved calls
//! - [`slot`]: single-assignment return value cells
//!
//! Calls outside the window run one after another on the calling thread.
//! Calls inside it each get a scoped thread. A panic in any step reaches the
//! caller with its original payload.

mod mode;
mod slot;
mod state;

use std::any::Any;
use std::sync::Arc;

use chainfuzz_plan::{decode_plan, Call, Plan, SourceKind};
use tracing::{debug, trace, warn};

use crate::config::ChainConfig;
use crate::errors::{FillError, FuzzError};
use crate::fill::{CapabilityValue, Fill, FillOptions, Filler};
use crate::report::ChainSummary;
use crate::repro::render_repro;
use crate::step::Step;

pub use mode::{parallel_pair, parallel_suffix, spin, ParallelControl, Schedule};
pub use slot::OutputSlot;
pub use state::{Argument, ExecCall, ExecutionState, INPUT_RING_CAPACITY};

/// Byte-driven value filler and step chainer for one fuzzing input.
pub struct Fuzzer<'a> {
    filler: Filler<'a>,
    config: ChainConfig,
}

impl<'a> Fuzzer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ChainConfig::default())
    }

    /// The first input byte is reserved and skipped.
    pub fn with_config(data: &'a [u8], config: ChainConfig) -> Self {
        let mut filler = Filler::with_options(
            data,
            FillOptions {
                strict: config.strict,
            },
        );
        filler.cursor_mut().byte();
        Self { filler, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Input bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.filler.remaining()
    }

    /// Fill a value directly from the input. Call before [`chain`](Self::chain),
    /// never from inside a step.
    pub fn fill<T: Fill>(&mut self) -> Result<T, FillError> {
        let before = self.filler.cursor().position();
        let value = self.filler.fill::<T>()?;
        let used = &self.filler.cursor().consumed()[before..];
        trace!(
            type_name = std::any::type_name::<T>(),
            used = used.len(),
            bytes = %hex::encode(used),
            remaining = self.remaining(),
            "filled value"
        );
        if self.config.print_plan {
            eprintln!(
                "chainfuzz: filled {} using {} bytes, {} bytes remaining",
                std::any::type_name::<T>(),
                used.len(),
                self.remaining()
            );
        }
        Ok(value)
    }

    /// Fill a capability carrier chosen by catalog name at run time. Steps
    /// take the concrete carrier types instead; this is for harnesses that
    /// pick a capability before building their step catalog.
    pub fn fill_capability(&mut self, name: &str) -> Result<Option<CapabilityValue>, FillError> {
        let before = self.filler.cursor().position();
        let value = self.filler.fill_capability(name)?;
        trace!(
            capability = name,
            used = self.filler.cursor().position() - before,
            found = value.is_some(),
            "filled capability"
        );
        Ok(value)
    }

    /// Decode a plan from the input and execute it against `steps`.
    pub fn chain(&mut self, steps: &[Step]) -> Result<ChainSummary, FuzzError> {
        if steps.is_empty() {
            return Err(FuzzError::NoSteps);
        }
        let arities: Vec<usize> = steps.iter().map(Step::arity).collect();
        let data = self.filler.cursor().data();
        let (plan, used) = decode_plan(data, &arities);
        self.filler.cursor_mut().drain(used);

        debug!(
            calls = plan.len(),
            plan_bytes = used,
            bytes = %hex::encode(&data[..used]),
            remaining = self.remaining(),
            "decoded plan"
        );
        if self.config.print_plan {
            print_plan(&plan, used, self.remaining());
        }
        self.execute(steps, plan, used)
    }

    /// Execute a plan built by hand instead of decoded from the input.
    /// Control bytes, arguments and the selector byte still come from the
    /// input.
    pub fn run_plan(&mut self, steps: &[Step], plan: &Plan) -> Result<ChainSummary, FuzzError> {
        if steps.is_empty() {
            return Err(FuzzError::NoSteps);
        }
        self.execute(steps, plan.clone(), 0)
    }

    fn execute(
        &mut self,
        steps: &[Step],
        plan: Plan,
        plan_bytes: usize,
    ) -> Result<ChainSummary, FuzzError> {
        // Loop count must be known before wiring outputs, so the control
        // bytes precede argument resolution.
        let spin_byte = self.filler.draw_u8();
        let loop_byte = self.filler.draw_u8();
        let ordering = self.filler.draw_u8();
        let control = ParallelControl::from_bytes(spin_byte, loop_byte, ordering);

        let mut state = ExecutionState::new();
        let mut calls = Vec::with_capacity(plan.len());
        for (index, planned) in plan.calls.iter().enumerate() {
            let step_index = planned.step(steps.len());
            let step = &steps[step_index];
            let args = self.resolve_args(
                &mut state,
                step,
                planned,
                index,
                control.allows_output_reuse(),
            )?;
            let outputs = state.register_outputs(index, &step.signature().returns);
            calls.push(ExecCall {
                index,
                step: step_index,
                name: step.name().to_string(),
                args,
                outputs,
            });
        }

        let selector = self.filler.draw_u8();
        let schedule = Schedule::select(selector, calls.len(), self.config.parallel);
        let control = if schedule.is_sequential() {
            ParallelControl::sequential(ordering)
        } else {
            control
        };
        debug!(
            selector,
            schedule = ?schedule,
            loop_count = control.loop_count,
            spin = control.spin,
            "selected schedule"
        );
        if self.config.print_plan {
            eprintln!(
                "chainfuzz: selector byte {} schedule {:?} loop count {} spin {}",
                selector, schedule, control.loop_count, control.spin
            );
        }

        let repro = if self.config.emit_repro {
            let text = render_repro(&calls, schedule, control);
            eprintln!("{}", text);
            Some(text)
        } else {
            None
        };

        let runner = Runner {
            steps,
            substitute_absent: self.config.substitute_absent,
            spin_iterations: self.config.spin_iterations,
        };
        runner.run(&calls, schedule, control);

        Ok(ChainSummary {
            plan,
            plan_bytes,
            steps: calls.iter().map(|c| c.name.clone()).collect(),
            control,
            schedule,
            remaining: self.remaining(),
            repro,
        })
    }

    fn resolve_args(
        &mut self,
        state: &mut ExecutionState,
        step: &Step,
        planned: &Call,
        index: usize,
        allow_output_reuse: bool,
    ) -> Result<Vec<Argument>, FuzzError> {
        let params = &step.signature().params;
        let mut args = Vec::with_capacity(params.len());
        for (position, param) in params.iter().enumerate() {
            let reused = match planned.source(position) {
                SourceKind::ReuseInput => state.reuse_input(&param.key).map(Argument::Reused),
                SourceKind::ReuseOutput if allow_output_reuse => {
                    state.claim_output(&param.key, index).map(Argument::Wired)
                }
                _ => None,
            };
            let arg = match reused {
                Some(arg) => arg,
                None => {
                    let value = (param.fill)(&mut self.filler)?;
                    state.record_input(value.clone());
                    Argument::Fresh(value)
                }
            };
            trace!(call = index, position, arg = ?arg, "resolved argument");
            args.push(arg);
        }
        Ok(args)
    }
}

fn print_plan(plan: &Plan, used: usize, remaining: usize) {
    match serde_json::to_string_pretty(plan) {
        Ok(json) => eprintln!("PLAN:\n{}\n", json),
        Err(e) => warn!(error = %e, "failed to render plan"),
    }
    eprintln!(
        "chainfuzz: filled plan using {} bytes, {} bytes remaining",
        used, remaining
    );
}

/// Releases a call's output slots when dropped, so consumers never wait on
/// a producer that panicked or was skipped. Published slots are unaffected.
struct ReleaseSlots<'a>(&'a [Arc<OutputSlot>]);

impl Drop for ReleaseSlots<'_> {
    fn drop(&mut self) {
        for slot in self.0 {
            slot.abandon();
        }
    }
}

struct Runner<'s> {
    steps: &'s [Step],
    substitute_absent: bool,
    spin_iterations: u64,
}

impl Runner<'_> {
    fn run(&self, calls: &[ExecCall], schedule: Schedule, control: ParallelControl) {
        let Schedule::Window { start, stop } = schedule else {
            for call in calls {
                self.invoke(call);
            }
            return;
        };
        for call in &calls[..start] {
            self.invoke(call);
        }
        self.run_window(&calls[start..=stop], control);
        for call in &calls[stop + 1..] {
            self.invoke(call);
        }
    }

    fn run_window(&self, window: &[ExecCall], control: ParallelControl) {
        debug!(
            tasks = window.len(),
            loop_count = control.loop_count,
            spin = control.spin,
            "launching parallel window"
        );
        let mut failure: Option<Box<dyn Any + Send>> = None;
        std::thread::scope(|s| {
            let mut handles = Vec::with_capacity(window.len());
            for (i, call) in window.iter().enumerate() {
                if control.spin && i > 0 {
                    spin(self.spin_iterations);
                }
                let call = call.clone();
                handles.push(s.spawn(move || {
                    for _ in 0..control.loop_count {
                        self.invoke(&call);
                    }
                }));
            }
            for handle in handles {
                if let Err(payload) = handle.join() {
                    failure.get_or_insert(payload);
                }
            }
        });
        debug!("parallel window joined");
        if let Some(payload) = failure {
            std::panic::resume_unwind(payload);
        }
    }

    fn invoke(&self, call: &ExecCall) {
        let step = &self.steps[call.step];
        let _release = ReleaseSlots(&call.outputs);

        let mut args = Vec::with_capacity(call.args.len());
        for (arg, param) in call.args.iter().zip(&step.signature().params) {
            let mut value = match arg {
                Argument::Fresh(v) | Argument::Reused(v) => v.clone(),
                Argument::Wired(slot) => match slot.wait() {
                    Some(v) => v,
                    None => {
                        debug!(
                            call = call.index,
                            producer = slot.call_index(),
                            "producer did not publish, skipping call"
                        );
                        return;
                    }
                },
            };
            if self.substitute_absent {
                (param.substitute_absent)(&mut value);
            }
            args.push(value);
        }

        trace!(call = call.index, step = %call.name, "invoking step");
        let results = step.call(args);
        assert_eq!(
            results.len(),
            call.outputs.len(),
            "malformed plan: step {} returned {} values but declares {}",
            call.name,
            results.len(),
            call.outputs.len()
        );
        for (slot, value) in call.outputs.iter().zip(results) {
            if !slot.is_needed() {
                continue;
            }
            assert_eq!(
                value.type_key(),
                slot.key(),
                "malformed plan: step {} return {} has the wrong type",
                call.name,
                slot.ret_index()
            );
            slot.publish(value);
        }
    }
}
