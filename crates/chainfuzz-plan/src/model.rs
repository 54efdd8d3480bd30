//! Plan data types.

use serde::{Deserialize, Serialize};

/// Where the value for one argument of a call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Reuse a value previously filled as an input of the same type.
    ReuseInput,
    /// Reuse a value returned by an earlier call.
    ReuseOutput,
    /// Fill a new value from the byte stream.
    Fresh,
}

/// Raw per-argument source record, two bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgSource {
    /// Reduced mod 3 into a [`SourceKind`].
    pub source_type: u8,
    /// Which candidate to pick among matching values. Recorded, but the
    /// runtime currently always takes the first match.
    pub arg_index: u8,
}

impl ArgSource {
    pub fn new(source_type: u8, arg_index: u8) -> Self {
        Self {
            source_type,
            arg_index,
        }
    }

    /// Record that decodes to the given kind with a zero index hint.
    pub fn of_kind(kind: SourceKind) -> Self {
        let source_type = match kind {
            SourceKind::ReuseInput => 0,
            SourceKind::ReuseOutput => 1,
            SourceKind::Fresh => 2,
        };
        Self::new(source_type, 0)
    }

    /// Decoded source kind.
    ///
    /// ASCII `'0'` is 48, and 48 % 3 == 0, so both `0x00` and `'0'` (values
    /// fuzzing engines like to insert) select input reuse.
    pub fn kind(&self) -> SourceKind {
        match self.source_type % 3 {
            0 => SourceKind::ReuseInput,
            1 => SourceKind::ReuseOutput,
            _ => SourceKind::Fresh,
        }
    }
}

/// One planned invocation of a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Call {
    /// Index into the step catalog, taken mod the catalog length.
    pub step_index: u8,
    /// One entry per formal parameter. Extra entries are ignored and missing
    /// entries mean a fresh value.
    pub arg_sources: Vec<ArgSource>,
}

impl Call {
    pub fn new(step_index: u8, arg_sources: Vec<ArgSource>) -> Self {
        Self {
            step_index,
            arg_sources,
        }
    }

    /// Resolve the step this call targets in a catalog of `step_count` steps.
    pub fn step(&self, step_count: usize) -> usize {
        if step_count == 0 {
            return 0;
        }
        self.step_index as usize % step_count
    }

    /// Source kind for parameter `param`, defaulting to fresh when the call
    /// carries no record for it.
    pub fn source(&self, param: usize) -> SourceKind {
        self.arg_sources
            .get(param)
            .map(ArgSource::kind)
            .unwrap_or(SourceKind::Fresh)
    }
}

/// An ordered sequence of calls to execute.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub calls: Vec<Call>,
}

impl Plan {
    pub fn new(calls: Vec<Call>) -> Self {
        Self { calls }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_mod_three() {
        assert_eq!(ArgSource::new(0, 0).kind(), SourceKind::ReuseInput);
        assert_eq!(ArgSource::new(1, 0).kind(), SourceKind::ReuseOutput);
        assert_eq!(ArgSource::new(2, 0).kind(), SourceKind::Fresh);
        assert_eq!(ArgSource::new(b'0', 0).kind(), SourceKind::ReuseInput);
        assert_eq!(ArgSource::new(255, 0).kind(), SourceKind::ReuseInput);
        assert_eq!(ArgSource::new(7, 0).kind(), SourceKind::ReuseOutput);
    }

    #[test]
    fn test_of_kind_decodes_back() {
        for kind in [
            SourceKind::ReuseInput,
            SourceKind::ReuseOutput,
            SourceKind::Fresh,
        ] {
            assert_eq!(ArgSource::of_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn test_missing_source_is_fresh() {
        let call = Call::new(3, vec![ArgSource::of_kind(SourceKind::ReuseInput)]);
        assert_eq!(call.source(0), SourceKind::ReuseInput);
        assert_eq!(call.source(1), SourceKind::Fresh);
        assert_eq!(call.step(2), 1);
        assert_eq!(call.step(0), 0);
    }

    #[test]
    fn test_plan_serializes() {
        let plan = Plan::new(vec![Call::new(1, vec![ArgSource::new(2, 9)])]);
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert!(json.contains("\"step_index\":1"));
    }
}
