//! Chain execution configuration.
//!
//! Defaults favour deterministic, sequential execution. Parallel windows are
//! opt-in, and diagnostics are usually switched on from the environment
//! while reproducing a crash:
//!
//! ```text
//! CHAINFUZZ_DEBUG=repro=1,plan=1 cargo test my_fuzz_target
//! ```

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable holding diagnostic switches.
pub const DEBUG_ENV_VAR: &str = "CHAINFUZZ_DEBUG";

/// Default busy-wait length between parallel task starts.
pub const DEFAULT_SPIN_ITERATIONS: u64 = 1 << 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Allow a window of calls to run concurrently.
    pub parallel: bool,
    /// Replace `None` arguments with empty present values before a call.
    pub substitute_absent: bool,
    /// Fail on argument shapes that cannot be filled instead of zeroing them.
    pub strict: bool,
    /// Print a repro of every chain to stderr.
    pub emit_repro: bool,
    /// Print each decoded plan and its byte accounting to stderr.
    pub print_plan: bool,
    /// Busy-wait rounds between parallel task starts when spinning.
    pub spin_iterations: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            substitute_absent: true,
            strict: false,
            emit_repro: false,
            print_plan: false,
            spin_iterations: DEFAULT_SPIN_ITERATIONS,
        }
    }
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with diagnostics taken from [`DEBUG_ENV_VAR`].
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(spec) = std::env::var(DEBUG_ENV_VAR) {
            config
                .apply_debug_spec(&spec)
                .with_context(|| format!("Invalid {} value '{}'", DEBUG_ENV_VAR, spec))?;
        }
        Ok(config)
    }

    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chain config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse chain config {}", path.display()))
    }

    /// Apply a comma-separated list of `repro=0|1` and `plan=0|1` switches.
    /// Other keys are ignored.
    pub fn apply_debug_spec(&mut self, spec: &str) -> Result<()> {
        for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(value) = item.strip_prefix("repro=") {
                self.emit_repro = parse_switch("repro", value)?;
            } else if let Some(value) = item.strip_prefix("plan=") {
                self.print_plan = parse_switch("plan", value)?;
            }
        }
        Ok(())
    }

    /// Builder method: allow a parallel window.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method: toggle absent-argument substitution.
    pub fn with_substitute_absent(mut self, substitute: bool) -> Self {
        self.substitute_absent = substitute;
        self
    }

    /// Builder method: toggle strict filling.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder method: toggle repro output.
    pub fn with_repro(mut self, emit: bool) -> Self {
        self.emit_repro = emit;
        self
    }

    /// Builder method: toggle plan output.
    pub fn with_print_plan(mut self, print: bool) -> Self {
        self.print_plan = print;
        self
    }

    /// Builder method: set spin length.
    pub fn with_spin_iterations(mut self, iterations: u64) -> Self {
        self.spin_iterations = iterations;
        self
    }
}

fn parse_switch(key: &str, value: &str) -> Result<bool> {
    match value.parse::<u8>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        _ => Err(anyhow!("{} must be 0 or 1, got '{}'", key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();
        assert!(!config.parallel);
        assert!(config.substitute_absent);
        assert!(!config.strict);
        assert_eq!(config.spin_iterations, 262_144);
    }

    #[test]
    fn test_debug_spec() {
        let mut config = ChainConfig::new();
        config.apply_debug_spec("repro=1, plan=1,planversion=2").unwrap();
        assert!(config.emit_repro);
        assert!(config.print_plan);

        config.apply_debug_spec("plan=0").unwrap();
        assert!(!config.print_plan);
        assert!(config.emit_repro);

        config.apply_debug_spec("").unwrap();
    }

    #[test]
    fn test_debug_spec_rejects_bad_values() {
        let mut config = ChainConfig::new();
        let err = config.apply_debug_spec("repro=2").unwrap_err();
        assert!(err.to_string().contains("repro must be 0 or 1"));
        assert!(config.apply_debug_spec("plan=yes").is_err());
    }

    #[test]
    fn test_builders() {
        let config = ChainConfig::new()
            .with_parallel(true)
            .with_strict(true)
            .with_substitute_absent(false)
            .with_repro(true)
            .with_print_plan(true)
            .with_spin_iterations(0);
        assert!(config.parallel && config.strict && config.emit_repro && config.print_plan);
        assert!(!config.substitute_absent);
        assert_eq!(config.spin_iterations, 0);
    }

    #[test]
    fn test_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"parallel": true, "spin_iterations": 16}}"#).unwrap();

        let config = ChainConfig::from_json_file(file.path()).unwrap();
        assert!(config.parallel);
        assert_eq!(config.spin_iterations, 16);
        assert!(config.substitute_absent, "missing fields keep defaults");
    }

    #[test]
    fn test_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = ChainConfig::from_json_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read chain config"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let err = ChainConfig::from_json_file(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse chain config"));
    }
}
