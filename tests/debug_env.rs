//! `CHAINFUZZ_DEBUG` handling. Kept in its own test binary, and in a single
//! test, because it mutates the process environment.

use chainfuzz::{run_chain, ChainConfig, Step, DEBUG_ENV_VAR};

#[test]
fn test_debug_env_switches() {
    std::env::remove_var(DEBUG_ENV_VAR);
    let config = ChainConfig::from_env().unwrap();
    assert!(!config.emit_repro && !config.print_plan);

    std::env::set_var(DEBUG_ENV_VAR, "repro=1,plan=1,verbose=7");
    let config = ChainConfig::from_env().unwrap();
    assert!(config.emit_repro, "repro switch");
    assert!(config.print_plan, "plan switch");

    // Repro text is attached to the summary when switched on from the env.
    let steps = vec![Step::new("ping", |_n: u8| ())];
    let summary = run_chain(&[0, 200, 0, 2, 0, 0, 0, 0, 9], &steps, |c| c).unwrap();
    let repro = summary.repro.unwrap();
    assert!(repro.contains("ping(\n        9,\n    );"));

    std::env::set_var(DEBUG_ENV_VAR, "repro=2");
    let err = ChainConfig::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("repro must be 0 or 1"));
    assert!(run_chain(&[0], &steps, |c| c).is_err());

    std::env::set_var(DEBUG_ENV_VAR, "plan=on");
    assert!(ChainConfig::from_env().is_err());

    std::env::remove_var(DEBUG_ENV_VAR);
}
