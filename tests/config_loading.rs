//! Configuration files, strict filling and run summaries.

use std::io::Write;

use chainfuzz::{run_chain, ChainConfig, FillError, Filler, FuzzError, Shape, Step};

#[test]
fn test_config_file_drives_chain() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"parallel": true, "spin_iterations": 0, "emit_repro": true}}"#
    )
    .unwrap();
    let config = ChainConfig::from_json_file(file.path()).unwrap();
    assert!(config.parallel && config.emit_repro);
    assert!(!config.strict);

    let steps = vec![Step::new("a", || ()), Step::new("b", || ())];
    let data = [0, 201, 0, 1, 0, 0, 0, b'1'];
    let summary = run_chain(&data, &steps, |_| config.clone()).unwrap();
    assert!(summary.is_parallel());
    let repro = summary.repro.expect("repro enabled by config file");
    assert!(repro.starts_with("PLANNED STEPS: (sequential: false, loop count: 1, spin: true)"));
}

#[test]
fn test_config_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    let config = ChainConfig::new().with_strict(true).with_spin_iterations(99);
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    assert_eq!(ChainConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn test_strict_mode_rejects_unfillable_argument() {
    let steps = vec![Step::new("register", |_callback: fn()| ())];
    // One call with a fresh argument.
    let data = [0, 200, 0, 2, 0];

    let err = run_chain(&data, &steps, |c| c.with_strict(true)).unwrap_err();
    match err.downcast_ref::<FuzzError>() {
        Some(FuzzError::Fill(FillError::UnsupportedShape { shape, .. })) => {
            assert_eq!(*shape, Shape::Callable)
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(format!("{:#}", err).contains("cannot fill callable"));

    // Lenient mode hands the step a no-op function instead.
    let summary = run_chain(&data, &steps, |c| c).unwrap();
    assert_eq!(summary.calls(), 1);
}

#[test]
fn test_strict_filler_direct() {
    let mut filler = Filler::new(&[]);
    filler.set_strict(true);
    assert!(filler.fill::<std::sync::mpsc::Sender<u8>>().is_err());
    filler.set_strict(false);
    assert!(filler.fill::<std::sync::mpsc::Sender<u8>>().is_ok());
}

#[test]
fn test_summary_serializes() {
    let steps = vec![Step::new("store", |_k: u8, _v: Vec<u8>| ())];
    let data = [0, 200, 0, 2, 0, 2, 0, 0, 0, 0, 5, 2, 1, 2];
    let summary = run_chain(&data, &steps, |c| c).unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["plan_bytes"], 6);
    assert_eq!(json["steps"][0], "store");
    assert_eq!(json["schedule"]["type"], "Sequential");
    assert_eq!(json["control"]["loop_count"], 1);
    assert_eq!(json["remaining"], 0);
    assert!(json["repro"].is_null());
}
