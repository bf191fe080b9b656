#[path = "harness_support.rs"]
mod support;

use clocked_harness::{Harness, HarnessError, Verdict};
use support::{counter_config, scratch_dir, EdgeCounter};

#[test]
fn performs_cycles_plus_one_drain_tick() {
    for cycles in [0u64, 1, 2, 7, 64] {
        let dir = scratch_dir();
        let mut model = EdgeCounter::new();
        let report = Harness::new(counter_config(dir.path(), cycles, cycles + 1))
            .drive(&mut model)
            .expect("harness should run");

        assert_eq!(report.ticks, cycles + 1, "cycles={cycles}");
        assert_eq!(model.rising_edges, cycles + 1, "cycles={cycles}");
        assert_eq!(model.evals, 2 * (cycles + 1), "one eval per clock phase");
        assert_eq!(model.clock_writes, 2 * (cycles + 1));
        assert_eq!(report.final_time, 10 * (cycles + 1));
        assert_eq!(report.verdict, Verdict::Pass);
    }
}

#[test]
fn finalize_runs_once_after_the_last_eval() {
    let dir = scratch_dir();
    let mut model = EdgeCounter::new();
    Harness::new(counter_config(dir.path(), 3, 4))
        .drive(&mut model)
        .expect("harness should run");

    assert_eq!(model.finalize_calls, 1);
    assert_eq!(model.evals_after_finalize, 0);
}

#[test]
fn time_quantum_scales_simulated_time() {
    let dir = scratch_dir();
    let mut model = EdgeCounter::new();
    let config = counter_config(dir.path(), 4, 5).with_time_quantum(3);
    let report = Harness::new(config)
        .drive(&mut model)
        .expect("harness should run");
    assert_eq!(report.final_time, 5 * 2 * 3);
}

#[test]
fn inputs_are_assigned_before_the_first_tick() {
    let dir = scratch_dir();
    let mut model = EdgeCounter::new();
    let config = counter_config(dir.path(), 2, 103).with_input("offset", 100);
    let report = Harness::new(config)
        .drive(&mut model)
        .expect("harness should run");
    assert!(report.passed());
    assert_eq!(report.observed, 103);
}

#[test]
fn setup_hook_runs_before_clocking() {
    let dir = scratch_dir();
    let mut model = EdgeCounter::new();
    let mut edges_at_setup = None;
    let report = Harness::new(counter_config(dir.path(), 1, 42))
        .with_setup(|model, ctx| {
            assert_eq!(ctx.time(), 0);
            edges_at_setup = Some(model.peek("count")?);
            model.poke("offset", 40)
        })
        .drive(&mut model)
        .expect("harness should run");

    assert_eq!(edges_at_setup, Some(0));
    assert_eq!(report.observed, 42);
    assert!(report.passed());
}

#[test]
fn setup_errors_abort_the_run() {
    let dir = scratch_dir();
    let mut model = EdgeCounter::new();
    let err = Harness::new(counter_config(dir.path(), 1, 2))
        .with_setup(|model, _| model.poke("missing", 1))
        .drive(&mut model)
        .expect_err("setup failure is fatal");
    assert!(matches!(err, HarnessError::UnknownPort(ref port) if port == "missing"));
    assert_eq!(model.evals, 0);
}

#[test]
fn unknown_ports_are_rejected_before_clocking() {
    let dir = scratch_dir();

    let mut model = EdgeCounter::new();
    let err = Harness::new(counter_config(dir.path(), 1, 2).with_clock_port("sys_clk"))
        .drive(&mut model)
        .expect_err("clock port is missing");
    assert!(matches!(err, HarnessError::UnknownPort(ref port) if port == "sys_clk"));

    let mut model = EdgeCounter::new();
    let err = Harness::new(counter_config(dir.path(), 1, 2).with_check("nope", 0))
        .drive(&mut model)
        .expect_err("checked port is missing");
    assert!(matches!(err, HarnessError::UnknownPort(ref port) if port == "nope"));

    let mut model = EdgeCounter::new();
    let err = Harness::new(counter_config(dir.path(), 1, 2).with_input("count", 1))
        .drive(&mut model)
        .expect_err("outputs cannot be driven");
    assert!(matches!(err, HarnessError::NotAnInput(ref port) if port == "count"));

    let mut model = EdgeCounter::new();
    let err = Harness::new(counter_config(dir.path(), 1, 2).with_input("offset", 1 << 16))
        .drive(&mut model)
        .expect_err("value wider than the port");
    assert!(matches!(err, HarnessError::PortWidth { width: 16, .. }));
    assert_eq!(model.evals, 0);
}

#[test]
fn missing_check_is_a_config_error() {
    let dir = scratch_dir();
    let mut config = counter_config(dir.path(), 1, 2);
    config.check = None;
    let mut model = EdgeCounter::new();
    let err = Harness::new(config)
        .drive(&mut model)
        .expect_err("no check configured");
    assert!(matches!(err, HarnessError::InvalidConfig(_)));
}

#[test]
fn invalid_config_is_rejected_before_the_model_is_built() {
    let dir = scratch_dir();
    let mut config = counter_config(dir.path(), 1, 2);
    config.check = None;
    let mut built = false;
    let err = Harness::new(config)
        .run(|_| {
            built = true;
            Ok(EdgeCounter::new())
        })
        .expect_err("no check configured");
    assert!(matches!(err, HarnessError::InvalidConfig(_)));
    assert!(!built);
    assert!(!dir.path().join("logs").exists());
}
