use std::process::ExitCode;

use clocked_harness::{
    logging, Harness, HarnessConfig, HarnessResult, RunReport, SimContext, SETUP_FAILURE_EXIT,
};

const A: u64 = 0xdead_beef;
const B: u64 = 0x8bad_f00d;

fn main() -> ExitCode {
    let mut context = SimContext::new();
    if let Err(err) = context.command_args(std::env::args().skip(1)) {
        eprintln!("adder_tb: {err}");
        return ExitCode::from(SETUP_FAILURE_EXIT);
    }
    logging::init_logging(context.debug());

    match run(context) {
        Ok(report) => {
            if let Ok(json) = serde_json::to_string(&report) {
                println!("{json}");
            }
            ExitCode::from(report.exit_code())
        }
        Err(err) => {
            tracing::error!(error = %err, "harness setup failed");
            ExitCode::from(SETUP_FAILURE_EXIT)
        }
    }
}

/// Registered adder fed two constants; after two cycles `c` holds their 32-bit sum.
fn adder_config() -> HarnessConfig {
    HarnessConfig::new("adder")
        .with_cycles(2)
        .with_trace(false)
        .with_input("a", A)
        .with_input("b", B)
        .with_check("c", A.wrapping_add(B) & 0xffff_ffff)
}

fn run(context: SimContext) -> HarnessResult<RunReport> {
    // `+config=<manifest.json>` swaps the built-in adder test for a manifest.
    let config = match context.value_plusargs("config") {
        Some(path) => HarnessConfig::from_json_file(path)?,
        None => adder_config(),
    };
    Harness::new(config).with_context(context).run_named()
}
