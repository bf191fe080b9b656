//! Clock-driven test harness for cycle-evaluated RTL simulation models.
//!
//! A run assigns input ports, toggles the clock for a fixed number of cycles
//! (plus one drain tick), optionally records a VCD trace, and compares one
//! output port with an expected value. The verdict maps to a process exit
//! code: 0 on match, 1 on mismatch.
//!
//! Typical usage:
//! ```no_run
//! use clocked_harness::{Harness, HarnessConfig};
//!
//! let config = HarnessConfig::new("adder")
//!     .with_cycles(2)
//!     .with_input("a", 0xdead_beef)
//!     .with_input("b", 0x8bad_f00d)
//!     .with_check("c", 0x6a5b_aefc);
//!
//! let report = Harness::new(config)
//!     .with_args(std::env::args())
//!     .expect("simulator arguments should parse")
//!     .run_named()
//!     .expect("harness should run");
//! std::process::exit(i32::from(report.exit_code()));
//! ```

mod config;
mod context;
mod error;
mod harness;
pub mod logging;
mod model;
pub mod models;
mod trace;

pub use config::{HarnessConfig, OutputCheck, TraceConfig, DEFINE_TRACE_FILE, DEFINE_TRACE_VCD};
pub use context::{ResetPolicy, SimContext};
pub use error::{HarnessError, HarnessResult};
pub use harness::{Harness, RunReport, Verdict, SETUP_FAILURE_EXIT};
pub use model::{drive_input, PortDecl, PortDirection, SimModel};
pub use trace::{TraceSummary, VcdRecorder};
