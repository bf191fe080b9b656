#![allow(dead_code)]

use std::path::{Path, PathBuf};

use clocked_harness::{HarnessConfig, HarnessError, HarnessResult, PortDecl, SimModel};
use tempfile::TempDir;

pub const A: u64 = 0xdead_beef;
pub const B: u64 = 0x8bad_f00d;
pub const SUM: u64 = A.wrapping_add(B) & 0xffff_ffff;

/// Instrumented model: `count` holds the number of rising clock edges seen.
#[derive(Debug)]
pub struct EdgeCounter {
    ports: Vec<PortDecl>,
    clk: u64,
    prev_clk: u64,
    pub offset: u64,
    pub rising_edges: u64,
    pub evals: u64,
    pub clock_writes: u64,
    pub finalize_calls: u64,
    pub evals_after_finalize: u64,
}

impl EdgeCounter {
    pub fn new() -> Self {
        Self {
            ports: vec![
                PortDecl::input("clk", 1),
                PortDecl::input("offset", 16),
                PortDecl::output("count", 32),
            ],
            clk: 0,
            prev_clk: 0,
            offset: 0,
            rising_edges: 0,
            evals: 0,
            clock_writes: 0,
            finalize_calls: 0,
            evals_after_finalize: 0,
        }
    }
}

impl SimModel for EdgeCounter {
    fn name(&self) -> &str {
        "edge_counter"
    }

    fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    fn poke(&mut self, port: &str, value: u64) -> HarnessResult<()> {
        match port {
            "clk" => {
                self.clk = value;
                self.clock_writes += 1;
            }
            "offset" => self.offset = value,
            other => return Err(HarnessError::UnknownPort(other.to_string())),
        }
        Ok(())
    }

    fn peek(&self, port: &str) -> HarnessResult<u64> {
        match port {
            "clk" => Ok(self.clk),
            "offset" => Ok(self.offset),
            "count" => Ok(self.offset + self.rising_edges),
            other => Err(HarnessError::UnknownPort(other.to_string())),
        }
    }

    fn eval(&mut self) {
        self.evals += 1;
        if self.finalize_calls > 0 {
            self.evals_after_finalize += 1;
        }
        if self.prev_clk == 0 && self.clk == 1 {
            self.rising_edges += 1;
        }
        self.prev_clk = self.clk;
    }

    fn finalize(&mut self) {
        self.finalize_calls += 1;
    }
}

/// Config for [`EdgeCounter`] writing into `dir`, tracing off.
pub fn counter_config(dir: &Path, cycles: u64, expected: u64) -> HarnessConfig {
    HarnessConfig::new("edge_counter")
        .with_clock_port("clk")
        .with_cycles(cycles)
        .with_log_dir(dir.join("logs"))
        .with_trace(false)
        .with_check("count", expected)
}

/// Adder config for the boundary case, writing into `dir`, tracing off.
pub fn adder_config(dir: &Path, expected: u64) -> HarnessConfig {
    HarnessConfig::new("adder")
        .with_cycles(2)
        .with_log_dir(dir.join("logs"))
        .with_trace(false)
        .with_input("a", A)
        .with_input("b", B)
        .with_check("c", expected)
}

pub fn scratch_dir() -> TempDir {
    TempDir::new().expect("temp dir")
}

pub fn adder_tb_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_adder_tb") {
        return PathBuf::from(path);
    }

    // Fallback to the workspace target directory.
    let mut path = std::env::current_exe().expect("current exe");
    path.pop(); // deps
    path.pop(); // debug or release
    path.push("adder_tb");
    if cfg!(windows) {
        path.set_extension("exe");
    }
    path
}
