use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Feature flag toggling trace recording (`0` or `1`).
pub const DEFINE_TRACE_VCD: &str = "VM_TRACE_VCD";
/// Feature flag overriding the trace output path.
pub const DEFINE_TRACE_FILE: &str = "VM_TRACE_FILE";

const DEFAULT_TRACE_FILE: &str = "trace.vcd";

/// Waveform recording options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Whether a trace recorder is attached, sampled and closed.
    pub enabled: bool,
    /// Output file; `None` places `trace.vcd` under the log directory.
    pub path: Option<PathBuf>,
    /// Number of hierarchy levels to record.
    pub depth: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            depth: 99,
        }
    }
}

/// Output port compared against an expected value once the run is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputCheck {
    pub port: String,
    pub expected: u64,
}

impl OutputCheck {
    pub fn new(port: impl Into<String>, expected: u64) -> Self {
        Self {
            port: port.into(),
            expected,
        }
    }
}

/// Everything a harness run needs besides the model itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Model to instantiate when the harness builds it by name.
    pub model: String,
    /// Number of driven clock ticks before the drain tick.
    pub cycles: u64,
    /// Clock input toggled by every tick.
    pub clock_port: String,
    /// Simulated time advanced before each clock phase.
    pub time_quantum: u64,
    /// Directory created before the model is constructed.
    pub log_dir: PathBuf,
    pub trace: TraceConfig,
    /// Input values assigned once before the first tick.
    pub inputs: BTreeMap<String, u64>,
    pub check: Option<OutputCheck>,
    /// Named feature flags; see [`HarnessConfig::resolve_defines`].
    pub defines: BTreeMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            model: "top".to_string(),
            cycles: 0,
            clock_port: "sys_clk".to_string(),
            time_quantum: 5,
            log_dir: PathBuf::from("logs"),
            trace: TraceConfig::default(),
            inputs: BTreeMap::new(),
            check: None,
            defines: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    /// Create a config for the named model with default timing and tracing.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON harness manifest.
    pub fn from_json_str(text: &str) -> HarnessResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.resolve_defines()
    }

    /// Read and parse a JSON harness manifest from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the number of driven clock ticks.
    pub fn with_cycles(mut self, cycles: u64) -> Self {
        self.cycles = cycles;
        self
    }

    /// Override the clock input name.
    pub fn with_clock_port(mut self, port: impl Into<String>) -> Self {
        self.clock_port = port.into();
        self
    }

    /// Override the time advanced per clock phase.
    pub fn with_time_quantum(mut self, quantum: u64) -> Self {
        self.time_quantum = quantum;
        self
    }

    /// Override the log directory.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Enable or disable trace recording.
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace.enabled = enabled;
        self
    }

    /// Write the trace to a specific file.
    pub fn with_trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace.path = Some(path.into());
        self
    }

    /// Limit the traced hierarchy depth.
    pub fn with_trace_depth(mut self, depth: u32) -> Self {
        self.trace.depth = depth;
        self
    }

    /// Assign an input port before the first tick.
    pub fn with_input(mut self, port: impl Into<String>, value: u64) -> Self {
        self.inputs.insert(port.into(), value);
        self
    }

    /// Compare `port` against `expected` after teardown.
    pub fn with_check(mut self, port: impl Into<String>, expected: u64) -> Self {
        self.check = Some(OutputCheck::new(port, expected));
        self
    }

    /// Set a feature flag.
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(name.into(), value.into());
        self
    }

    /// Look up a feature flag.
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// Fold the trace feature flags into the typed trace settings.
    ///
    /// `VM_TRACE_VCD` must be `0` or `1`; `VM_TRACE_FILE` replaces the trace
    /// path. Other flags are left for setup hooks to read.
    pub fn resolve_defines(mut self) -> HarnessResult<Self> {
        if let Some(flag) = self.defines.get(DEFINE_TRACE_VCD) {
            self.trace.enabled = match flag.as_str() {
                "0" => false,
                "1" => true,
                other => {
                    return Err(HarnessError::invalid_config(format!(
                        "{DEFINE_TRACE_VCD} must be 0 or 1, got `{other}`"
                    )))
                }
            };
        }
        if let Some(path) = self.defines.get(DEFINE_TRACE_FILE) {
            self.trace.path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// File the trace is written to when tracing is enabled.
    pub fn trace_path(&self) -> PathBuf {
        self.trace
            .path
            .clone()
            .unwrap_or_else(|| self.log_dir.join(DEFAULT_TRACE_FILE))
    }

    /// Check the settings a run cannot proceed without.
    pub fn validate(&self) -> HarnessResult<&OutputCheck> {
        if self.clock_port.is_empty() {
            return Err(HarnessError::invalid_config("clock port name is empty"));
        }
        if self.time_quantum == 0 {
            return Err(HarnessError::invalid_config("time quantum must be non-zero"));
        }
        if self.inputs.contains_key(&self.clock_port) {
            return Err(HarnessError::invalid_config(format!(
                "clock port `{}` cannot be assigned as an input",
                self.clock_port
            )));
        }
        self.check
            .as_ref()
            .ok_or_else(|| HarnessError::invalid_config("no output check configured"))
    }
}
