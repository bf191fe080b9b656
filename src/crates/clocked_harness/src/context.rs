use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

const RUNTIME_PREFIX: &str = "+verilator+";

/// Initial value policy for registers that have no explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    #[default]
    Zeros,
    Ones,
    Random,
}

/// Simulation-wide state: the time counter plus runtime options.
///
/// Time starts at zero and only moves forward through [`SimContext::time_inc`].
#[derive(Debug)]
pub struct SimContext {
    time: u64,
    trace_ever_on: bool,
    debug: bool,
    seed: u64,
    reset_policy: ResetPolicy,
    plusargs: BTreeMap<String, Option<String>>,
    rng: StdRng,
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SimContext {
    pub fn new() -> Self {
        Self {
            time: 0,
            trace_ever_on: false,
            debug: false,
            seed: 0,
            reset_policy: ResetPolicy::default(),
            plusargs: BTreeMap::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Current simulated time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Advance simulated time.
    pub fn time_inc(&mut self, delta: u64) {
        self.time = self.time.saturating_add(delta);
    }

    /// Allow trace recorders to be attached to models built from this context.
    pub fn trace_ever_on(&mut self, on: bool) {
        self.trace_ever_on = on;
    }

    pub fn is_trace_ever_on(&self) -> bool {
        self.trace_ever_on
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    /// Parse forwarded command-line arguments.
    ///
    /// Runtime options use the `+verilator+<option>` form; every other `+name`
    /// or `+name=value` argument is kept as a plusarg. Arguments without a
    /// leading `+` (program name included) are ignored.
    pub fn command_args<I, S>(&mut self, args: I) -> HarnessResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if let Some(option) = arg.strip_prefix(RUNTIME_PREFIX) {
                self.runtime_option(arg, option)?;
            } else if let Some(plusarg) = arg.strip_prefix('+') {
                if plusarg.is_empty() {
                    return Err(HarnessError::InvalidArgument(arg.to_string()));
                }
                let (name, value) = match plusarg.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (plusarg, None),
                };
                self.plusargs.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    fn runtime_option(&mut self, arg: &str, option: &str) -> HarnessResult<()> {
        let invalid = || HarnessError::InvalidArgument(arg.to_string());
        if option == "debug" {
            self.debug = true;
        } else if let Some(seed) = option.strip_prefix("seed+") {
            self.seed = seed.parse().map_err(|_| invalid())?;
            self.rng = StdRng::seed_from_u64(self.seed);
        } else if let Some(policy) = option.strip_prefix("rand+reset+") {
            self.reset_policy = match policy {
                "0" => ResetPolicy::Zeros,
                "1" => ResetPolicy::Ones,
                "2" => ResetPolicy::Random,
                _ => return Err(invalid()),
            };
        } else {
            return Err(invalid());
        }
        Ok(())
    }

    /// Whether `+name` (with or without a value) was passed.
    pub fn test_plusargs(&self, name: &str) -> bool {
        self.plusargs.contains_key(name)
    }

    /// Value of a `+name=value` plusarg.
    pub fn value_plusargs(&self, name: &str) -> Option<&str> {
        self.plusargs.get(name).and_then(|value| value.as_deref())
    }

    /// Power-on value for a register of `width` bits under the reset policy.
    pub fn reset_value(&mut self, width: u32) -> u64 {
        let mask = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        match self.reset_policy {
            ResetPolicy::Zeros => 0,
            ResetPolicy::Ones => mask,
            ResetPolicy::Random => self.rng.gen::<u64>() & mask,
        }
    }

    /// Create a directory (and its parents) if it does not exist yet.
    pub fn mkdir(path: impl AsRef<Path>) -> HarnessResult<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|source| HarnessError::LogDirectory {
            path: path.to_path_buf(),
            source,
        })
    }
}
