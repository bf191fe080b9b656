use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{HarnessConfig, OutputCheck};
use crate::context::SimContext;
use crate::error::{HarnessError, HarnessResult};
use crate::model::{drive_input, PortDirection, SimModel};
use crate::models::build_model;
use crate::trace::VcdRecorder;

/// Exit code reported when the run could not reach a verdict.
pub const SETUP_FAILURE_EXIT: u8 = 2;

/// Instance name given to models built by name.
const TOP_INSTANCE: &str = "top";

/// Outcome of the output comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub model: String,
    /// Driven ticks requested by the config.
    pub cycles: u64,
    /// Ticks actually performed, drain tick included.
    pub ticks: u64,
    pub trace_samples: u64,
    pub trace_path: Option<PathBuf>,
    /// Simulated time when the model was finalized.
    pub final_time: u64,
    pub port: String,
    pub observed: u64,
    pub expected: u64,
    pub verdict: Verdict,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Process exit code: 0 on match, 1 on mismatch.
    pub fn exit_code(&self) -> u8 {
        match self.verdict {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

type SetupHook<'a> = Box<dyn FnOnce(&mut dyn SimModel, &SimContext) -> HarnessResult<()> + 'a>;

/// Clock-driven runner for a single model.
///
/// A run assigns the configured inputs, performs `cycles` clock ticks plus one
/// drain tick, finalizes the model, closes the trace and compares the checked
/// output port with its expected value.
pub struct Harness<'a> {
    config: HarnessConfig,
    context: SimContext,
    setup: Option<SetupHook<'a>>,
}

impl<'a> Harness<'a> {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            context: SimContext::new(),
            setup: None,
        }
    }

    /// Use a pre-configured simulation context.
    pub fn with_context(mut self, context: SimContext) -> Self {
        self.context = context;
        self
    }

    /// Forward command-line arguments to the simulation context.
    pub fn with_args<I, S>(mut self, args: I) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.context.command_args(args)?;
        Ok(self)
    }

    /// Run `hook` after the inputs are assigned and before the first tick.
    pub fn with_setup(
        mut self,
        hook: impl FnOnce(&mut dyn SimModel, &SimContext) -> HarnessResult<()> + 'a,
    ) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// Whether this run will record a trace, from the config or a `+trace` plusarg.
    pub fn tracing_enabled(&self) -> bool {
        self.config.trace.enabled || self.context.test_plusargs("trace")
    }

    /// Build the configured model by name and run it.
    pub fn run_named(self) -> HarnessResult<RunReport> {
        let model_name = self.config.model.clone();
        self.run(|ctx| build_model(&model_name, TOP_INSTANCE, ctx))
    }

    /// Validate the config, create the output directories, construct the model
    /// with `build`, then run it.
    pub fn run<M, F>(mut self, build: F) -> HarnessResult<RunReport>
    where
        M: SimModel,
        F: FnOnce(&mut SimContext) -> HarnessResult<M>,
    {
        let check = self.config.validate()?.clone();
        self.prepare_dirs()?;
        let mut model = build(&mut self.context)?;
        self.execute(&mut model, check)
    }

    /// Run an already constructed model.
    pub fn drive<M: SimModel>(self, model: &mut M) -> HarnessResult<RunReport> {
        let check = self.config.validate()?.clone();
        self.prepare_dirs()?;
        self.execute(model, check)
    }

    fn execute<M: SimModel>(
        mut self,
        model: &mut M,
        check: OutputCheck,
    ) -> HarnessResult<RunReport> {
        self.check_ports(&*model, &check.port)?;

        let tracing_on = self.tracing_enabled();
        tracing::info!(
            model = model.name(),
            cycles = self.config.cycles,
            trace = tracing_on,
            "starting harness run"
        );

        for (port, value) in &self.config.inputs {
            drive_input(model, port, *value)?;
        }
        if let Some(hook) = self.setup.take() {
            hook(model, &self.context)?;
        }

        // Nothing has been evaluated yet, so the trace still sees the first eval.
        self.context.trace_ever_on(tracing_on);
        let mut recorder = if tracing_on {
            let path = self.config.trace_path();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                SimContext::mkdir(parent)?;
            }
            Some(VcdRecorder::open(
                &self.context,
                &path,
                &*model,
                self.config.trace.depth,
            )?)
        } else {
            None
        };

        let ticks = match self.run_ticks(model, &mut recorder) {
            Ok(ticks) => ticks,
            Err(err) => {
                if let Some(recorder) = recorder.take() {
                    if let Err(close_err) = recorder.close() {
                        tracing::warn!(error = %close_err, "trace close failed after run error");
                    }
                }
                return Err(err);
            }
        };

        model.finalize();
        let summary = recorder.map(VcdRecorder::close).transpose()?;
        let final_time = self.context.time();

        let observed = model.peek(&check.port)?;
        let verdict = if observed == check.expected {
            Verdict::Pass
        } else {
            Verdict::Fail
        };

        match verdict {
            Verdict::Pass => tracing::info!(
                port = %check.port,
                observed = %format!("{observed:#x}"),
                ticks,
                "output matched"
            ),
            Verdict::Fail => tracing::warn!(
                port = %check.port,
                observed = %format!("{observed:#x}"),
                expected = %format!("{:#x}", check.expected),
                ticks,
                "output mismatch"
            ),
        }

        Ok(RunReport {
            model: model.name().to_string(),
            cycles: self.config.cycles,
            ticks,
            trace_samples: summary.as_ref().map_or(0, |s| s.samples),
            trace_path: summary.map(|s| s.path),
            final_time,
            port: check.port,
            observed,
            expected: check.expected,
            verdict,
        })
    }

    /// The configured clock ticks followed by the drain tick.
    fn run_ticks<M: SimModel>(
        &mut self,
        model: &mut M,
        recorder: &mut Option<VcdRecorder>,
    ) -> HarnessResult<u64> {
        let mut ticks = 0u64;
        for cycle in 0..self.config.cycles {
            tracing::trace!(cycle, time = self.context.time(), "clock tick");
            self.clock_tick(model, recorder)?;
            ticks += 1;
        }

        tracing::trace!(time = self.context.time(), "drain tick");
        self.clock_tick(model, recorder)?;
        Ok(ticks + 1)
    }

    fn prepare_dirs(&self) -> HarnessResult<()> {
        SimContext::mkdir(&self.config.log_dir)
    }

    fn check_ports<M: SimModel>(&self, model: &M, output: &str) -> HarnessResult<()> {
        let clock = model
            .port(&self.config.clock_port)
            .ok_or_else(|| HarnessError::UnknownPort(self.config.clock_port.clone()))?;
        if clock.direction != PortDirection::Input {
            return Err(HarnessError::NotAnInput(clock.name.clone()));
        }
        if model.port(output).is_none() {
            return Err(HarnessError::UnknownPort(output.to_string()));
        }
        Ok(())
    }

    /// One low-then-high clock cycle with an evaluation after each phase.
    ///
    /// The recorder samples at the start of the tick and after the low-phase
    /// evaluation, so every tick contributes exactly two samples.
    fn clock_tick<M: SimModel>(
        &mut self,
        model: &mut M,
        recorder: &mut Option<VcdRecorder>,
    ) -> HarnessResult<()> {
        let quantum = self.config.time_quantum;
        let clock = self.config.clock_port.as_str();

        if let Some(recorder) = recorder.as_mut() {
            recorder.dump(self.context.time(), &*model)?;
        }
        self.context.time_inc(quantum);
        model.poke(clock, 0)?;
        model.eval();

        if let Some(recorder) = recorder.as_mut() {
            recorder.dump(self.context.time(), &*model)?;
        }
        self.context.time_inc(quantum);
        model.poke(clock, 1)?;
        model.eval();
        Ok(())
    }
}

impl std::fmt::Debug for Harness<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("context", &self.context)
            .field("setup", &self.setup.is_some())
            .finish()
    }
}
