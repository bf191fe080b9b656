//! VCD waveform recording for harness runs.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use vcd_ng::{IdCode, SimulationCommand, TimescaleUnit, Value, VecValue, Writer};

use crate::context::SimContext;
use crate::error::{HarnessError, HarnessResult};
use crate::model::SimModel;

struct TracedWire {
    port: String,
    width: u32,
    id: IdCode,
    last: Option<u64>,
}

/// Outcome of a closed trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSummary {
    pub path: PathBuf,
    pub samples: u64,
}

/// Records model port values into a VCD file.
///
/// The header is written when the recorder is opened; each [`VcdRecorder::dump`]
/// emits a timestamp followed by the ports whose value changed since the
/// previous sample. [`VcdRecorder::close`] consumes the recorder so a trace can
/// only be finalised once.
pub struct VcdRecorder {
    path: PathBuf,
    out: BufWriter<File>,
    wires: Vec<TracedWire>,
    samples: u64,
    last_time: Option<u64>,
}

impl VcdRecorder {
    /// Create `path` and write the VCD header for every port of `model`.
    ///
    /// Fails unless tracing was switched on in `ctx` with
    /// [`SimContext::trace_ever_on`].
    ///
    /// `depth` limits how many scope levels are traced; the models driven by
    /// this crate are flat, so any depth of at least one records all ports and
    /// zero records none.
    pub fn open<M: SimModel + ?Sized>(
        ctx: &SimContext,
        path: impl AsRef<Path>,
        model: &M,
        depth: u32,
    ) -> HarnessResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !ctx.is_trace_ever_on() {
            return Err(HarnessError::trace(format!(
                "cannot trace to {}: tracing was never enabled",
                path.display()
            )));
        }
        let file = File::create(&path).map_err(|source| HarnessError::TraceOpen {
            path: path.clone(),
            source,
        })?;
        let mut out = BufWriter::new(file);

        let mut wires = Vec::new();
        {
            let mut writer = Writer::new(&mut out);
            writer.timescale(1, TimescaleUnit::PS)?;
            writer.add_module(model.name())?;
            if depth > 0 {
                for port in model.ports() {
                    let id = writer.add_wire(port.width, &port.name)?;
                    wires.push(TracedWire {
                        port: port.name.clone(),
                        width: port.width,
                        id,
                        last: None,
                    });
                }
            }
            writer.upscope()?;
            writer.enddefinitions()?;
        }

        tracing::debug!(path = %path.display(), wires = wires.len(), "trace opened");
        Ok(Self {
            path,
            out,
            wires,
            samples: 0,
            last_time: None,
        })
    }

    /// Sample every traced port at simulated time `time`.
    pub fn dump<M: SimModel + ?Sized>(&mut self, time: u64, model: &M) -> HarnessResult<()> {
        if let Some(last) = self.last_time {
            if time < last {
                return Err(HarnessError::trace(format!(
                    "sample time {time} precedes previous sample at {last}"
                )));
            }
        }

        let first = self.last_time.is_none();
        // The writer only borrows the buffered file for the duration of a sample.
        let mut writer = Writer::new(&mut self.out);
        writer.timestamp(time)?;
        if first {
            writer.begin(SimulationCommand::Dumpvars)?;
        }
        for wire in &mut self.wires {
            let value = model.peek(&wire.port)?;
            if wire.last == Some(value) {
                continue;
            }
            wire.last = Some(value);
            if wire.width == 1 {
                writer.change_scalar(wire.id, bit_value(value, 0))?;
            } else {
                writer.change_vector(wire.id, &vector_value(value, wire.width))?;
            }
        }
        if first {
            writer.end()?;
        }

        self.last_time = Some(time);
        self.samples += 1;
        Ok(())
    }

    /// Number of samples recorded so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the trace to disk and release the file.
    pub fn close(self) -> HarnessResult<TraceSummary> {
        let file = self
            .out
            .into_inner()
            .map_err(|err| HarnessError::Io(err.into_error()))?;
        file.sync_all()?;
        tracing::debug!(path = %self.path.display(), samples = self.samples, "trace closed");
        Ok(TraceSummary {
            path: self.path,
            samples: self.samples,
        })
    }
}

fn bit_value(value: u64, bit: u32) -> Value {
    if bit < 64 && (value >> bit) & 1 == 1 {
        Value::V1
    } else {
        Value::V0
    }
}

/// Bits of `value` most significant first, as VCD vectors are written.
fn vector_value(value: u64, width: u32) -> VecValue {
    let mut bits = VecValue::new();
    for bit in (0..width).rev() {
        bits.push(bit_value(value, bit));
    }
    bits
}

impl std::fmt::Debug for VcdRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcdRecorder")
            .field("path", &self.path)
            .field("wires", &self.wires.len())
            .field("samples", &self.samples)
            .finish()
    }
}
