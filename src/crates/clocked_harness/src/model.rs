use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};

/// Direction of a model port as seen from the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Static description of a single model port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDecl {
    pub name: String,
    pub width: u32,
    pub direction: PortDirection,
}

impl PortDecl {
    pub fn input(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Input,
        }
    }

    pub fn output(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            direction: PortDirection::Output,
        }
    }

    /// Mask selecting the bits this port can hold.
    pub fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

/// A compiled, cycle-evaluated hardware model.
///
/// Implementations expose named ports: inputs are assigned with [`SimModel::poke`],
/// and every port (inputs included) can be read back with [`SimModel::peek`].
/// Assigning an input has no visible effect until the next [`SimModel::eval`].
pub trait SimModel {
    /// Instance name, used as the top scope of waveform traces.
    fn name(&self) -> &str;

    /// All ports of the model, clock included.
    fn ports(&self) -> &[PortDecl];

    /// Assign an input port.
    fn poke(&mut self, port: &str, value: u64) -> HarnessResult<()>;

    /// Read the current value of any port.
    fn peek(&self, port: &str) -> HarnessResult<u64>;

    /// Recompute outputs from the current inputs.
    fn eval(&mut self);

    /// Run end-of-simulation hooks. Called exactly once, after the last `eval`.
    fn finalize(&mut self);

    /// Look up a port declaration by name.
    fn port(&self, name: &str) -> Option<&PortDecl> {
        self.ports().iter().find(|port| port.name == name)
    }
}

impl<M: SimModel + ?Sized> SimModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ports(&self) -> &[PortDecl] {
        (**self).ports()
    }

    fn poke(&mut self, port: &str, value: u64) -> HarnessResult<()> {
        (**self).poke(port, value)
    }

    fn peek(&self, port: &str) -> HarnessResult<u64> {
        (**self).peek(port)
    }

    fn eval(&mut self) {
        (**self).eval()
    }

    fn finalize(&mut self) {
        (**self).finalize()
    }
}

/// Assign an input port after checking its direction and width.
pub fn drive_input<M: SimModel + ?Sized>(model: &mut M, port: &str, value: u64) -> HarnessResult<()> {
    let decl = model
        .port(port)
        .ok_or_else(|| HarnessError::UnknownPort(port.to_string()))?;
    if decl.direction != PortDirection::Input {
        return Err(HarnessError::NotAnInput(port.to_string()));
    }
    if value & !decl.mask() != 0 {
        return Err(HarnessError::PortWidth {
            port: port.to_string(),
            width: decl.width,
            value,
        });
    }
    model.poke(port, value)
}
