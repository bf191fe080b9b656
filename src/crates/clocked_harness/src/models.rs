//! Built-in simulation models.

use crate::context::SimContext;
use crate::error::{HarnessError, HarnessResult};
use crate::model::{PortDecl, SimModel};

/// Model names accepted by [`build_model`].
pub const MODEL_NAMES: &[&str] = &["adder"];

/// Instantiate a built-in model by name.
pub fn build_model(
    model: &str,
    instance: &str,
    ctx: &mut SimContext,
) -> HarnessResult<Box<dyn SimModel>> {
    match model {
        "adder" => Ok(Box::new(Adder::new(instance, ctx))),
        other => Err(HarnessError::model_construction(format!(
            "unknown model `{other}` (available: {})",
            MODEL_NAMES.join(", ")
        ))),
    }
}

/// 32-bit registered adder: `c <= a + b` on every rising edge of `sys_clk`.
///
/// The sum wraps at 32 bits. `c` powers up according to the context's reset
/// policy.
#[derive(Debug)]
pub struct Adder {
    name: String,
    ports: Vec<PortDecl>,
    sys_clk: u64,
    a: u64,
    b: u64,
    c: u64,
    prev_clk: u64,
    finalized: bool,
}

const WORD_MASK: u64 = 0xffff_ffff;

impl Adder {
    pub fn new(name: impl Into<String>, ctx: &mut SimContext) -> Self {
        Self {
            name: name.into(),
            ports: vec![
                PortDecl::input("sys_clk", 1),
                PortDecl::input("a", 32),
                PortDecl::input("b", 32),
                PortDecl::output("c", 32),
            ],
            sys_clk: 0,
            a: 0,
            b: 0,
            c: ctx.reset_value(32),
            prev_clk: 0,
            finalized: false,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl SimModel for Adder {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    fn poke(&mut self, port: &str, value: u64) -> HarnessResult<()> {
        match port {
            "sys_clk" => self.sys_clk = value & 1,
            "a" => self.a = value & WORD_MASK,
            "b" => self.b = value & WORD_MASK,
            "c" => return Err(HarnessError::NotAnInput(port.to_string())),
            other => return Err(HarnessError::UnknownPort(other.to_string())),
        }
        Ok(())
    }

    fn peek(&self, port: &str) -> HarnessResult<u64> {
        match port {
            "sys_clk" => Ok(self.sys_clk),
            "a" => Ok(self.a),
            "b" => Ok(self.b),
            "c" => Ok(self.c),
            other => Err(HarnessError::UnknownPort(other.to_string())),
        }
    }

    fn eval(&mut self) {
        if self.prev_clk == 0 && self.sys_clk == 1 {
            self.c = self.a.wrapping_add(self.b) & WORD_MASK;
        }
        self.prev_clk = self.sys_clk;
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }
}
