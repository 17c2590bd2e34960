//! Implement Pdf Type4 PostScript function
use crate::{eval_bytes, Error, Options};
use anyhow::{bail, Context, Result};
use log::warn;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct PdfFunc {
    script: Box<[u8]>,
    n_out: usize,
    options: Options,
}

impl PdfFunc {
    /// Create a new PdfFunc.
    /// `script`: PostScript script.
    /// `n_out`: number of return value.
    pub fn new(script: impl Into<Box<[u8]>>, n_out: usize) -> Self {
        Self {
            script: script.into(),
            n_out,
            options: Options::default(),
        }
    }

    pub fn with_options(self, options: Options) -> Self {
        Self { options, ..self }
    }

    pub fn n_out(&self) -> usize {
        self.n_out
    }

    /// Evaluate on decimal arguments, returns the whole result stack.
    pub fn eval(&self, args: &[Decimal]) -> Result<Vec<Decimal>, Error> {
        eval_bytes(&self.script, args, &self.options)
    }

    /// Execute the function.
    ///
    /// `args` pushed to stack before execution.
    /// return numbers of stack after execution, there must be exactly `n_out`
    /// of them.
    pub fn exec(&self, args: &[f32]) -> Result<Box<[f32]>> {
        let args = args
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Decimal::from_f32(*v).with_context(|| format!("argument {i} is not finite: {v}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let r = self.eval(&args)?;
        if r.len() != self.n_out {
            warn!(
                "type 4 function returns {} values, expected {}",
                r.len(),
                self.n_out
            );
            bail!("expected {} return values, got {}", self.n_out, r.len());
        }
        r.iter()
            .map(|d| d.to_f32().with_context(|| format!("{d} out of f32 range")))
            .collect()
    }
}

#[cfg(test)]
mod tests;
