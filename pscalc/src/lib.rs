//! Evaluator of PDF Type 4 functions, the PostScript calculator subset.
//!
//! Numbers are exact decimals, trigonometric operators work in degrees.
//!
//! ```
//! use pscalc::{eval, Decimal};
//!
//! let r = eval("{ 1 2 add 3 mul }", &[]).unwrap();
//! assert_eq!(r, vec![Decimal::from(9)]);
//! ```
pub(crate) mod machine;
pub(crate) mod parser;

mod pdf_fn;
pub use machine::{Error, Machine, MachineError, MachineResult, Options, Value, MAX_PRECISION};
pub use pdf_fn::PdfFunc;
pub use rust_decimal::Decimal;

/// Evaluate `program` with `args` pushed to stack, bottom first.
/// Returns the final stack from bottom to top.
pub fn eval(program: &str, args: &[Decimal]) -> Result<Vec<Decimal>, Error> {
    eval_with(program, args, &Options::default())
}

/// Same as [`eval`] with explicit options.
pub fn eval_with(
    program: &str,
    args: &[Decimal],
    options: &Options,
) -> Result<Vec<Decimal>, Error> {
    eval_bytes(program.as_bytes(), args, options)
}

pub(crate) fn eval_bytes(
    script: &[u8],
    args: &[Decimal],
    options: &Options,
) -> Result<Vec<Decimal>, Error> {
    let mut m = Machine::new(*options);
    for arg in args {
        m.push(*arg)?;
    }
    m.execute(script)?;
    Ok(m.finish()?)
}
