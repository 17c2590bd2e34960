use crate::parser::{next_token, parse_number, Token};
use log::{debug, trace};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::{fmt::Display, str::from_utf8};

mod math;
mod ops;
use ops::{is_operator_start, lookup_operator};

/// Value on the operand stack.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Value {
    Num(Decimal),
    Bool(bool),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Num(d) => write!(f, "{}", d),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Num(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Num(v.into())
    }
}

/// `arg` is the operand position counted from the top of stack, 1 is the top.
macro_rules! value_access {
    ($method:ident, $opt_method:ident, $branch:ident, $t: ty) => {
        impl Value {
            pub fn $opt_method(&self) -> Option<$t> {
                match self {
                    Self::$branch(v) => Some(*v),
                    _ => None,
                }
            }

            pub fn $method(&self, arg: usize) -> MachineResult<$t> {
                self.$opt_method()
                    .ok_or(MachineError::TypeMismatch { arg })
            }
        }
    };
}

value_access!(num, opt_num, Num, Decimal);
value_access!(bool, opt_bool, Bool, bool);

impl Value {
    /// Integer valued number that fits in `i64`.
    pub fn int(&self, arg: usize) -> MachineResult<i64> {
        let d = self.num(arg)?;
        if !d.fract().is_zero() {
            return Err(MachineError::TypeMismatch { arg });
        }
        d.to_i64().ok_or(MachineError::RangeCheck)
    }

    /// Non-negative integer, used as an element count. Counts beyond
    /// `usize` saturate, no stack is that deep.
    pub fn count(&self, arg: usize) -> MachineResult<usize> {
        let d = self.num(arg)?;
        if !d.fract().is_zero() || d < Decimal::ZERO {
            return Err(MachineError::TypeMismatch { arg });
        }
        Ok(d.to_usize().unwrap_or(usize::MAX))
    }

    /// 32-bit two's-complement integer for bitwise operators.
    pub fn int32(&self, arg: usize) -> MachineResult<i32> {
        let i = self.int(arg)?;
        i32::try_from(i).map_err(|_| MachineError::TypeMismatch { arg })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum MachineError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("type mismatch on argument {arg}")]
    TypeMismatch { arg: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("domain error")]
    DomainError,
    #[error("range check error")]
    RangeCheck,
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("malformed number `{0}`")]
    MalformedNumber(String),
    #[error("non-numeric value at stack position {position}")]
    NonNumericOutput { position: usize },
}

pub type MachineResult<T> = Result<T, MachineError>;

/// Error of one evaluation.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum Error {
    /// Raised while executing operator `op`.
    #[error("`{op}`: {kind}")]
    Operator {
        op: &'static str,
        kind: MachineError,
    },
    #[error(transparent)]
    Machine(#[from] MachineError),
}

impl Error {
    pub fn kind(&self) -> &MachineError {
        match self {
            Self::Operator { kind, .. } | Self::Machine(kind) => kind,
        }
    }

    /// Name of the failing operator, `None` if evaluation failed outside of
    /// an operator.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Self::Operator { op, .. } => Some(*op),
            Self::Machine(_) => None,
        }
    }
}

/// Widest significand `Decimal` holds.
pub const MAX_PRECISION: u32 = 28;

/// Evaluation options.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Options {
    /// Significant digits kept from division and transcendental operators,
    /// clamped to `1..=MAX_PRECISION`.
    pub precision: u32,
    /// Push beyond this depth fails with `StackOverflow`.
    pub max_stack_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            precision: MAX_PRECISION,
            max_stack_depth: 256,
        }
    }
}

impl Options {
    pub fn with_precision(self, precision: u32) -> Self {
        Self { precision, ..self }
    }

    pub fn with_max_stack_depth(self, max_stack_depth: usize) -> Self {
        Self {
            max_stack_depth,
            ..self
        }
    }
}

/// Stack machine that runs one Type 4 program.
#[derive(Debug)]
pub struct Machine {
    stack: Vec<Value>,
    options: Options,
}

impl Machine {
    pub fn new(options: Options) -> Self {
        Self {
            stack: Vec::new(),
            options,
        }
    }

    /// Stack from bottom to top.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn push(&mut self, v: impl Into<Value>) -> MachineResult<()> {
        if self.stack.len() >= self.options.max_stack_depth {
            return Err(MachineError::StackOverflow);
        }
        self.stack.push(v.into());
        Ok(())
    }

    /// Execute `script`, operators work on current stack.
    pub fn execute(&mut self, script: &[u8]) -> Result<(), Error> {
        let mut input = script;
        while let Some(token) = next_token(&mut input, is_operator_start) {
            match token {
                Token::Number(run) => match parse_number(run) {
                    Some(n) => self.push(n?)?,
                    None => debug!("skip number run without digits: {:?}", from_utf8(run)),
                },
                Token::Operator(run) => {
                    let (op, f) = lookup_operator(run).ok_or_else(|| {
                        MachineError::UnknownOperator(String::from_utf8_lossy(run).into_owned())
                    })?;
                    trace!("exec {op}, stack depth: {}", self.stack.len());
                    f(self).map_err(|kind| Error::Operator { op, kind })?;
                }
                Token::Stray(b) => debug!("skip stray byte {:#04x}", b),
            }
        }
        Ok(())
    }

    /// Check every value left on the stack is a number, returns them from
    /// bottom to top.
    pub fn finish(self) -> MachineResult<Vec<Decimal>> {
        debug!("finished, stack depth: {}", self.stack.len());
        self.stack
            .into_iter()
            .enumerate()
            .map(|(position, v)| {
                v.opt_num()
                    .ok_or(MachineError::NonNumericOutput { position })
            })
            .collect()
    }

    /// Pop `N` values, returned from bottom to top. Stack not touched if
    /// there are less than `N` values.
    fn pop_n<const N: usize>(&mut self) -> MachineResult<[Value; N]> {
        let len = self.stack.len();
        if len < N {
            return Err(MachineError::StackUnderflow);
        }
        let mut r = [Value::Bool(false); N];
        r.copy_from_slice(&self.stack[len - N..]);
        self.stack.truncate(len - N);
        Ok(r)
    }

    fn pop(&mut self) -> MachineResult<Value> {
        self.stack.pop().ok_or(MachineError::StackUnderflow)
    }

    fn pop_num(&mut self) -> MachineResult<Decimal> {
        self.pop()?.num(1)
    }

    /// Pop `N` numbers, returned from bottom to top.
    fn pop_nums<const N: usize>(&mut self) -> MachineResult<[Decimal; N]> {
        let values = self.pop_n::<N>()?;
        let mut r = [Decimal::ZERO; N];
        for (i, v) in values.iter().enumerate() {
            r[i] = v.num(N - i)?;
        }
        Ok(r)
    }

    fn top(&self) -> MachineResult<Value> {
        self.stack.last().copied().ok_or(MachineError::StackUnderflow)
    }

    /// Round results of division and transcendental operators to at most
    /// `precision` significant digits. Digits are only dropped, never padded,
    /// so the scale stays within what `Decimal` holds.
    fn round(&self, d: Decimal) -> Decimal {
        let precision = self.options.precision.clamp(1, MAX_PRECISION);
        let digits = significant_digits(d);
        if digits <= precision {
            return d;
        }
        let r = match d.scale().checked_sub(digits - precision) {
            Some(dp) => d.round_dp(dp),
            // integer digits beyond precision, rounding never adds scale
            None => d.round_sf(precision).unwrap_or(d),
        };
        debug_assert!(r.scale() <= MAX_PRECISION, "{r:?}");
        r
    }
}

/// Digits of the significand, 0 for zero.
fn significant_digits(d: Decimal) -> u32 {
    d.mantissa()
        .unsigned_abs()
        .checked_ilog10()
        .map_or(0, |l| l + 1)
}
