//! Built-in operators of Type 4 functions.
use super::{
    math::{atan_degrees, cos_degrees, sin_degrees},
    Machine, MachineError, MachineResult, Value,
};
use num_traits::ToPrimitive;
use phf::phf_map;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

pub(super) type OperatorFn = fn(&mut Machine) -> MachineResult<()>;

static OPERATORS: phf::Map<&'static str, OperatorFn> = phf_map! {
    "abs" => abs as OperatorFn,
    "add" => add as OperatorFn,
    "and" => and as OperatorFn,
    "atan" => atan as OperatorFn,
    "bitshift" => bitshift as OperatorFn,
    "ceiling" => ceiling as OperatorFn,
    "copy" => copy as OperatorFn,
    "cos" => cos as OperatorFn,
    "cvi" => cvi as OperatorFn,
    "cvr" => cvr as OperatorFn,
    "div" => div as OperatorFn,
    "dup" => dup as OperatorFn,
    "eq" => eq as OperatorFn,
    "exch" => exch as OperatorFn,
    "exp" => exp as OperatorFn,
    "false" => push_false as OperatorFn,
    "floor" => floor as OperatorFn,
    "ge" => ge as OperatorFn,
    "gt" => gt as OperatorFn,
    "idiv" => idiv as OperatorFn,
    "index" => index as OperatorFn,
    "le" => le as OperatorFn,
    "ln" => ln as OperatorFn,
    "log" => log as OperatorFn,
    "lt" => lt as OperatorFn,
    "mod" => modulo as OperatorFn,
    "mul" => mul as OperatorFn,
    "ne" => ne as OperatorFn,
    "neg" => neg as OperatorFn,
    "not" => not as OperatorFn,
    "or" => or as OperatorFn,
    "pop" => pop as OperatorFn,
    "roll" => roll as OperatorFn,
    "round" => round as OperatorFn,
    "sin" => sin as OperatorFn,
    "sqrt" => sqrt as OperatorFn,
    "sub" => sub as OperatorFn,
    "true" => push_true as OperatorFn,
    "truncate" => truncate as OperatorFn,
    "xor" => xor as OperatorFn,
};

/// Returns true if some operator name starts with `b`.
pub(super) fn is_operator_start(b: u8) -> bool {
    OPERATORS.keys().any(|k| k.as_bytes()[0] == b)
}

pub(super) fn lookup_operator(name: &[u8]) -> Option<(&'static str, OperatorFn)> {
    let name = std::str::from_utf8(name).ok()?;
    OPERATORS.get_entry(name).map(|(k, f)| (*k, *f))
}

fn overflow<T>(v: Option<T>) -> MachineResult<T> {
    v.ok_or(MachineError::RangeCheck)
}

// num1 abs num2
fn abs(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.abs())
}

// num1 neg num2
fn neg(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(-a)
}

// num1 num2 add sum
fn add(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(overflow(a.checked_add(b))?)
}

// num1 num2 sub difference
fn sub(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(overflow(a.checked_sub(b))?)
}

// num1 num2 mul product
fn mul(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(overflow(a.checked_mul(b))?)
}

// num1 num2 div quotient
fn div(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    if b.is_zero() {
        return Err(MachineError::DivisionByZero);
    }
    let r = overflow(a.checked_div(b))?;
    m.push(m.round(r))
}

// num1 num2 idiv quotient, truncated toward zero
fn idiv(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    if b.is_zero() {
        return Err(MachineError::DivisionByZero);
    }
    // a - (a rem b) is an exact multiple of b
    let rem = overflow(a.checked_rem(b))?;
    let q = overflow(overflow(a.checked_sub(rem))?.checked_div(b))?;
    m.push(q.trunc())
}

// num1 num2 mod remainder, sign follows num1
fn modulo(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    let (a, b) = (a.trunc(), b.trunc());
    if b.is_zero() {
        return Err(MachineError::DivisionByZero);
    }
    m.push(overflow(a.checked_rem(b))?)
}

// num1 ceiling num2
fn ceiling(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.ceil())
}

// num1 floor num2
fn floor(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.floor())
}

// num1 round num2, half way rounds away from zero
fn round(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

// num1 truncate num2
fn truncate(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.trunc())
}

// num sqrt real
fn sqrt(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    if a.is_sign_negative() && !a.is_zero() {
        return Err(MachineError::DomainError);
    }
    let r = overflow(a.sqrt())?;
    m.push(m.round(r))
}

// base exponent exp real
fn exp(m: &mut Machine) -> MachineResult<()> {
    let [base, exponent] = m.pop_nums()?;
    let integral = exponent.fract().is_zero();
    if base.is_zero() {
        // 0 to a negative power is undefined
        if exponent.is_sign_negative() && !exponent.is_zero() {
            return Err(MachineError::DomainError);
        }
        return m.push(if exponent.is_zero() {
            Decimal::ONE
        } else {
            Decimal::ZERO
        });
    }

    let r = if integral {
        let e = overflow(exponent.to_i64())?;
        base.checked_powi(e)
    } else if base.is_sign_negative() {
        return Err(MachineError::DomainError);
    } else {
        base.checked_powd(exponent)
    };
    let r = overflow(r)?;
    m.push(m.round(r))
}

/// Positive operand of logarithm operators.
fn log_operand(m: &mut Machine) -> MachineResult<Decimal> {
    let a = m.pop_num()?;
    if a.is_sign_negative() || a.is_zero() {
        return Err(MachineError::DomainError);
    }
    Ok(a)
}

// num ln real
fn ln(m: &mut Machine) -> MachineResult<()> {
    let a = log_operand(m)?;
    let r = overflow(a.checked_ln())?;
    m.push(m.round(r))
}

// num log real
fn log(m: &mut Machine) -> MachineResult<()> {
    let a = log_operand(m)?;
    let r = overflow(a.checked_log10())?;
    m.push(m.round(r))
}

// angle sin real, angle in degrees
fn sin(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    let r = overflow(sin_degrees(a))?;
    m.push(m.round(r))
}

// angle cos real, angle in degrees
fn cos(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    let r = overflow(cos_degrees(a))?;
    m.push(m.round(r))
}

// num den atan angle, angle in degrees within [0, 360)
fn atan(m: &mut Machine) -> MachineResult<()> {
    let [num, den] = m.pop_nums()?;
    let r = atan_degrees(num, den).ok_or(MachineError::DomainError)?;
    m.push(m.round(r))
}

// num cvi int
fn cvi(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a.trunc())
}

// num cvr real
fn cvr(m: &mut Machine) -> MachineResult<()> {
    let a = m.pop_num()?;
    m.push(a)
}

/// Compare two values of the same category.
fn same_category_eq(a: Value, b: Value) -> MachineResult<bool> {
    match (a, b) {
        (Value::Num(a), Value::Num(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        _ => Err(MachineError::TypeMismatch { arg: 1 }),
    }
}

// any1 any2 eq bool
fn eq(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_n()?;
    m.push(same_category_eq(a, b)?)
}

// any1 any2 ne bool
fn ne(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_n()?;
    m.push(!same_category_eq(a, b)?)
}

// num1 num2 ge bool
fn ge(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(a >= b)
}

// num1 num2 gt bool
fn gt(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(a > b)
}

// num1 num2 le bool
fn le(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(a <= b)
}

// num1 num2 lt bool
fn lt(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_nums()?;
    m.push(a < b)
}

/// Apply `bool_op` on two booleans, or `int_op` bitwise on two 32-bit
/// integers.
fn logical(
    m: &mut Machine,
    bool_op: fn(bool, bool) -> bool,
    int_op: fn(i32, i32) -> i32,
) -> MachineResult<()> {
    let [a, b] = m.pop_n()?;
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => m.push(bool_op(a, b)),
        (Value::Num(_), Value::Num(_)) => {
            let r = int_op(a.int32(2)?, b.int32(1)?);
            m.push(Value::from(r))
        }
        (Value::Bool(_), Value::Num(_)) | (Value::Num(_), Value::Bool(_)) => {
            Err(MachineError::TypeMismatch { arg: 2 })
        }
    }
}

// bool1 bool2 and bool3
// int1 int2 and int3
fn and(m: &mut Machine) -> MachineResult<()> {
    logical(m, |a, b| a && b, |a, b| a & b)
}

// bool1 bool2 or bool3
// int1 int2 or int3
fn or(m: &mut Machine) -> MachineResult<()> {
    logical(m, |a, b| a || b, |a, b| a | b)
}

// bool1 bool2 xor bool3
// int1 int2 xor int3
fn xor(m: &mut Machine) -> MachineResult<()> {
    logical(m, |a, b| a ^ b, |a, b| a ^ b)
}

// bool1 not bool2
// int1 not int2
fn not(m: &mut Machine) -> MachineResult<()> {
    match m.pop()? {
        Value::Bool(b) => m.push(!b),
        v => {
            let i = v.int32(1)?;
            m.push(Value::from(!i))
        }
    }
}

// int1 shift bitshift int2, negative shift moves right with zero fill
fn bitshift(m: &mut Machine) -> MachineResult<()> {
    let [a, shift] = m.pop_n()?;
    let (a, shift) = (a.int32(2)? as u32, shift.int(1)?);
    let r = match shift.unsigned_abs() {
        n if n >= 32 => 0,
        n if shift >= 0 => a << n,
        n => a >> n,
    };
    m.push(Value::from(r as i32))
}

// - true true
fn push_true(m: &mut Machine) -> MachineResult<()> {
    m.push(true)
}

// - false false
fn push_false(m: &mut Machine) -> MachineResult<()> {
    m.push(false)
}

// any pop -
fn pop(m: &mut Machine) -> MachineResult<()> {
    m.pop()?;
    Ok(())
}

// any dup any any
fn dup(m: &mut Machine) -> MachineResult<()> {
    let v = m.top()?;
    m.push(v)
}

// any1 any2 exch any2 any1
fn exch(m: &mut Machine) -> MachineResult<()> {
    let [a, b] = m.pop_n()?;
    m.push(b)?;
    m.push(a)
}

// any1 .. any(n) n copy any1 .. any(n) any1 .. any(n)
fn copy(m: &mut Machine) -> MachineResult<()> {
    let n = m.pop()?.count(1)?;
    let len = m.stack.len();
    if len < n {
        return Err(MachineError::StackUnderflow);
    }
    if len + n > m.options.max_stack_depth {
        return Err(MachineError::StackOverflow);
    }
    m.stack.extend_from_within(len - n..);
    Ok(())
}

// any(n) .. any0 n index any(n) .. any0 any(n)
fn index(m: &mut Machine) -> MachineResult<()> {
    let n = m.pop()?.count(1)?;
    let len = m.stack.len();
    if n >= len {
        return Err(MachineError::StackUnderflow);
    }
    let v = m.stack[len - 1 - n];
    m.push(v)
}

// any(n-1) .. any0 n j roll any((j-1) mod n) .. any0 any(n-1) .. any(j mod n)
fn roll(m: &mut Machine) -> MachineResult<()> {
    let [n, j] = m.pop_n()?;
    let (n, j) = (n.count(2)?, j.num(1)?);
    if !j.fract().is_zero() {
        return Err(MachineError::TypeMismatch { arg: 1 });
    }
    let len = m.stack.len();
    if len < n {
        return Err(MachineError::StackUnderflow);
    }
    if n == 0 {
        return Ok(());
    }
    let n_dec = Decimal::from(n);
    let mut shift = overflow(j.checked_rem(n_dec))?;
    if shift < Decimal::ZERO {
        shift += n_dec;
    }
    let shift = overflow(shift.to_usize())?;
    m.stack[len - n..].rotate_right(shift);
    Ok(())
}
