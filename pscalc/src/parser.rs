//! Lexer of Type 4 function programs.
//!
//! A program is a flat run of numbers and operator names. `{` and `}` are
//! accepted but carry no meaning, everything else that is neither a number nor
//! a lowercase operator run is skipped one byte at a time.
use crate::machine::{MachineError, MachineResult};
use rust_decimal::Decimal;
use std::str::FromStr;
use winnow::{
    ascii::digit0,
    combinator::{opt, preceded},
    error::ContextError,
    token::{any, take_while},
    PResult, Parser,
};

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Token<'a> {
    /// Maximal run of digits, `.` and `-`. Not yet validated.
    Number(&'a [u8]),
    /// Maximal run of lowercase letters, starting with a letter that begins
    /// a known operator.
    Operator(&'a [u8]),
    /// Byte that starts neither a number nor an operator.
    Stray(u8),
}

/// Space, tab, newline. Carriage return is accepted too, PDF streams
/// often use CRLF line endings.
fn is_white_space(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

fn is_ignorable(b: u8) -> bool {
    is_white_space(b) || b == b'{' || b == b'}'
}

fn is_number_char(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.' || b == b'-'
}

fn ignorable(input: &mut &[u8]) -> PResult<()> {
    take_while(0.., is_ignorable).void().parse_next(input)
}

fn number_run<'a>(input: &mut &'a [u8]) -> PResult<&'a [u8]> {
    take_while(1.., is_number_char).parse_next(input)
}

fn operator_run<'a>(input: &mut &'a [u8]) -> PResult<&'a [u8]> {
    take_while(1.., |b: u8| b.is_ascii_lowercase()).parse_next(input)
}

/// Read next token from `input`, skipping white space and block delimiters.
/// `is_operator_start` tells whether a lowercase letter may begin an operator
/// name. Returns `None` at end of input.
pub(crate) fn next_token<'a>(
    input: &mut &'a [u8],
    is_operator_start: impl Fn(u8) -> bool,
) -> Option<Token<'a>> {
    ignorable.parse_next(input).ok()?;
    let b = *input.first()?;
    if is_number_char(b) {
        number_run.parse_next(input).ok().map(Token::Number)
    } else if b.is_ascii_lowercase() && is_operator_start(b) {
        operator_run.parse_next(input).ok().map(Token::Operator)
    } else {
        any::<_, ContextError>
            .parse_next(input)
            .ok()
            .map(Token::Stray)
    }
}

/// `-`? digits? (`.` digits?)?
fn number<'a>(input: &mut &'a [u8]) -> PResult<(bool, &'a [u8], &'a [u8])> {
    (
        opt('-').map(|sign| sign.is_some()),
        digit0,
        opt(preceded('.', digit0)).map(Option::unwrap_or_default),
    )
        .parse_next(input)
}

/// Convert a number run into a decimal.
///
/// Returns `None` if the run has no digit at all (`-`, `.`, `-.`), those are
/// skipped by the caller. No exponent notation, no leading `+`.
pub(crate) fn parse_number(run: &[u8]) -> Option<MachineResult<Decimal>> {
    if !run.iter().any(u8::is_ascii_digit) {
        return None;
    }

    let malformed = || MachineError::MalformedNumber(String::from_utf8_lossy(run).into_owned());
    let Ok((negative, int, frac)) = number.parse(run) else {
        return Some(Err(malformed()));
    };

    let mut s = String::with_capacity(run.len() + 2);
    if negative {
        s.push('-');
    }
    if int.is_empty() {
        s.push('0');
    } else {
        s.extend(int.iter().copied().map(char::from));
    }
    if !frac.is_empty() {
        s.push('.');
        s.extend(frac.iter().copied().map(char::from));
    }
    Some(Decimal::from_str(&s).map_err(|_| malformed()))
}
