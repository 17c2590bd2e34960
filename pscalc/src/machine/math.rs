//! Decimal math the `maths` feature of `rust_decimal` does not cover:
//! trigonometry in degrees and `atan`.
use rust_decimal::{Decimal, MathematicalOps};

const FULL_TURN: Decimal = Decimal::from_parts(360, 0, 0, false, 0);
const HALF_TURN: Decimal = Decimal::from_parts(180, 0, 0, false, 0);
const RIGHT_ANGLE: Decimal = Decimal::from_parts(90, 0, 0, false, 0);
const THREE_QUARTER_TURN: Decimal = Decimal::from_parts(270, 0, 0, false, 0);

/// Terms added by the `atan` series before giving up, the reduced argument
/// converges in far fewer.
const MAX_SERIES_TERMS: usize = 64;

/// Reduce degrees into `[0, 360)`.
fn normalize_degrees(deg: Decimal) -> Option<Decimal> {
    let r = deg.checked_rem(FULL_TURN)?;
    Some(if r.is_sign_negative() && !r.is_zero() {
        r + FULL_TURN
    } else {
        r
    })
}

/// Map `[0, 360)` onto `(-180, 180]`, angles just below a full turn become
/// small negative ones.
fn signed_degrees(deg: Decimal) -> Decimal {
    if deg > HALF_TURN {
        deg - FULL_TURN
    } else {
        deg
    }
}

fn to_radians(deg: Decimal) -> Option<Decimal> {
    deg.checked_mul(Decimal::PI)?.checked_div(HALF_TURN)
}

fn to_degrees(rad: Decimal) -> Option<Decimal> {
    rad.checked_mul(HALF_TURN)?.checked_div(Decimal::PI)
}

/// Sine of `deg` degrees, exact at multiples of 90.
pub fn sin_degrees(deg: Decimal) -> Option<Decimal> {
    let deg = normalize_degrees(deg)?;
    if deg.is_zero() || deg == HALF_TURN {
        Some(Decimal::ZERO)
    } else if deg == RIGHT_ANGLE {
        Some(Decimal::ONE)
    } else if deg == THREE_QUARTER_TURN {
        Some(Decimal::NEGATIVE_ONE)
    } else {
        to_radians(signed_degrees(deg))?.checked_sin()
    }
}

/// Cosine of `deg` degrees, exact at multiples of 90.
pub fn cos_degrees(deg: Decimal) -> Option<Decimal> {
    let deg = normalize_degrees(deg)?;
    if deg.is_zero() {
        Some(Decimal::ONE)
    } else if deg == HALF_TURN {
        Some(Decimal::NEGATIVE_ONE)
    } else if deg == RIGHT_ANGLE || deg == THREE_QUARTER_TURN {
        Some(Decimal::ZERO)
    } else {
        to_radians(signed_degrees(deg))?.checked_cos()
    }
}

/// Arc tangent of `z` in `[0, 1]`, in radians.
///
/// The argument is halved three times with
/// `atan(z) = 2 * atan(z / (1 + sqrt(1 + z^2)))`, then the Taylor series is
/// summed until terms vanish at decimal scale.
fn atan_unit(z: Decimal) -> Option<Decimal> {
    let mut z = z;
    let mut factor = Decimal::ONE;
    for _ in 0..3 {
        let root = Decimal::ONE.checked_add(z.checked_mul(z)?)?.sqrt()?;
        z = z.checked_div(Decimal::ONE + root)?;
        factor *= Decimal::TWO;
    }

    let z2 = z.checked_mul(z)?;
    let mut power = z;
    let mut sum = z;
    let mut n = Decimal::ONE;
    for _ in 0..MAX_SERIES_TERMS {
        power = -power.checked_mul(z2)?;
        n += Decimal::TWO;
        let term = power.checked_div(n)?;
        if term.is_zero() {
            break;
        }
        sum = sum.checked_add(term)?;
    }
    sum.checked_mul(factor)
}

/// Angle in degrees of vector (`x`, `y`), in `[0, 360)`. `None` for the
/// zero vector.
pub fn atan_degrees(y: Decimal, x: Decimal) -> Option<Decimal> {
    match (y.is_zero(), x.is_zero()) {
        (true, true) => return None,
        (false, true) => {
            return Some(if y.is_sign_positive() {
                RIGHT_ANGLE
            } else {
                THREE_QUARTER_TURN
            })
        }
        (true, false) => {
            return Some(if x.is_sign_positive() {
                Decimal::ZERO
            } else {
                HALF_TURN
            })
        }
        _ => {}
    }

    let (ay, ax) = (y.abs(), x.abs());
    let base = if ay == ax {
        Decimal::QUARTER_PI
    } else if ay < ax {
        atan_unit(ay.checked_div(ax)?)?
    } else {
        Decimal::HALF_PI - atan_unit(ax.checked_div(ay)?)?
    };
    let base = to_degrees(base)?;

    Some(match (y.is_sign_positive(), x.is_sign_positive()) {
        (true, true) => base,
        (true, false) => HALF_TURN - base,
        (false, false) => HALF_TURN + base,
        (false, true) => FULL_TURN - base,
    })
}
