//! Numeric values in FlexScript.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use fixed::types::I64F64;

use crate::prelude::*;
use crate::{EvalError, ParseError};

/// Fixed-point number for fractional representation. This is a 128-bit number,
/// with 64 bits reserved for the whole number part and 64 bits reserved for the
/// fractional part.
pub type Fixed = I64F64;

/// A number is either an integer or a fixed-point fraction.
///
/// Integer arithmetic stays exact for as long as results fit into 64 bits.
/// As soon as a fraction is involved, computation continues in [`Fixed`].
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Unsigned(u64),
    Signed(i64),
    Fixed(Fixed),
}

impl Number {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(u) => Some(*u),
            Self::Signed(i) => u64::try_from(*i).ok(),
            Self::Fixed(f) => {
                if !f.is_negative() && f.frac().is_zero() {
                    Some(f.to_num())
                } else {
                    None
                }
            }
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Unsigned(u) => i64::try_from(*u).ok(),
            Self::Signed(i) => Some(*i),
            Self::Fixed(f) => {
                if f.frac().is_zero() {
                    Some(f.to_num())
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number into its fixed-point representation, failing if
    /// the integer part does not fit.
    pub fn as_fixed(&self) -> Result<Fixed, EvalError> {
        match self {
            Self::Unsigned(u) => Fixed::checked_from_num(*u).ok_or(EvalError::NumericOverflow),
            Self::Signed(i) => Ok(Fixed::from_num(*i)),
            Self::Fixed(f) => Ok(*f),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Unsigned(u) => *u as f64,
            Self::Signed(i) => *i as f64,
            Self::Fixed(f) => f.to_num(),
        }
    }

    /// Builds a number from a float, preferring an integer representation
    /// where the float has no fractional part. Returns `None` for NaN and
    /// infinities, and for values out of the fixed-point range.
    pub fn from_f64(f: f64) -> Option<Self> {
        let fixed = Fixed::checked_from_num(f)?;
        if fixed.frac().is_zero() {
            Some(Self::from_i128(fixed.to_num::<i64>() as i128).unwrap_or(Self::Fixed(fixed)))
        } else {
            Some(Self::Fixed(fixed))
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::Unsigned(u) => *u == 0,
            Self::Signed(i) => *i == 0,
            Self::Fixed(f) => f.is_zero(),
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Self::Unsigned(_) | Self::Signed(_) => true,
            Self::Fixed(f) => f.frac().is_zero(),
        }
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, EvalError> {
        match (self.integral(), rhs.integral()) {
            (Some(a), Some(b)) => Self::from_i128(a + b).ok_or(EvalError::NumericOverflow),
            _ => self.fixed_op(rhs, Fixed::checked_add),
        }
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, EvalError> {
        match (self.integral(), rhs.integral()) {
            (Some(a), Some(b)) => Self::from_i128(a - b).ok_or(EvalError::NumericOverflow),
            _ => self.fixed_op(rhs, Fixed::checked_sub),
        }
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, EvalError> {
        match (self.integral(), rhs.integral()) {
            (Some(a), Some(b)) => a
                .checked_mul(b)
                .and_then(Self::from_i128)
                .ok_or(EvalError::NumericOverflow),
            _ => self.fixed_op(rhs, Fixed::checked_mul),
        }
    }

    /// Division always produces the exact quotient, which is only an integer
    /// if the division leaves no remainder.
    pub fn checked_div(self, rhs: Self) -> Result<Self, EvalError> {
        if rhs.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        match (self.integral(), rhs.integral()) {
            (Some(a), Some(b)) if a % b == 0 => {
                Self::from_i128(a / b).ok_or(EvalError::NumericOverflow)
            }
            _ => self.fixed_op(rhs, Fixed::checked_div),
        }
    }

    pub fn checked_rem(self, rhs: Self) -> Result<Self, EvalError> {
        if rhs.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        match (self.integral(), rhs.integral()) {
            (Some(a), Some(b)) => Self::from_i128(a % b).ok_or(EvalError::NumericOverflow),
            _ => self.fixed_op(rhs, Fixed::checked_rem),
        }
    }

    pub fn checked_neg(self) -> Result<Self, EvalError> {
        match self {
            Self::Unsigned(u) => Self::from_i128(-(u as i128)).ok_or(EvalError::NumericOverflow),
            Self::Signed(i) => Self::from_i128(-(i as i128)).ok_or(EvalError::NumericOverflow),
            Self::Fixed(f) => f
                .checked_neg()
                .map(Self::Fixed)
                .ok_or(EvalError::NumericOverflow),
        }
    }

    pub fn abs(self) -> Result<Self, EvalError> {
        if self.cmp_num(&Self::Unsigned(0)) == Ordering::Less {
            self.checked_neg()
        } else {
            Ok(self)
        }
    }

    pub fn floor(self) -> Result<Self, EvalError> {
        self.round_with(Fixed::checked_floor)
    }

    pub fn ceil(self) -> Result<Self, EvalError> {
        self.round_with(Fixed::checked_ceil)
    }

    /// Rounds half away from zero.
    pub fn round(self) -> Result<Self, EvalError> {
        self.round_with(Fixed::checked_round)
    }

    /// Numeric comparison across representations.
    pub fn cmp_num(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a.cmp(b),
            (Self::Fixed(a), b) => cmp_fixed_int(*a, b.integral().unwrap_or_default()),
            (a, Self::Fixed(b)) => cmp_fixed_int(*b, a.integral().unwrap_or_default()).reverse(),
            (a, b) => a
                .integral()
                .unwrap_or_default()
                .cmp(&b.integral().unwrap_or_default()),
        }
    }

    fn integral(&self) -> Option<i128> {
        match self {
            Self::Unsigned(u) => Some(*u as i128),
            Self::Signed(i) => Some(*i as i128),
            Self::Fixed(_) => None,
        }
    }

    fn from_i128(v: i128) -> Option<Self> {
        if v >= 0 {
            u64::try_from(v).ok().map(Self::Unsigned)
        } else {
            i64::try_from(v).ok().map(Self::Signed)
        }
    }

    fn fixed_op(self, rhs: Self, op: fn(Fixed, Fixed) -> Option<Fixed>) -> Result<Self, EvalError> {
        op(self.as_fixed()?, rhs.as_fixed()?)
            .map(Self::Fixed)
            .ok_or(EvalError::NumericOverflow)
    }

    fn round_with(self, op: fn(Fixed) -> Option<Fixed>) -> Result<Self, EvalError> {
        match self {
            Self::Fixed(f) => {
                let rounded = op(f).ok_or(EvalError::NumericOverflow)?;
                Self::from_i128(rounded.to_num::<i64>() as i128).ok_or(EvalError::NumericOverflow)
            }
            _ => Ok(self),
        }
    }
}

fn cmp_fixed_int(f: Fixed, i: i128) -> Ordering {
    let whole = f.floor().to_num::<i64>() as i128;
    match whole.cmp(&i) {
        Ordering::Equal if !f.frac().is_zero() => Ordering::Greater,
        o => o,
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_num(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_num(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_num(other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(u) => write!(f, "{}", u),
            Self::Signed(i) => write!(f, "{}", i),
            Self::Fixed(x) => {
                if x.frac().is_zero() {
                    write!(f, "{}", x.to_num::<i64>())
                } else {
                    write!(f, "{}", x)
                }
            }
        }
    }
}

impl From<u64> for Number {
    fn from(u: u64) -> Self {
        Self::Unsigned(u)
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        if i >= 0 {
            Self::Unsigned(i as u64)
        } else {
            Self::Signed(i)
        }
    }
}

impl From<Fixed> for Number {
    fn from(f: Fixed) -> Self {
        Self::Fixed(f)
    }
}

impl FromStr for Number {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            parse_hex(hex, s)
        } else if s.contains('.') {
            parse_fixed(s)
        } else {
            parse_unsigned(s)
        }
    }
}

#[inline]
fn parse_hex(digits: &str, s: &str) -> Result<Number, ParseError> {
    let value =
        u64::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidNumber(s.to_string()))?;
    Ok(Number::Unsigned(value))
}

#[inline]
fn parse_unsigned(s: &str) -> Result<Number, ParseError> {
    let value = s
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))?;
    Ok(Number::Unsigned(value))
}

#[inline]
fn parse_fixed(s: &str) -> Result<Number, ParseError> {
    let value = Fixed::from_str(s).map_err(|_| ParseError::InvalidNumber(s.to_string()))?;
    Ok(Number::Fixed(value))
}
