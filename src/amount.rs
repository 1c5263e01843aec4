use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

/// Errors that can occur when parsing a decimal string into an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount '{0}'")]
    Invalid(String),
    #[error("amount '{0}' has more than 4 decimal places")]
    TooPrecise(String),
}

impl Amount {
    const SCALE: i64 = 10_000;
    const DECIMALS: usize = 4;

    pub const ZERO: Amount = Amount(0);

    pub const fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents * (Self::SCALE / 100))
    }

    pub const fn from_units(units: i64) -> Self {
        Amount(units * Self::SCALE)
    }

    /// `None` when the sum leaves the representable range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_mul(self, rhs: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(rhs)).map(Amount)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Amount(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_mul(self, rhs: u32) -> Self {
        Amount(self.0.saturating_mul(i64::from(rhs)))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if frac.len() > Self::DECIMALS {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::Invalid(s.to_string()))?
        };
        // right-pad so "5" reads as 5000 ten-thousandths
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<4}")
                .parse()
                .map_err(|_| AmountError::Invalid(s.to_string()))?
        };

        let scaled = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| AmountError::Invalid(s.to_string()))?;

        Ok(Amount(if negative { -scaled } else { scaled }))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = format!("{:04}", abs % Self::SCALE);
        // money reads with at least cents precision
        let trimmed = frac.trim_end_matches('0');
        let frac = if trimmed.len() < 2 { &frac[..2] } else { trimmed };
        write!(f, "{sign}{whole}.{frac}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::Mul<u32> for Amount {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Amount(self.0 * i64::from(rhs))
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// Saturates at the bounds of the representable range.
impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}
