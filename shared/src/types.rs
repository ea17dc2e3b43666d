use crate::error::{EngineError, EngineResult};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MONEY_SCALE: u32 = 2;
pub const PERCENT_SCALE: u32 = 2;

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a monetary amount at the result boundary: half away from zero,
/// always carrying exactly two decimal places.
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Round a percentage to at most two decimal places.
pub fn percent(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// `numerator / denominator`, surfacing a zero denominator as `DivisionByZero`.
pub fn checked_ratio(numerator: Decimal, denominator: Decimal, what: &str) -> EngineResult<Decimal> {
    if denominator.is_zero() {
        return Err(EngineError::DivisionByZero(what.to_string()));
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| EngineError::invalid_input(format!("{} overflows", what)))
}

/// Same as [`checked_ratio`] but a zero denominator yields the documented
/// zero default instead of an error.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal, what: &str) -> EngineResult<Decimal> {
    match checked_ratio(numerator, denominator, what) {
        Err(EngineError::DivisionByZero(_)) => Ok(Decimal::ZERO),
        other => other,
    }
}

pub fn checked_mul(a: Decimal, b: Decimal, what: &str) -> EngineResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::invalid_input(format!("{} overflows", what)))
}

pub fn checked_add(a: Decimal, b: Decimal, what: &str) -> EngineResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::invalid_input(format!("{} overflows", what)))
}

pub fn checked_sub(a: Decimal, b: Decimal, what: &str) -> EngineResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| EngineError::invalid_input(format!("{} overflows", what)))
}

pub fn checked_sum(values: &[Decimal], what: &str) -> EngineResult<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, value| checked_add(acc, *value, what))
}

/// `part * 100 / whole`, unrounded; 0 when `whole` is zero.
pub fn percent_ratio(part: Decimal, whole: Decimal, what: &str) -> EngineResult<Decimal> {
    ratio_or_zero(checked_mul(part, HUNDRED, what)?, whole, what)
}

pub fn ensure_non_negative(value: Decimal, field: &str) -> EngineResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::invalid_input(format!(
            "{} must not be negative, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Percent fields expressed on a 0..=100 scale.
pub fn ensure_percent_range(value: Decimal, field: &str) -> EngineResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(EngineError::invalid_input(format!(
            "{} must be within [0, 100], got {}",
            field, value
        )));
    }
    Ok(())
}

/// Accounting period in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: u16,
    month: u8,
}

impl Period {
    pub fn new(year: u16, month: u8) -> EngineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::invalid_input(format!(
                "period month must be within 1..=12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::invalid_input(format!("period must be YYYY-MM, got '{}'", raw));

        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = EngineError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
