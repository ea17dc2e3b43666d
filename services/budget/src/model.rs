use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::types::ensure_non_negative;
use shared::{EngineError, EngineResult};
use std::collections::BTreeMap;

pub const MONTHS_PER_YEAR: usize = 12;

/// Explicit forecast per remaining month (1..=12), taking precedence over the policy
pub type ForecastOverrides = BTreeMap<u8, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetMonthEntry {
    /// 1..=12
    pub month: u8,
    pub budgeted: Decimal,
    /// `None` for months not yet realized
    #[serde(default)]
    pub actual: Option<Decimal>,
}

impl BudgetMonthEntry {
    pub fn new(month: u8, budgeted: Decimal, actual: Option<Decimal>) -> Self {
        Self {
            month,
            budgeted,
            actual,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=MONTHS_PER_YEAR as u8).contains(&self.month) {
            return Err(EngineError::invalid_input(format!(
                "budget month must be within 1..=12, got {}",
                self.month
            )));
        }
        ensure_non_negative(self.budgeted, &format!("budgeted amount for month {}", self.month))?;
        if let Some(actual) = self.actual {
            ensure_non_negative(actual, &format!("actual amount for month {}", self.month))?;
        }
        Ok(())
    }
}

/// A named 12-month budget line, e.g. one cost centre of a base-zero budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub name: String,
    pub entries: Vec<BudgetMonthEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthVariance {
    pub month: u8,
    pub budgeted: Decimal,
    pub actual: Option<Decimal>,
    /// Within the as-of window
    pub elapsed: bool,
    pub variance: Option<Decimal>,
    pub variance_percent: Option<Decimal>,
    pub adherent: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAnalysis {
    /// Zero-indexed, inclusive
    pub as_of_month: u8,
    pub budgeted_to_date: Decimal,
    pub actual_to_date: Decimal,
    pub burn_rate_percent: Decimal,
    pub run_rate: Decimal,
    pub cumulative_variance: Decimal,
    pub cumulative_variance_percent: Decimal,
    pub adherent_months: u8,
    pub months_elapsed: u8,
    pub adherence_percent: Decimal,
    pub annual_budget: Decimal,
    pub forecast_year_end: Decimal,
    /// `forecast_year_end - annual_budget`
    pub forecast_variance: Decimal,
    pub months: Vec<MonthVariance>,
}

/// Wire form of a single forecast override
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthForecast {
    pub month: u8,
    pub amount: Decimal,
}

pub fn collect_overrides(items: &[MonthForecast]) -> EngineResult<ForecastOverrides> {
    let mut overrides = ForecastOverrides::new();
    for item in items {
        if overrides.insert(item.month, item.amount).is_some() {
            return Err(EngineError::invalid_input(format!(
                "forecast override for month {} given more than once",
                item.month
            )));
        }
    }
    Ok(overrides)
}
