//! Budget variance and year-end forecast over a fixed 12-month window.
//!
//! `as_of_month` is zero-indexed and inclusive: `2` means January through
//! March are elapsed. An elapsed month without an actual counts as zero spend.
//! Every ratio over an empty budget reports 0 instead of failing.

use crate::model::*;
use rust_decimal::Decimal;
use shared::types::{checked_add, checked_mul, checked_ratio, checked_sub, percent_ratio};
use shared::{money, percent, EngineError, EngineResult, EnginePolicy, ForecastPolicy};
use tracing::debug;

/// Analyze with the reference policy and no forecast overrides.
pub fn analyze(entries: &[BudgetMonthEntry], as_of_month: u8) -> EngineResult<BudgetAnalysis> {
    BudgetAnalyzer::default().analyze(entries, as_of_month, &ForecastOverrides::new())
}

/// Sum several budget lines month by month. A month's consolidated actual is
/// `None` only when no line has realized it.
pub fn consolidate(lines: &[BudgetLine]) -> EngineResult<Vec<BudgetMonthEntry>> {
    if lines.is_empty() {
        return Err(EngineError::invalid_input("at least one budget line is required"));
    }

    let mut totals: Vec<BudgetMonthEntry> = (1..=MONTHS_PER_YEAR as u8)
        .map(|month| BudgetMonthEntry::new(month, Decimal::ZERO, None))
        .collect();

    for line in lines {
        let ordered = ordered_months(&line.entries)
            .map_err(|e| EngineError::invalid_input(format!("budget line '{}': {}", line.name, e)))?;
        for (total, entry) in totals.iter_mut().zip(ordered) {
            total.budgeted = checked_add(total.budgeted, entry.budgeted, "consolidated budget")?;
            if let Some(actual) = entry.actual {
                let so_far = total.actual.unwrap_or(Decimal::ZERO);
                total.actual = Some(checked_add(so_far, actual, "consolidated actual")?);
            }
        }
    }

    Ok(totals)
}

/// Validate and sort exactly twelve entries, one per month.
fn ordered_months(entries: &[BudgetMonthEntry]) -> EngineResult<Vec<&BudgetMonthEntry>> {
    if entries.len() != MONTHS_PER_YEAR {
        return Err(EngineError::invalid_input(format!(
            "exactly 12 monthly entries are required, got {}",
            entries.len()
        )));
    }
    for entry in entries {
        entry.validate()?;
    }

    let mut ordered: Vec<&BudgetMonthEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.month);
    for (index, entry) in ordered.iter().enumerate() {
        if entry.month as usize != index + 1 {
            return Err(EngineError::invalid_input(format!(
                "month {} appears more than once",
                entry.month
            )));
        }
    }
    Ok(ordered)
}

#[derive(Debug, Clone, Default)]
pub struct BudgetAnalyzer {
    policy: EnginePolicy,
}

impl BudgetAnalyzer {
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    pub fn with_forecast_policy(mut self, forecast_policy: ForecastPolicy) -> Self {
        self.policy.forecast_policy = forecast_policy;
        self
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    pub fn analyze(
        &self,
        entries: &[BudgetMonthEntry],
        as_of_month: u8,
        overrides: &ForecastOverrides,
    ) -> EngineResult<BudgetAnalysis> {
        if as_of_month as usize >= MONTHS_PER_YEAR {
            return Err(EngineError::invalid_input(format!(
                "as-of month must be within 0..=11, got {}",
                as_of_month
            )));
        }
        let ordered = ordered_months(entries)?;
        self.validate_overrides(overrides, as_of_month)?;

        let months_elapsed = as_of_month + 1;
        let (elapsed, remaining) = ordered.split_at(months_elapsed as usize);

        let mut budgeted_to_date = Decimal::ZERO;
        let mut actual_to_date = Decimal::ZERO;
        let mut adherent_months: u8 = 0;
        let mut months = Vec::with_capacity(MONTHS_PER_YEAR);

        for entry in elapsed {
            let actual = entry.actual.unwrap_or(Decimal::ZERO);
            budgeted_to_date = checked_add(budgeted_to_date, entry.budgeted, "budgeted to date")?;
            actual_to_date = checked_add(actual_to_date, actual, "actual to date")?;

            let adherent = self.is_adherent(entry.budgeted, actual)?;
            if adherent {
                adherent_months += 1;
            }

            let variance = checked_sub(actual, entry.budgeted, "monthly variance")?;
            months.push(MonthVariance {
                month: entry.month,
                budgeted: money(entry.budgeted),
                actual: entry.actual.map(money),
                elapsed: true,
                variance: Some(money(variance)),
                variance_percent: Some(percent(percent_ratio(
                    variance,
                    entry.budgeted,
                    "monthly variance percent",
                )?)),
                adherent: Some(adherent),
            });
        }

        let run_rate_monthly = checked_ratio(actual_to_date, Decimal::from(months_elapsed), "run rate")?;
        let mut forecast_remaining = Decimal::ZERO;
        let mut annual_budget = budgeted_to_date;

        for entry in remaining {
            annual_budget = checked_add(annual_budget, entry.budgeted, "annual budget")?;
            let projected = match overrides.get(&entry.month) {
                Some(value) => *value,
                None => match self.policy.forecast_policy {
                    ForecastPolicy::Budgeted => entry.budgeted,
                    ForecastPolicy::RunRate => run_rate_monthly,
                },
            };
            forecast_remaining = checked_add(forecast_remaining, projected, "forecast")?;

            months.push(MonthVariance {
                month: entry.month,
                budgeted: money(entry.budgeted),
                actual: entry.actual.map(money),
                elapsed: false,
                variance: None,
                variance_percent: None,
                adherent: None,
            });
        }

        let cumulative_variance = checked_sub(actual_to_date, budgeted_to_date, "cumulative variance")?;
        let run_rate = checked_ratio(
            checked_mul(actual_to_date, Decimal::from(MONTHS_PER_YEAR as u8), "run rate")?,
            Decimal::from(months_elapsed),
            "run rate",
        )?;
        let forecast_year_end = money(checked_add(actual_to_date, forecast_remaining, "forecast")?);
        let annual_budget = money(annual_budget);

        let analysis = BudgetAnalysis {
            as_of_month,
            budgeted_to_date: money(budgeted_to_date),
            actual_to_date: money(actual_to_date),
            burn_rate_percent: percent(percent_ratio(actual_to_date, budgeted_to_date, "burn rate")?),
            run_rate: money(run_rate),
            cumulative_variance: money(cumulative_variance),
            cumulative_variance_percent: percent(percent_ratio(
                cumulative_variance,
                budgeted_to_date,
                "cumulative variance percent",
            )?),
            adherent_months,
            months_elapsed,
            adherence_percent: percent(percent_ratio(
                Decimal::from(adherent_months),
                Decimal::from(months_elapsed),
                "adherence",
            )?),
            annual_budget,
            forecast_year_end,
            forecast_variance: checked_sub(forecast_year_end, annual_budget, "forecast variance")?,
            months,
        };

        debug!(
            as_of_month,
            burn_rate = %analysis.burn_rate_percent,
            adherence = %analysis.adherence_percent,
            forecast = %analysis.forecast_year_end,
            "Budget analyzed"
        );
        Ok(analysis)
    }

    /// Relative deviation within the band, inclusive. A zero budget is only
    /// met by zero spend.
    fn is_adherent(&self, budgeted: Decimal, actual: Decimal) -> EngineResult<bool> {
        if budgeted.is_zero() {
            return Ok(actual.is_zero());
        }
        let deviation = checked_sub(actual, budgeted, "monthly deviation")?.abs();
        Ok(deviation <= checked_mul(self.policy.adherence_band, budgeted, "adherence band")?)
    }

    fn validate_overrides(&self, overrides: &ForecastOverrides, as_of_month: u8) -> EngineResult<()> {
        for (&month, &value) in overrides {
            if !(1..=MONTHS_PER_YEAR as u8).contains(&month) {
                return Err(EngineError::invalid_input(format!(
                    "forecast override month must be within 1..=12, got {}",
                    month
                )));
            }
            if month <= as_of_month + 1 {
                return Err(EngineError::invalid_input(format!(
                    "forecast override for month {} which is already elapsed",
                    month
                )));
            }
            shared::types::ensure_non_negative(value, &format!("forecast override for month {}", month))?;
        }
        Ok(())
    }
}
