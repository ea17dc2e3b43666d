//! Engine policy: the tunable constants behind every calculator.
//!
//! The defaults are the reference values of the product domain. A deployment
//! may override them from a TOML file and `COSTING__*` environment variables.

use crate::error::{EngineError, EngineResult};
use crate::types::checked_sum;
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How months after the as-of month are projected in a year-end forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastPolicy {
    /// Remaining months spend exactly what was budgeted
    #[default]
    Budgeted,
    /// Remaining months spend the realized monthly average
    RunRate,
}

/// Share of a base cost attributed to each sub-component, as fractions of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSplit {
    pub material_pct: Decimal,
    pub labor_pct: Decimal,
    pub indirect_pct: Decimal,
}

impl CostSplit {
    pub fn new(material_pct: Decimal, labor_pct: Decimal, indirect_pct: Decimal) -> Self {
        Self {
            material_pct,
            labor_pct,
            indirect_pct,
        }
    }

    /// 60% material, 25% labor, 15% indirect.
    pub fn reference() -> Self {
        Self::new(dec!(0.60), dec!(0.25), dec!(0.15))
    }

    pub fn total(&self) -> EngineResult<Decimal> {
        checked_sum(&[self.material_pct, self.labor_pct, self.indirect_pct], "cost split")
            .map_err(|e| EngineError::invalid_config(e.to_string()))
    }

    pub fn validate(&self, tolerance: Decimal) -> EngineResult<()> {
        for (name, share) in [
            ("material", self.material_pct),
            ("labor", self.labor_pct),
            ("indirect", self.indirect_pct),
        ] {
            if share < Decimal::ZERO {
                return Err(EngineError::invalid_config(format!(
                    "{} share must not be negative, got {}",
                    name, share
                )));
            }
        }

        let total = self.total()?;
        let deviation = (total - Decimal::ONE).abs();
        if deviation > tolerance {
            return Err(EngineError::invalid_config(format!(
                "cost split must sum to 1.0, got {}",
                total
            )));
        }
        Ok(())
    }
}

impl Default for CostSplit {
    fn default() -> Self {
        Self::reference()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Split used by the scenario simulator when the caller supplies none
    pub cost_split: CostSplit,
    /// Allowed deviation of a cost split's sum from 1.0
    pub split_tolerance: Decimal,
    /// Relative deviation (fraction) within which a budget month is adherent, inclusive
    pub adherence_band: Decimal,
    pub forecast_policy: ForecastPolicy,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            cost_split: CostSplit::reference(),
            split_tolerance: dec!(0.000001),
            adherence_band: dec!(0.10),
            forecast_policy: ForecastPolicy::Budgeted,
        }
    }
}

impl EnginePolicy {
    /// Load the policy from an optional TOML file, then `COSTING__*`
    /// environment overrides (e.g. `COSTING__ADHERENCE_BAND=0.05`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("COSTING")
                .prefix_separator("__")
                .separator("__"),
        );

        let policy: EnginePolicy = builder.build()?.try_deserialize()?;
        policy.validate()?;

        debug!(
            adherence_band = %policy.adherence_band,
            forecast_policy = ?policy.forecast_policy,
            "Engine policy loaded"
        );
        Ok(policy)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.split_tolerance < Decimal::ZERO {
            return Err(EngineError::invalid_config("split tolerance must not be negative"));
        }
        if self.adherence_band < Decimal::ZERO || self.adherence_band > Decimal::ONE {
            return Err(EngineError::invalid_config(format!(
                "adherence band must be within [0, 1], got {}",
                self.adherence_band
            )));
        }
        self.cost_split.validate(self.split_tolerance)
    }
}
