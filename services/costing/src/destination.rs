//! Freight and multi-tax cost for a shipment to a destination

use formula_service::{Formula, Variables};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::types::{
    checked_add, checked_mul, checked_ratio, checked_sum, ensure_non_negative, ensure_percent_range, HUNDRED,
};
use shared::{money, EngineError, EngineResult};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightType {
    Fixed,
    Formula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationTaxProfile {
    pub freight_type: FreightType,
    #[serde(default)]
    pub freight_fixed_value: Decimal,
    #[serde(default)]
    pub freight_formula: Option<String>,
    #[serde(default)]
    pub icms_percent: Decimal,
    #[serde(default)]
    pub icms_st_percent: Decimal,
    #[serde(default)]
    pub pis_percent: Decimal,
    #[serde(default)]
    pub cofins_percent: Decimal,
    #[serde(default)]
    pub ipi_percent: Decimal,
}

impl DestinationTaxProfile {
    pub fn fixed(freight: Decimal) -> Self {
        Self {
            freight_type: FreightType::Fixed,
            freight_fixed_value: freight,
            freight_formula: None,
            icms_percent: Decimal::ZERO,
            icms_st_percent: Decimal::ZERO,
            pis_percent: Decimal::ZERO,
            cofins_percent: Decimal::ZERO,
            ipi_percent: Decimal::ZERO,
        }
    }

    pub fn formula(formula: impl Into<String>) -> Self {
        Self {
            freight_type: FreightType::Formula,
            freight_formula: Some(formula.into()),
            ..Self::fixed(Decimal::ZERO)
        }
    }

    fn tax_rates(&self) -> [(&'static str, Decimal); 5] {
        [
            ("icms percent", self.icms_percent),
            ("icms-st percent", self.icms_st_percent),
            ("pis percent", self.pis_percent),
            ("cofins percent", self.cofins_percent),
            ("ipi percent", self.ipi_percent),
        ]
    }

    /// Check rates and compile the freight formula, if any.
    pub fn validate(&self) -> EngineResult<Option<Formula>> {
        for (field, rate) in self.tax_rates() {
            ensure_percent_range(rate, field)?;
        }

        match self.freight_type {
            FreightType::Fixed => {
                ensure_non_negative(self.freight_fixed_value, "freight fixed value")?;
                Ok(None)
            }
            FreightType::Formula => {
                let source = self
                    .freight_formula
                    .as_deref()
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| {
                        EngineError::MissingFormula(
                            "destination uses formula freight but has no formula".to_string(),
                        )
                    })?;
                Formula::parse(source).map(Some)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub icms: Decimal,
    pub icms_st: Decimal,
    pub pis: Decimal,
    pub cofins: Decimal,
    pub ipi: Decimal,
    pub total: Decimal,
}

/// Cost components only; the shipment value itself is not added back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationCostResult {
    pub freight_cost: Decimal,
    pub taxes: TaxBreakdown,
    pub total_cost: Decimal,
}

pub fn calculate_destination_cost(
    profile: &DestinationTaxProfile,
    weight: Decimal,
    value: Decimal,
) -> EngineResult<DestinationCostResult> {
    ensure_non_negative(weight, "weight")?;
    ensure_non_negative(value, "value")?;

    let freight = match profile.validate()? {
        None => profile.freight_fixed_value,
        Some(formula) => {
            let amount = formula.evaluate(&Variables::new(weight, value))?;
            if amount < Decimal::ZERO {
                return Err(EngineError::invalid_formula(format!(
                    "freight formula '{}' produced a negative amount {}",
                    formula.source(),
                    amount
                )));
            }
            amount
        }
    };

    let line = |rate: Decimal| -> EngineResult<Decimal> {
        Ok(money(checked_ratio(checked_mul(value, rate, "tax line")?, HUNDRED, "tax line")?))
    };
    let icms = line(profile.icms_percent)?;
    let icms_st = line(profile.icms_st_percent)?;
    let pis = line(profile.pis_percent)?;
    let cofins = line(profile.cofins_percent)?;
    let ipi = line(profile.ipi_percent)?;
    let total = checked_sum(&[icms, icms_st, pis, cofins, ipi], "tax total")?;

    let freight_cost = money(freight);
    trace!(freight = %freight_cost, taxes = %total, "Destination cost calculated");

    Ok(DestinationCostResult {
        freight_cost,
        taxes: TaxBreakdown {
            icms,
            icms_st,
            pis,
            cofins,
            ipi,
            total,
        },
        total_cost: checked_add(freight_cost, total, "destination cost")?,
    })
}
