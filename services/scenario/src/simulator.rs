//! What-if simulation: shift material, labor and indirect cost independently,
//! then price the result at a target margin.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::types::{
    checked_add, checked_mul, checked_ratio, checked_sub, checked_sum, ensure_non_negative, percent_ratio, HUNDRED,
};
use shared::{money, percent, CostSplit, EngineError, EngineResult, EnginePolicy};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioAdjustment {
    pub material_variation_percent: Decimal,
    pub labor_variation_percent: Decimal,
    pub indirect_variation_percent: Decimal,
    /// Margin on selling price, in [0, 100)
    pub target_margin_percent: Decimal,
}

impl ScenarioAdjustment {
    pub fn validate(&self) -> EngineResult<()> {
        let floor = -HUNDRED;
        for (field, variation) in [
            ("material variation", self.material_variation_percent),
            ("labor variation", self.labor_variation_percent),
            ("indirect variation", self.indirect_variation_percent),
        ] {
            if variation < floor {
                return Err(EngineError::invalid_input(format!(
                    "{} must be at least -100%, got {}",
                    field, variation
                )));
            }
        }

        if self.target_margin_percent >= HUNDRED {
            return Err(EngineError::invalid_config(format!(
                "target margin must be below 100%, got {}",
                self.target_margin_percent
            )));
        }
        if self.target_margin_percent < Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "target margin must not be negative, got {}",
                self.target_margin_percent
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub base_cost: Decimal,
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub indirect_cost: Decimal,
    pub simulated_cost: Decimal,
    /// `simulated_cost - base_cost`
    pub cost_variation: Decimal,
    pub cost_variation_percent: Decimal,
    pub suggested_price: Decimal,
    /// Price at which margin is exactly zero
    pub break_even_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAction {
    Increase,
    Decrease,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecommendation {
    pub current_price: Decimal,
    pub suggested_price: Decimal,
    pub adjustment: Decimal,
    pub adjustment_percent: Decimal,
    pub action: PriceAction,
}

/// Simulate with the reference split when `cost_split` is `None`.
pub fn simulate(
    base_cost: Decimal,
    adjustment: &ScenarioAdjustment,
    cost_split: Option<CostSplit>,
) -> EngineResult<ScenarioResult> {
    ScenarioSimulator::default().simulate(base_cost, adjustment, cost_split)
}

/// Compare the scenario's suggested price against the price currently charged.
pub fn recommend_price_adjustment(result: &ScenarioResult, current_price: Decimal) -> EngineResult<PriceRecommendation> {
    ensure_non_negative(current_price, "current price")?;

    let adjustment = checked_sub(result.suggested_price, current_price, "price adjustment")?;
    let action = if adjustment > Decimal::ZERO {
        PriceAction::Increase
    } else if adjustment < Decimal::ZERO {
        PriceAction::Decrease
    } else {
        PriceAction::Keep
    };

    Ok(PriceRecommendation {
        current_price: money(current_price),
        suggested_price: result.suggested_price,
        adjustment: money(adjustment),
        adjustment_percent: percent(percent_ratio(adjustment, current_price, "price adjustment")?),
        action,
    })
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioSimulator {
    policy: EnginePolicy,
}

impl ScenarioSimulator {
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    pub fn simulate(
        &self,
        base_cost: Decimal,
        adjustment: &ScenarioAdjustment,
        cost_split: Option<CostSplit>,
    ) -> EngineResult<ScenarioResult> {
        ensure_non_negative(base_cost, "base cost")?;
        adjustment.validate()?;

        let split = cost_split.unwrap_or(self.policy.cost_split);
        split.validate(self.policy.split_tolerance)?;

        let part = |share: Decimal, variation: Decimal| -> EngineResult<Decimal> {
            let portion = checked_mul(base_cost, share, "scenario portion")?;
            let factor = checked_add(HUNDRED, variation, "scenario variation")?;
            checked_ratio(checked_mul(portion, factor, "scenario portion")?, HUNDRED, "scenario portion")
        };
        let material = part(split.material_pct, adjustment.material_variation_percent)?;
        let labor = part(split.labor_pct, adjustment.labor_variation_percent)?;
        let indirect = part(split.indirect_pct, adjustment.indirect_variation_percent)?;
        let simulated = checked_sum(&[material, labor, indirect], "simulated cost")?;

        // margin < 100, so the divisor is positive
        let cost_share = checked_sub(HUNDRED, adjustment.target_margin_percent, "suggested price")?;
        let suggested = checked_ratio(
            checked_mul(simulated, HUNDRED, "suggested price")?,
            cost_share,
            "suggested price",
        )?;
        let variation = checked_sub(simulated, base_cost, "cost variation")?;

        let result = ScenarioResult {
            base_cost: money(base_cost),
            material_cost: money(material),
            labor_cost: money(labor),
            indirect_cost: money(indirect),
            simulated_cost: money(simulated),
            cost_variation: money(variation),
            cost_variation_percent: percent(percent_ratio(variation, base_cost, "cost variation")?),
            suggested_price: money(suggested),
            break_even_price: money(simulated),
        };

        debug!(
            simulated_cost = %result.simulated_cost,
            suggested_price = %result.suggested_price,
            "Scenario simulated"
        );
        Ok(result)
    }
}
