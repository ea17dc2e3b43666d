//! Absorption costing
//!
//! Buckets, in the order they are built:
//! - direct materials: per-unit BOM cost scaled by the quantity produced
//! - labor: period labor entries as supplied
//! - indirect: period overhead apportioned by production volume
//! - variable: freight and taxes from the destination profile
//!
//! Wastage is charged on materials and labor only. Each bucket is rounded to
//! currency precision once, and the total is the sum of the rounded buckets.

use crate::destination::{calculate_destination_cost, DestinationTaxProfile};
use crate::model::{CostCalculationInput, CostCalculationResult, CostComponent, IndirectCostEntry};
use rust_decimal::Decimal;
use shared::types::{checked_add, checked_mul, checked_ratio, checked_sub, checked_sum, percent_ratio, HUNDRED};
use shared::{money, percent, EngineResult};
use tracing::debug;

pub fn calculate_cost(
    input: &CostCalculationInput,
    bom_items: &[CostComponent],
    labor_entries: &[CostComponent],
    indirect_entries: &[IndirectCostEntry],
    destination: Option<&DestinationTaxProfile>,
) -> EngineResult<CostCalculationResult> {
    input.validate()?;

    let per_unit_material = sum_components(bom_items)?;
    let direct = checked_mul(per_unit_material, input.quantity_produced, "direct cost")?;
    let labor = sum_components(labor_entries)?;
    let indirect = apportion_indirect(input, indirect_entries)?;

    let wastage_base = checked_add(direct, labor, "wastage base")?;
    let wastage = checked_ratio(checked_mul(wastage_base, input.wastage_percent, "wastage")?, HUNDRED, "wastage")?;

    let (freight_cost, tax_cost) = match destination {
        Some(profile) => {
            let (weight, value) = match input.shipment {
                Some(shipment) => (shipment.weight, shipment.value),
                None => (
                    Decimal::ZERO,
                    checked_sum(&[wastage_base, indirect, wastage], "shipment value")?,
                ),
            };
            let logistics = calculate_destination_cost(profile, weight, value)?;
            (logistics.freight_cost, logistics.taxes.total)
        }
        None => (money(Decimal::ZERO), money(Decimal::ZERO)),
    };

    let direct_cost_total = money(direct);
    let labor_cost_total = money(labor);
    let indirect_cost_total = money(indirect);
    let wastage_value = money(wastage);
    let total_cost = checked_sum(
        &[direct_cost_total, labor_cost_total, indirect_cost_total, freight_cost, tax_cost, wastage_value],
        "total cost",
    )?;

    let unit_cost = money(checked_ratio(total_cost, input.quantity_produced, "unit cost")?);

    let (gross_margin, gross_margin_percent) = match input.selling_price {
        Some(price) => {
            let margin = money(checked_sub(price, unit_cost, "gross margin")?);
            let margin_percent = percent(percent_ratio(margin, price, "gross margin percent")?);
            (Some(margin), Some(margin_percent))
        }
        None => (None, None),
    };

    debug!(
        sku = %input.sku_id,
        period = %input.period,
        total_cost = %total_cost,
        unit_cost = %unit_cost,
        "Absorption cost calculated"
    );

    Ok(CostCalculationResult {
        sku_id: input.sku_id.clone(),
        period: input.period,
        direct_cost_total,
        labor_cost_total,
        indirect_cost_total,
        freight_cost,
        tax_cost,
        wastage_value,
        total_cost,
        unit_cost,
        selling_price: input.selling_price.map(money),
        gross_margin,
        gross_margin_percent,
    })
}

fn sum_components(components: &[CostComponent]) -> EngineResult<Decimal> {
    components.iter().try_fold(Decimal::ZERO, |acc, component| {
        component.validate()?;
        checked_add(acc, component.extended()?, "component total")
    })
}

/// Overhead for `input.period` times this SKU's share of the period's volume.
/// Without a known period total the SKU absorbs the whole amount.
fn apportion_indirect(input: &CostCalculationInput, entries: &[IndirectCostEntry]) -> EngineResult<Decimal> {
    let period_overhead = entries
        .iter()
        .filter(|entry| entry.period == input.period)
        .try_fold(Decimal::ZERO, |acc, entry| {
            shared::types::ensure_non_negative(entry.amount, &format!("indirect amount '{}'", entry.description))?;
            checked_add(acc, entry.amount, "indirect total")
        })?;

    match input.total_period_production {
        Some(total) => {
            let weighted = checked_mul(period_overhead, input.quantity_produced, "indirect apportionment")?;
            checked_ratio(weighted, total, "production share")
        }
        None => Ok(period_overhead),
    }
}
