use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::types::{ensure_non_negative, ensure_percent_range};
use shared::{EngineError, EngineResult, Period};

/// Direct-material or labor line: `unit_cost * quantity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComponent {
    pub name: String,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
}

impl CostComponent {
    pub fn new(name: impl Into<String>, unit_cost: Decimal, quantity: Decimal) -> Self {
        Self {
            name: name.into(),
            unit_cost,
            quantity,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        ensure_non_negative(self.quantity, &format!("quantity of '{}'", self.name))?;
        ensure_non_negative(self.unit_cost, &format!("unit cost of '{}'", self.name))
    }

    pub fn extended(&self) -> EngineResult<Decimal> {
        shared::types::checked_mul(self.unit_cost, self.quantity, &self.name)
    }
}

/// Period overhead to be apportioned across the units produced in that period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectCostEntry {
    pub description: String,
    pub amount: Decimal,
    pub period: Period,
}

impl IndirectCostEntry {
    pub fn new(description: impl Into<String>, amount: Decimal, period: Period) -> Self {
        Self {
            description: description.into(),
            amount,
            period,
        }
    }
}

/// Recipe line before its warehouse unit cost is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLine {
    pub item_id: String,
    /// Quantity consumed per finished unit
    pub quantity_per_unit: Decimal,
    /// Affects product composition only; optional lines present in the snapshot are costed.
    #[serde(default)]
    pub optional: bool,
}

impl BomLine {
    pub fn new(item_id: impl Into<String>, quantity_per_unit: Decimal) -> Self {
        Self {
            item_id: item_id.into(),
            quantity_per_unit,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub weight: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCalculationInput {
    pub sku_id: String,
    pub period: Period,
    pub quantity_produced: Decimal,
    #[serde(default)]
    pub wastage_percent: Decimal,
    #[serde(default)]
    pub selling_price: Option<Decimal>,
    #[serde(default)]
    pub destination_id: Option<String>,
    /// Units of all SKUs produced in the period; absent means this SKU absorbs all overhead
    #[serde(default)]
    pub total_period_production: Option<Decimal>,
    #[serde(default)]
    pub shipment: Option<Shipment>,
}

impl CostCalculationInput {
    pub fn new(sku_id: impl Into<String>, period: Period, quantity_produced: Decimal) -> Self {
        Self {
            sku_id: sku_id.into(),
            period,
            quantity_produced,
            wastage_percent: Decimal::ZERO,
            selling_price: None,
            destination_id: None,
            total_period_production: None,
            shipment: None,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.quantity_produced <= Decimal::ZERO {
            return Err(EngineError::invalid_input(format!(
                "quantity produced must be positive, got {}",
                self.quantity_produced
            )));
        }
        ensure_percent_range(self.wastage_percent, "wastage percent")?;

        if let Some(price) = self.selling_price {
            ensure_non_negative(price, "selling price")?;
        }
        if let Some(total) = self.total_period_production {
            if total < self.quantity_produced {
                return Err(EngineError::invalid_input(format!(
                    "total period production {} is below quantity produced {}",
                    total, self.quantity_produced
                )));
            }
        }
        if let Some(shipment) = &self.shipment {
            ensure_non_negative(shipment.weight, "shipment weight")?;
            ensure_non_negative(shipment.value, "shipment value")?;
        }
        Ok(())
    }
}

/// Absorption-costing result. Monetary fields carry two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCalculationResult {
    pub sku_id: String,
    pub period: Period,
    pub direct_cost_total: Decimal,
    pub labor_cost_total: Decimal,
    pub indirect_cost_total: Decimal,
    pub freight_cost: Decimal,
    pub tax_cost: Decimal,
    pub wastage_value: Decimal,
    pub total_cost: Decimal,
    pub unit_cost: Decimal,
    pub selling_price: Option<Decimal>,
    /// `None` when no selling price was supplied
    pub gross_margin: Option<Decimal>,
    pub gross_margin_percent: Option<Decimal>,
}
