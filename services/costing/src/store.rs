//! In-memory snapshot of the data a cost calculation needs.
//!
//! The store is filled by whatever data layer the embedding application uses
//! and read concurrently; a calculation reads one consistent snapshot per SKU
//! and period.

use crate::calculator::calculate_cost;
use crate::destination::DestinationTaxProfile;
use crate::model::{BomLine, CostCalculationInput, CostCalculationResult, CostComponent, IndirectCostEntry};
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::logger::redact_identifier;
use shared::{EngineError, EngineResult, Period};
use std::collections::HashMap;
use tracing::debug;

/// Warehouse unit cost of a stock item
pub trait ItemCostLookup {
    fn unit_cost(&self, item_id: &str) -> Option<Decimal>;
}

impl ItemCostLookup for HashMap<String, Decimal> {
    fn unit_cost(&self, item_id: &str) -> Option<Decimal> {
        self.get(item_id).copied()
    }
}

/// Price every BOM line with its real unit cost. An item without a known cost
/// is an error, never a placeholder price.
pub fn resolve_bom<L: ItemCostLookup + ?Sized>(lines: &[BomLine], lookup: &L) -> EngineResult<Vec<CostComponent>> {
    lines
        .iter()
        .map(|line| {
            let unit_cost = lookup
                .unit_cost(&line.item_id)
                .ok_or_else(|| EngineError::not_found("item cost", line.item_id.clone()))?;
            Ok(CostComponent::new(line.item_id.clone(), unit_cost, line.quantity_per_unit))
        })
        .collect()
}

#[derive(Default)]
pub struct CostSnapshotStore {
    boms: DashMap<String, Vec<BomLine>>,
    item_costs: DashMap<String, Decimal>,
    labor: DashMap<Period, Vec<CostComponent>>,
    indirect: DashMap<Period, Vec<IndirectCostEntry>>,
    destinations: DashMap<String, DestinationTaxProfile>,
}

impl CostSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bom(&self, sku_id: &str, lines: Vec<BomLine>) {
        self.boms.insert(sku_id.to_string(), lines);
    }

    pub fn put_item_cost(&self, item_id: &str, unit_cost: Decimal) {
        self.item_costs.insert(item_id.to_string(), unit_cost);
    }

    pub fn put_labor(&self, period: Period, entries: Vec<CostComponent>) {
        self.labor.insert(period, entries);
    }

    pub fn add_indirect(&self, entry: IndirectCostEntry) {
        self.indirect.entry(entry.period).or_insert_with(Vec::new).push(entry);
    }

    pub fn put_destination(&self, destination_id: &str, profile: DestinationTaxProfile) {
        self.destinations.insert(destination_id.to_string(), profile);
    }

    pub fn destination(&self, destination_id: &str) -> EngineResult<DestinationTaxProfile> {
        self.destinations
            .get(destination_id)
            .map(|p| p.clone())
            .ok_or_else(|| EngineError::not_found("destination", destination_id))
    }

    /// Resolve the SKU's snapshot and run the absorption calculation.
    ///
    /// An unknown SKU or destination is `NotFound`; a known SKU with an empty
    /// recipe is valid and costs nothing in direct materials.
    pub fn calculate_for_sku(&self, input: &CostCalculationInput) -> EngineResult<CostCalculationResult> {
        let lines = self
            .boms
            .get(&input.sku_id)
            .map(|bom| bom.clone())
            .ok_or_else(|| EngineError::not_found("sku", input.sku_id.clone()))?;
        let bom = resolve_bom(&lines, self)?;

        let labor = self
            .labor
            .get(&input.period)
            .map(|entries| entries.clone())
            .unwrap_or_default();
        let indirect = self
            .indirect
            .get(&input.period)
            .map(|entries| entries.clone())
            .unwrap_or_default();

        let destination = match &input.destination_id {
            Some(id) => Some(self.destination(id)?),
            None => None,
        };

        debug!(
            sku = %redact_identifier(&input.sku_id),
            bom_lines = bom.len(),
            labor_entries = labor.len(),
            indirect_entries = indirect.len(),
            "Snapshot resolved"
        );

        calculate_cost(input, &bom, &labor, &indirect, destination.as_ref())
    }
}

impl ItemCostLookup for CostSnapshotStore {
    fn unit_cost(&self, item_id: &str) -> Option<Decimal> {
        self.item_costs.get(item_id).map(|cost| *cost)
    }
}
