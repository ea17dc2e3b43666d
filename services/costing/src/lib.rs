pub mod calculator;
pub mod destination;
pub mod model;
pub mod store;


pub use calculator::calculate_cost;
pub use destination::{
    calculate_destination_cost, DestinationCostResult, DestinationTaxProfile, FreightType, TaxBreakdown,
};
pub use model::{
    BomLine, CostCalculationInput, CostCalculationResult, CostComponent, IndirectCostEntry, Shipment,
};
pub use store::{resolve_bom, CostSnapshotStore, ItemCostLookup};
