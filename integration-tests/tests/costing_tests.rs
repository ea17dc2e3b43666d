//! End-to-end costing tests
//!
//! Tests cover: formula-driven freight feeding destination cost, absorption
//! totals with logistics, and the canonical worked examples.

use costing_service::{
    calculate_cost, calculate_destination_cost, CostCalculationInput, CostComponent, DestinationTaxProfile,
    IndirectCostEntry, Shipment,
};
use formula_service::{evaluate, Formula, Variables};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::{EngineError, Period};

fn period() -> Period {
    "2024-07".parse().unwrap()
}

fn cake_input(quantity: Decimal, wastage: Decimal) -> CostCalculationInput {
    let mut input = CostCalculationInput::new("BOLO-020", period(), quantity);
    input.wastage_percent = wastage;
    input.selling_price = Some(dec!(35));
    input
}

fn cake_bom() -> Vec<CostComponent> {
    vec![
        CostComponent::new("sugar", dec!(3.89), dec!(0.3)),
        CostComponent::new("eggs", dec!(0.75), dec!(4)),
        CostComponent::new("butter", dec!(42.10), dec!(0.125)),
    ]
}

fn cake_labor() -> Vec<CostComponent> {
    vec![CostComponent::new("confectioner", dec!(27.33), dec!(12))]
}

fn cake_overhead() -> Vec<IndirectCostEntry> {
    vec![IndirectCostEntry::new("gas", dec!(333.33), period())]
}

// =============================================================================
// Formula evaluator
// =============================================================================

#[test]
fn test_formula_worked_example() {
    let result = evaluate("weight * 2.5 + 50", Variables::new(dec!(10), Decimal::ZERO)).unwrap();
    assert_eq!(result.to_string(), "75.00");
}

#[test]
fn test_formula_rejects_code() {
    for source in ["__import__('os')", "weight; value", "max(weight, 1)", "weight ** 2"] {
        let err = evaluate(source, Variables::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormula(_)), "{}", source);
    }
}

#[test]
fn test_parsed_formula_reused_across_shipments() {
    let formula = Formula::parse("(WEIGHT * 1.2) + value / 100").unwrap();
    let light = formula.evaluate(&Variables::new(dec!(1), dec!(100))).unwrap();
    let heavy = formula.evaluate(&Variables::new(dec!(100), dec!(10000))).unwrap();
    assert_eq!(light, dec!(2.2));
    assert_eq!(heavy, dec!(220));
}

// =============================================================================
// Destination cost
// =============================================================================

#[test]
fn test_destination_worked_example() {
    let profile = DestinationTaxProfile {
        icms_percent: dec!(7),
        ..DestinationTaxProfile::fixed(dec!(120))
    };
    let result = calculate_destination_cost(&profile, dec!(10), dec!(1000)).unwrap();
    assert_eq!(result.freight_cost, dec!(120));
    assert_eq!(result.taxes.icms, dec!(70));
    assert_eq!(result.taxes.total, dec!(70));
    assert_eq!(result.total_cost, dec!(190));
}

#[test]
fn test_destination_formula_freight_matches_evaluator() {
    let profile = DestinationTaxProfile::formula("weight * 0.85 + 12");
    let direct = evaluate("weight * 0.85 + 12", Variables::new(dec!(37), dec!(500))).unwrap();
    let result = calculate_destination_cost(&profile, dec!(37), dec!(500)).unwrap();
    assert_eq!(result.freight_cost, direct);
    assert_eq!(result.freight_cost, dec!(43.45));
}

// =============================================================================
// Absorption costing
// =============================================================================

#[test]
fn test_total_is_sum_of_components() {
    let mut input = cake_input(dec!(37), dec!(3.5));
    input.shipment = Some(Shipment {
        weight: dec!(55.5),
        value: dec!(1234.56),
    });
    let profile = DestinationTaxProfile {
        icms_percent: dec!(12),
        pis_percent: dec!(1.65),
        cofins_percent: dec!(7.6),
        ..DestinationTaxProfile::formula("weight * 1.15")
    };

    let result = calculate_cost(&input, &cake_bom(), &cake_labor(), &cake_overhead(), Some(&profile)).unwrap();
    let components = result.direct_cost_total
        + result.labor_cost_total
        + result.indirect_cost_total
        + result.freight_cost
        + result.tax_cost
        + result.wastage_value;
    assert_eq!(result.total_cost, components);
    assert!((result.unit_cost * dec!(37) - result.total_cost).abs() <= dec!(0.005) * dec!(37));
}

#[test]
fn test_calculation_is_idempotent() {
    let input = cake_input(dec!(12), dec!(2));
    let first = calculate_cost(&input, &cake_bom(), &cake_labor(), &cake_overhead(), None).unwrap();
    let second = calculate_cost(&input, &cake_bom(), &cake_labor(), &cake_overhead(), None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_wastage_boundaries() {
    let none = calculate_cost(&cake_input(dec!(10), dec!(0)), &cake_bom(), &cake_labor(), &[], None).unwrap();
    assert_eq!(none.wastage_value, Decimal::ZERO);

    let full = calculate_cost(&cake_input(dec!(10), dec!(100)), &cake_bom(), &cake_labor(), &[], None).unwrap();
    assert_eq!(full.wastage_value, full.direct_cost_total + full.labor_cost_total);

    let over = calculate_cost(&cake_input(dec!(10), dec!(100.01)), &cake_bom(), &cake_labor(), &[], None);
    assert!(matches!(over, Err(EngineError::InvalidInput(_))));
}

#[test]
fn test_zero_quantity_rejected() {
    let result = calculate_cost(&cake_input(Decimal::ZERO, dec!(0)), &cake_bom(), &cake_labor(), &[], None);
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[test]
fn test_margin_follows_unit_cost() {
    let result = calculate_cost(&cake_input(dec!(20), dec!(0)), &cake_bom(), &cake_labor(), &[], None).unwrap();
    // 9.4295 * 20 + 327.96
    assert_eq!(result.direct_cost_total, dec!(188.59));
    assert_eq!(result.total_cost, dec!(516.55));
    assert_eq!(result.unit_cost, dec!(25.83));
    assert_eq!(result.gross_margin, Some(dec!(9.17)));
    assert_eq!(result.gross_margin_percent, Some(dec!(26.2)));
}
