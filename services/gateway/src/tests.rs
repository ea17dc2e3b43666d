//! Tests for the analytics gateway
//!
//! Tests cover:
//! - Typed dispatch for each operation
//! - JSON request/response contract and error envelope
//! - Snapshot-store backed SKU costing
//! - Policy loading into the gateway

#[cfg(test)]
mod tests {
    use crate::*;
    use costing_service::{BomLine, CostCalculationInput, CostComponent, DestinationTaxProfile};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use scenario_service::ScenarioAdjustment;
    use serde_json::Value;
    use shared::{EngineError, EnginePolicy, Period};

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    fn margin(target: Decimal) -> ScenarioAdjustment {
        ScenarioAdjustment {
            target_margin_percent: target,
            ..ScenarioAdjustment::default()
        }
    }

    fn budget_entries_json() -> String {
        let actuals = ["\"1100\"", "\"900\"", "\"1000\""];
        let entries: Vec<String> = (1..=12)
            .map(|month| {
                let actual = actuals.get(month - 1).copied().unwrap_or("null");
                format!(r#"{{"month":{},"budgeted":"1000","actual":{}}}"#, month, actual)
            })
            .collect();
        format!("[{}]", entries.join(","))
    }

    // =============================================================================
    // Typed dispatch
    // =============================================================================

    #[test]
    fn test_dispatch_destination_cost() {
        let gateway = AnalyticsGateway::default();
        let profile = DestinationTaxProfile {
            icms_percent: dec!(7),
            ..DestinationTaxProfile::fixed(dec!(120))
        };
        let response = gateway
            .dispatch(AnalyticsRequest::CalculateDestinationCost {
                profile,
                weight: dec!(10),
                value: dec!(1000),
            })
            .unwrap();

        match response {
            AnalyticsResponse::DestinationCost(result) => {
                assert_eq!(result.freight_cost, dec!(120));
                assert_eq!(result.taxes.icms, dec!(70));
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_scenario_with_recommendation() {
        let gateway = AnalyticsGateway::default();
        let response = gateway
            .dispatch(AnalyticsRequest::SimulateScenario {
                base_cost: dec!(100),
                adjustment: margin(dec!(25)),
                cost_split: None,
                current_price: Some(dec!(140)),
            })
            .unwrap();

        let AnalyticsResponse::Scenario(outcome) = response else {
            panic!("expected scenario outcome");
        };
        assert_eq!(outcome.scenario.suggested_price, dec!(133.33));
        let recommendation = outcome.recommendation.unwrap();
        assert_eq!(recommendation.adjustment, dec!(-6.67));
    }

    #[test]
    fn test_dispatch_propagates_typed_error() {
        let gateway = AnalyticsGateway::default();
        let err = gateway
            .dispatch(AnalyticsRequest::SimulateScenario {
                base_cost: dec!(100),
                adjustment: margin(dec!(100)),
                cost_split: None,
                current_price: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    // =============================================================================
    // JSON contract
    // =============================================================================

    #[test]
    fn test_json_calculate_cost() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{
            "operation": "calculate_cost",
            "input": {"skuId": "PAO-001", "period": "2024-03", "quantityProduced": "10", "sellingPrice": "20"},
            "bomItems": [{"name": "flour", "unitCost": "4.00", "quantity": "0.5"}],
            "laborEntries": [{"name": "baker", "unitCost": "25", "quantity": "2"}],
            "indirectEntries": [{"description": "energy", "amount": "30", "period": "2024-03"}]
        }"#;

        let response = parse(&gateway.handle_json(body));
        assert_eq!(response["kind"], "cost");
        let result = &response["result"];
        assert_eq!(result["directCostTotal"], "20.00");
        assert_eq!(result["laborCostTotal"], "50.00");
        assert_eq!(result["indirectCostTotal"], "30.00");
        assert_eq!(result["totalCost"], "100.00");
        assert_eq!(result["unitCost"], "10.00");
        assert_eq!(result["grossMargin"], "10.00");
        assert_eq!(result["grossMarginPercent"], "50");
    }

    #[test]
    fn test_json_analyze_budget() {
        let gateway = AnalyticsGateway::default();
        let body = format!(
            r#"{{"operation":"analyze_budget","entries":{},"asOfMonth":2,"forecastOverrides":[{{"month":12,"amount":"2000"}}]}}"#,
            budget_entries_json()
        );

        let response = parse(&gateway.handle_json(&body));
        assert_eq!(response["kind"], "budget");
        assert_eq!(response["result"]["burnRatePercent"], "100");
        assert_eq!(response["result"]["adherencePercent"], "100");
        assert_eq!(response["result"]["forecastYearEnd"], "13000.00");
    }

    #[test]
    fn test_json_duplicate_override_rejected() {
        let gateway = AnalyticsGateway::default();
        let body = format!(
            r#"{{"operation":"analyze_budget","entries":{},"asOfMonth":2,"forecastOverrides":[{{"month":12,"amount":"1"}},{{"month":12,"amount":"2"}}]}}"#,
            budget_entries_json()
        );
        let response = parse(&gateway.handle_json(&body));
        assert_eq!(response["error"]["kind"], "INVALID_INPUT");
    }

    #[test]
    fn test_json_consolidated_budget() {
        let gateway = AnalyticsGateway::default();
        let body = format!(
            r#"{{"operation":"analyze_consolidated_budget","lines":[{{"name":"a","entries":{e}}},{{"name":"b","entries":{e}}}],"asOfMonth":2}}"#,
            e = budget_entries_json()
        );
        let response = parse(&gateway.handle_json(&body));
        assert_eq!(response["result"]["annualBudget"], "24000.00");
        assert_eq!(response["result"]["actualToDate"], "6000.00");
    }

    #[test]
    fn test_json_scenario() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{"operation":"simulate_scenario","baseCost":"100","adjustment":{"targetMarginPercent":"25"},"costSplit":{"material_pct":"0.6","labor_pct":"0.25","indirect_pct":"0.15"}}"#;
        let response = parse(&gateway.handle_json(body));
        assert_eq!(response["kind"], "scenario");
        assert_eq!(response["result"]["scenario"]["simulatedCost"], "100.00");
        assert_eq!(response["result"]["scenario"]["suggestedPrice"], "133.33");
        assert!(response["result"]["recommendation"].is_null());
    }

    #[test]
    fn test_json_error_envelope() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{"operation":"calculate_destination_cost","profile":{"freightType":"formula"},"weight":"1","value":"1"}"#;
        let response = parse(&gateway.handle_json(body));
        assert_eq!(response["error"]["kind"], "MISSING_FORMULA");
        assert!(response["error"]["message"].as_str().unwrap().contains("formula"));
    }

    #[test]
    fn test_json_invalid_formula() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{"operation":"calculate_destination_cost","profile":{"freightType":"formula","freightFormula":"exec(weight)"},"weight":"1","value":"1"}"#;
        let response = parse(&gateway.handle_json(body));
        assert_eq!(response["error"]["kind"], "INVALID_FORMULA");
    }

    #[test]
    fn test_json_overflow_returns_envelope() {
        let gateway = AnalyticsGateway::default();
        let bodies = [
            r#"{"operation":"calculate_cost","input":{"skuId":"X","period":"2024-03","quantityProduced":"1","sellingPrice":"1000000000000000000000000000"},"bomItems":[{"name":"flour","unitCost":"4.00","quantity":"0.5"}]}"#,
            r#"{"operation":"simulate_scenario","baseCost":"1000000","adjustment":{"targetMarginPercent":"99.999999999999999999999999"}}"#,
            r#"{"operation":"calculate_destination_cost","profile":{"freightType":"fixed","freightFixedValue":"1","icmsPercent":"50"},"weight":"0","value":"79228162514264337593543950335"}"#,
        ];
        for body in bodies {
            let response = parse(&gateway.handle_json(body));
            assert_eq!(response["error"]["kind"], "INVALID_INPUT", "body: {}", body);
            assert!(response["error"]["message"].as_str().unwrap().contains("overflows"));
        }
    }

    #[test]
    fn test_json_oversized_formula_returns_envelope() {
        let gateway = AnalyticsGateway::default();
        let chain = vec!["weight"; 20_000].join("+");
        let body = format!(
            r#"{{"operation":"calculate_destination_cost","profile":{{"freightType":"formula","freightFormula":"{}"}},"weight":"1","value":"1"}}"#,
            chain
        );
        let response = parse(&gateway.handle_json(&body));
        assert_eq!(response["error"]["kind"], "INVALID_FORMULA");
    }

    #[test]
    fn test_json_malformed_request() {
        let gateway = AnalyticsGateway::default();
        for body in ["not json", r#"{"operation":"launch_rockets"}"#, r#"{"operation":"analyze_budget"}"#] {
            let response = parse(&gateway.handle_json(body));
            assert_eq!(response["error"]["kind"], "INVALID_INPUT", "body: {}", body);
        }
    }

    #[test]
    fn test_json_response_round_trips() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{"operation":"calculate_destination_cost","profile":{"freightType":"fixed","freightFixedValue":"120","icmsPercent":"7"},"weight":"0","value":"1000"}"#;
        let raw = gateway.handle_json(body);
        let response: AnalyticsResponse = serde_json::from_str(&raw).unwrap();
        let AnalyticsResponse::DestinationCost(result) = response else {
            panic!("expected destination cost");
        };
        assert_eq!(result.total_cost, dec!(190.00));
    }

    // =============================================================================
    // Snapshot store
    // =============================================================================

    #[test]
    fn test_sku_cost_from_store() {
        let gateway = AnalyticsGateway::default();
        let period: Period = "2024-05".parse().unwrap();
        gateway.store().put_item_cost("cocoa", dec!(12));
        gateway.store().put_bom("BOLO-010", vec![BomLine::new("cocoa", dec!(0.25))]);
        gateway
            .store()
            .put_labor(period, vec![CostComponent::new("confectioner", dec!(30), dec!(10))]);

        let input = CostCalculationInput::new("BOLO-010", period, dec!(40));
        let response = gateway
            .dispatch(AnalyticsRequest::CalculateSkuCost { input })
            .unwrap();
        let AnalyticsResponse::Cost(result) = response else {
            panic!("expected cost");
        };
        assert_eq!(result.direct_cost_total, dec!(120.00));
        assert_eq!(result.labor_cost_total, dec!(300.00));
        assert_eq!(result.unit_cost, dec!(10.50));
    }

    #[test]
    fn test_sku_cost_unknown_sku_json() {
        let gateway = AnalyticsGateway::default();
        let body = r#"{"operation":"calculate_sku_cost","input":{"skuId":"NOPE","period":"2024-05","quantityProduced":"1"}}"#;
        let response = parse(&gateway.handle_json(body));
        assert_eq!(response["error"]["kind"], "NOT_FOUND");
    }

    // =============================================================================
    // Policy
    // =============================================================================

    #[test]
    fn test_gateway_uses_policy_band() {
        let gateway = AnalyticsGateway::new(EnginePolicy {
            adherence_band: dec!(0.05),
            ..EnginePolicy::default()
        });
        let body = format!(
            r#"{{"operation":"analyze_budget","entries":{},"asOfMonth":2}}"#,
            budget_entries_json()
        );
        let response = parse(&gateway.handle_json(&body));
        // 1100 and 900 fall outside a 5% band
        assert_eq!(response["result"]["adherentMonths"], 1);
    }

    #[test]
    fn test_gateway_from_missing_config_file() {
        let missing = std::path::Path::new("/nonexistent/costing-policy.toml");
        assert!(AnalyticsGateway::from_config(Some(missing)).is_err());
    }
}
