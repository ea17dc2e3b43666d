use budget_service::{
    collect_overrides, consolidate, BudgetAnalysis, BudgetAnalyzer, BudgetLine, BudgetMonthEntry, ForecastOverrides,
    MonthForecast,
};
use costing_service::{
    calculate_cost, calculate_destination_cost, CostCalculationInput, CostCalculationResult, CostComponent,
    CostSnapshotStore, DestinationCostResult, DestinationTaxProfile, IndirectCostEntry,
};
use rust_decimal::Decimal;
use scenario_service::{
    recommend_price_adjustment, PriceRecommendation, ScenarioAdjustment, ScenarioResult, ScenarioSimulator,
};
use serde::{Deserialize, Serialize};
use shared::{CostSplit, EngineError, EngineResult, EnginePolicy};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AnalyticsRequest {
    CalculateCost {
        input: CostCalculationInput,
        #[serde(default)]
        bom_items: Vec<CostComponent>,
        #[serde(default)]
        labor_entries: Vec<CostComponent>,
        #[serde(default)]
        indirect_entries: Vec<IndirectCostEntry>,
        #[serde(default)]
        destination: Option<DestinationTaxProfile>,
    },
    /// Cost a SKU from the gateway's snapshot store
    CalculateSkuCost {
        input: CostCalculationInput,
    },
    CalculateDestinationCost {
        profile: DestinationTaxProfile,
        weight: Decimal,
        value: Decimal,
    },
    AnalyzeBudget {
        entries: Vec<BudgetMonthEntry>,
        as_of_month: u8,
        #[serde(default)]
        forecast_overrides: Vec<MonthForecast>,
    },
    AnalyzeConsolidatedBudget {
        lines: Vec<BudgetLine>,
        as_of_month: u8,
        #[serde(default)]
        forecast_overrides: Vec<MonthForecast>,
    },
    SimulateScenario {
        base_cost: Decimal,
        #[serde(default)]
        adjustment: ScenarioAdjustment,
        #[serde(default)]
        cost_split: Option<CostSplit>,
        #[serde(default)]
        current_price: Option<Decimal>,
    },
}

impl AnalyticsRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CalculateCost { .. } => "calculate_cost",
            Self::CalculateSkuCost { .. } => "calculate_sku_cost",
            Self::CalculateDestinationCost { .. } => "calculate_destination_cost",
            Self::AnalyzeBudget { .. } => "analyze_budget",
            Self::AnalyzeConsolidatedBudget { .. } => "analyze_consolidated_budget",
            Self::SimulateScenario { .. } => "simulate_scenario",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub scenario: ScenarioResult,
    pub recommendation: Option<PriceRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum AnalyticsResponse {
    Cost(CostCalculationResult),
    DestinationCost(DestinationCostResult),
    Budget(BudgetAnalysis),
    Scenario(ScenarioOutcome),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

/// Stateless apart from the read-mostly snapshot store; share it behind an
/// `Arc` across callers.
pub struct AnalyticsGateway {
    store: Arc<CostSnapshotStore>,
    budget: BudgetAnalyzer,
    scenario: ScenarioSimulator,
}

impl Default for AnalyticsGateway {
    fn default() -> Self {
        Self::new(EnginePolicy::default())
    }
}

impl AnalyticsGateway {
    pub fn new(policy: EnginePolicy) -> Self {
        Self::with_store(policy, Arc::new(CostSnapshotStore::new()))
    }

    pub fn with_store(policy: EnginePolicy, store: Arc<CostSnapshotStore>) -> Self {
        Self {
            store,
            budget: BudgetAnalyzer::new(policy.clone()),
            scenario: ScenarioSimulator::new(policy),
        }
    }

    /// Build from a policy file plus `COSTING__*` overrides.
    pub fn from_config(path: Option<&Path>) -> anyhow::Result<Self> {
        Ok(Self::new(EnginePolicy::load(path)?))
    }

    pub fn store(&self) -> &Arc<CostSnapshotStore> {
        &self.store
    }

    pub fn calculate_cost(
        &self,
        input: &CostCalculationInput,
        bom_items: &[CostComponent],
        labor_entries: &[CostComponent],
        indirect_entries: &[IndirectCostEntry],
        destination: Option<&DestinationTaxProfile>,
    ) -> EngineResult<CostCalculationResult> {
        calculate_cost(input, bom_items, labor_entries, indirect_entries, destination)
    }

    pub fn calculate_destination_cost(
        &self,
        profile: &DestinationTaxProfile,
        weight: Decimal,
        value: Decimal,
    ) -> EngineResult<DestinationCostResult> {
        calculate_destination_cost(profile, weight, value)
    }

    pub fn analyze_budget(
        &self,
        entries: &[BudgetMonthEntry],
        as_of_month: u8,
        overrides: &ForecastOverrides,
    ) -> EngineResult<BudgetAnalysis> {
        self.budget.analyze(entries, as_of_month, overrides)
    }

    pub fn simulate_scenario(
        &self,
        base_cost: Decimal,
        adjustment: &ScenarioAdjustment,
        cost_split: Option<CostSplit>,
    ) -> EngineResult<ScenarioResult> {
        self.scenario.simulate(base_cost, adjustment, cost_split)
    }

    pub fn dispatch(&self, request: AnalyticsRequest) -> EngineResult<AnalyticsResponse> {
        let operation = request.operation();
        let outcome = self.route(request);

        match &outcome {
            Ok(_) => info!(operation, "Analytics request completed"),
            Err(e) => info!(operation, kind = e.kind(), "Analytics request rejected"),
        }
        outcome
    }

    fn route(&self, request: AnalyticsRequest) -> EngineResult<AnalyticsResponse> {
        match request {
            AnalyticsRequest::CalculateCost {
                input,
                bom_items,
                labor_entries,
                indirect_entries,
                destination,
            } => self
                .calculate_cost(&input, &bom_items, &labor_entries, &indirect_entries, destination.as_ref())
                .map(AnalyticsResponse::Cost),
            AnalyticsRequest::CalculateSkuCost { input } => {
                self.store.calculate_for_sku(&input).map(AnalyticsResponse::Cost)
            }
            AnalyticsRequest::CalculateDestinationCost { profile, weight, value } => self
                .calculate_destination_cost(&profile, weight, value)
                .map(AnalyticsResponse::DestinationCost),
            AnalyticsRequest::AnalyzeBudget {
                entries,
                as_of_month,
                forecast_overrides,
            } => {
                let overrides = collect_overrides(&forecast_overrides)?;
                self.analyze_budget(&entries, as_of_month, &overrides)
                    .map(AnalyticsResponse::Budget)
            }
            AnalyticsRequest::AnalyzeConsolidatedBudget {
                lines,
                as_of_month,
                forecast_overrides,
            } => {
                let entries = consolidate(&lines)?;
                let overrides = collect_overrides(&forecast_overrides)?;
                self.analyze_budget(&entries, as_of_month, &overrides)
                    .map(AnalyticsResponse::Budget)
            }
            AnalyticsRequest::SimulateScenario {
                base_cost,
                adjustment,
                cost_split,
                current_price,
            } => {
                let scenario = self.simulate_scenario(base_cost, &adjustment, cost_split)?;
                let recommendation = match current_price {
                    Some(price) => Some(recommend_price_adjustment(&scenario, price)?),
                    None => None,
                };
                Ok(AnalyticsResponse::Scenario(ScenarioOutcome {
                    scenario,
                    recommendation,
                }))
            }
        }
    }

    /// JSON in, JSON out. Failures become `{"error": {"kind", "message"}}`.
    pub fn handle_json(&self, body: &str) -> String {
        let outcome = serde_json::from_str::<AnalyticsRequest>(body)
            .map_err(|e| EngineError::invalid_input(format!("malformed request: {}", e)))
            .and_then(|request| self.dispatch(request));

        let encoded = match &outcome {
            Ok(response) => serde_json::to_string(response),
            Err(e) => serde_json::to_string(&ErrorEnvelope {
                error: ErrorBody {
                    kind: e.kind(),
                    message: e.to_string(),
                },
            }),
        };
        encoded.unwrap_or_else(|e| {
            format!(
                "{{\"error\":{{\"kind\":\"INTERNAL\",\"message\":\"response encoding failed: {}\"}}}}",
                e.to_string().replace('"', "'")
            )
        })
    }
}
