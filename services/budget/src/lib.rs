pub mod analyzer;
pub mod model;


pub use analyzer::{analyze, consolidate, BudgetAnalyzer};
pub use model::{
    collect_overrides, BudgetAnalysis, BudgetLine, BudgetMonthEntry, ForecastOverrides, MonthForecast, MonthVariance,
    MONTHS_PER_YEAR,
};
