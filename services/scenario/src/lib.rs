pub mod simulator;


pub use simulator::{
    recommend_price_adjustment, simulate, PriceAction, PriceRecommendation, ScenarioAdjustment, ScenarioResult,
    ScenarioSimulator,
};
