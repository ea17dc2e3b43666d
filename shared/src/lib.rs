pub mod config;
pub mod error;
pub mod logger;
pub mod types;


pub use config::{CostSplit, EnginePolicy, ForecastPolicy};
pub use error::{EngineError, EngineResult};
pub use types::{money, percent, Period};
