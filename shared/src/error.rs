//! Error taxonomy shared by every calculator

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller-supplied quantity or percentage outside its documented domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unparseable or unsafe freight/tax formula
    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    /// Formula-mode destination configured without a formula
    #[error("Missing formula: {0}")]
    MissingFormula(String),

    /// Cost split not summing to 1.0, target margin >= 100%, bad policy file
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Only produced internally; public operations substitute their documented default
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Raised by snapshot lookups for unknown SKUs, items or destinations
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl EngineError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn invalid_formula(reason: impl Into<String>) -> Self {
        Self::InvalidFormula(reason.into())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable code for error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidFormula(_) => "INVALID_FORMULA",
            Self::MissingFormula(_) => "MISSING_FORMULA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::DivisionByZero(_) => "DIVISION_BY_ZERO",
            Self::NotFound { .. } => "NOT_FOUND",
        }
    }
}
