//! Freight/tax formula evaluation.
//!
//! A formula is a single arithmetic expression over `weight` and `value`
//! (case-insensitive) using `+ - * /`, parentheses and decimal literals. The
//! `formula.pest` grammar parses it into an [`Expr`] tree, which is evaluated
//! with checked decimal arithmetic; nothing is ever executed dynamically.
//! Formulas are capped at [`parser::MAX_FORMULA_LENGTH`] characters and
//! [`parser::MAX_DEPTH`] levels of parentheses.

pub mod ast;
pub mod parser;


pub use ast::{BinaryOp, Expr, Variable, Variables};
pub use parser::Formula;

use rust_decimal::Decimal;
use shared::{money, EngineResult};

/// Parse and evaluate `formula`, rounding the result to currency precision.
pub fn evaluate(formula: &str, variables: Variables) -> EngineResult<Decimal> {
    let parsed = Formula::parse(formula)?;
    parsed.evaluate(&variables).map(money)
}
