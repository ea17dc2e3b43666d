//! Formula parsing using pest

use crate::ast::{BinaryOp, Expr, Variable, Variables};
use pest::error::{InputLocation, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use rust_decimal::Decimal;
use shared::{EngineError, EngineResult};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::trace;

/// Longest accepted formula, in characters. Bounds tree size and recursion.
pub const MAX_FORMULA_LENGTH: usize = 1024;

/// Parenthesis nesting limit
pub const MAX_DEPTH: usize = 64;

#[derive(Parser)]
#[grammar = "formula.pest"]
struct FormulaGrammar;

/// A parsed formula, reusable across evaluations
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> EngineResult<Self> {
        if source.trim().is_empty() {
            return Err(EngineError::invalid_formula("formula is empty"));
        }
        check_shape(source)?;

        let mut pairs = FormulaGrammar::parse(Rule::formula, source).map_err(syntax_error)?;
        let expr = pairs
            .next()
            .and_then(|formula| formula.into_inner().find(|pair| pair.as_rule() == Rule::expr))
            .ok_or_else(|| EngineError::invalid_formula("formula is empty"))?;
        let root = build(expr.into_inner(), &operators())?;

        trace!(formula = %source, "Formula parsed");
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.root
    }

    /// Variables the formula references
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.root.collect_variables(&mut out);
        out
    }

    /// Unrounded result; callers round at their own result boundary.
    pub fn evaluate(&self, variables: &Variables) -> EngineResult<Decimal> {
        self.root.eval(variables)
    }
}

/// Length, paren balance and nesting are checked before the grammar runs.
fn check_shape(source: &str) -> EngineResult<()> {
    let length = source.chars().count();
    if length > MAX_FORMULA_LENGTH {
        return Err(EngineError::invalid_formula(format!(
            "formula is {} characters long, limit is {}",
            length, MAX_FORMULA_LENGTH
        )));
    }

    let mut open = Vec::new();
    for (position, c) in source.char_indices() {
        match c {
            '(' => {
                open.push(position);
                if open.len() > MAX_DEPTH {
                    return Err(EngineError::invalid_formula("expression is nested too deeply"));
                }
            }
            ')' => {
                if open.pop().is_none() {
                    return Err(EngineError::invalid_formula(format!(
                        "unbalanced parentheses: unexpected ')' at position {}",
                        position
                    )));
                }
            }
            _ => {}
        }
    }

    match open.last() {
        Some(position) => Err(EngineError::invalid_formula(format!(
            "unbalanced parentheses: '(' at position {} is never closed",
            position
        ))),
        None => Ok(()),
    }
}

fn syntax_error(error: pest::error::Error<Rule>) -> EngineError {
    let (line, column) = match error.line_col {
        LineColLocation::Pos((line, col)) => (line, col),
        LineColLocation::Span((line, col), _) => (line, col),
    };
    let position = match error.location {
        InputLocation::Pos(position) => position,
        InputLocation::Span((start, _)) => start,
    };
    EngineError::invalid_formula(format!(
        "unexpected input at line {}, column {} (position {})",
        line, column, position
    ))
}

// Later entries bind tighter: unary over `* /` over `+ -`
fn operators() -> PrattParser<Rule> {
    PrattParser::new()
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
}

fn build(pairs: Pairs<'_, Rule>, pratt: &PrattParser<Rule>) -> EngineResult<Expr> {
    pratt
        .map_primary(|operand| build_operand(operand, pratt))
        .map_prefix(|op, operand| {
            let operand = operand?;
            match op.as_rule() {
                Rule::neg => Ok(Expr::Neg(Box::new(operand))),
                _ => Ok(operand),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                other => {
                    return Err(EngineError::invalid_formula(format!(
                        "unexpected operator {:?} at position {}",
                        other,
                        op.as_span().start()
                    )))
                }
            };
            Ok(Expr::binary(op, lhs?, rhs?))
        })
        .parse(pairs)
}

fn build_operand(pair: Pair<'_, Rule>, pratt: &PrattParser<Rule>) -> EngineResult<Expr> {
    let position = pair.as_span().start();
    match pair.as_rule() {
        Rule::expr => build(pair.into_inner(), pratt),
        Rule::number => parse_literal(pair.as_str(), position).map(Expr::Number),
        Rule::identifier => Variable::from_identifier(pair.as_str())
            .map(Expr::Variable)
            .ok_or_else(|| {
                EngineError::invalid_formula(format!(
                    "unknown identifier '{}' at position {}",
                    pair.as_str(),
                    position
                ))
            }),
        Rule::call => {
            let name = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
            Err(EngineError::invalid_formula(format!(
                "function calls are not allowed: '{}' at position {}",
                name, position
            )))
        }
        other => Err(EngineError::invalid_formula(format!(
            "unexpected {:?} at position {}",
            other, position
        ))),
    }
}

// `.5` and `10.` are accepted literal forms
fn parse_literal(text: &str, position: usize) -> EngineResult<Decimal> {
    let trimmed = text.strip_suffix('.').unwrap_or(text);
    let normalized = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };
    Decimal::from_str(&normalized).map_err(|_| {
        EngineError::invalid_formula(format!("invalid number '{}' at position {}", text, position))
    })
}
