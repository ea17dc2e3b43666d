use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{EngineError, EngineResult};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Weight,
    Value,
}

impl Variable {
    /// Identifiers are matched case-insensitively.
    pub fn from_identifier(ident: &str) -> Option<Self> {
        if ident.eq_ignore_ascii_case("weight") {
            Some(Self::Weight)
        } else if ident.eq_ignore_ascii_case("value") {
            Some(Self::Value)
        } else {
            None
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight => write!(f, "weight"),
            Self::Value => write!(f, "value"),
        }
    }
}

/// Bindings for the two formula variables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variables {
    pub weight: Decimal,
    pub value: Decimal,
}

impl Variables {
    pub fn new(weight: Decimal, value: Decimal) -> Self {
        Self { weight, value }
    }

    pub fn get(&self, variable: Variable) -> Decimal {
        match variable {
            Variable::Weight => self.weight,
            Variable::Value => self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    Variable(Variable),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluate with exact decimal arithmetic. No intermediate rounding.
    pub fn eval(&self, variables: &Variables) -> EngineResult<Decimal> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Variable(v) => Ok(variables.get(*v)),
            Self::Neg(inner) => Ok(-inner.eval(variables)?),
            Self::Binary { op, lhs, rhs } => {
                let l = lhs.eval(variables)?;
                let r = rhs.eval(variables)?;
                let result = match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    BinaryOp::Div => {
                        if r.is_zero() {
                            return Err(EngineError::invalid_formula("division by zero"));
                        }
                        l.checked_div(r)
                    }
                };
                result.ok_or_else(|| {
                    EngineError::invalid_formula(format!("arithmetic overflow in '{} {} {}'", l, op, r))
                })
            }
        }
    }

    pub(crate) fn collect_variables(&self, out: &mut std::collections::BTreeSet<Variable>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(v) => {
                out.insert(*v);
            }
            Self::Neg(inner) => inner.collect_variables(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}
