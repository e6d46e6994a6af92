use crate::engines::generation::codec::scale_factor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of values for reference operands
pub trait ReferenceResolver {
    fn resolve(&self, index: u8) -> f64;
}

/// A feature row resolves references by column, wrapping around the row width.
impl ReferenceResolver for [f64] {
    fn resolve(&self, index: u8) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self[index as usize % self.len()]
    }
}

impl ReferenceResolver for Vec<f64> {
    fn resolve(&self, index: u8) -> f64 {
        self.as_slice().resolve(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// 7-bit constant, 0..=127
    Literal(u8),
    /// 7-bit column index into the current feature row
    Reference(u8),
}

/// An operand with its optional scale magnitude (raw 7-bit value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub operand: Operand,
    pub scale: Option<u8>,
}

impl Term {
    pub fn value<R: ReferenceResolver + ?Sized>(&self, resolver: &R) -> f64 {
        let base = match self.operand {
            Operand::Literal(value) => f64::from(value),
            Operand::Reference(index) => resolver.resolve(index),
        };
        match self.scale {
            Some(raw) => base * scale_factor(u32::from(raw)),
            None => base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
}

impl Operator {
    /// Maps the 2-bit selector; order is part of the gene format.
    pub fn from_code(code: u32) -> Self {
        match code & 0b11 {
            0 => Operator::Eq,
            1 => Operator::Ne,
            2 => Operator::Gt,
            _ => Operator::Lt,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Operator::Eq => 0,
            Operator::Ne => 1,
            Operator::Gt => 2,
            Operator::Lt => 3,
        }
    }

    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Gt => left > right,
            Operator::Lt => left < right,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    Or,
    And,
}

impl Combinator {
    pub fn from_bit(bit: u32) -> Self {
        if bit & 1 == 1 {
            Combinator::And
        } else {
            Combinator::Or
        }
    }

    pub fn bit(self) -> u32 {
        match self {
            Combinator::Or => 0,
            Combinator::And => 1,
        }
    }
}

/// Decoded boolean expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(bool),
    Compare {
        left: Term,
        op: Operator,
        right: Term,
    },
    Combine {
        op: Combinator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates the whole tree. Both sides of every `Combine` are always
    /// evaluated, left before right, so every reference is read in clause order.
    pub fn evaluate<R: ReferenceResolver + ?Sized>(&self, resolver: &R) -> bool {
        match self {
            Expr::Literal(value) => *value,
            Expr::Compare { left, op, right } => {
                let left = left.value(resolver);
                let right = right.value(resolver);
                op.apply(left, right)
            }
            Expr::Combine { op, lhs, rhs } => {
                let lhs = lhs.evaluate(resolver);
                let rhs = rhs.evaluate(resolver);
                match op {
                    Combinator::And => lhs & rhs,
                    Combinator::Or => lhs | rhs,
                }
            }
        }
    }

    /// Joins comparisons with their trailing combinators. AND binds tighter
    /// than OR; both associate to the left. The last combinator is unused.
    pub fn join(clauses: Vec<(Expr, Combinator)>) -> Expr {
        let mut disjuncts: Vec<Expr> = Vec::new();
        let mut conjunction: Option<Expr> = None;
        let mut pending = Combinator::Or;

        for (expr, combinator) in clauses {
            conjunction = Some(match (conjunction.take(), pending) {
                (Some(acc), Combinator::And) => Expr::Combine {
                    op: Combinator::And,
                    lhs: Box::new(acc),
                    rhs: Box::new(expr),
                },
                (Some(acc), Combinator::Or) => {
                    disjuncts.push(acc);
                    expr
                }
                (None, _) => expr,
            });
            pending = combinator;
        }
        disjuncts.extend(conjunction);

        disjuncts
            .into_iter()
            .reduce(|lhs, rhs| Expr::Combine {
                op: Combinator::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
            .unwrap_or(Expr::Literal(false))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Literal(value) => write!(f, "{}", value)?,
            Operand::Reference(index) => write!(f, "row[{}]", index)?,
        }
        if let Some(raw) = self.scale {
            write!(f, "*{:.4}", scale_factor(u32::from(raw)))?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Compare { left, op, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Combine { op, lhs, rhs } => {
                let joiner = match op {
                    Combinator::And => "&",
                    Combinator::Or => "|",
                };
                write!(f, "{} {} {}", lhs, joiner, rhs)
            }
        }
    }
}

/// A decoded gene: when-to-act expression plus its stop-loss ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRule {
    pub expr: Expr,
    pub stop_loss: f64,
}

impl DecisionRule {
    pub fn evaluate<R: ReferenceResolver + ?Sized>(&self, resolver: &R) -> bool {
        self.expr.evaluate(resolver)
    }

    pub fn is_constant_false(&self) -> bool {
        self.expr == Expr::Literal(false)
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [stop-loss {:.2}]", self.expr, self.stop_loss)
    }
}
