//! Bit layout of a gene record and the decoder that turns genes into rules.
//!
//! One record (40 bits):
//!
//! | bits | field                                         |
//! |------|-----------------------------------------------|
//! | 1    | enable                                        |
//! | 8    | left operand: 1 reference flag + 7-bit value  |
//! | 8    | left scale: 1 enable flag + 7-bit magnitude   |
//! | 2    | operator (`==`, `!=`, `>`, `<`)               |
//! | 8    | right operand                                 |
//! | 8    | right scale                                   |
//! | 1    | combinator joining the next clause (`|`, `&`) |
//! | 4    | stop-loss selector                            |

use crate::engines::generation::genome::Gene;
use crate::engines::generation::rule::{Combinator, DecisionRule, Expr, Operand, Operator, Term};

pub const ENABLE_WIDTH: usize = 1;
pub const OPERAND_WIDTH: usize = 8;
pub const SCALE_WIDTH: usize = 8;
pub const OPERATOR_WIDTH: usize = 2;
pub const COMBINATOR_WIDTH: usize = 1;
pub const STOP_LOSS_WIDTH: usize = 4;

pub const RECORD_WIDTH: usize = ENABLE_WIDTH
    + OPERAND_WIDTH
    + SCALE_WIDTH
    + OPERATOR_WIDTH
    + OPERAND_WIDTH
    + SCALE_WIDTH
    + COMBINATOR_WIDTH
    + STOP_LOSS_WIDTH;

const SCALE_CENTER: f64 = 63.5;
const VALUE_MASK: u32 = 0x7f;
const FLAG_BIT: u32 = 0x80;

/// Maps a 7-bit scale magnitude onto [-1.0, 1.0]
pub fn scale_factor(raw: u32) -> f64 {
    (f64::from(raw) - SCALE_CENTER) / SCALE_CENTER
}

pub fn stop_loss_ratio(raw: u32) -> f64 {
    1.0 - f64::from(raw) / 100.0
}

/// One enabled record, with field values as stored in the gene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause {
    pub left: Term,
    pub operator: Operator,
    pub right: Term,
    pub combinator: Combinator,
    pub stop_loss_raw: u8,
}

impl Clause {
    pub fn stop_loss(&self) -> f64 {
        stop_loss_ratio(u32::from(self.stop_loss_raw))
    }

    fn comparison(&self) -> Expr {
        Expr::Compare {
            left: self.left,
            op: self.operator,
            right: self.right,
        }
    }
}

struct Cursor<'a> {
    gene: &'a Gene,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, width: usize) -> u32 {
        let value = self.gene.read_uint(self.position, width);
        self.position += width;
        value
    }

    fn remaining(&self) -> usize {
        self.gene.len().saturating_sub(self.position)
    }

    fn operand(&mut self) -> Operand {
        let field = self.take(OPERAND_WIDTH);
        let value = (field & VALUE_MASK) as u8;
        if (field & FLAG_BIT) != 0 {
            Operand::Reference(value)
        } else {
            Operand::Literal(value)
        }
    }

    fn scale(&mut self) -> Option<u8> {
        let field = self.take(SCALE_WIDTH);
        ((field & FLAG_BIT) != 0).then_some((field & VALUE_MASK) as u8)
    }
}

/// Enabled clauses of a gene, in order. Disabled records are skipped; an
/// enabled record cut short by the end of the gene ends decoding.
pub fn decode_clauses(gene: &Gene) -> Vec<Clause> {
    let mut cursor = Cursor { gene, position: 0 };
    let mut clauses = Vec::with_capacity(gene.record_count());

    while cursor.remaining() >= 2 {
        let enabled = cursor.take(ENABLE_WIDTH) == 1;
        if !enabled {
            cursor.position += RECORD_WIDTH - ENABLE_WIDTH;
            continue;
        }
        if cursor.remaining() < RECORD_WIDTH - ENABLE_WIDTH {
            break;
        }

        let left_operand = cursor.operand();
        let left_scale = cursor.scale();
        let operator = Operator::from_code(cursor.take(OPERATOR_WIDTH));
        let right_operand = cursor.operand();
        let right_scale = cursor.scale();
        let combinator = Combinator::from_bit(cursor.take(COMBINATOR_WIDTH));
        let stop_loss_raw = cursor.take(STOP_LOSS_WIDTH) as u8;

        clauses.push(Clause {
            left: Term {
                operand: left_operand,
                scale: left_scale,
            },
            operator,
            right: Term {
                operand: right_operand,
                scale: right_scale,
            },
            combinator,
            stop_loss_raw,
        });
    }

    clauses
}

/// Decode a gene into its rule. Total: every bit pattern yields a rule.
pub fn decode(gene: &Gene) -> DecisionRule {
    let clauses = decode_clauses(gene);
    let stop_loss = clauses.last().map(Clause::stop_loss).unwrap_or(1.0);
    let expr = Expr::join(clauses.iter().map(|c| (c.comparison(), c.combinator)).collect());
    DecisionRule { expr, stop_loss }
}

/// Encode clauses as enabled records. Inverse of [`decode_clauses`] for
/// genes without disabled records.
pub fn encode(clauses: &[Clause]) -> Gene {
    let mut bits = Vec::with_capacity(clauses.len() * RECORD_WIDTH);
    let mut push = |value: u32, width: usize| {
        for shift in (0..width).rev() {
            bits.push((value >> shift) & 1 == 1);
        }
    };

    for clause in clauses {
        push(1, ENABLE_WIDTH);
        for (term, is_left) in [(clause.left, true), (clause.right, false)] {
            let operand = match term.operand {
                Operand::Literal(v) => u32::from(v) & VALUE_MASK,
                Operand::Reference(i) => FLAG_BIT | (u32::from(i) & VALUE_MASK),
            };
            let scale = term
                .scale
                .map(|raw| FLAG_BIT | (u32::from(raw) & VALUE_MASK))
                .unwrap_or(0);
            push(operand, OPERAND_WIDTH);
            push(scale, SCALE_WIDTH);
            if is_left {
                push(clause.operator.code(), OPERATOR_WIDTH);
            }
        }
        push(clause.combinator.bit(), COMBINATOR_WIDTH);
        push(u32::from(clause.stop_loss_raw), STOP_LOSS_WIDTH);
    }

    Gene::from_bits(bits)
}
