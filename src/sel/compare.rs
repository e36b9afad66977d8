//! Selection of comparisons.
//!
//! A literal operand moves into the condition as an immediate, mirroring
//! the comparison when the literal is on the left. Float comparisons have
//! no immediate form on this target.

use crate::expr::Expr;
use crate::op::{Comparison, Cond, Op};

/// Signed integer comparison.
pub fn comp(c: Comparison, e1: Expr, e2: Expr) -> Expr {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), e2) => {
            Expr::unop(Op::Cmp(Cond::Compimm(c.swap(), n)), e2)
        }
        (e1, Expr::Op(Op::Intconst(n), _)) => Expr::unop(Op::Cmp(Cond::Compimm(c, n)), e1),
        (e1, e2) => Expr::binop(Op::Cmp(Cond::Comp(c)), e1, e2),
    }
}

/// Unsigned integer comparison.
pub fn compu(c: Comparison, e1: Expr, e2: Expr) -> Expr {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), e2) => {
            Expr::unop(Op::Cmp(Cond::Compuimm(c.swap(), n as u32)), e2)
        }
        (e1, Expr::Op(Op::Intconst(n), _)) => {
            Expr::unop(Op::Cmp(Cond::Compuimm(c, n as u32)), e1)
        }
        (e1, e2) => Expr::binop(Op::Cmp(Cond::Compu(c)), e1, e2),
    }
}

/// Float comparison.
pub fn compf(c: Comparison, e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Cmp(Cond::Compf(c)), e1, e2)
}
