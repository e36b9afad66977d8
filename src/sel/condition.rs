//! Boolean-condition extraction.
//!
//! Turns a boolean-ish expression into a target condition plus its argument
//! expressions, for direct use by a branch or condition-set instruction.
//! A materialized comparison is reused as-is; a masked operand becomes a
//! mask test; anything else is tested against zero.

use crate::expr::Expr;
use crate::op::{Comparison, Cond, Op};

/// Split an expression into a condition and its arguments such that
/// evaluating the condition yields exactly the expression's boolean
/// interpretation.
pub fn condition(e: Expr) -> (Cond, Vec<Expr>) {
    match e {
        Expr::Op(Op::Cmp(c), args) => (c, args),
        Expr::Op(Op::Andimm(m), args) if args.len() == 1 => (Cond::Masknotzero(m), args),
        e => (Cond::Compimm(Comparison::Ne, 0), vec![e]),
    }
}
