//! Selection of division and modulo.
//!
//! Unsigned division and modulo by a power-of-two literal reduce to a shift
//! and a mask. Modulo otherwise reduces to `x - (x / y) * y` through a
//! shared helper that binds both operands once, so each operand expression
//! is evaluated a single time.
//!
//! These combinators are only invoked when the generic operation is defined
//! (nonzero divisor, no signed-overflow case); the caller establishes that
//! before selection.

use crate::expr::Expr;
use crate::op::Op;
use crate::sel::logic::andimm;
use crate::sel::shift::shruimm;

/// `Some(k)` when the bit pattern of `n` is exactly `2^k`.
fn power_of_two(n: i32) -> Option<i32> {
    let u = n as u32;
    if u.is_power_of_two() {
        Some(u.trailing_zeros() as i32)
    } else {
        None
    }
}

/// Signed division.
pub fn divs(e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Divs, e1, e2)
}

/// Unsigned division; a power-of-two divisor becomes an unsigned shift.
pub fn divu(e1: Expr, e2: Expr) -> Expr {
    if let Expr::Op(Op::Intconst(n), _) = &e2 {
        if let Some(k) = power_of_two(*n) {
            return shruimm(e1, k);
        }
    }
    Expr::binop(Op::Divu, e1, e2)
}

/// `x mod y` as `x - (x / y) * y`, evaluating `x` and `y` once each.
/// The divisor expression moves under one new binder and is lifted past it.
fn mod_aux(divop: Op, e1: Expr, e2: Expr) -> Expr {
    Expr::letin(
        e1,
        Expr::letin(
            e2.lift(1),
            Expr::binop(
                Op::Sub,
                Expr::Var(1),
                Expr::binop(
                    Op::Mul,
                    Expr::binop(divop, Expr::Var(1), Expr::Var(0)),
                    Expr::Var(0),
                ),
            ),
        ),
    )
}

/// Signed modulo.
pub fn mods(e1: Expr, e2: Expr) -> Expr {
    mod_aux(Op::Divs, e1, e2)
}

/// Unsigned modulo; a power-of-two divisor becomes a mask.
pub fn modu(e1: Expr, e2: Expr) -> Expr {
    if let Expr::Op(Op::Intconst(n), _) = &e2 {
        if power_of_two(*n).is_some() {
            return andimm((*n as u32).wrapping_sub(1), e1);
        }
    }
    mod_aux(Op::Divu, e1, e2)
}
