//! Selection of shifts by a known amount, and the rotate-and-mask smart
//! constructor.
//!
//! Left and unsigned-right shifts by an in-range amount are a rotate with a
//! zeroing mask on this target, which lets nested shift/rotate/mask chains
//! collapse into a single `Rolm`. Arithmetic right shift keeps its own
//! immediate form. Out-of-range amounts fall back to the variable-shift
//! operator, whose semantics is already undefined there.

use crate::expr::Expr;
use crate::op::Op;

/// True if `x` is a single contiguous run of ones (no wrap).
fn contiguous(x: u32) -> bool {
    x != 0 && {
        let y = x >> x.trailing_zeros();
        y & y.wrapping_add(1) == 0
    }
}

/// True if `m` is a contiguous run of ones, possibly wrapping around bit 31
/// — the mask shapes a single rotate-and-mask instruction can encode.
/// Rotation maps this class onto itself, so feasibility of a combined mask
/// can be checked on the mask as-is.
pub(crate) fn is_rolm_mask(m: u32) -> bool {
    m != 0 && (contiguous(m) || contiguous(!m))
}

/// Rotate-and-mask smart constructor: `rol(e, amount) & mask`.
/// Folds integer constants and composes with a nested rotate-and-mask
/// (amounts add mod 32, the inner mask rotates along and intersects).
pub fn rolm(e: Expr, amount: u8, mask: u32) -> Expr {
    match e {
        Expr::Op(Op::Intconst(n), _) => {
            Expr::intconst(((n as u32).rotate_left(amount as u32) & mask) as i32)
        }
        Expr::Op(Op::Rolm(amount1, mask1), args) if args.len() == 1 => {
            let combined_amount = ((amount1 as u32 + amount as u32) % 32) as u8;
            let combined_mask = mask1.rotate_left(amount as u32) & mask;
            Expr::Op(Op::Rolm(combined_amount, combined_mask), args)
        }
        e => Expr::unop(Op::Rolm(amount, mask), e),
    }
}

/// Left shift by a known amount.
pub fn shlimm(e: Expr, n: i32) -> Expr {
    if n == 0 {
        return e;
    }
    if (n as u32) < 32 {
        rolm(e, n as u8, u32::MAX << (n as u32))
    } else {
        Expr::binop(Op::Shl, e, Expr::intconst(n))
    }
}

/// Unsigned right shift by a known amount.
pub fn shruimm(e: Expr, n: i32) -> Expr {
    if n == 0 {
        return e;
    }
    if (n as u32) < 32 {
        rolm(e, (32 - n) as u8, u32::MAX >> (n as u32))
    } else {
        Expr::binop(Op::Shru, e, Expr::intconst(n))
    }
}

/// Arithmetic right shift by a known amount.
pub fn shrimm(e: Expr, n: i32) -> Expr {
    if n == 0 {
        return e;
    }
    if (n as u32) < 32 {
        Expr::unop(Op::Shrimm(n as u8), e)
    } else {
        Expr::binop(Op::Shr, e, Expr::intconst(n))
    }
}

/// Left shift with a general amount operand.
pub fn shl(e1: Expr, e2: Expr) -> Expr {
    match e2 {
        Expr::Op(Op::Intconst(n), _) => shlimm(e1, n),
        e2 => Expr::binop(Op::Shl, e1, e2),
    }
}

/// Arithmetic right shift with a general amount operand.
pub fn shr(e1: Expr, e2: Expr) -> Expr {
    match e2 {
        Expr::Op(Op::Intconst(n), _) => shrimm(e1, n),
        e2 => Expr::binop(Op::Shr, e1, e2),
    }
}

/// Unsigned right shift with a general amount operand.
pub fn shru(e1: Expr, e2: Expr) -> Expr {
    match e2 {
        Expr::Op(Op::Intconst(n), _) => shruimm(e1, n),
        e2 => Expr::binop(Op::Shru, e1, e2),
    }
}
