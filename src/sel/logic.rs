//! Selection of bitwise logic operators and boolean coercions.
//!
//! `notint` chases double complements and De Morgan shapes; `boolval` and
//! `notbool` turn a value into its canonical 0/1 form, reusing an existing
//! comparison (or its complement) instead of materializing and re-testing
//! an intermediate boolean. The binary and/or/xor forms fold immediates,
//! and `or` additionally fuses rotate-and-mask pairs.

use crate::expr::{same_expr_pure, Expr};
use crate::op::{Comparison, Cond, Op};
use crate::sel::shift::is_rolm_mask;

/// Operand shapes `notint` distinguishes: a literal, a complement to chase,
/// or a two-operand logic node with a complemented operand on one side.
pub(crate) enum NotShape {
    Const(i32),
    /// Operand is itself a complement; payload is what it complements.
    Not(Expr),
    /// `¬t & u` — payloads are `t` and `u`.
    AndNotLeft(Expr, Expr),
    /// `t & ¬u` — payloads are `t` and `u`.
    AndNotRight(Expr, Expr),
    /// `¬t | u`
    OrNotLeft(Expr, Expr),
    /// `t | ¬u`
    OrNotRight(Expr, Expr),
    /// `¬t ^ u`
    XorNotLeft(Expr, Expr),
    /// `t ^ ¬u`
    XorNotRight(Expr, Expr),
    Default,
}

/// Peel a complement: `Some(t)` if `e` is `Notint(t)`.
fn as_not(e: &Expr) -> Option<&Expr> {
    match e {
        Expr::Op(Op::Notint, args) if args.len() == 1 => Some(&args[0]),
        _ => None,
    }
}

pub(crate) fn classify_not(e: &Expr) -> NotShape {
    match e {
        Expr::Op(Op::Intconst(n), _) => NotShape::Const(*n),
        Expr::Op(Op::Notint, args) if args.len() == 1 => NotShape::Not(args[0].clone()),
        Expr::Op(op @ (Op::And | Op::Or | Op::Xor), args) if args.len() == 2 => {
            if let Some(t) = as_not(&args[0]) {
                let (t, u) = (t.clone(), args[1].clone());
                match op {
                    Op::And => NotShape::AndNotLeft(t, u),
                    Op::Or => NotShape::OrNotLeft(t, u),
                    _ => NotShape::XorNotLeft(t, u),
                }
            } else if let Some(u) = as_not(&args[1]) {
                let (t, u) = (args[0].clone(), u.clone());
                match op {
                    Op::And => NotShape::AndNotRight(t, u),
                    Op::Or => NotShape::OrNotRight(t, u),
                    _ => NotShape::XorNotRight(t, u),
                }
            } else {
                NotShape::Default
            }
        }
        _ => NotShape::Default,
    }
}

/// Bitwise complement. Double complements cancel, and a complement folds
/// through and/or/xor when one of their operands is itself complemented:
/// `¬(¬t & u) = t | ¬u`, `¬(¬t | u) = t & ¬u`, `¬(¬t ^ u) = t ^ u`.
pub fn notint(e: Expr) -> Expr {
    match classify_not(&e) {
        NotShape::Const(n) => Expr::intconst(!n),
        NotShape::Not(t) => t,
        NotShape::AndNotLeft(t, u) => or(t, notint(u)),
        NotShape::AndNotRight(t, u) => or(notint(t), u),
        NotShape::OrNotLeft(t, u) => and(t, notint(u)),
        NotShape::OrNotRight(t, u) => and(notint(t), u),
        NotShape::XorNotLeft(t, u) => Expr::binop(Op::Xor, t, u),
        NotShape::XorNotRight(t, u) => Expr::binop(Op::Xor, t, u),
        NotShape::Default => Expr::unop(Op::Notint, e),
    }
}

/// Shapes the boolean coercions distinguish.
pub(crate) enum BoolShape {
    Const(i32),
    /// Operand already materializes a condition.
    Cmp(Cond, Vec<Expr>),
    /// Operand branches; the coercion distributes into both arms.
    Conditional(Expr, Expr, Expr),
    Default,
}

pub(crate) fn classify_bool(e: &Expr) -> BoolShape {
    match e {
        Expr::Op(Op::Intconst(n), _) => BoolShape::Const(*n),
        Expr::Op(Op::Cmp(c), args) => BoolShape::Cmp(*c, args.clone()),
        Expr::Conditional(c, t, f) => {
            BoolShape::Conditional((**c).clone(), (**t).clone(), (**f).clone())
        }
        _ => BoolShape::Default,
    }
}

/// Coerce to a canonical boolean: 0 stays 0, everything else becomes 1.
pub fn boolval(e: Expr) -> Expr {
    match classify_bool(&e) {
        BoolShape::Const(n) => Expr::intconst((n != 0) as i32),
        BoolShape::Cmp(c, args) => Expr::Op(Op::Cmp(c), args),
        BoolShape::Conditional(c, t, f) => Expr::conditional(c, boolval(t), boolval(f)),
        BoolShape::Default => {
            Expr::unop(Op::Cmp(Cond::Compimm(Comparison::Ne, 0)), e)
        }
    }
}

/// Coerce to the complemented canonical boolean: 0 becomes 1, everything
/// else becomes 0. A condition operand is rewritten to its complement
/// rather than tested again.
pub fn notbool(e: Expr) -> Expr {
    match classify_bool(&e) {
        BoolShape::Const(n) => Expr::intconst((n == 0) as i32),
        BoolShape::Cmp(c, args) => Expr::Op(Op::Cmp(c.negate()), args),
        BoolShape::Conditional(c, t, f) => Expr::conditional(c, notbool(t), notbool(f)),
        BoolShape::Default => {
            Expr::unop(Op::Cmp(Cond::Compimm(Comparison::Eq, 0)), e)
        }
    }
}

/// And with a known immediate. Folds a literal, a nested and-immediate, and
/// a rotate-and-mask operand whose combined mask the rotate-mask instruction
/// can still encode.
pub fn andimm(n: u32, e: Expr) -> Expr {
    match e {
        Expr::Op(Op::Intconst(m), _) => Expr::intconst(((m as u32) & n) as i32),
        Expr::Op(Op::Andimm(m), args) => Expr::Op(Op::Andimm(m & n), args),
        Expr::Op(Op::Rolm(amount, mask), args) if is_rolm_mask(mask & n) => {
            Expr::Op(Op::Rolm(amount, mask & n), args)
        }
        e => Expr::unop(Op::Andimm(n), e),
    }
}

/// Or with a known immediate. Zero is the identity.
pub fn orimm(n: u32, e: Expr) -> Expr {
    if n == 0 {
        return e;
    }
    match e {
        Expr::Op(Op::Intconst(m), _) => Expr::intconst(((m as u32) | n) as i32),
        Expr::Op(Op::Orimm(m), args) => Expr::Op(Op::Orimm(m | n), args),
        e => Expr::unop(Op::Orimm(n), e),
    }
}

/// Xor with a known immediate. Zero is the identity.
pub fn xorimm(n: u32, e: Expr) -> Expr {
    if n == 0 {
        return e;
    }
    match e {
        Expr::Op(Op::Intconst(m), _) => Expr::intconst(((m as u32) ^ n) as i32),
        Expr::Op(Op::Xorimm(m), args) => Expr::Op(Op::Xorimm(m ^ n), args),
        e => Expr::unop(Op::Xorimm(n), e),
    }
}

/// Binary and: a literal on either side routes to `andimm`.
pub fn and(e1: Expr, e2: Expr) -> Expr {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), e2) => andimm(n as u32, e2),
        (e1, Expr::Op(Op::Intconst(n), _)) => andimm(n as u32, e1),
        (e1, e2) => Expr::binop(Op::And, e1, e2),
    }
}

/// Rotate-mask fusion shapes the `or` combinator recognizes.
pub(crate) enum OrShape {
    /// Both operands rotate the same subexpression by the same amount;
    /// their masks union into one rotate-and-mask.
    RolmPair { amount: u8, mask1: u32, mask2: u32, arg: Expr },
    /// One operand keeps the bits outside a mask, the other rotates bits
    /// into exactly that mask: a single rotate-insert.
    Insert { amount: u8, mask: u32, outside: Expr, inside: Expr },
    ConstLeft(i32),
    ConstRight(i32),
    Default,
}

pub(crate) fn classify_or(e1: &Expr, e2: &Expr) -> OrShape {
    if let (Expr::Op(Op::Rolm(a1, m1), args1), Expr::Op(Op::Rolm(a2, m2), args2)) = (e1, e2) {
        if a1 == a2
            && args1.len() == 1
            && args2.len() == 1
            && same_expr_pure(&args1[0], &args2[0])
        {
            return OrShape::RolmPair {
                amount: *a1,
                mask1: *m1,
                mask2: *m2,
                arg: args1[0].clone(),
            };
        }
    }
    if let (Expr::Op(Op::Andimm(m1), args1), Expr::Op(Op::Rolm(amount, m2), args2)) = (e1, e2) {
        if *m1 == !*m2 && args1.len() == 1 && args2.len() == 1 {
            return OrShape::Insert {
                amount: *amount,
                mask: *m2,
                outside: args1[0].clone(),
                inside: args2[0].clone(),
            };
        }
    }
    if let (Expr::Op(Op::Rolm(amount, m1), args1), Expr::Op(Op::Andimm(m2), args2)) = (e1, e2) {
        if *m2 == !*m1 && args1.len() == 1 && args2.len() == 1 {
            return OrShape::Insert {
                amount: *amount,
                mask: *m1,
                outside: args2[0].clone(),
                inside: args1[0].clone(),
            };
        }
    }
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), _) => OrShape::ConstLeft(*n),
        (_, Expr::Op(Op::Intconst(n), _)) => OrShape::ConstRight(*n),
        _ => OrShape::Default,
    }
}

/// Binary or. Fuses rotate-and-mask pairs over one shared operand, fuses a
/// mask/rotate pair with exactly complementary masks into a rotate-insert,
/// and otherwise routes literals to `orimm`.
pub fn or(e1: Expr, e2: Expr) -> Expr {
    match classify_or(&e1, &e2) {
        OrShape::RolmPair { amount, mask1, mask2, arg } => {
            Expr::unop(Op::Rolm(amount, mask1 | mask2), arg)
        }
        OrShape::Insert { amount, mask, outside, inside } => {
            Expr::binop(Op::Roli(amount, mask), outside, inside)
        }
        OrShape::ConstLeft(n) => orimm(n as u32, e2),
        OrShape::ConstRight(n) => orimm(n as u32, e1),
        OrShape::Default => Expr::binop(Op::Or, e1, e2),
    }
}

/// Binary xor: a literal on either side routes to `xorimm`.
pub fn xor(e1: Expr, e2: Expr) -> Expr {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), e2) => xorimm(n as u32, e2),
        (e1, Expr::Op(Op::Intconst(n), _)) => xorimm(n as u32, e1),
        (e1, e2) => Expr::binop(Op::Xor, e1, e2),
    }
}
