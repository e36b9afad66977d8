//! Selection of integer-width casts, float arithmetic, and int↔float
//! conversions.
//!
//! The target has no hardware int→float conversion. A 32-bit integer is
//! converted by assembling the double `2^52 + w` from two words — the
//! exponent word `0x43300000` and the integer itself — and subtracting the
//! matching magic constant, which cancels the bias exactly (the 52-bit
//! mantissa holds any 32-bit word). The signed variant first flips the sign
//! bit (adding `2^31` mod `2^32`) so the biased word is the unsigned offset
//! from `-2^31`.
//!
//! float→unsigned has no direct instruction either: magnitudes below `2^31`
//! go through the signed conversion, larger ones are rebased by `2^31`
//! before converting and the bit is added back afterwards.

use crate::expr::Expr;
use crate::op::{double_from_words, Comparison, Cond, Op};
use crate::sel::arith::addimm;
use crate::sel::logic::andimm;

/// The exponent/sign high word that places a 32-bit payload word in the
/// mantissa of a double valued `2^52 + payload`.
const BIAS_HI: i32 = 0x4330_0000;

/// Sign-extend the low 8 bits.
pub fn cast8signed(e: Expr) -> Expr {
    match e {
        Expr::Op(Op::Intconst(n), _) => Expr::intconst(n as i8 as i32),
        e => Expr::unop(Op::Cast8signed, e),
    }
}

/// Zero-extend the low 8 bits: an and-immediate.
pub fn cast8unsigned(e: Expr) -> Expr {
    andimm(0xFF, e)
}

/// Sign-extend the low 16 bits.
pub fn cast16signed(e: Expr) -> Expr {
    match e {
        Expr::Op(Op::Intconst(n), _) => Expr::intconst(n as i16 as i32),
        e => Expr::unop(Op::Cast16signed, e),
    }
}

/// Zero-extend the low 16 bits: an and-immediate.
pub fn cast16unsigned(e: Expr) -> Expr {
    andimm(0xFFFF, e)
}

pub fn negf(e: Expr) -> Expr {
    Expr::unop(Op::Negf, e)
}

pub fn absf(e: Expr) -> Expr {
    Expr::unop(Op::Absf, e)
}

pub fn addf(e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Addf, e1, e2)
}

pub fn subf(e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Subf, e1, e2)
}

pub fn mulf(e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Mulf, e1, e2)
}

pub fn divf(e1: Expr, e2: Expr) -> Expr {
    Expr::binop(Op::Divf, e1, e2)
}

/// Round a double to single precision.
pub fn singleoffloat(e: Expr) -> Expr {
    Expr::unop(Op::Singleoffloat, e)
}

/// Truncate a double toward zero to a signed 32-bit integer.
pub fn intoffloat(e: Expr) -> Expr {
    Expr::unop(Op::Intoffloat, e)
}

/// Truncate a double toward zero to an unsigned 32-bit integer, through the
/// signed conversion: magnitudes below `2^31` convert directly, larger ones
/// are rebased by `2^31` and the top bit is added back.
pub fn intuoffloat(e: Expr) -> Expr {
    let two_p31 = || Expr::floatconst(2147483648.0);
    Expr::letin(
        e,
        Expr::conditional(
            Expr::binop(Op::Cmp(Cond::Compf(Comparison::Lt)), Expr::Var(0), two_p31()),
            intoffloat(Expr::Var(0)),
            addimm(
                0x8000_0000_u32 as i32,
                intoffloat(Expr::binop(Op::Subf, Expr::Var(0), two_p31())),
            ),
        ),
    )
}

/// Convert a signed 32-bit integer to the double with the same value.
pub fn floatofint(e: Expr) -> Expr {
    subf(
        Expr::binop(
            Op::Floatofwords,
            Expr::intconst(BIAS_HI),
            addimm(0x8000_0000_u32 as i32, e),
        ),
        Expr::floatconst_bits(double_from_words(BIAS_HI as u32, 0x8000_0000)),
    )
}

/// Convert an unsigned 32-bit integer to the double with the same value.
pub fn floatofintu(e: Expr) -> Expr {
    subf(
        Expr::binop(Op::Floatofwords, Expr::intconst(BIAS_HI), e),
        Expr::floatconst_bits(double_from_words(BIAS_HI as u32, 0)),
    )
}
