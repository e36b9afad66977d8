//! Selection of additive and multiplicative operators.
//!
//! Immediates are reassociated and folded into a single add-immediate or a
//! symbol offset (integer addition commutes and associates under 32-bit
//! wraparound). Multiplication by a known constant is strength-reduced to
//! at most two shift-and-add steps when the constant has at most two set
//! bits.

use crate::expr::Expr;
use crate::op::{Op, Symbol};
use crate::sel::shift::shlimm;

/// Add a known immediate. Zero is the identity; constants and existing
/// immediate-relative operands absorb the addend.
pub fn addimm(n: i32, e: Expr) -> Expr {
    if n == 0 {
        return e;
    }
    match e {
        Expr::Op(Op::Intconst(m), _) => Expr::intconst(m.wrapping_add(n)),
        Expr::Op(Op::Addrsymbol(s, ofs), _) => Expr::addrsymbol(s, ofs.wrapping_add(n)),
        Expr::Op(Op::Addimm(m), args) => Expr::Op(Op::Addimm(m.wrapping_add(n)), args),
        e => Expr::unop(Op::Addimm(n), e),
    }
}

/// Operand shapes the binary add combinator distinguishes. Classification
/// is purely syntactic; payloads carry the destructured pieces the rewrite
/// needs.
pub(crate) enum AddShape {
    /// Left operand is an integer literal.
    ConstLeft(i32),
    /// Right operand is an integer literal.
    ConstRight(i32),
    /// Left operand is a symbol+offset constant.
    SymbolLeft(Symbol, i32),
    /// Right operand is a symbol+offset constant.
    SymbolRight(Symbol, i32),
    /// Left operand is register+immediate (`Addimm`); payload is the inner
    /// operand.
    ImmLeft(i32, Expr),
    /// Right operand is register+immediate.
    ImmRight(i32, Expr),
    /// Neither operand has a recognized shape.
    Default,
}

pub(crate) fn classify_add(e1: &Expr, e2: &Expr) -> AddShape {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), _) => AddShape::ConstLeft(*n),
        (_, Expr::Op(Op::Intconst(n), _)) => AddShape::ConstRight(*n),
        (Expr::Op(Op::Addrsymbol(s, ofs), _), _) => AddShape::SymbolLeft(*s, *ofs),
        (_, Expr::Op(Op::Addrsymbol(s, ofs), _)) => AddShape::SymbolRight(*s, *ofs),
        (Expr::Op(Op::Addimm(n), args), _) if args.len() == 1 => {
            AddShape::ImmLeft(*n, args[0].clone())
        }
        (_, Expr::Op(Op::Addimm(n), args)) if args.len() == 1 => {
            AddShape::ImmRight(*n, args[0].clone())
        }
        _ => AddShape::Default,
    }
}

/// Binary addition. Immediate-relative operands on either side are
/// reassociated so at most one register-register add and one combined
/// immediate remain.
pub fn add(e1: Expr, e2: Expr) -> Expr {
    match classify_add(&e1, &e2) {
        AddShape::ConstLeft(n) => addimm(n, e2),
        AddShape::ConstRight(n) => addimm(n, e1),
        AddShape::SymbolLeft(s, ofs) => add_symbol(s, ofs, e2),
        AddShape::SymbolRight(s, ofs) => add_symbol(s, ofs, e1),
        AddShape::ImmLeft(n, t) => addimm(n, add(t, e2)),
        AddShape::ImmRight(n, t) => addimm(n, add(e1, t)),
        AddShape::Default => Expr::binop(Op::Add, e1, e2),
    }
}

/// Add a symbol+offset to an arbitrary operand, folding a register+immediate
/// operand's addend into the symbol's constant part.
fn add_symbol(s: Symbol, ofs: i32, e: Expr) -> Expr {
    match e {
        Expr::Op(Op::Addimm(n), mut args) if args.len() == 1 => {
            let t = args.remove(0);
            Expr::binop(Op::Add, Expr::addrsymbol(s, ofs.wrapping_add(n)), t)
        }
        e => Expr::binop(Op::Add, Expr::addrsymbol(s, ofs), e),
    }
}

/// Operand shapes the subtraction combinator distinguishes.
pub(crate) enum SubShape {
    /// Right operand is an integer literal.
    ConstRight(i32),
    /// Left operand is register+immediate.
    ImmLeft(i32, Expr),
    /// Right operand is register+immediate.
    ImmRight(i32, Expr),
    Default,
}

pub(crate) fn classify_sub(e1: &Expr, e2: &Expr) -> SubShape {
    match (e1, e2) {
        (_, Expr::Op(Op::Intconst(n), _)) => SubShape::ConstRight(*n),
        (Expr::Op(Op::Addimm(n), args), _) if args.len() == 1 => {
            SubShape::ImmLeft(*n, args[0].clone())
        }
        (_, Expr::Op(Op::Addimm(n), args)) if args.len() == 1 => {
            SubShape::ImmRight(*n, args[0].clone())
        }
        _ => SubShape::Default,
    }
}

/// Binary subtraction. Subtracting a literal becomes an add-immediate of
/// its negation; immediate-relative operands are reassociated out.
pub fn sub(e1: Expr, e2: Expr) -> Expr {
    match classify_sub(&e1, &e2) {
        SubShape::ConstRight(n) => addimm(n.wrapping_neg(), e1),
        SubShape::ImmLeft(n, t) => addimm(n, sub(t, e2)),
        SubShape::ImmRight(n, t) => addimm(n.wrapping_neg(), sub(e1, t)),
        SubShape::Default => Expr::binop(Op::Sub, e1, e2),
    }
}

/// Positions of the set bits of `n`, lowest first.
fn one_bits(n: u32) -> Vec<i32> {
    (0..32).filter(|i| n & (1u32 << i) != 0).collect()
}

/// Multiply by a constant with no further operand inspection: one set bit is
/// a shift, two set bits are a shared-operand shift-shift-add, anything else
/// is the multiply-immediate operator.
pub(crate) fn mulimm_base(n: i32, e: Expr) -> Expr {
    match one_bits(n as u32).as_slice() {
        [i] => shlimm(e, *i),
        [i, j] => Expr::letin(
            e,
            add(shlimm(Expr::Var(0), *i), shlimm(Expr::Var(0), *j)),
        ),
        _ => Expr::unop(Op::Mulimm(n), e),
    }
}

/// Multiply by a known immediate. Zero and one short-circuit; a
/// register+immediate operand distributes the multiply so the immediate
/// product folds separately.
pub fn mulimm(n: i32, e: Expr) -> Expr {
    if n == 0 {
        return Expr::intconst(0);
    }
    if n == 1 {
        return e;
    }
    match e {
        Expr::Op(Op::Intconst(m), _) => Expr::intconst(m.wrapping_mul(n)),
        Expr::Op(Op::Addimm(m), mut args) if args.len() == 1 => {
            let t = args.remove(0);
            addimm(n.wrapping_mul(m), mulimm_base(n, t))
        }
        e => mulimm_base(n, e),
    }
}

/// Binary multiplication: a literal on either side routes to `mulimm`.
pub fn mul(e1: Expr, e2: Expr) -> Expr {
    match (e1, e2) {
        (Expr::Op(Op::Intconst(n), _), e2) => mulimm(n, e2),
        (e1, Expr::Op(Op::Intconst(n), _)) => mulimm(n, e1),
        (e1, e2) => Expr::binop(Op::Mul, e1, e2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Env;
    use crate::value::Value;

    fn eval2(e: &Expr, x: Value, y: Value) -> Value {
        // Var(1) is x, Var(0) is y
        let mut env = Env::new();
        env.push(x);
        env.push(y);
        e.eval(&mut env).unwrap()
    }

    #[test]
    fn test_addimm_zero_is_identity() {
        assert_eq!(addimm(0, Expr::Var(3)), Expr::Var(3));
    }

    #[test]
    fn test_addimm_folds_constants_and_symbols() {
        assert_eq!(addimm(4, Expr::intconst(3)), Expr::intconst(7));
        assert_eq!(
            addimm(-8, Expr::addrsymbol(Symbol(2), 20)),
            Expr::addrsymbol(Symbol(2), 12)
        );
    }

    #[test]
    fn test_addimm_chain_combines_immediates() {
        let chained = addimm(3, addimm(4, Expr::Var(0)));
        let direct = addimm(7, Expr::Var(0));
        assert_eq!(chained, direct);
        // Wraparound combining
        let wrapped = addimm(1, addimm(i32::MAX, Expr::Var(0)));
        let mut env = Env::new();
        env.push(Value::Int(5));
        assert_eq!(wrapped.eval(&mut env), Ok(Value::Int(i32::MIN.wrapping_add(5))));
    }

    #[test]
    fn test_add_of_two_addimm_operands() {
        // (x + 3) + (y + 4) becomes (x + y) + 7
        let e = add(
            addimm(3, Expr::Var(1)),
            addimm(4, Expr::Var(0)),
        );
        assert_eq!(
            e,
            Expr::unop(
                Op::Addimm(7),
                Expr::binop(Op::Add, Expr::Var(1), Expr::Var(0)),
            )
        );
        assert_eq!(eval2(&e, Value::Int(10), Value::Int(20)), Value::Int(37));
    }

    #[test]
    fn test_add_symbol_folds_offset() {
        let e = add(
            Expr::addrsymbol(Symbol(1), 8),
            addimm(4, Expr::Var(0)),
        );
        assert_eq!(
            e,
            Expr::binop(Op::Add, Expr::addrsymbol(Symbol(1), 12), Expr::Var(0))
        );
        let v = eval2(&e, Value::Undef, Value::Int(100));
        assert_eq!(v, Value::Ptr { base: 1, offset: 112 });
    }

    #[test]
    fn test_add_constant_on_either_side() {
        assert_eq!(add(Expr::intconst(5), Expr::Var(0)), Expr::unop(Op::Addimm(5), Expr::Var(0)));
        assert_eq!(add(Expr::Var(0), Expr::intconst(5)), Expr::unop(Op::Addimm(5), Expr::Var(0)));
    }

    #[test]
    fn test_sub_constant_becomes_addimm() {
        assert_eq!(sub(Expr::Var(0), Expr::intconst(7)), Expr::unop(Op::Addimm(-7), Expr::Var(0)));
        // i32::MIN negates to itself under wraparound
        let e = sub(Expr::Var(0), Expr::intconst(i32::MIN));
        assert_eq!(e, Expr::unop(Op::Addimm(i32::MIN), Expr::Var(0)));
    }

    #[test]
    fn test_sub_reassociates_immediates() {
        // (x + 10) - (y + 3) == (x - y) + 7
        let e = sub(addimm(10, Expr::Var(1)), addimm(3, Expr::Var(0)));
        assert_eq!(eval2(&e, Value::Int(100), Value::Int(50)), Value::Int(57));
        // Pointer minuend stays a pointer
        let p = Value::Ptr { base: 4, offset: 40 };
        assert_eq!(eval2(&e, p, Value::Int(8)), Value::Ptr { base: 4, offset: 39 });
    }

    #[test]
    fn test_mulimm_zero_and_one() {
        assert_eq!(mulimm(0, Expr::Var(0)), Expr::intconst(0));
        assert_eq!(mulimm(1, Expr::Var(0)), Expr::Var(0));
    }

    #[test]
    fn test_mulimm_power_of_two_is_shift() {
        let e = mulimm(8, Expr::Var(0));
        assert!(matches!(e, Expr::Op(Op::Rolm(3, _), _)));
        let mut env = Env::new();
        env.push(Value::Int(-5));
        assert_eq!(e.eval(&mut env), Ok(Value::Int(-40)));
    }

    #[test]
    fn test_mulimm_two_bits_is_shift_shift_add() {
        // 12 = 8 + 4
        let e = mulimm(12, Expr::Var(0));
        assert!(matches!(e, Expr::Let(..)));
        let samples = [0i32, 1, -1, i32::MIN, 0x1234_5678, 715827883];
        for &x in &samples {
            let mut env = Env::new();
            env.push(Value::Int(x));
            assert_eq!(e.eval(&mut env), Ok(Value::Int(x.wrapping_mul(12))), "x = {}", x);
        }
    }

    #[test]
    fn test_mulimm_dense_constant_stays_multiply() {
        let e = mulimm(7, Expr::Var(0));
        assert_eq!(e, Expr::unop(Op::Mulimm(7), Expr::Var(0)));
    }

    #[test]
    fn test_mulimm_distributes_over_addimm() {
        // 6 * (x + 5) == 6*x + 30, realized as shift-shift-add plus immediate
        let e = mulimm(6, addimm(5, Expr::Var(0)));
        let samples = [0i32, -3, 1000, i32::MAX];
        for &x in &samples {
            let mut env = Env::new();
            env.push(Value::Int(x));
            let expected = x.wrapping_add(5).wrapping_mul(6);
            assert_eq!(e.eval(&mut env), Ok(Value::Int(expected)), "x = {}", x);
        }
    }

    #[test]
    fn test_mul_routes_constants() {
        let e = mul(Expr::intconst(4), Expr::Var(0));
        assert!(matches!(e, Expr::Op(Op::Rolm(2, _), _)));
        let e = mul(Expr::Var(0), Expr::Var(1));
        assert_eq!(e, Expr::binop(Op::Mul, Expr::Var(0), Expr::Var(1)));
    }
}
