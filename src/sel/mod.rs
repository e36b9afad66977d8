//! Operator selection: smart constructors that build a target expression
//! for a generic source operator applied to already-selected operands.
//!
//! Every combinator commits to one contract: the expression it returns
//! evaluates to a value no less defined than the generic operator applied
//! to the operand values, on every operand shape. The recognized shapes
//! (literals, symbol+offset, register+immediate, rotate/mask chains,
//! power-of-two divisors) only make the result cheaper, never different;
//! the default arm of every combinator re-emits the generic operator.

pub mod addressing;
pub mod arith;
pub mod compare;
pub mod condition;
pub mod convert;
pub mod divmod;
pub mod logic;
pub mod shift;

use crate::expr::Expr;
use crate::op::{Comparison, Cond, Op};
use crate::value::Value;

pub use addressing::{addressing as select_addressing, AddressingMode, Chunk};
pub use condition::condition as select_condition;

/// Unary source operators the driver can select. Compile-time parameters
/// (immediates, shift amounts) ride along in the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarySel {
    Cast8Signed,
    Cast8Unsigned,
    Cast16Signed,
    Cast16Unsigned,
    Notint,
    Boolval,
    Notbool,
    Negf,
    Absf,
    Singleoffloat,
    Intoffloat,
    Intuoffloat,
    Floatofint,
    Floatofintu,
    Addimm(i32),
    Mulimm(i32),
    Andimm(u32),
    Orimm(u32),
    Xorimm(u32),
    Shlimm(i32),
    Shrimm(i32),
    Shruimm(i32),
}

impl UnarySel {
    /// Generic (unoptimized) semantics of the source operator: the value the
    /// selected expression must be at least as defined as. `None` marks the
    /// semantically partial cases, which callers exclude before selection.
    pub fn apply(self, v: Value) -> Option<Value> {
        match self {
            UnarySel::Cast8Signed => Op::Cast8signed.eval_unary(v),
            UnarySel::Cast8Unsigned => Op::Andimm(0xFF).eval_unary(v),
            UnarySel::Cast16Signed => Op::Cast16signed.eval_unary(v),
            UnarySel::Cast16Unsigned => Op::Andimm(0xFFFF).eval_unary(v),
            UnarySel::Notint => Op::Notint.eval_unary(v),
            UnarySel::Boolval => Some(match v {
                Value::Int(n) => Value::of_bool(n != 0),
                Value::Ptr { .. } => Value::Int(1),
                _ => Value::Undef,
            }),
            UnarySel::Notbool => Some(match v {
                Value::Int(n) => Value::of_bool(n == 0),
                Value::Ptr { .. } => Value::Int(0),
                _ => Value::Undef,
            }),
            UnarySel::Negf => Op::Negf.eval_unary(v),
            UnarySel::Absf => Op::Absf.eval_unary(v),
            UnarySel::Singleoffloat => Op::Singleoffloat.eval_unary(v),
            UnarySel::Intoffloat => Op::Intoffloat.eval_unary(v),
            UnarySel::Intuoffloat => match v {
                Value::Float(bits) => {
                    let t = f64::from_bits(bits).trunc();
                    if t.is_nan() || t < 0.0 || t > u32::MAX as f64 {
                        Some(Value::Undef)
                    } else {
                        Some(Value::Int(t as u32 as i32))
                    }
                }
                // The branch on the float's magnitude has no interpretation
                // for anything else; this case is excluded by the caller
                // like the division preconditions.
                _ => None,
            },
            UnarySel::Floatofint => Some(match v {
                Value::Int(n) => Value::float(n as f64),
                _ => Value::Undef,
            }),
            UnarySel::Floatofintu => Some(match v {
                Value::Int(n) => Value::float(n as u32 as f64),
                _ => Value::Undef,
            }),
            UnarySel::Addimm(n) => Op::Addimm(n).eval_unary(v),
            UnarySel::Mulimm(n) => Op::Mulimm(n).eval_unary(v),
            UnarySel::Andimm(n) => Op::Andimm(n).eval_unary(v),
            UnarySel::Orimm(n) => Op::Orimm(n).eval_unary(v),
            UnarySel::Xorimm(n) => Op::Xorimm(n).eval_unary(v),
            UnarySel::Shlimm(n) => Op::Shl.eval_binary(v, Value::Int(n)),
            UnarySel::Shrimm(n) => Op::Shr.eval_binary(v, Value::Int(n)),
            UnarySel::Shruimm(n) => Op::Shru.eval_binary(v, Value::Int(n)),
        }
    }
}

/// Binary source operators the driver can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySel {
    Add,
    Sub,
    Mul,
    Divs,
    Divu,
    Mods,
    Modu,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Shru,
    Addf,
    Subf,
    Mulf,
    Divf,
    Comp(Comparison),
    Compu(Comparison),
    Compf(Comparison),
}

/// Generic signed modulo over values; partial exactly where signed division
/// is.
fn mods_value(a: Value, b: Value) -> Option<Value> {
    if a == Value::Undef || b == Value::Undef {
        return Some(Value::Undef);
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 || (x == i32::MIN && y == -1) {
                None
            } else {
                Some(Value::Int(x.wrapping_rem(y)))
            }
        }
        _ => Some(Value::Undef),
    }
}

/// Generic unsigned modulo over values.
fn modu_value(a: Value, b: Value) -> Option<Value> {
    if a == Value::Undef || b == Value::Undef {
        return Some(Value::Undef);
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                None
            } else {
                Some(Value::Int(((x as u32) % (y as u32)) as i32))
            }
        }
        _ => Some(Value::Undef),
    }
}

impl BinarySel {
    /// Generic (unoptimized) semantics of the source operator. `None` marks
    /// the division/modulo partiality, excluded by the caller.
    pub fn apply(self, a: Value, b: Value) -> Option<Value> {
        match self {
            BinarySel::Add => Op::Add.eval_binary(a, b),
            BinarySel::Sub => Op::Sub.eval_binary(a, b),
            BinarySel::Mul => Op::Mul.eval_binary(a, b),
            BinarySel::Divs => Op::Divs.eval_binary(a, b),
            BinarySel::Divu => Op::Divu.eval_binary(a, b),
            BinarySel::Mods => mods_value(a, b),
            BinarySel::Modu => modu_value(a, b),
            BinarySel::And => Op::And.eval_binary(a, b),
            BinarySel::Or => Op::Or.eval_binary(a, b),
            BinarySel::Xor => Op::Xor.eval_binary(a, b),
            BinarySel::Shl => Op::Shl.eval_binary(a, b),
            BinarySel::Shr => Op::Shr.eval_binary(a, b),
            BinarySel::Shru => Op::Shru.eval_binary(a, b),
            BinarySel::Addf => Op::Addf.eval_binary(a, b),
            BinarySel::Subf => Op::Subf.eval_binary(a, b),
            BinarySel::Mulf => Op::Mulf.eval_binary(a, b),
            BinarySel::Divf => Op::Divf.eval_binary(a, b),
            BinarySel::Comp(c) => Some(Value::of_opt_bool(Cond::Comp(c).eval(&[a, b]))),
            BinarySel::Compu(c) => Some(Value::of_opt_bool(Cond::Compu(c).eval(&[a, b]))),
            BinarySel::Compf(c) => Some(Value::of_opt_bool(Cond::Compf(c).eval(&[a, b]))),
        }
    }
}

/// Select a unary source operator applied to one operand expression.
pub fn select_unary(sel: UnarySel, e: Expr) -> Expr {
    match sel {
        UnarySel::Cast8Signed => convert::cast8signed(e),
        UnarySel::Cast8Unsigned => convert::cast8unsigned(e),
        UnarySel::Cast16Signed => convert::cast16signed(e),
        UnarySel::Cast16Unsigned => convert::cast16unsigned(e),
        UnarySel::Notint => logic::notint(e),
        UnarySel::Boolval => logic::boolval(e),
        UnarySel::Notbool => logic::notbool(e),
        UnarySel::Negf => convert::negf(e),
        UnarySel::Absf => convert::absf(e),
        UnarySel::Singleoffloat => convert::singleoffloat(e),
        UnarySel::Intoffloat => convert::intoffloat(e),
        UnarySel::Intuoffloat => convert::intuoffloat(e),
        UnarySel::Floatofint => convert::floatofint(e),
        UnarySel::Floatofintu => convert::floatofintu(e),
        UnarySel::Addimm(n) => arith::addimm(n, e),
        UnarySel::Mulimm(n) => arith::mulimm(n, e),
        UnarySel::Andimm(n) => logic::andimm(n, e),
        UnarySel::Orimm(n) => logic::orimm(n, e),
        UnarySel::Xorimm(n) => logic::xorimm(n, e),
        UnarySel::Shlimm(n) => shift::shlimm(e, n),
        UnarySel::Shrimm(n) => shift::shrimm(e, n),
        UnarySel::Shruimm(n) => shift::shruimm(e, n),
    }
}

/// Select a binary source operator applied to two operand expressions.
pub fn select_binary(sel: BinarySel, e1: Expr, e2: Expr) -> Expr {
    match sel {
        BinarySel::Add => arith::add(e1, e2),
        BinarySel::Sub => arith::sub(e1, e2),
        BinarySel::Mul => arith::mul(e1, e2),
        BinarySel::Divs => divmod::divs(e1, e2),
        BinarySel::Divu => divmod::divu(e1, e2),
        BinarySel::Mods => divmod::mods(e1, e2),
        BinarySel::Modu => divmod::modu(e1, e2),
        BinarySel::And => logic::and(e1, e2),
        BinarySel::Or => logic::or(e1, e2),
        BinarySel::Xor => logic::xor(e1, e2),
        BinarySel::Shl => shift::shl(e1, e2),
        BinarySel::Shr => shift::shr(e1, e2),
        BinarySel::Shru => shift::shru(e1, e2),
        BinarySel::Addf => convert::addf(e1, e2),
        BinarySel::Subf => convert::subf(e1, e2),
        BinarySel::Mulf => convert::mulf(e1, e2),
        BinarySel::Divf => convert::divf(e1, e2),
        BinarySel::Comp(c) => compare::comp(c, e1, e2),
        BinarySel::Compu(c) => compare::compu(c, e1, e2),
        BinarySel::Compf(c) => compare::compf(c, e1, e2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Env;
    use crate::op::Symbol;
    use pretty_assertions::assert_eq;

    /// Representative operand shapes: everything a classifier might
    /// recognize, plus shapes none of the fast paths know.
    fn operand_shapes() -> Vec<Expr> {
        vec![
            Expr::Var(0),
            Expr::Var(1),
            Expr::intconst(0),
            Expr::intconst(1),
            Expr::intconst(-1),
            Expr::intconst(i32::MIN),
            Expr::intconst(8),
            Expr::intconst(12),
            Expr::addrsymbol(Symbol(1), 4),
            arith::addimm(3, Expr::Var(0)),
            shift::shlimm(Expr::Var(0), 4),
            logic::notint(Expr::Var(1)),
            logic::andimm(0xFF, Expr::Var(0)),
            compare::comp(Comparison::Lt, Expr::Var(0), Expr::intconst(5)),
            Expr::conditional(
                compare::comp(Comparison::Ge, Expr::Var(0), Expr::intconst(0)),
                Expr::intconst(3),
                Expr::Var(1),
            ),
            Expr::floatconst(1.5),
            Expr::floatconst(f64::NAN),
            Expr::floatconst(2147483648.0),
        ]
    }

    /// Representative values for the two free variables of the shapes.
    fn var0_values() -> Vec<Value> {
        vec![
            Value::Int(0),
            Value::Int(1),
            Value::Int(-1),
            Value::Int(i32::MIN),
            Value::Int(64),
            Value::Int(100),
            Value::float(2.5),
            Value::float(f64::NAN),
            Value::Ptr { base: 2, offset: 8 },
            Value::Undef,
        ]
    }

    fn var1_values() -> Vec<Value> {
        vec![
            Value::Int(7),
            Value::Int(-1),
            Value::float(1.0),
            Value::Ptr { base: 3, offset: 4 },
            Value::Undef,
        ]
    }

    /// The central contract: on every operand shape and every environment,
    /// the selected expression evaluates to something at least as defined
    /// as the generic operator applied to the operand values.
    fn check_unary_sound(sel: UnarySel) {
        for shape in operand_shapes() {
            for &v0 in &var0_values() {
                for &v1 in &var1_values() {
                    let mut env = Env::new();
                    env.push(v1);
                    env.push(v0); // Var(0)
                    let operand = match shape.eval(&mut env.clone()) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    let generic = match sel.apply(operand) {
                        Some(g) => g,
                        None => continue, // caller-excluded partiality
                    };
                    let selected = select_unary(sel, shape.clone());
                    let result = selected
                        .eval(&mut env)
                        .unwrap_or_else(|e| panic!("{:?} on {:?}: {}", sel, shape, e));
                    assert!(
                        generic.lessdef(result),
                        "{:?} on {:?} with operand {:?}: generic {:?} vs selected {:?}",
                        sel, shape, operand, generic, result
                    );
                }
            }
        }
    }

    fn check_binary_sound(sel: BinarySel) {
        for shape1 in operand_shapes() {
            for shape2 in operand_shapes() {
                for &v0 in &var0_values() {
                    for &v1 in &var1_values() {
                        let mut env = Env::new();
                        env.push(v1);
                        env.push(v0);
                        let (a, b) = match (
                            shape1.eval(&mut env.clone()),
                            shape2.eval(&mut env.clone()),
                        ) {
                            (Ok(a), Ok(b)) => (a, b),
                            _ => continue,
                        };
                        let generic = match sel.apply(a, b) {
                            Some(g) => g,
                            None => continue,
                        };
                        let selected = select_binary(sel, shape1.clone(), shape2.clone());
                        let result = selected.eval(&mut env).unwrap_or_else(|e| {
                            panic!("{:?} on {:?}, {:?}: {}", sel, shape1, shape2, e)
                        });
                        assert!(
                            generic.lessdef(result),
                            "{:?} on ({:?}, {:?}) = ({:?}, {:?}): generic {:?} vs selected {:?}",
                            sel, shape1, shape2, a, b, generic, result
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_unary_casts_sound() {
        for sel in [
            UnarySel::Cast8Signed,
            UnarySel::Cast8Unsigned,
            UnarySel::Cast16Signed,
            UnarySel::Cast16Unsigned,
        ] {
            check_unary_sound(sel);
        }
    }

    #[test]
    fn test_unary_logic_sound() {
        for sel in [UnarySel::Notint, UnarySel::Boolval, UnarySel::Notbool] {
            check_unary_sound(sel);
        }
    }

    #[test]
    fn test_unary_immediates_sound() {
        for sel in [
            UnarySel::Addimm(0),
            UnarySel::Addimm(7),
            UnarySel::Addimm(i32::MIN),
            UnarySel::Mulimm(0),
            UnarySel::Mulimm(1),
            UnarySel::Mulimm(8),
            UnarySel::Mulimm(12),
            UnarySel::Mulimm(-7),
            UnarySel::Andimm(0xFF),
            UnarySel::Andimm(0xF0F0_F0F0),
            UnarySel::Orimm(0),
            UnarySel::Orimm(0x8000_0001),
            UnarySel::Xorimm(0),
            UnarySel::Xorimm(u32::MAX),
        ] {
            check_unary_sound(sel);
        }
    }

    #[test]
    fn test_unary_shifts_sound() {
        for n in [0, 1, 4, 31, 32, -1] {
            check_unary_sound(UnarySel::Shlimm(n));
            check_unary_sound(UnarySel::Shrimm(n));
            check_unary_sound(UnarySel::Shruimm(n));
        }
    }

    #[test]
    fn test_unary_float_sound() {
        for sel in [
            UnarySel::Negf,
            UnarySel::Absf,
            UnarySel::Singleoffloat,
            UnarySel::Intoffloat,
            UnarySel::Intuoffloat,
            UnarySel::Floatofint,
            UnarySel::Floatofintu,
        ] {
            check_unary_sound(sel);
        }
    }

    #[test]
    fn test_binary_integer_sound() {
        for sel in [
            BinarySel::Add,
            BinarySel::Sub,
            BinarySel::Mul,
            BinarySel::And,
            BinarySel::Or,
            BinarySel::Xor,
            BinarySel::Shl,
            BinarySel::Shr,
            BinarySel::Shru,
        ] {
            check_binary_sound(sel);
        }
    }

    #[test]
    fn test_binary_divmod_sound() {
        for sel in [BinarySel::Divs, BinarySel::Divu, BinarySel::Mods, BinarySel::Modu] {
            check_binary_sound(sel);
        }
    }

    #[test]
    fn test_binary_float_sound() {
        for sel in [BinarySel::Addf, BinarySel::Subf, BinarySel::Mulf, BinarySel::Divf] {
            check_binary_sound(sel);
        }
    }

    #[test]
    fn test_binary_compare_sound() {
        for c in [Comparison::Eq, Comparison::Ne, Comparison::Lt, Comparison::Ge] {
            check_binary_sound(BinarySel::Comp(c));
            check_binary_sound(BinarySel::Compu(c));
            check_binary_sound(BinarySel::Compf(c));
        }
    }

    #[test]
    fn test_scenario_fold_of_two_addimm_operands() {
        let e = select_binary(
            BinarySel::Add,
            arith::addimm(3, Expr::Var(1)),
            arith::addimm(4, Expr::Var(0)),
        );
        assert_eq!(
            e,
            Expr::unop(Op::Addimm(7), Expr::binop(Op::Add, Expr::Var(1), Expr::Var(0)))
        );
    }

    #[test]
    fn test_scenario_divu_by_power_of_two() {
        let e = select_binary(BinarySel::Divu, Expr::Var(0), Expr::intconst(8));
        assert_eq!(e, Expr::unop(Op::Rolm(29, u32::MAX >> 3), Expr::Var(0)));
    }

    #[test]
    fn test_scenario_notbool_of_comparison() {
        let e = select_unary(
            UnarySel::Notbool,
            select_binary(BinarySel::Comp(Comparison::Lt), Expr::Var(0), Expr::Var(1)),
        );
        assert_eq!(
            e,
            Expr::binop(Op::Cmp(Cond::Comp(Comparison::Ge)), Expr::Var(0), Expr::Var(1))
        );
    }
}
