//! Addressing-mode extraction.
//!
//! Splits a pointer-valued expression into one of the memory operand shapes
//! the target accepts, plus the argument expressions that shape consumes.
//! Reconstructing the address from the chosen mode's arguments yields
//! exactly the pointer the expression denotes.

use crate::expr::Expr;
use crate::op::{Op, Symbol};
use crate::value::Value;

/// Access width of the memory operation the address feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    Int8Signed,
    Int8Unsigned,
    Int16Signed,
    Int16Unsigned,
    Int32,
    Float32,
    Float64,
}

/// A target memory operand shape. Every mode's address is the sum of its
/// arguments and its constant parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Symbol + fixed offset; no register arguments.
    Global(Symbol, i32),
    /// Register + symbol + fixed offset; one register argument.
    Based(Symbol, i32),
    /// Register + immediate; one register argument. Immediate 0 is the bare
    /// register form.
    Indexed(i32),
    /// Register + register + immediate; two register arguments. Immediate 0
    /// is the plain two-register form.
    Indexed2(i32),
}

impl AddressingMode {
    /// Number of argument expressions the mode consumes.
    pub fn arity(self) -> usize {
        match self {
            AddressingMode::Global(..) => 0,
            AddressingMode::Based(..) | AddressingMode::Indexed(_) => 1,
            AddressingMode::Indexed2(_) => 2,
        }
    }

    /// Reconstruct the address denoted by this mode from its evaluated
    /// arguments. `None` on an arity mismatch.
    pub fn eval(self, args: &[Value]) -> Option<Value> {
        match (self, args) {
            (AddressingMode::Global(s, ofs), []) => {
                Some(Value::Ptr { base: s.0, offset: ofs })
            }
            (AddressingMode::Based(s, ofs), [v]) => {
                Op::Add.eval_binary(Value::Ptr { base: s.0, offset: ofs }, *v)
            }
            (AddressingMode::Indexed(ofs), [v]) => Op::Add.eval_binary(*v, Value::Int(ofs)),
            (AddressingMode::Indexed2(ofs), [v1, v2]) => {
                let sum = Op::Add.eval_binary(*v1, *v2)?;
                Op::Add.eval_binary(sum, Value::Int(ofs))
            }
            _ => None,
        }
    }
}

/// Split a pointer expression into an addressing mode and its arguments.
/// The chunk does not restrict the mode choice on this target; every access
/// width accepts the full mode set.
pub fn addressing(_chunk: Chunk, e: Expr) -> (AddressingMode, Vec<Expr>) {
    match e {
        Expr::Op(Op::Addrsymbol(s, n), _) => (AddressingMode::Global(s, n), vec![]),
        Expr::Op(Op::Addimm(n), mut args) if args.len() == 1 => {
            let t = args.remove(0);
            (AddressingMode::Indexed(n), vec![t])
        }
        Expr::Op(Op::Add, args) if args.len() == 2 => classify_sum(args),
        e => (AddressingMode::Indexed(0), vec![e]),
    }
}

/// Mode selection for a two-operand sum: symbol operands become based
/// addressing, an add-immediate operand folds into the mode's displacement.
fn classify_sum(mut args: Vec<Expr>) -> (AddressingMode, Vec<Expr>) {
    let t2 = args.remove(1);
    let t1 = args.remove(0);
    match (t1, t2) {
        (Expr::Op(Op::Addrsymbol(s, n), _), t2) => (AddressingMode::Based(s, n), vec![t2]),
        (t1, Expr::Op(Op::Addrsymbol(s, n), _)) => (AddressingMode::Based(s, n), vec![t1]),
        (Expr::Op(Op::Addimm(n), mut inner), t2) if inner.len() == 1 => {
            let t1 = inner.remove(0);
            (AddressingMode::Indexed2(n), vec![t1, t2])
        }
        (t1, Expr::Op(Op::Addimm(n), mut inner)) if inner.len() == 1 => {
            let t2 = inner.remove(0);
            (AddressingMode::Indexed2(n), vec![t1, t2])
        }
        (t1, t2) => (AddressingMode::Indexed2(0), vec![t1, t2]),
    }
}
