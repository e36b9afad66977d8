//! Target expression trees and the reference evaluator.
//!
//! `Expr` is the immutable tree the combinators build: variables are de
//! Bruijn indices into a value environment, `Let` expresses explicit sharing
//! of a computed subexpression, `Op` applies a target operator, and
//! `Conditional` branches on the boolean interpretation of its scrutinee,
//! evaluating only the taken branch.
//!
//! The evaluator here is the reference oracle: combinator outputs are
//! judged against it, it is never part of generated code.

use thiserror::Error;

use crate::op::{Op, Symbol};
use crate::value::Value;

/// A target expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Reference to a bound value, innermost binder first: `Var(0)` is the
    /// nearest enclosing `Let`.
    Var(usize),
    /// Evaluate the first expression, push its value, evaluate the body,
    /// pop.
    Let(Box<Expr>, Box<Expr>),
    /// Operator application; arity must match the operator.
    Op(Op, Vec<Expr>),
    /// Branch on the scrutinee's boolean interpretation. Only the taken
    /// branch is evaluated.
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Evaluation environment: the stack of values bound by enclosing `Let`s.
#[derive(Debug, Clone, Default)]
pub struct Env {
    slots: Vec<Value>,
}

impl Env {
    pub fn new() -> Env {
        Env { slots: Vec::new() }
    }

    /// Number of bound values.
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Push a newly bound value (innermost position).
    pub fn push(&mut self, v: Value) {
        self.slots.push(v);
    }

    /// Pop the innermost bound value.
    pub fn pop(&mut self) {
        self.slots.pop();
    }

    /// Read the value `index` binders out from the innermost one.
    pub fn lookup(&self, index: usize) -> Option<Value> {
        if index < self.slots.len() {
            Some(self.slots[self.slots.len() - 1 - index])
        } else {
            None
        }
    }
}

/// Why the oracle failed to produce a value for an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A `Var` index reached past the bound environment.
    #[error("unbound variable {index} at binding depth {depth}")]
    UnboundVar { index: usize, depth: usize },
    /// An operator application with no value: wrong arity, or the division
    /// partiality cases.
    #[error("operation {op:?} has no value for its arguments")]
    UndefinedOperation { op: Op },
    /// A conditional whose scrutinee has no boolean interpretation.
    #[error("conditional scrutinee has no boolean interpretation")]
    UndefinedTest,
}

impl Expr {
    /// Integer constant expression.
    pub fn intconst(n: i32) -> Expr {
        Expr::Op(Op::Intconst(n), Vec::new())
    }

    /// Double constant expression.
    pub fn floatconst(v: f64) -> Expr {
        Expr::Op(Op::Floatconst(v.to_bits()), Vec::new())
    }

    /// Double constant expression from raw binary64 bits.
    pub fn floatconst_bits(bits: u64) -> Expr {
        Expr::Op(Op::Floatconst(bits), Vec::new())
    }

    /// Symbol+offset constant expression.
    pub fn addrsymbol(s: Symbol, ofs: i32) -> Expr {
        Expr::Op(Op::Addrsymbol(s, ofs), Vec::new())
    }

    pub fn unop(op: Op, e: Expr) -> Expr {
        Expr::Op(op, vec![e])
    }

    pub fn binop(op: Op, e1: Expr, e2: Expr) -> Expr {
        Expr::Op(op, vec![e1, e2])
    }

    pub fn letin(bound: Expr, body: Expr) -> Expr {
        Expr::Let(Box::new(bound), Box::new(body))
    }

    pub fn conditional(cond: Expr, then_e: Expr, else_e: Expr) -> Expr {
        Expr::Conditional(Box::new(cond), Box::new(then_e), Box::new(else_e))
    }

    /// Shift every free `Var` index up by `by`. Needed when an existing
    /// operand expression is placed under freshly introduced `Let` binders:
    /// its references to outer bindings must skip the new ones.
    pub fn lift(&self, by: usize) -> Expr {
        self.lift_above(0, by)
    }

    fn lift_above(&self, bound: usize, by: usize) -> Expr {
        match self {
            Expr::Var(i) => {
                if *i >= bound {
                    Expr::Var(i + by)
                } else {
                    Expr::Var(*i)
                }
            }
            Expr::Let(b, body) => {
                Expr::letin(b.lift_above(bound, by), body.lift_above(bound + 1, by))
            }
            Expr::Op(op, args) => {
                Expr::Op(*op, args.iter().map(|a| a.lift_above(bound, by)).collect())
            }
            Expr::Conditional(c, t, f) => Expr::conditional(
                c.lift_above(bound, by),
                t.lift_above(bound, by),
                f.lift_above(bound, by),
            ),
        }
    }

    /// Evaluate under the given environment.
    pub fn eval(&self, env: &mut Env) -> Result<Value, EvalError> {
        match self {
            Expr::Var(i) => env
                .lookup(*i)
                .ok_or(EvalError::UnboundVar { index: *i, depth: env.depth() }),
            Expr::Let(bound, body) => {
                let v = bound.eval(env)?;
                env.push(v);
                let r = body.eval(env);
                env.pop();
                r
            }
            Expr::Op(op, args) => {
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(a.eval(env)?);
                }
                op.eval(&vals).ok_or(EvalError::UndefinedOperation { op: *op })
            }
            Expr::Conditional(c, t, f) => {
                let cv = c.eval(env)?;
                match cv.truthiness() {
                    Some(true) => t.eval(env),
                    Some(false) => f.eval(env),
                    None => Err(EvalError::UndefinedTest),
                }
            }
        }
    }
}

/// Conservative syntactic equality between two operand expressions, used to
/// justify reading one computed value in place of the other. Only `Var`/`Op`
/// trees are ever certified equal; anything containing a binder or a branch
/// is rejected outright, even if structurally identical.
pub fn same_expr_pure(a: &Expr, b: &Expr) -> bool {
    match (a, b) {
        (Expr::Var(i), Expr::Var(j)) => i == j,
        (Expr::Op(op1, args1), Expr::Op(op2, args2)) => {
            op1 == op2
                && args1.len() == args2.len()
                && args1.iter().zip(args2).all(|(x, y)| same_expr_pure(x, y))
        }
        _ => false,
    }
}
