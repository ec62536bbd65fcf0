use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::ids::NodeId;
use crate::foundation::rand::Rng64;
use smallvec::SmallVec;

/// Read-only view of one query's state while an expression is walked.
///
/// `values` is the per-query memo indexed by graph node; the topological
/// walk guarantees every node the expression references is already filled.
pub(crate) struct EvalScope<'a> {
    /// Query position in the channel-local domain.
    pub(crate) time: f64,
    pub(crate) values: &'a [Option<f64>],
    pub(crate) var_count: u32,
    pub(crate) rng: &'a mut Rng64,
}

impl EvalScope<'_> {
    fn node_value(&self, node: NodeId) -> KeysplineResult<f64> {
        match self.values.get(node.0 as usize) {
            Some(Some(v)) => Ok(*v),
            _ => Err(KeysplineError::evaluation(
                "referenced node has no computed value",
            )),
        }
    }
}

/// Pure recursive walk of a bound tree. Arithmetic follows IEEE-754
/// (division by zero yields an infinity, not an error).
pub(crate) fn eval_expr(e: &Expr, scope: &mut EvalScope<'_>) -> KeysplineResult<f64> {
    match e {
        Expr::Num(v) => Ok(*v),
        Expr::Time => Ok(scope.time),
        Expr::Var(vid) => scope.node_value(NodeId::from_var(*vid)),
        Expr::Channel(cid) => scope.node_value(NodeId::from_channel(*cid, scope.var_count)),
        Expr::Unary { op, expr } => {
            let v = eval_expr(expr, scope)?;
            match op {
                UnaryOp::Neg => Ok(-v),
            }
        }
        Expr::Binary { op, left, right } => {
            let a = eval_expr(left, scope)?;
            let b = eval_expr(right, scope)?;
            Ok(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Pow => a.powf(b),
            })
        }
        Expr::Func { func, args } => {
            let mut vals: SmallVec<[f64; 2]> = SmallVec::with_capacity(args.len());
            for a in args {
                vals.push(eval_expr(a, scope)?);
            }
            func.call(&vals, scope.rng)
        }
        Expr::Call { .. } | Expr::Path(_) => Err(KeysplineError::evaluation(
            "expression was not bound before evaluation",
        )),
    }
}
