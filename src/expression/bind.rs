use crate::expression::ast::Expr;
use crate::expression::builtins::Builtin;
use crate::expression::error::ExprError;
use crate::foundation::ids::{ChannelId, VarId};
use std::collections::HashMap;

/// Declared names an expression may reference: variables by bare name,
/// channels by qualified `spline.channel` name. Built once at load.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    pub(crate) var_by_name: HashMap<String, VarId>,
    pub(crate) channel_by_name: HashMap<String, ChannelId>,
}

/// Resolve every `Path` and `Call` in the tree against the symbol table.
/// The returned tree contains only evaluable node kinds.
pub(crate) fn bind_expr(e: Expr, symbols: &SymbolTable) -> Result<Expr, ExprError> {
    match e {
        Expr::Num(_) | Expr::Var(_) | Expr::Channel(_) | Expr::Time => Ok(e),
        Expr::Unary { op, expr } => Ok(Expr::Unary {
            op,
            expr: Box::new(bind_expr(*expr, symbols)?),
        }),
        Expr::Binary { op, left, right } => Ok(Expr::Binary {
            op,
            left: Box::new(bind_expr(*left, symbols)?),
            right: Box::new(bind_expr(*right, symbols)?),
        }),
        Expr::Call { func, args } => {
            let builtin = Builtin::from_name(&func)
                .ok_or_else(|| ExprError::new(0, format!("unknown function \"{func}\"")))?;
            if args.len() != builtin.arity() {
                return Err(ExprError::new(
                    0,
                    format!(
                        "{} expects {} argument(s), got {}",
                        builtin.name(),
                        builtin.arity(),
                        args.len()
                    ),
                ));
            }
            let mut out_args = Vec::with_capacity(args.len());
            for a in args {
                out_args.push(bind_expr(a, symbols)?);
            }
            Ok(Expr::Func {
                func: builtin,
                args: out_args,
            })
        }
        Expr::Func { func, args } => {
            let mut out_args = Vec::with_capacity(args.len());
            for a in args {
                out_args.push(bind_expr(a, symbols)?);
            }
            Ok(Expr::Func {
                func,
                args: out_args,
            })
        }
        Expr::Path(p) => bind_path(p, symbols),
    }
}

fn bind_path(p: Vec<String>, symbols: &SymbolTable) -> Result<Expr, ExprError> {
    match p.len() {
        1 => {
            let name = &p[0];
            if let Some(&vid) = symbols.var_by_name.get(name) {
                return Ok(Expr::Var(vid));
            }
            if name == "t" {
                return Ok(Expr::Time);
            }
            Err(ExprError::undefined(
                0,
                format!("unknown identifier \"{name}\""),
            ))
        }
        2 => {
            let qname = format!("{}.{}", p[0], p[1]);
            let cid = symbols
                .channel_by_name
                .get(&qname)
                .copied()
                .ok_or_else(|| ExprError::undefined(0, format!("unknown channel \"{qname}\"")))?;
            Ok(Expr::Channel(cid))
        }
        _ => Err(ExprError::new(
            0,
            format!(
                "channel reference must be 'spline.channel', got '{}'",
                p.join(".")
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::error::ExprErrorKind;
    use crate::expression::parser::parse_expr;

    fn symbols() -> SymbolTable {
        let mut s = SymbolTable::default();
        s.var_by_name.insert("amp".to_owned(), VarId(0));
        s.channel_by_name.insert("pos.x".to_owned(), ChannelId(2));
        s
    }

    #[test]
    fn binds_vars_channels_and_time() {
        let s = symbols();

        let e = bind_expr(parse_expr("amp").unwrap(), &s).unwrap();
        assert_eq!(e, Expr::Var(VarId(0)));

        let e = bind_expr(parse_expr("pos.x").unwrap(), &s).unwrap();
        assert_eq!(e, Expr::Channel(ChannelId(2)));

        let e = bind_expr(parse_expr("t").unwrap(), &s).unwrap();
        assert_eq!(e, Expr::Time);

        let e = bind_expr(parse_expr("@").unwrap(), &s).unwrap();
        assert_eq!(e, Expr::Time);
    }

    #[test]
    fn unknown_names_are_undefined_symbols() {
        let s = symbols();

        let err = bind_expr(parse_expr("missing").unwrap(), &s).unwrap_err();
        assert_eq!(err.kind, ExprErrorKind::UndefinedSymbol);

        let err = bind_expr(parse_expr("pos.z").unwrap(), &s).unwrap_err();
        assert_eq!(err.kind, ExprErrorKind::UndefinedSymbol);
        assert!(err.message.contains("pos.z"));
    }

    #[test]
    fn call_arity_is_checked_at_bind_time() {
        let s = symbols();

        let err = bind_expr(parse_expr("sin(1, 2)").unwrap(), &s).unwrap_err();
        assert_eq!(err.kind, ExprErrorKind::Syntax);
        assert!(err.message.contains("sin expects 1"));

        let err = bind_expr(parse_expr("nope(1)").unwrap(), &s).unwrap_err();
        assert_eq!(err.kind, ExprErrorKind::Syntax);
        assert!(err.message.contains("unknown function"));
    }

    #[test]
    fn rejects_deep_paths() {
        let s = symbols();
        let err = bind_expr(parse_expr("a.b.c").unwrap(), &s).unwrap_err();
        assert_eq!(err.kind, ExprErrorKind::Syntax);
    }
}
