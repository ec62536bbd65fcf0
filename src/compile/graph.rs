use crate::expression::ast::Expr;
use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::ids::NodeId;

/// Collects every graph node an expression reads.
pub(crate) fn scan_refs(e: &Expr, var_count: u32, out: &mut Vec<NodeId>) {
    match e {
        Expr::Num(_) | Expr::Time => {}
        Expr::Var(vid) => out.push(NodeId::from_var(*vid)),
        Expr::Channel(cid) => out.push(NodeId::from_channel(*cid, var_count)),
        Expr::Unary { expr, .. } => scan_refs(expr, var_count, out),
        Expr::Binary { left, right, .. } => {
            scan_refs(left, var_count, out);
            scan_refs(right, var_count, out);
        }
        Expr::Func { args, .. } | Expr::Call { args, .. } => {
            for a in args {
                scan_refs(a, var_count, out);
            }
        }
        Expr::Path(_) => {}
    }
}

/// Static dependency graph over all scene nodes, variables first and
/// channels after. `deps[i]` lists the nodes node `i` reads.
#[derive(Debug)]
pub(crate) struct DepGraph {
    pub(crate) deps: Vec<Vec<NodeId>>,
    /// Dependencies-first order covering every node, built once at load.
    pub(crate) eval_order: Vec<NodeId>,
}

/// Orders the graph by depth-first search, dependencies before
/// dependents. A back edge aborts the load with the full cycle path in
/// display names, first node repeated at the end.
pub(crate) fn build(deps: Vec<Vec<NodeId>>, names: &[String]) -> KeysplineResult<DepGraph> {
    let n = deps.len();
    let mut state = vec![0u8; n]; // 0=unvisited,1=visiting,2=done
    let mut stack: Vec<u32> = Vec::new();
    let mut eval_order: Vec<NodeId> = Vec::with_capacity(n);

    fn dfs(
        v: u32,
        deps: &[Vec<NodeId>],
        state: &mut [u8],
        stack: &mut Vec<u32>,
        order: &mut Vec<NodeId>,
    ) -> Option<Vec<u32>> {
        state[v as usize] = 1;
        stack.push(v);
        for &to in &deps[v as usize] {
            let st = state[to.0 as usize];
            if st == 0 {
                if let Some(c) = dfs(to.0, deps, state, stack, order) {
                    return Some(c);
                }
            } else if st == 1 {
                let pos = stack.iter().position(|&x| x == to.0).unwrap_or(0);
                let mut cycle = stack[pos..].to_vec();
                cycle.push(to.0);
                return Some(cycle);
            }
        }
        stack.pop();
        state[v as usize] = 2;
        order.push(NodeId(v));
        None
    }

    for i in 0..n {
        if state[i] == 0
            && let Some(c) = dfs(i as u32, &deps, &mut state, &mut stack, &mut eval_order)
        {
            let cycle = c
                .iter()
                .map(|&i| names[i as usize].clone())
                .collect::<Vec<_>>();
            return Err(KeysplineError::CyclicDependency { cycle });
        }
    }

    Ok(DepGraph { deps, eval_order })
}
