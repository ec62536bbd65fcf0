//! Per-query evaluation: the dependency-ordered walk that turns a
//! compiled scene and a position into channel values.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::compile::compiler::{CompiledChannel, CompiledScene, CompiledValue};
use crate::curve::{self, CurveKey};
use crate::expression::eval::{EvalScope, eval_expr};
use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::ids::{ChannelId, NodeId};
use crate::foundation::rand::node_rng;

/// Caller-supplied channel values for one query, keyed by qualified
/// `spline.channel` name. An override shadows the channel's computed
/// value verbatim; `min_max` is not applied to it.
pub type Overrides = BTreeMap<String, f64>;

/// What happens to query positions outside the declared `range`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangePolicy {
    /// Clamp the position to the nearer range bound.
    #[default]
    Clamp,
    /// Fail the query with an evaluation error.
    Error,
}

impl CompiledScene {
    /// Value of one channel at `position`.
    ///
    /// Evaluates only the channel and its transitive dependencies; every
    /// node is computed at most once. Naming an unknown channel, either
    /// as the target or in `overrides`, is an evaluation error.
    pub fn query(&self, channel: &str, position: f64, overrides: &Overrides) -> KeysplineResult<f64> {
        let cid = self.channel_id(channel)?;
        let mut ctx = QueryCtx::new(self, position, overrides)?;
        let node = NodeId::from_channel(cid, self.var_count());
        ctx.mark_needed(node);
        ctx.run()?;
        ctx.value(node)
    }

    /// Values of every channel at `position`, keyed by qualified name.
    pub fn query_all(
        &self,
        position: f64,
        overrides: &Overrides,
    ) -> KeysplineResult<BTreeMap<String, f64>> {
        let mut ctx = QueryCtx::new(self, position, overrides)?;
        for cid in 0..self.channels.len() as u32 {
            ctx.mark_needed(NodeId::from_channel(ChannelId(cid), self.var_count()));
        }
        ctx.run()?;
        let mut out = BTreeMap::new();
        for (i, channel) in self.channels.iter().enumerate() {
            let node = NodeId::from_channel(ChannelId(i as u32), self.var_count());
            out.insert(channel.qualified.clone(), ctx.value(node)?);
        }
        Ok(out)
    }

    /// The published view at `position`: public name to value.
    pub fn published_at(&self, position: f64) -> KeysplineResult<BTreeMap<String, f64>> {
        let overrides = Overrides::new();
        let mut ctx = QueryCtx::new(self, position, &overrides)?;
        for &cid in self.published.values() {
            ctx.mark_needed(NodeId::from_channel(cid, self.var_count()));
        }
        ctx.run()?;
        let mut out = BTreeMap::new();
        for (name, &cid) in &self.published {
            let node = NodeId::from_channel(cid, self.var_count());
            out.insert(name.clone(), ctx.value(node)?);
        }
        Ok(out)
    }
}

/// One query's ephemeral state. Dropped when the query returns, so
/// nothing carries over between positions.
struct QueryCtx<'s> {
    scene: &'s CompiledScene,
    /// Policy-mapped position in the channel-local domain.
    local: f64,
    /// Memo by node id; each slot is written at most once.
    values: Vec<Option<f64>>,
    needed: Vec<bool>,
    /// Override values spread onto node ids.
    overrides: Vec<Option<f64>>,
}

impl<'s> QueryCtx<'s> {
    fn new(scene: &'s CompiledScene, position: f64, overrides: &Overrides) -> KeysplineResult<Self> {
        let local = map_position(scene, position)?;
        let mut by_node = vec![None; scene.node_count()];
        for (name, &value) in overrides {
            let cid = scene.channel_by_name.get(name).copied().ok_or_else(|| {
                KeysplineError::evaluation(format!("override names unknown channel '{name}'"))
            })?;
            by_node[NodeId::from_channel(cid, scene.var_count()).0 as usize] = Some(value);
        }
        Ok(Self {
            scene,
            local,
            values: vec![None; scene.node_count()],
            needed: vec![false; scene.node_count()],
            overrides: by_node,
        })
    }

    /// Marks `root` and its transitive dependencies. An overridden node
    /// is used verbatim, so its dependencies stay unmarked.
    fn mark_needed(&mut self, root: NodeId) {
        let scene = self.scene;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let i = node.0 as usize;
            if self.needed[i] {
                continue;
            }
            self.needed[i] = true;
            if self.overrides[i].is_some() {
                continue;
            }
            stack.extend_from_slice(&scene.graph.deps[i]);
        }
    }

    /// Walks the topological order, filling memo slots for needed nodes.
    fn run(&mut self) -> KeysplineResult<()> {
        let scene = self.scene;
        let var_count = scene.var_count();
        for &node in &scene.graph.eval_order {
            let i = node.0 as usize;
            if !self.needed[i] {
                continue;
            }
            let value = if let Some(v) = self.overrides[i] {
                v
            } else {
                // Each node draws from its own stream, so results do not
                // depend on which other nodes a query happens to touch.
                let mut rng = node_rng(scene.seed, &scene.node_names[i], self.local);
                let mut scope = EvalScope {
                    time: self.local,
                    values: &self.values,
                    var_count,
                    rng: &mut rng,
                };
                match node.as_channel(var_count) {
                    None => match &scene.vars[i].value {
                        CompiledValue::Literal(v) => *v,
                        CompiledValue::Expr(e) => eval_expr(e, &mut scope)?,
                    },
                    Some(cid) => eval_channel(&scene.channels[cid.0 as usize], &mut scope)?,
                }
            };
            self.values[i] = Some(value);
        }
        Ok(())
    }

    fn value(&self, node: NodeId) -> KeysplineResult<f64> {
        self.values[node.0 as usize]
            .ok_or_else(|| KeysplineError::evaluation("channel value was not computed"))
    }
}

fn eval_channel(channel: &CompiledChannel, scope: &mut EvalScope<'_>) -> KeysplineResult<f64> {
    let mut keys: SmallVec<[CurveKey; 8]> = SmallVec::with_capacity(channel.keys.len());
    for key in &channel.keys {
        let value = match &key.value {
            CompiledValue::Literal(v) => *v,
            CompiledValue::Expr(e) => eval_expr(e, scope)?,
        };
        keys.push(CurveKey {
            position: key.position,
            value,
            algorithm: key.algorithm,
            cp: key.cp,
            deriv: key.deriv,
        });
    }
    let v = curve::value_at(&keys, channel.algorithm, scope.time);
    Ok(match channel.min_max {
        Some([lo, hi]) => v.clamp(lo, hi),
        None => v,
    })
}

/// Applies the range policy, then maps the external position onto the
/// local domain the keyframes are written in. The default `[0, 1]`
/// range makes this the identity.
fn map_position(scene: &CompiledScene, position: f64) -> KeysplineResult<f64> {
    if !position.is_finite() {
        return Err(KeysplineError::evaluation(format!(
            "query position {position} is not finite"
        )));
    }
    let [lo, hi] = scene.range;
    let p = if position < lo || position > hi {
        match scene.options.range_policy {
            RangePolicy::Clamp => position.clamp(lo, hi),
            RangePolicy::Error => {
                return Err(KeysplineError::evaluation(format!(
                    "position {position} outside declared range [{lo}, {hi}]"
                )));
            }
        }
    } else {
        position
    };
    Ok((p - lo) / (hi - lo))
}
