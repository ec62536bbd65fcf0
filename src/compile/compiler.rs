//! Scene loading: validation, symbol interning, expression compilation,
//! dependency ordering, and publish resolution, in one pass.

use std::collections::{BTreeMap, HashMap};

use crate::compile::graph::{self, DepGraph};
use crate::curve::Algorithm;
use crate::eval::backend::BackendKind;
use crate::eval::context::RangePolicy;
use crate::expression::ast::Expr;
use crate::expression::bind::{SymbolTable, bind_expr};
use crate::expression::error::{ExprError, ExprErrorKind};
use crate::expression::parser::parse_expr;
use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::ids::{ChannelId, NodeId, VarId};
use crate::publish::{self, PublishChannel, PublishPolicy};
use crate::scene::document::Scene;
use crate::scene::model::{SceneDef, ValueDef};
use crate::scene::validate::validate_scene;

/// Knobs applied when compiling a scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// What happens to query positions outside the declared `range`.
    pub range_policy: RangePolicy,
    /// How document-level and channel-level publish declarations combine.
    pub publish_policy: PublishPolicy,
    /// Sampling backend used by [`CompiledScene::sample_bulk`].
    pub backend: BackendKind,
}

/// A keyframe or variable value: resolved at load when literal,
/// re-evaluated per query when an expression.
#[derive(Debug, Clone)]
pub(crate) enum CompiledValue {
    Literal(f64),
    Expr(Expr),
}

#[derive(Debug)]
pub(crate) struct CompiledVar {
    pub(crate) name: String,
    pub(crate) value: CompiledValue,
}

#[derive(Debug)]
pub(crate) struct CompiledKey {
    pub(crate) position: f64,
    pub(crate) value: CompiledValue,
    /// Overrides the channel algorithm for the segment this key opens.
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) cp: Option<[f64; 4]>,
    pub(crate) deriv: Option<f64>,
}

#[derive(Debug)]
pub(crate) struct CompiledChannel {
    pub(crate) qualified: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) min_max: Option<[f64; 2]>,
    /// Ascending by position; positions are unique.
    pub(crate) keys: Vec<CompiledKey>,
}

/// Per-channel facts for tooling and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ChannelInfo<'a> {
    /// Qualified `spline.channel` name.
    pub name: &'a str,
    /// Tag of the channel's default interpolation algorithm.
    pub algorithm: &'static str,
    /// Number of keyframes.
    pub keyframes: usize,
}

/// An immutable, query-ready scene.
///
/// Produced by [`Scene::compile`]. Holds the compiled expressions, the
/// dependency order, and the publish table; queries never mutate it, so
/// it can be shared freely across threads.
#[derive(Debug)]
pub struct CompiledScene {
    pub(crate) name: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) seed: u64,
    pub(crate) range: [f64; 2],
    pub(crate) options: CompileOptions,
    /// Indexed by [`VarId`].
    pub(crate) vars: Vec<CompiledVar>,
    /// Indexed by [`ChannelId`], document order.
    pub(crate) channels: Vec<CompiledChannel>,
    pub(crate) channel_by_name: HashMap<String, ChannelId>,
    /// Display names by node id: variable names, then qualified channel names.
    pub(crate) node_names: Vec<String>,
    pub(crate) graph: DepGraph,
    /// Public name to channel, from the publish declarations.
    pub(crate) published: BTreeMap<String, ChannelId>,
}

impl CompiledScene {
    /// Compiles `scene` with default options.
    pub fn load(scene: &Scene) -> KeysplineResult<Self> {
        load(scene.def(), CompileOptions::default())
    }

    /// Declared scene name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared document version, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The external query domain `[min, max]`.
    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    /// The document seed feeding `rand` and `randint`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The options the scene was compiled with.
    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Declared variable names, in symbol order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.name.as_str())
    }

    /// Per-channel facts, in document order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelInfo<'_>> {
        self.channels.iter().map(|c| ChannelInfo {
            name: &c.qualified,
            algorithm: c.algorithm.tag(),
            keyframes: c.keys.len(),
        })
    }

    /// Public names the scene publishes, sorted.
    pub fn published_names(&self) -> impl Iterator<Item = &str> {
        self.published.keys().map(String::as_str)
    }

    pub(crate) fn var_count(&self) -> u32 {
        self.vars.len() as u32
    }

    pub(crate) fn node_count(&self) -> usize {
        self.vars.len() + self.channels.len()
    }

    pub(crate) fn channel_id(&self, name: &str) -> KeysplineResult<ChannelId> {
        self.channel_by_name
            .get(name)
            .copied()
            .ok_or_else(|| KeysplineError::evaluation(format!("unknown channel '{name}'")))
    }
}

/// Compiles a validated scene definition into a [`CompiledScene`].
#[tracing::instrument(skip(def, options), level = "debug")]
pub(crate) fn load(def: &SceneDef, options: CompileOptions) -> KeysplineResult<CompiledScene> {
    validate_scene(def)?;

    // Dense ids: variables first in name order, then channels in
    // document order. Node ids follow the same split.
    let mut symbols = SymbolTable::default();
    for (i, name) in def.variables.keys().enumerate() {
        let id = u32::try_from(i).map_err(|_| KeysplineError::validation("too many variables"))?;
        symbols.var_by_name.insert(name.clone(), VarId(id));
    }
    let var_count = symbols.var_by_name.len() as u32;

    let mut next_channel = 0u32;
    for spline in &def.splines {
        for channel in &spline.channels {
            let qualified = format!("{}.{}", spline.name, channel.name);
            symbols.channel_by_name.insert(qualified, ChannelId(next_channel));
            next_channel = next_channel
                .checked_add(1)
                .ok_or_else(|| KeysplineError::validation("too many channels"))?;
        }
    }

    let mut vars = Vec::with_capacity(def.variables.len());
    for (name, value) in &def.variables {
        let value = compile_value(value, &symbols, &format!("variable '{name}'"))?;
        vars.push(CompiledVar { name: name.clone(), value });
    }

    let mut channels = Vec::with_capacity(next_channel as usize);
    let mut declared_publish: Vec<&[String]> = Vec::with_capacity(next_channel as usize);
    for spline in &def.splines {
        for channel in &spline.channels {
            let qualified = format!("{}.{}", spline.name, channel.name);
            let algorithm = Algorithm::from_tag(&channel.interpolation)?;
            let mut keys = Vec::with_capacity(channel.keyframes.len());
            for key in &channel.keyframes {
                let context = format!("channel '{qualified}' keyframe @{}", key.position);
                let value = compile_value(&key.value, &symbols, &context)?;
                let algorithm = key.interpolation.as_deref().map(Algorithm::from_tag).transpose()?;
                keys.push(CompiledKey {
                    position: key.position,
                    value,
                    algorithm,
                    cp: key.cp,
                    deriv: key.deriv,
                });
            }
            keys.sort_by(|a, b| a.position.total_cmp(&b.position));
            declared_publish.push(&channel.publish);
            channels.push(CompiledChannel { qualified, algorithm, min_max: channel.min_max, keys });
        }
    }

    let node_count = vars.len() + channels.len();
    let mut node_names = Vec::with_capacity(node_count);
    node_names.extend(vars.iter().map(|v| v.name.clone()));
    node_names.extend(channels.iter().map(|c| c.qualified.clone()));

    let mut deps: Vec<Vec<NodeId>> = vec![Vec::new(); node_count];
    for (i, var) in vars.iter().enumerate() {
        if let CompiledValue::Expr(e) = &var.value {
            graph::scan_refs(e, var_count, &mut deps[i]);
        }
    }
    for (i, channel) in channels.iter().enumerate() {
        let node = NodeId::from_channel(ChannelId(i as u32), var_count);
        for key in &channel.keys {
            if let CompiledValue::Expr(e) = &key.value {
                graph::scan_refs(e, var_count, &mut deps[node.0 as usize]);
            }
        }
    }
    for refs in &mut deps {
        refs.sort_unstable();
        refs.dedup();
    }
    let graph = graph::build(deps, &node_names)?;

    let views: Vec<PublishChannel<'_>> = channels
        .iter()
        .zip(&declared_publish)
        .map(|(ch, declared)| PublishChannel {
            qualified: &ch.qualified,
            short: ch.qualified.split_once('.').map_or(ch.qualified.as_str(), |(_, s)| s),
            declared,
        })
        .collect();
    let published = publish::resolve(def.publish.as_ref(), &views, options.publish_policy)?;

    tracing::debug!(
        variables = vars.len(),
        channels = channels.len(),
        published = published.len(),
        "compiled scene"
    );

    Ok(CompiledScene {
        name: def.name.clone(),
        version: def.version.clone(),
        seed: def.seed,
        range: def.range.unwrap_or([0.0, 1.0]),
        options,
        vars,
        channels,
        channel_by_name: symbols.channel_by_name,
        node_names,
        graph,
        published,
    })
}

fn compile_value(value: &ValueDef, symbols: &SymbolTable, context: &str) -> KeysplineResult<CompiledValue> {
    match value {
        ValueDef::Number(v) => Ok(CompiledValue::Literal(*v)),
        ValueDef::Expr(src) => {
            let ast = parse_expr(src)
                .map_err(|e| KeysplineError::parse(format!("{context}: {e}")))?;
            let bound = bind_expr(ast, symbols).map_err(|e| bind_err(e, context))?;
            Ok(CompiledValue::Expr(bound))
        }
    }
}

// Binder diagnostics carry no useful span; surface the message alone.
fn bind_err(e: ExprError, context: &str) -> KeysplineError {
    match e.kind {
        ExprErrorKind::Syntax => KeysplineError::parse(format!("{context}: {}", e.message)),
        ExprErrorKind::UndefinedSymbol => {
            KeysplineError::undefined_symbol(format!("{context}: {}", e.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(json: &str) -> KeysplineResult<CompiledScene> {
        let def: SceneDef = serde_json::from_str(json).unwrap();
        load(&def, CompileOptions::default())
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let scene = compile(
            r#"{
                "variables": { "amp": 2.0 },
                "splines": [{
                    "name": "pos",
                    "channels": [
                        { "name": "y", "keyframes": [
                            { "@": 0.0, "value": "pos.x * amp" },
                            { "@": 1.0, "value": 0.0 }
                        ]},
                        { "name": "x", "keyframes": [
                            { "@": 0.0, "value": 0.0 },
                            { "@": 1.0, "value": 10.0 }
                        ]}
                    ]
                }]
            }"#,
        )
        .unwrap();

        // Nodes: amp = 0, pos.y = 1, pos.x = 2.
        let order = &scene.graph.eval_order;
        let at = |node: u32| order.iter().position(|n| n.0 == node).unwrap();
        assert!(at(2) < at(1), "pos.x must run before pos.y");
        assert!(at(0) < at(1), "amp must run before pos.y");
        assert_eq!(scene.channel_id("pos.y").unwrap(), ChannelId(0));
        assert_eq!(scene.channel_id("pos.x").unwrap(), ChannelId(1));
    }

    #[test]
    fn cycle_is_fatal_and_names_the_path() {
        let err = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [
                        { "name": "x", "keyframes": [{ "@": 0.0, "value": "a.y" }] },
                        { "name": "y", "keyframes": [{ "@": 0.0, "value": "a.x" }] }
                    ]
                }]
            }"#,
        )
        .unwrap_err();
        match err {
            KeysplineError::CyclicDependency { cycle } => {
                assert!(cycle.contains(&"a.x".to_owned()));
                assert!(cycle.contains(&"a.y".to_owned()));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn unknown_interpolation_fails_at_load() {
        let err = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [{
                        "name": "x",
                        "interpolation": "gaussian",
                        "keyframes": [{ "@": 0.0, "value": 1.0 }]
                    }]
                }]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, KeysplineError::UnsupportedInterpolation(tag) if tag == "gaussian"));
    }

    #[test]
    fn keyframe_interpolation_override_is_checked_at_load() {
        let err = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [{
                        "name": "x",
                        "keyframes": [
                            { "@": 0.0, "value": 1.0, "interpolation": "wobble" },
                            { "@": 1.0, "value": 2.0 }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, KeysplineError::UnsupportedInterpolation(_)));
    }

    #[test]
    fn undefined_symbol_names_the_site() {
        let err = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [{
                        "name": "x",
                        "keyframes": [{ "@": 0.5, "value": "missing + 1" }]
                    }]
                }]
            }"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, KeysplineError::UndefinedSymbol(_)), "{msg}");
        assert!(msg.contains("channel 'a.x'"), "{msg}");
        assert!(msg.contains("missing"), "{msg}");
    }

    #[test]
    fn wrong_arity_is_a_parse_error() {
        let err = compile(
            r#"{
                "variables": { "v": "sin(1, 2)" },
                "splines": [{
                    "name": "a",
                    "channels": [{ "name": "x", "keyframes": [{ "@": 0.0, "value": 1.0 }] }]
                }]
            }"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, KeysplineError::Parse(_)), "{msg}");
        assert!(msg.contains("variable 'v'"), "{msg}");
        assert!(msg.contains("sin"), "{msg}");
    }

    #[test]
    fn keyframes_are_sorted_at_load() {
        let scene = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [{
                        "name": "x",
                        "keyframes": [
                            { "@": 1.0, "value": 3.0 },
                            { "@": 0.0, "value": 1.0 },
                            { "@": 0.5, "value": 2.0 }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let positions: Vec<f64> = scene.channels[0].keys.iter().map(|k| k.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn publish_star_covers_every_channel() {
        let scene = compile(
            r#"{
                "publish": ["*"],
                "splines": [{
                    "name": "pos",
                    "channels": [
                        { "name": "x", "keyframes": [{ "@": 0.0, "value": 0.0 }] },
                        { "name": "y", "keyframes": [{ "@": 0.0, "value": 0.0 }] }
                    ]
                }]
            }"#,
        )
        .unwrap();
        let names: Vec<&str> = scene.published_names().collect();
        assert_eq!(names, vec!["pos.x", "pos.y"]);
    }

    #[test]
    fn default_range_and_seed() {
        let scene = compile(
            r#"{
                "splines": [{
                    "name": "a",
                    "channels": [{ "name": "x", "keyframes": [{ "@": 0.0, "value": 1.0 }] }]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.range(), [0.0, 1.0]);
        assert_eq!(scene.seed(), 0);
        assert_eq!(scene.variable_names().count(), 0);
        let info: Vec<_> = scene.channels().collect();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].name, "a.x");
        assert_eq!(info[0].algorithm, "cubic");
        assert_eq!(info[0].keyframes, 1);
    }
}
