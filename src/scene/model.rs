use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of the scene document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SceneDef {
    #[serde(default)]
    pub(crate) version: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Opaque author metadata; never interpreted by the engine.
    #[serde(default)]
    pub(crate) metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub(crate) seed: u64,
    #[serde(default)]
    pub(crate) variables: BTreeMap<String, ValueDef>,
    /// External query domain `[min, max]`; defaults to `[0, 1]`.
    #[serde(default)]
    pub(crate) range: Option<[f64; 2]>,
    #[serde(default)]
    pub(crate) publish: Option<PublishDef>,
    #[serde(default)]
    pub(crate) splines: Vec<SplineDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SplineDef {
    pub(crate) name: String,
    pub(crate) channels: Vec<ChannelDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChannelDef {
    pub(crate) name: String,
    /// Interpolation algorithm tag. Defaults to `"cubic"`.
    #[serde(default = "default_interpolation")]
    pub(crate) interpolation: String,
    /// Optional `[min, max]` bound: literal keyframe values are validated
    /// against it at load, computed values are clamped into it.
    #[serde(default)]
    pub(crate) min_max: Option<[f64; 2]>,
    /// Channel-declared publish selectors (see the publish resolver).
    #[serde(default)]
    pub(crate) publish: Vec<String>,
    pub(crate) keyframes: Vec<KeyframeDef>,
}

fn default_interpolation() -> String {
    "cubic".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeyframeDef {
    /// Position in the channel's local parameter domain.
    #[serde(rename = "@")]
    pub(crate) position: f64,
    pub(crate) value: ValueDef,
    /// Per-keyframe algorithm override for the outgoing segment.
    #[serde(default)]
    pub(crate) interpolation: Option<String>,
    /// Explicit bezier control points `[x1, y1, x2, y2]` in absolute
    /// (position, value) coordinates for the outgoing segment.
    #[serde(default)]
    pub(crate) cp: Option<[f64; 4]>,
    /// Explicit derivative at this keyframe (hermite; endpoint condition for cubic).
    #[serde(default)]
    pub(crate) deriv: Option<f64>,
}

/// A literal number or an expression string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ValueDef {
    Number(f64),
    Expr(String),
}

/// Document-level publish declaration.
///
/// The list form publishes matched channels under their own qualified
/// names; the map form maps a selector to a list of publish-name targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum PublishDef {
    List(Vec<String>),
    Map(BTreeMap<String, Vec<String>>),
}
