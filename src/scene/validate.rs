use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::scene::model::{ChannelDef, SceneDef, ValueDef};
use std::collections::HashSet;

/// Structural checks that do not need compiled expressions: identifier
/// shapes, uniqueness, keyframe positions, `range` and `min_max` bounds.
/// Expression syntax, symbol resolution, algorithm tags, and publish
/// selectors are checked by the later load stages, which have the full
/// symbol context. Fails on the first violation.
pub(crate) fn validate_scene(def: &SceneDef) -> KeysplineResult<()> {
    if let Some([min, max]) = def.range {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(KeysplineError::validation(format!(
                "range must be a finite [min, max] with min < max, got [{min}, {max}]"
            )));
        }
    }

    for name in def.variables.keys() {
        if !is_ident(name) {
            return Err(KeysplineError::validation(format!(
                "variable name '{name}' is not a valid identifier"
            )));
        }
        if name == "t" {
            return Err(KeysplineError::validation(
                "variable name 't' is reserved for the time parameter",
            ));
        }
    }

    let mut spline_names = HashSet::new();
    let mut qualified = HashSet::new();
    for spline in &def.splines {
        if !is_ident(&spline.name) {
            return Err(KeysplineError::validation(format!(
                "spline name '{}' is not a valid identifier",
                spline.name
            )));
        }
        if !spline_names.insert(spline.name.as_str()) {
            return Err(KeysplineError::validation(format!(
                "duplicate spline name '{}'",
                spline.name
            )));
        }
        for channel in &spline.channels {
            if !is_ident(&channel.name) {
                return Err(KeysplineError::validation(format!(
                    "channel name '{}' in spline '{}' is not a valid identifier",
                    channel.name, spline.name
                )));
            }
            let qname = format!("{}.{}", spline.name, channel.name);
            if !qualified.insert(qname.clone()) {
                return Err(KeysplineError::validation(format!(
                    "duplicate channel '{qname}'"
                )));
            }
            validate_channel(channel, &qname)?;
        }
    }

    Ok(())
}

fn validate_channel(channel: &ChannelDef, qname: &str) -> KeysplineResult<()> {
    if channel.keyframes.is_empty() {
        return Err(KeysplineError::validation(format!(
            "channel '{qname}' has no keyframes"
        )));
    }

    if let Some([lo, hi]) = channel.min_max
        && (!lo.is_finite() || !hi.is_finite() || lo > hi)
    {
        return Err(KeysplineError::validation(format!(
            "channel '{qname}' min_max must be a finite [min, max] with min <= max"
        )));
    }

    for key in &channel.keyframes {
        if !key.position.is_finite() {
            return Err(KeysplineError::validation(format!(
                "channel '{qname}' has a non-finite keyframe position"
            )));
        }
        if let Some(cp) = key.cp
            && cp.iter().any(|v| !v.is_finite())
        {
            return Err(KeysplineError::validation(format!(
                "channel '{qname}' keyframe @{} has non-finite control points",
                key.position
            )));
        }
        if let Some(d) = key.deriv
            && !d.is_finite()
        {
            return Err(KeysplineError::validation(format!(
                "channel '{qname}' keyframe @{} has a non-finite derivative",
                key.position
            )));
        }
        if let (ValueDef::Number(v), Some([lo, hi])) = (&key.value, channel.min_max)
            && (*v < lo || *v > hi)
        {
            return Err(KeysplineError::validation(format!(
                "channel '{qname}' keyframe @{} value {v} outside min_max [{lo}, {hi}]",
                key.position
            )));
        }
    }

    // Duplicate positions are checked on a sorted copy; document order is free.
    let mut positions: Vec<f64> = channel.keyframes.iter().map(|k| k.position).collect();
    positions.sort_by(|a, b| a.total_cmp(b));
    for pair in positions.windows(2) {
        if pair[0] == pair[1] {
            return Err(KeysplineError::DuplicateKeyframe {
                channel: qname.to_owned(),
                position: pair[0],
            });
        }
    }

    Ok(())
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
