//! Publish resolution: which channels a scene exposes, under which
//! public names.
//!
//! Publishing is opt-in. The document may carry selectors (list form
//! publishes matches under their own qualified names; map form renames
//! through targets) and each channel may carry its own entries. How the
//! two levels combine is governed by [`PublishPolicy`]. The resolved
//! mapping is built once at load; name collisions across distinct
//! channels are fatal.

use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::foundation::ids::ChannelId;
use crate::scene::model::PublishDef;
use crate::scene::validate::is_ident;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// How document-level selectors combine with channel-level entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Both levels contribute; the published set is their union.
    #[default]
    Union,
    /// A channel that declares its own entries opts out of document
    /// selectors; only its own entries apply to it.
    ChannelOverride,
}

/// Channel facts the resolver needs, in [`ChannelId`] order.
pub(crate) struct PublishChannel<'a> {
    pub(crate) qualified: &'a str,
    pub(crate) short: &'a str,
    pub(crate) declared: &'a [String],
}

/// A parsed selector: `*`, `spline.*`, or `spline.channel`.
struct Selector {
    spline: Option<String>,
    channel: Option<String>,
}

impl Selector {
    fn parse(s: &str) -> KeysplineResult<Self> {
        if s == "*" {
            return Ok(Self {
                spline: None,
                channel: None,
            });
        }
        if let Some((spline, channel)) = s.split_once('.') {
            if !is_ident(spline) {
                return Err(bad_selector(s));
            }
            if channel == "*" {
                return Ok(Self {
                    spline: Some(spline.to_owned()),
                    channel: None,
                });
            }
            if !is_ident(channel) {
                return Err(bad_selector(s));
            }
            return Ok(Self {
                spline: Some(spline.to_owned()),
                channel: Some(channel.to_owned()),
            });
        }
        Err(bad_selector(s))
    }

    fn matches(&self, spline: &str, channel: &str) -> bool {
        if let Some(s) = &self.spline
            && s != spline
        {
            return false;
        }
        if let Some(c) = &self.channel
            && c != channel
        {
            return false;
        }
        true
    }
}

fn bad_selector(s: &str) -> KeysplineError {
    KeysplineError::validation(format!(
        "invalid publish selector '{s}': expected '*', 'spline.*', or 'spline.channel'"
    ))
}

fn bad_entry(entry: &str, qualified: &str) -> KeysplineError {
    KeysplineError::validation(format!(
        "invalid publish entry '{entry}' on channel '{qualified}'"
    ))
}

/// Resolves the published-name map. `channels` must be indexed by
/// [`ChannelId`].
pub(crate) fn resolve(
    doc: Option<&PublishDef>,
    channels: &[PublishChannel<'_>],
    policy: PublishPolicy,
) -> KeysplineResult<BTreeMap<String, ChannelId>> {
    let mut out = BTreeMap::new();

    if let Some(doc) = doc {
        match doc {
            PublishDef::List(selectors) => {
                for raw in selectors {
                    let sel = Selector::parse(raw)?;
                    let mut hits = 0usize;
                    for (i, ch) in eligible(channels, policy) {
                        if sel.matches(spline_of(ch.qualified), ch.short) {
                            insert(&mut out, ch.qualified.to_owned(), i, channels)?;
                            hits += 1;
                        }
                    }
                    if hits == 0 {
                        tracing::debug!(selector = %raw, "publish selector matched no channel");
                    }
                }
            }
            PublishDef::Map(map) => {
                for (raw, targets) in map {
                    let sel = Selector::parse(raw)?;
                    let mut hits = 0usize;
                    for (i, ch) in eligible(channels, policy) {
                        if !sel.matches(spline_of(ch.qualified), ch.short) {
                            continue;
                        }
                        hits += 1;
                        for target in targets {
                            let name = apply_target(target, ch)?;
                            insert(&mut out, name, i, channels)?;
                        }
                    }
                    if hits == 0 {
                        tracing::debug!(selector = %raw, "publish selector matched no channel");
                    }
                }
            }
        }
    }

    for (i, ch) in channels.iter().enumerate() {
        let cid = ChannelId(i as u32);
        for entry in ch.declared {
            if entry.contains('*') {
                // Wildcard entries are self-assertions: the selector is
                // matched against the channel's own qualified name.
                let sel = Selector::parse(entry).map_err(|_| bad_entry(entry, ch.qualified))?;
                if sel.matches(spline_of(ch.qualified), ch.short) {
                    insert(&mut out, ch.qualified.to_owned(), cid, channels)?;
                } else {
                    tracing::debug!(
                        selector = %entry,
                        channel = %ch.qualified,
                        "channel publish selector does not match its own name"
                    );
                }
            } else if is_publish_name(entry) {
                insert(&mut out, entry.clone(), cid, channels)?;
            } else {
                return Err(bad_entry(entry, ch.qualified));
            }
        }
    }

    Ok(out)
}

/// Channels a document selector may touch under the given policy.
fn eligible<'a>(
    channels: &'a [PublishChannel<'a>],
    policy: PublishPolicy,
) -> impl Iterator<Item = (ChannelId, &'a PublishChannel<'a>)> {
    channels.iter().enumerate().filter_map(move |(i, ch)| {
        if policy == PublishPolicy::ChannelOverride && !ch.declared.is_empty() {
            return None;
        }
        Some((ChannelId(i as u32), ch))
    })
}

/// Expands one map-form target for a matched channel. `*` keeps the
/// channel's own qualified name, `alias.*` substitutes the short name,
/// and a plain name is used verbatim.
fn apply_target(target: &str, ch: &PublishChannel<'_>) -> KeysplineResult<String> {
    if target == "*" {
        return Ok(ch.qualified.to_owned());
    }
    if let Some(prefix) = target.strip_suffix(".*") {
        if is_ident(prefix) {
            return Ok(format!("{prefix}.{}", ch.short));
        }
        return Err(bad_target(target));
    }
    if is_publish_name(target) {
        return Ok(target.to_owned());
    }
    Err(bad_target(target))
}

fn bad_target(target: &str) -> KeysplineError {
    KeysplineError::validation(format!(
        "invalid publish target '{target}': expected '*', 'alias.*', or a plain name"
    ))
}

fn insert(
    out: &mut BTreeMap<String, ChannelId>,
    name: String,
    cid: ChannelId,
    channels: &[PublishChannel<'_>],
) -> KeysplineResult<()> {
    match out.entry(name) {
        Entry::Vacant(v) => {
            v.insert(cid);
            Ok(())
        }
        Entry::Occupied(o) => {
            if *o.get() == cid {
                return Ok(());
            }
            Err(KeysplineError::validation(format!(
                "publish name '{}' maps to both '{}' and '{}'",
                o.key(),
                channels[o.get().0 as usize].qualified,
                channels[cid.0 as usize].qualified
            )))
        }
    }
}

fn spline_of(qualified: &str) -> &str {
    qualified.split_once('.').map_or(qualified, |(s, _)| s)
}

/// Public names are one or two dot-separated identifiers.
fn is_publish_name(s: &str) -> bool {
    match s.split_once('.') {
        Some((a, b)) => is_ident(a) && is_ident(b),
        None => is_ident(s),
    }
}
