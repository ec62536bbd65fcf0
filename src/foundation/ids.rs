#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VarId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ChannelId(pub(crate) u32);

/// Dense index into the dependency graph: variables first, channels after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn from_var(vid: VarId) -> Self {
        Self(vid.0)
    }

    pub(crate) fn from_channel(cid: ChannelId, var_count: u32) -> Self {
        Self(var_count + cid.0)
    }

    pub(crate) fn as_channel(self, var_count: u32) -> Option<ChannelId> {
        if self.0 >= var_count {
            Some(ChannelId(self.0 - var_count))
        } else {
            None
        }
    }
}
