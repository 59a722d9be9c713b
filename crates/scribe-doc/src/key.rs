use serde::{Deserialize, Serialize};

/// Opaque, process-unique identity of a document node.
///
/// Keys are allocated monotonically by the owning [`Document`](crate::Document)
/// and are never reused within a document, so a key held across edits either
/// still resolves to the same node or resolves to nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u64);

impl NodeKey {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
