//! Rows of the flat list handed to the rendering widget.

use super::descriptor::{AnalysisStatus, NodeDescriptor, NodeKind};
use indextree::NodeId;
use serde::Serialize;

/// Stable handle of a row inside one [`FlatTreeStore`](super::FlatTreeStore).
///
/// Keys survive splices around the row; a key whose row was removed never
/// resolves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(pub(crate) NodeId);

/// Arena payload: a descriptor plus the level the store assigned to it.
#[derive(Debug, Clone)]
pub(crate) struct TreeEntry {
    pub(crate) descriptor: NodeDescriptor,
    pub(crate) level: usize,
    pub(crate) expandable: bool,
}

impl TreeEntry {
    pub(crate) fn new(descriptor: NodeDescriptor, level: usize) -> Self {
        let expandable = descriptor.has_children_hint();
        Self {
            descriptor,
            level,
            expandable,
        }
    }
}

/// One displayable row of the partially-expanded tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatNode {
    #[serde(skip)]
    pub key: NodeKey,
    #[serde(flatten)]
    pub descriptor: NodeDescriptor,
    /// Depth from the tree root; root rows are level 0.
    pub level: usize,
    pub expandable: bool,
    /// Children of this row are present in the list.
    pub expanded: bool,
    pub is_loading: bool,
}

impl FlatNode {
    pub fn id(&self) -> Option<&str> {
        self.descriptor.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn path(&self) -> &str {
        &self.descriptor.path
    }

    pub fn kind(&self) -> NodeKind {
        self.descriptor.kind
    }

    pub fn status(&self) -> Option<AnalysisStatus> {
        self.descriptor.status
    }

    pub fn is_directory(&self) -> bool {
        self.descriptor.is_directory()
    }
}
