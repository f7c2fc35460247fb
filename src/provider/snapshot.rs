//! Provider serving a saved repository-tree document one level at a time.

use super::DirectoryProvider;
use crate::error::ApiError;
use crate::tree::path;
use crate::tree::{NodeDescriptor, RepositoryTree, RepositoryTreeNode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SnapshotDirectoryProvider {
    repository_name: String,
    roots: Vec<NodeDescriptor>,
    children: HashMap<String, Vec<NodeDescriptor>>,
}

impl SnapshotDirectoryProvider {
    pub fn from_tree(tree: RepositoryTree) -> Self {
        let mut children = HashMap::new();
        let roots = tree
            .tree
            .children
            .into_iter()
            .map(|node| index_node(node, &mut children))
            .collect();
        Self {
            repository_name: tree.repository_name,
            roots,
            children,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        Ok(Self::from_tree(serde_json::from_str(json)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ProviderNotConfigured(format!(
                "Cannot read snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }
}

/// Strip `node` of its children, recording them under its id.
fn index_node(
    node: RepositoryTreeNode,
    index: &mut HashMap<String, Vec<NodeDescriptor>>,
) -> NodeDescriptor {
    let RepositoryTreeNode {
        mut descriptor,
        children,
    } = node;
    if descriptor.is_directory() {
        let id = descriptor
            .id
            .get_or_insert_with(|| path::normalize(&descriptor.path).into_owned())
            .clone();
        if descriptor.file_count.is_none() && descriptor.dir_count.is_none() {
            let dirs = children.iter().filter(|c| c.descriptor.is_directory()).count() as u64;
            descriptor.dir_count = Some(dirs);
            descriptor.file_count = Some(children.len() as u64 - dirs);
        }
        let listed = children
            .into_iter()
            .map(|child| index_node(child, index))
            .collect();
        index.insert(id, listed);
    }
    descriptor
}

#[async_trait]
impl DirectoryProvider for SnapshotDirectoryProvider {
    async fn fetch_roots(&self, repository: &str) -> Result<Vec<NodeDescriptor>, ApiError> {
        if repository != self.repository_name {
            debug!(
                requested = repository,
                snapshot = %self.repository_name,
                "Serving snapshot of a differently named repository"
            );
        }
        Ok(self.roots.clone())
    }

    async fn fetch_children(
        &self,
        _repository: &str,
        node_id: &str,
    ) -> Result<Vec<NodeDescriptor>, ApiError> {
        self.children
            .get(node_id)
            .cloned()
            .ok_or_else(|| ApiError::NodeNotFound(node_id.to_string()))
    }
}
