//! Directory-listing provider over a local checkout of the legacy sources.
//!
//! Node ids are paths relative to the configured root, joined with `/`. The
//! descriptor path is the same relative path, so children always sit one
//! segment below their parent.

use super::DirectoryProvider;
use crate::error::ApiError;
use crate::tree::path;
use crate::tree::{NodeDescriptor, NodeKind};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct LocalDirectoryProvider {
    root: PathBuf,
    show_hidden: bool,
}

impl LocalDirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ApiError::ProviderNotConfigured(format!(
                "Local provider root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            show_hidden: false,
        })
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    /// Resolve a node id to a directory below the root.
    fn resolve(&self, node_id: &str) -> Result<PathBuf, ApiError> {
        let normalized = path::normalize(node_id);
        let relative = Path::new(normalized.as_ref());
        if normalized.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ApiError::InvalidNodeId(node_id.to_string()));
        }
        let full = self.root.join(relative);
        if !full.is_dir() {
            return Err(ApiError::NodeNotFound(node_id.to_string()));
        }
        Ok(full)
    }

    fn list(&self, dir: &Path, parent_id: Option<&str>) -> Result<Vec<NodeDescriptor>, ApiError> {
        let mut entries = Vec::new();
        for entry in self.read_level(dir)? {
            let name = entry.file_name().to_string_lossy().to_string();
            let id = match parent_id {
                Some(parent) => format!(
                    "{}{}{}",
                    parent.trim_end_matches(path::SEPARATOR),
                    path::SEPARATOR,
                    name
                ),
                None => name.clone(),
            };
            let descriptor = if entry.file_type().is_dir() {
                self.describe_directory(entry.path(), id)
            } else {
                describe_file(&entry, id)
            };
            entries.push(descriptor);
        }
        entries.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });
        Ok(entries)
    }

    fn read_level(&self, dir: &Path) -> Result<Vec<DirEntry>, ApiError> {
        let show_hidden = self.show_hidden;
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_entry(|e| show_hidden || !is_hidden(e))
        {
            match entry {
                Ok(entry) => entries.push(entry),
                // the directory itself is unreadable
                Err(err) if err.depth() == 0 => {
                    return Err(err.into_io_error().map(ApiError::IoError).unwrap_or_else(|| {
                        ApiError::ProviderError(format!("Cannot read {}", dir.display()))
                    }));
                }
                Err(err) => warn!(dir = %dir.display(), error = %err, "Skipping unreadable entry"),
            }
        }
        Ok(entries)
    }

    fn describe_directory(&self, dir: &Path, id: String) -> NodeDescriptor {
        let (files, dirs) = match self.read_level(dir) {
            Ok(children) => children.iter().fold((0, 0), |(files, dirs), child| {
                if child.file_type().is_dir() {
                    (files, dirs + 1)
                } else {
                    (files + 1, dirs)
                }
            }),
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "Could not count directory entries");
                (0, 0)
            }
        };
        NodeDescriptor::directory(id.clone(), id, files, dirs)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn describe_file(entry: &DirEntry, id: String) -> NodeDescriptor {
    let mut descriptor = NodeDescriptor::file(id.clone(), id);
    if let Ok(metadata) = entry.metadata() {
        let size_kb = metadata.len() as f64 / 1024.0;
        descriptor.metadata.size_kb = Some((size_kb * 100.0).round() / 100.0);
    }
    if descriptor.kind.is_legacy_source() || descriptor.kind == NodeKind::Config {
        match std::fs::read(entry.path()) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                descriptor.metadata.line_count = Some(text.lines().count() as u64);
                descriptor.metadata.char_count = Some(text.chars().count() as u64);
            }
            Err(err) => {
                debug!(file = %entry.path().display(), error = %err, "Could not read source file")
            }
        }
    }
    descriptor
}

#[async_trait]
impl DirectoryProvider for LocalDirectoryProvider {
    async fn fetch_roots(&self, repository: &str) -> Result<Vec<NodeDescriptor>, ApiError> {
        debug!(repository, root = %self.root.display(), "Listing local repository root");
        let provider = self.clone();
        tokio::task::spawn_blocking(move || provider.list(&provider.root, None))
            .await
            .map_err(|e| ApiError::ProviderError(format!("Listing task failed: {}", e)))?
    }

    async fn fetch_children(
        &self,
        _repository: &str,
        node_id: &str,
    ) -> Result<Vec<NodeDescriptor>, ApiError> {
        let dir = self.resolve(node_id)?;
        let provider = self.clone();
        let parent = path::normalize(node_id).into_owned();
        tokio::task::spawn_blocking(move || provider.list(&dir, Some(parent.as_str())))
            .await
            .map_err(|e| ApiError::ProviderError(format!("Listing task failed: {}", e)))?
    }
}
