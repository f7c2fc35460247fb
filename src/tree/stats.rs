//! Summary counters over the materialised rows.

use super::descriptor::{AnalysisStatus, NodeKind};
use super::flat::FlatNode;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts over the rows currently in the flat list.
///
/// Only loaded rows are counted; collapsed directories contribute themselves,
/// not their contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub rows: usize,
    pub directories: usize,
    pub files: usize,
    pub expanded: usize,
    pub loading: usize,
    pub by_kind: BTreeMap<NodeKind, usize>,
    pub by_status: BTreeMap<AnalysisStatus, usize>,
}

impl TreeStats {
    pub fn from_nodes(nodes: &[FlatNode]) -> Self {
        let mut stats = TreeStats {
            rows: nodes.len(),
            ..TreeStats::default()
        };
        for node in nodes {
            if node.is_directory() {
                stats.directories += 1;
            } else {
                stats.files += 1;
                if let Some(status) = node.status() {
                    *stats.by_status.entry(status).or_insert(0) += 1;
                }
            }
            if node.expanded {
                stats.expanded += 1;
            }
            if node.is_loading {
                stats.loading += 1;
            }
            *stats.by_kind.entry(node.kind()).or_insert(0) += 1;
        }
        stats
    }

    /// Percentage of files with a status that are analyzed or generated.
    pub fn analysis_progress(&self) -> Option<f64> {
        let total: usize = self.by_status.values().sum();
        if total == 0 {
            return None;
        }
        let done = self.count_status(AnalysisStatus::Analyzed)
            + self.count_status(AnalysisStatus::Generated);
        Some(done as f64 * 100.0 / total as f64)
    }

    pub fn count_status(&self, status: AnalysisStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
