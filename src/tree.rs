//! Lazily loaded repository tree
//!
//! Presents a hierarchical repository as one flat, pre-order list of rows for
//! a virtualised tree widget. Directories are loaded one level at a time when
//! they are expanded.

pub mod descriptor;
pub mod flat;
pub mod loads;
pub mod path;
pub mod stats;
pub mod store;
pub mod subscription;

pub use descriptor::{
    AnalysisStatus, NodeDescriptor, NodeKind, NodeMetadata, RepositoryTree, RepositoryTreeNode,
};
pub use flat::{FlatNode, NodeKey};
pub use loads::CollapseGuard;
pub use stats::TreeStats;
pub use store::{ExpansionReport, FlatTreeStore, IgnoreReason, LoadFailure, ToggleOutcome};
pub use subscription::Subscription;
