//! repotree: Lazily Loaded Repository Tree
//!
//! Presents a legacy source repository as a flat, pre-order list of rows for a
//! virtualised tree widget. Directory contents are fetched one level at a time
//! from a directory-listing provider when the user expands them.

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod tooling;
pub mod tree;

pub use error::ApiError;
pub use provider::DirectoryProvider;
pub use tree::{FlatNode, FlatTreeStore, NodeDescriptor};
