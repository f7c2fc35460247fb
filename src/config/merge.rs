//! Composition of configuration sources.

pub mod service;

pub use service::MergeService;
