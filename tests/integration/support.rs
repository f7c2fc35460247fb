//! Fixtures and controllable providers shared by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use repotree::provider::{DirectoryProvider, SnapshotDirectoryProvider};
use repotree::tree::{NodeDescriptor, RepositoryTree, RepositoryTreeNode};
use repotree::{ApiError, FlatNode, FlatTreeStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const REPO: &str = "nsdk-sources";

pub fn dir(path: &str, children: Vec<RepositoryTreeNode>) -> RepositoryTreeNode {
    let dirs = children.iter().filter(|c| c.descriptor.is_directory()).count() as u64;
    let files = children.len() as u64 - dirs;
    RepositoryTreeNode {
        descriptor: NodeDescriptor::directory(path, path, files, dirs),
        children,
    }
}

pub fn file(path: &str) -> RepositoryTreeNode {
    RepositoryTreeNode {
        descriptor: NodeDescriptor::file(path, path),
        children: Vec::new(),
    }
}

/// ```text
/// fact/
///   sub/
///     LIB.NCL
///   FACT001.SCR
///   FACT002.SCR
/// stock/
///   STK.PRG
/// hinted/        (claims children, has none)
/// README.md
/// ```
pub fn fixture_tree() -> RepositoryTree {
    let mut hinted = dir("hinted", vec![]);
    hinted.descriptor.expandable = Some(true);
    RepositoryTree {
        repository_name: REPO.to_string(),
        tree: dir(
            REPO,
            vec![
                dir(
                    "fact",
                    vec![
                        dir("fact/sub", vec![file("fact/sub/LIB.NCL")]),
                        file("fact/FACT001.SCR"),
                        file("fact/FACT002.SCR"),
                    ],
                ),
                dir("stock", vec![file("stock/STK.PRG")]),
                hinted,
                file("README.md"),
            ],
        ),
    }
}

/// Snapshot-backed provider whose child fetches can be held open or made to
/// fail per node id.
pub struct ControlledProvider {
    inner: SnapshotDirectoryProvider,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl ControlledProvider {
    pub fn new(tree: RepositoryTree) -> Arc<Self> {
        Arc::new(Self {
            inner: SnapshotDirectoryProvider::from_tree(tree),
            gates: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Hold fetches of `id` until `release(id)`.
    pub fn gate(&self, id: &str) {
        self.gates
            .lock()
            .insert(id.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().get(id) {
            gate.add_permits(1);
        }
    }

    pub fn fail(&self, id: &str) {
        self.failing.lock().insert(id.to_string());
    }

    pub fn heal(&self, id: &str) {
        self.failing.lock().remove(id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryProvider for ControlledProvider {
    async fn fetch_roots(&self, repository: &str) -> Result<Vec<NodeDescriptor>, ApiError> {
        self.inner.fetch_roots(repository).await
    }

    async fn fetch_children(
        &self,
        repository: &str,
        node_id: &str,
    ) -> Result<Vec<NodeDescriptor>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().get(node_id).cloned();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| ApiError::ProviderError(e.to_string()))?
                .forget();
        }
        if self.failing.lock().contains(node_id) {
            return Err(ApiError::ProviderRequestFailed(format!(
                "listing {} failed",
                node_id
            )));
        }
        self.inner.fetch_children(repository, node_id).await
    }
}

pub async fn loaded_store(provider: Arc<ControlledProvider>) -> FlatTreeStore {
    let store = FlatTreeStore::new(REPO, provider);
    store.load_roots().await.unwrap();
    store
}

pub fn row(store: &FlatTreeStore, path: &str) -> FlatNode {
    store
        .find_by_path(path)
        .unwrap_or_else(|| panic!("row {} not in list", path))
}

pub fn paths(store: &FlatTreeStore) -> Vec<String> {
    store.nodes().iter().map(|n| n.path().to_string()).collect()
}

pub fn levels(store: &FlatTreeStore) -> Vec<(String, usize)> {
    store
        .nodes()
        .iter()
        .map(|n| (n.path().to_string(), n.level))
        .collect()
}

/// Poll until `cond` holds, yielding to spawned tasks in between.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
