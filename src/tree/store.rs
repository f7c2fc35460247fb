//! Flat Tree Store
//!
//! Owns the flat, pre-order list of a partially expanded repository tree and
//! reacts to expand/collapse intents from a rendering widget. Children are
//! fetched on demand from a [`DirectoryProvider`] and spliced in right after
//! their parent; collapsing removes the contiguous run of descendants.
//!
//! Node data lives in an `indextree` arena with explicit parent/child links.
//! The visible list is an ordered vector of arena ids, so the hierarchy is
//! both implicit in consecutive levels and explicit in the arena.

use super::descriptor::{AnalysisStatus, NodeDescriptor};
use super::flat::{FlatNode, NodeKey, TreeEntry};
use super::loads::{CollapseGuard, LoadTicket, LoadTracker};
use super::path;
use super::stats::TreeStats;
use super::subscription::{Listener, SubscriberSet, Subscription};
use crate::error::ApiError;
use crate::provider::DirectoryProvider;
use futures::future::join_all;
use indextree::{Arena, NodeId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a toggle request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not a directory, or no server id to fetch by.
    NotExpandable,
    /// The row is no longer in the list.
    Stale,
    AlreadyLoading,
    /// Collapse arrived while a child load was in flight.
    Suppressed,
}

/// Result of a single expand/collapse request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded { inserted: usize },
    Collapsed { removed: usize },
    Ignored(IgnoreReason),
    /// The listing arrived after the row was collapsed, removed or reset.
    Discarded,
}

/// A child fetch that failed. The row stays collapsed and may be retried.
#[derive(Debug)]
pub struct LoadFailure {
    pub key: NodeKey,
    pub path: String,
    pub error: ApiError,
}

/// Per-node results of one expansion-change batch.
#[derive(Debug, Default)]
pub struct ExpansionReport {
    pub outcomes: Vec<(NodeKey, ToggleOutcome)>,
    pub failures: Vec<LoadFailure>,
}

impl ExpansionReport {
    pub fn expanded(&self) -> usize {
        self.count(|o| matches!(o, ToggleOutcome::Expanded { .. }))
    }

    pub fn collapsed(&self) -> usize {
        self.count(|o| matches!(o, ToggleOutcome::Collapsed { .. }))
    }

    pub fn suppressed(&self) -> usize {
        self.count(|o| *o == ToggleOutcome::Ignored(IgnoreReason::Suppressed))
    }

    pub fn outcome_for(&self, key: NodeKey) -> Option<ToggleOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, outcome)| *outcome)
    }

    fn count(&self, pred: impl Fn(&ToggleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    fn merge(&mut self, other: ExpansionReport) {
        self.outcomes.extend(other.outcomes);
        self.failures.extend(other.failures);
    }
}

struct LoadRequest {
    ticket: LoadTicket,
    node_id: String,
    path: String,
}

#[derive(Default)]
struct TreeState {
    arena: Arena<TreeEntry>,
    order: Vec<NodeId>,
    loads: LoadTracker,
    revision: u64,
}

impl TreeState {
    fn entry(&self, id: NodeId) -> &TreeEntry {
        self.arena[id].get()
    }

    fn level_at(&self, index: usize) -> usize {
        self.entry(self.order[index]).level
    }

    fn position(&self, key: NodeKey) -> Option<usize> {
        self.order.iter().position(|&id| id == key.0)
    }

    fn has_loaded_children(&self, id: NodeId) -> bool {
        id.children(&self.arena).next().is_some()
    }

    fn flat_node(&self, id: NodeId) -> FlatNode {
        let entry = self.entry(id);
        FlatNode {
            key: NodeKey(id),
            descriptor: entry.descriptor.clone(),
            level: entry.level,
            expandable: entry.expandable,
            expanded: self.has_loaded_children(id),
            is_loading: self.loads.is_loading(NodeKey(id)),
        }
    }

    fn snapshot(&self) -> Vec<FlatNode> {
        self.order.iter().map(|&id| self.flat_node(id)).collect()
    }

    /// First index after `index` whose level is not deeper than the row at
    /// `index`, or the end of the list.
    fn insert_position(&self, index: usize) -> usize {
        let level = self.level_at(index);
        (index + 1..self.order.len())
            .find(|&i| self.level_at(i) <= level)
            .unwrap_or(self.order.len())
    }

    fn descendant_span(&self, index: usize) -> Range<usize> {
        index + 1..self.insert_position(index)
    }

    fn reset(&mut self, roots: Vec<NodeDescriptor>) {
        let old_roots: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.arena[id].parent().is_none())
            .collect();
        for id in old_roots {
            id.remove_subtree(&mut self.arena);
        }
        self.order.clear();
        self.loads.clear();
        for descriptor in roots {
            let id = self.arena.new_node(TreeEntry::new(descriptor, 0));
            self.order.push(id);
        }
    }

    /// Remove the descendant run after `index` and cancel every load inside it.
    /// Returns the number of removed rows and whether anything changed.
    fn collapse(&mut self, index: usize) -> (usize, bool) {
        let id = self.order[index];
        let cancelled = self.loads.cancel(NodeKey(id));
        let span = self.descendant_span(index);
        let removed: Vec<NodeId> = self.order.drain(span).collect();
        for &gone in &removed {
            self.loads.cancel(NodeKey(gone));
        }
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            child.remove_subtree(&mut self.arena);
        }
        (removed.len(), cancelled || !removed.is_empty())
    }

    fn splice_children(
        &mut self,
        request: &LoadRequest,
        children: Vec<NodeDescriptor>,
    ) -> (ToggleOutcome, bool) {
        if !self.loads.finish(request.ticket) {
            debug!(node = %request.path, "Discarding listing for a load that is no longer current");
            return (ToggleOutcome::Discarded, false);
        }
        let parent = request.ticket.key.0;
        let Some(index) = self.position(request.ticket.key) else {
            debug!(node = %request.path, "Discarding listing for a row that left the list");
            return (ToggleOutcome::Discarded, true);
        };
        if self.has_loaded_children(parent) {
            return (ToggleOutcome::Discarded, true);
        }

        let parent_level = self.entry(parent).level;
        let parent_path = self.entry(parent).descriptor.path.clone();
        for child in &children {
            if !path::is_direct_child(&parent_path, &child.path) {
                warn!(
                    parent = %parent_path,
                    child = %child.path,
                    "Listing entry is not a direct child of the expanded directory"
                );
            }
        }

        let insert_at = self.insert_position(index);
        let mut ids = Vec::with_capacity(children.len());
        for descriptor in children {
            let id = self
                .arena
                .new_node(TreeEntry::new(descriptor, parent_level + 1));
            parent.append(id, &mut self.arena);
            ids.push(id);
        }
        let inserted = ids.len();
        self.order.splice(insert_at..insert_at, ids);
        self.arena[parent].get_mut().expandable = inserted > 0;

        (ToggleOutcome::Expanded { inserted }, true)
    }
}

struct StoreInner {
    repository: String,
    provider: Arc<dyn DirectoryProvider>,
    guard: CollapseGuard,
    state: RwLock<TreeState>,
    subscribers: Arc<SubscriberSet>,
}

/// Lazily expanding flat tree over a directory-listing provider.
///
/// Cloning is cheap and every clone shares the same list. The internal lock is
/// never held across a fetch, and listeners run after it is released.
#[derive(Clone)]
pub struct FlatTreeStore {
    inner: Arc<StoreInner>,
}

impl FlatTreeStore {
    pub fn new(repository: impl Into<String>, provider: Arc<dyn DirectoryProvider>) -> Self {
        Self::with_guard(repository, provider, CollapseGuard::default())
    }

    pub fn with_guard(
        repository: impl Into<String>,
        provider: Arc<dyn DirectoryProvider>,
        guard: CollapseGuard,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                repository: repository.into(),
                provider,
                guard,
                state: RwLock::new(TreeState::default()),
                subscribers: Arc::new(SubscriberSet::default()),
            }),
        }
    }

    pub fn repository(&self) -> &str {
        &self.inner.repository
    }

    pub fn collapse_guard(&self) -> CollapseGuard {
        self.inner.guard
    }

    /// Replace the whole list with `nodes` at level 0, all collapsed.
    ///
    /// Outstanding loads are invalidated; their listings will be discarded.
    pub fn set_roots(&self, nodes: Vec<NodeDescriptor>) {
        let count = nodes.len();
        self.mutate(|state| {
            state.reset(nodes);
            ((), true)
        });
        info!(repository = %self.inner.repository, roots = count, "Tree roots replaced");
    }

    /// Full reload: fetch the root listing and replace the list with it.
    pub async fn load_roots(&self) -> Result<usize, ApiError> {
        let roots = self
            .inner
            .provider
            .fetch_roots(&self.inner.repository)
            .await
            .map_err(|err| {
                warn!(
                    repository = %self.inner.repository,
                    error = %err,
                    "Failed to load tree roots"
                );
                err
            })?;
        let count = roots.len();
        self.set_roots(roots);
        Ok(count)
    }

    /// Register a listener. It is called with the current list right away and
    /// again after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[FlatNode]) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        // registered under the read lock so no change slips between the
        // replayed list and the first emitted one
        let (subscription, revision, nodes) = {
            let state = self.inner.state.read();
            let subscription = self.inner.subscribers.add(listener);
            (subscription, state.revision, state.snapshot())
        };
        self.inner.subscribers.replay(&subscription, revision, &nodes);
        subscription
    }

    pub fn nodes(&self) -> Vec<FlatNode> {
        self.inner.state.read().snapshot()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current row for `key`, if it is still in the list.
    pub fn get(&self, key: NodeKey) -> Option<FlatNode> {
        let state = self.inner.state.read();
        state.position(key).map(|_| state.flat_node(key.0))
    }

    pub fn find_by_path(&self, target: &str) -> Option<FlatNode> {
        let state = self.inner.state.read();
        state
            .order
            .iter()
            .find(|&&id| path::same_path(&state.entry(id).descriptor.path, target))
            .map(|&id| state.flat_node(id))
    }

    pub fn is_expandable(&self, node: &FlatNode) -> bool {
        node.expandable
    }

    pub fn in_flight_loads(&self) -> usize {
        self.inner.state.read().loads.in_flight()
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats::from_nodes(&self.nodes())
    }

    /// Entry point for the rendering widget's expansion-model changes.
    ///
    /// Expansions run in the order given and their fetches proceed
    /// concurrently. Collapses run in reverse order, so an inner row is
    /// collapsed before an outer one from the same batch. Which collapses are
    /// suppressed is decided once, before this batch starts any load.
    pub async fn on_expansion_changed(
        &self,
        added: &[FlatNode],
        removed: &[FlatNode],
    ) -> ExpansionReport {
        let guard = self.inner.guard;
        let suppressed: Vec<bool> = {
            let state = self.inner.state.read();
            removed
                .iter()
                .map(|node| state.loads.suppresses_collapse(guard, node.key))
                .collect()
        };

        let mut report = ExpansionReport::default();
        let mut requests = Vec::new();
        for node in added {
            match self.begin_expand(node) {
                Ok(request) => requests.push(request),
                Err(outcome) => report.outcomes.push((node.key, outcome)),
            }
        }

        for (node, suppressed) in removed.iter().zip(suppressed).rev() {
            if suppressed {
                debug!(node = %node.path(), "Ignoring collapse while a child load is in flight");
                report
                    .outcomes
                    .push((node.key, ToggleOutcome::Ignored(IgnoreReason::Suppressed)));
                continue;
            }
            report.outcomes.push((node.key, self.collapse_node(node)));
        }

        let results = join_all(requests.into_iter().map(|request| async move {
            let key = request.ticket.key;
            let path = request.path.clone();
            (key, path, self.complete_load(request).await)
        }))
        .await;

        for (key, path, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push((key, outcome)),
                Err(error) => report.failures.push(LoadFailure { key, path, error }),
            }
        }
        report
    }

    /// Expand or collapse a single row.
    ///
    /// Expanding a row whose children are already present collapses it: the
    /// widget re-fires an expansion for rows the store still holds open.
    pub async fn toggle_node(
        &self,
        node: &FlatNode,
        expand: bool,
    ) -> Result<ToggleOutcome, ApiError> {
        if !expand {
            return Ok(self.collapse_node(node));
        }
        match self.begin_expand(node) {
            Ok(request) => self.complete_load(request).await,
            Err(outcome) => Ok(outcome),
        }
    }

    /// Expand every expandable row shallower than `depth`, level by level.
    /// Each row is attempted at most once.
    pub async fn expand_to_depth(&self, depth: usize) -> ExpansionReport {
        let mut report = ExpansionReport::default();
        let mut attempted = HashSet::new();
        loop {
            let batch: Vec<FlatNode> = self
                .nodes()
                .into_iter()
                .filter(|node| {
                    node.level < depth
                        && node.expandable
                        && !node.expanded
                        && !node.is_loading
                        && node.id().is_some()
                })
                .filter(|node| attempted.insert(node.key))
                .collect();
            if batch.is_empty() {
                break;
            }
            report.merge(self.on_expansion_changed(&batch, &[]).await);
        }
        report
    }

    /// Expand the ancestors of `target` until its row is in the list.
    pub async fn reveal(&self, target: &str) -> Result<FlatNode, ApiError> {
        loop {
            if let Some(node) = self.find_by_path(target) {
                return Ok(node);
            }
            let ancestor = {
                let state = self.inner.state.read();
                state
                    .order
                    .iter()
                    .copied()
                    .filter(|&id| {
                        let entry = state.entry(id);
                        entry.descriptor.is_directory()
                            && !state.has_loaded_children(id)
                            && path::is_descendant(&entry.descriptor.path, target)
                    })
                    .max_by_key(|&id| state.entry(id).level)
                    .map(|id| state.flat_node(id))
            };
            let Some(ancestor) = ancestor else {
                return Err(ApiError::NodeNotFound(target.to_string()));
            };
            match self.toggle_node(&ancestor, true).await? {
                ToggleOutcome::Expanded { inserted } if inserted > 0 => continue,
                _ => return Err(ApiError::NodeNotFound(target.to_string())),
            }
        }
    }

    /// Overlay analysis statuses onto file rows by id. Returns the number of
    /// rows whose status changed.
    pub fn apply_statuses(&self, statuses: &HashMap<String, AnalysisStatus>) -> usize {
        self.mutate(|state| {
            let TreeState { arena, order, .. } = state;
            let mut updated = 0;
            for &id in order.iter() {
                let descriptor = &mut arena[id].get_mut().descriptor;
                if descriptor.is_directory() {
                    continue;
                }
                let Some(status) = descriptor.id.as_ref().and_then(|id| statuses.get(id)) else {
                    continue;
                };
                if descriptor.status != Some(*status) {
                    descriptor.status = Some(*status);
                    updated += 1;
                }
            }
            (updated, updated > 0)
        })
    }

    fn begin_expand(&self, node: &FlatNode) -> Result<LoadRequest, ToggleOutcome> {
        let Some(node_id) = node.id().filter(|_| node.is_directory()) else {
            debug!(node = %node.path(), "Ignoring expansion of a row that cannot be expanded");
            return Err(ToggleOutcome::Ignored(IgnoreReason::NotExpandable));
        };
        let node_id = node_id.to_string();

        self.mutate(|state| {
            let Some(index) = state.position(node.key) else {
                debug!(node = %node.path(), "Ignoring expansion of a row no longer in the list");
                return (Err(ToggleOutcome::Ignored(IgnoreReason::Stale)), false);
            };
            if state.has_loaded_children(node.key.0) {
                let (removed, changed) = state.collapse(index);
                debug!(
                    node = %node.path(),
                    removed,
                    "Expansion of an open row treated as collapse"
                );
                return (Err(ToggleOutcome::Collapsed { removed }), changed);
            }
            match state.loads.begin(node.key) {
                Some(ticket) => {
                    let request = LoadRequest {
                        ticket,
                        node_id,
                        path: node.path().to_string(),
                    };
                    (Ok(request), true)
                }
                None => (Err(ToggleOutcome::Ignored(IgnoreReason::AlreadyLoading)), false),
            }
        })
    }

    fn collapse_node(&self, node: &FlatNode) -> ToggleOutcome {
        if !node.is_directory() || node.id().is_none() {
            return ToggleOutcome::Ignored(IgnoreReason::NotExpandable);
        }
        self.mutate(|state| match state.position(node.key) {
            Some(index) => {
                let (removed, changed) = state.collapse(index);
                debug!(node = %node.path(), removed, "Collapsed directory");
                (ToggleOutcome::Collapsed { removed }, changed)
            }
            None => (ToggleOutcome::Ignored(IgnoreReason::Stale), false),
        })
    }

    async fn complete_load(&self, request: LoadRequest) -> Result<ToggleOutcome, ApiError> {
        debug!(node = %request.path, id = %request.node_id, "Fetching directory children");
        let fetched = self
            .inner
            .provider
            .fetch_children(&self.inner.repository, &request.node_id)
            .await;

        match fetched {
            Ok(children) => {
                let outcome = self.mutate(|state| state.splice_children(&request, children));
                if let ToggleOutcome::Expanded { inserted } = outcome {
                    info!(node = %request.path, children = inserted, "Expanded directory");
                }
                Ok(outcome)
            }
            Err(err) => {
                self.mutate(|state| ((), state.loads.finish(request.ticket)));
                warn!(node = %request.path, error = %err, "Failed to load directory children");
                Err(err)
            }
        }
    }

    /// Run `f` under the write lock; if it reports a change, emit the new list
    /// after the lock is released.
    fn mutate<R>(&self, f: impl FnOnce(&mut TreeState) -> (R, bool)) -> R {
        let (result, pending) = {
            let mut state = self.inner.state.write();
            let (result, changed) = f(&mut state);
            let pending = changed.then(|| {
                state.revision += 1;
                (state.revision, state.snapshot())
            });
            (result, pending)
        };
        if let Some((revision, nodes)) = pending {
            self.inner.subscribers.emit(revision, &nodes);
        }
        result
    }
}
