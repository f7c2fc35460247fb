use crate::integration::support::{
    fixture_tree, levels, loaded_store, paths, row, wait_until, ControlledProvider, REPO,
};
use repotree::tree::{CollapseGuard, IgnoreReason, NodeDescriptor, ToggleOutcome};
use repotree::{ApiError, FlatTreeStore};
use std::collections::HashMap;
use std::sync::Arc;

fn owned(items: &[(&str, usize)]) -> Vec<(String, usize)> {
    items.iter().map(|(p, l)| (p.to_string(), *l)).collect()
}

#[tokio::test]
async fn set_roots_replaces_list_at_level_zero() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    store
        .toggle_node(&row(&store, "fact"), true)
        .await
        .unwrap();

    store.set_roots(vec![
        NodeDescriptor::directory("x", "x", 1, 0),
        NodeDescriptor::file("y", "y.inc"),
    ]);
    assert_eq!(levels(&store), owned(&[("x", 0), ("y.inc", 0)]));
    assert!(store.nodes().iter().all(|n| !n.expanded && !n.is_loading));
}

#[tokio::test]
async fn children_insert_between_parent_and_next_sibling() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;

    let outcome = store.toggle_node(&row(&store, "fact"), true).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { inserted: 3 });
    assert_eq!(
        levels(&store),
        owned(&[
            ("fact", 0),
            ("fact/sub", 1),
            ("fact/FACT001.SCR", 1),
            ("fact/FACT002.SCR", 1),
            ("stock", 0),
            ("hinted", 0),
            ("README.md", 0),
        ])
    );
}

#[tokio::test]
async fn collapse_removes_exactly_the_descendant_span() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    store.toggle_node(&row(&store, "fact"), true).await.unwrap();
    store.toggle_node(&row(&store, "fact/sub"), true).await.unwrap();
    store.toggle_node(&row(&store, "stock"), true).await.unwrap();

    let outcome = store.toggle_node(&row(&store, "fact"), false).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Collapsed { removed: 4 });
    assert_eq!(
        paths(&store),
        vec!["fact", "stock", "stock/STK.PRG", "hinted", "README.md"]
    );
}

#[tokio::test]
async fn collapsing_a_collapsed_node_changes_nothing() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    let before = store.nodes();

    let outcome = store.toggle_node(&row(&store, "stock"), false).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Collapsed { removed: 0 });
    assert_eq!(store.nodes(), before);
}

#[tokio::test]
async fn expand_then_collapse_restores_the_list() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    let before = store.nodes();

    let fact = row(&store, "fact");
    store.toggle_node(&fact, true).await.unwrap();
    store.toggle_node(&fact, false).await.unwrap();

    let after = store.nodes();
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.descriptor, b.descriptor);
        assert_eq!(a.level, b.level);
        assert_eq!(a.expanded, b.expanded);
    }
}

#[tokio::test]
async fn failed_fetch_leaves_node_collapsed_and_retryable() {
    let provider = ControlledProvider::new(fixture_tree());
    provider.fail("fact");
    let store = loaded_store(provider.clone()).await;
    let before = paths(&store);

    let err = store.toggle_node(&row(&store, "fact"), true).await.unwrap_err();
    assert!(matches!(err, ApiError::ProviderRequestFailed(_)));
    assert_eq!(paths(&store), before);
    let fact = row(&store, "fact");
    assert!(!fact.is_loading && !fact.expanded);
    assert_eq!(store.in_flight_loads(), 0);

    provider.heal("fact");
    let outcome = store.toggle_node(&fact, true).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { inserted: 3 });
}

#[tokio::test]
async fn batch_reports_failures_without_blocking_other_expansions() {
    let provider = ControlledProvider::new(fixture_tree());
    provider.fail("stock");
    let store = loaded_store(provider).await;

    let report = store
        .on_expansion_changed(&[row(&store, "fact"), row(&store, "stock")], &[])
        .await;
    assert_eq!(report.expanded(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "stock");
    assert!(row(&store, "fact").expanded);
    assert!(!row(&store, "stock").expanded);
}

#[tokio::test]
async fn reverse_order_collapse_of_outer_and_inner() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    store.toggle_node(&row(&store, "fact"), true).await.unwrap();
    store.toggle_node(&row(&store, "fact/sub"), true).await.unwrap();

    let outer = row(&store, "fact");
    let inner = row(&store, "fact/sub");
    let report = store.on_expansion_changed(&[], &[outer.clone(), inner.clone()]).await;

    assert!(report.failures.is_empty());
    assert_eq!(report.outcome_for(inner.key), Some(ToggleOutcome::Collapsed { removed: 1 }));
    assert_eq!(report.outcome_for(outer.key), Some(ToggleOutcome::Collapsed { removed: 3 }));
    assert_eq!(paths(&store), vec!["fact", "stock", "hinted", "README.md"]);
}

#[tokio::test]
async fn collapse_of_unrelated_node_is_ignored_while_any_load_is_in_flight() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider.clone()).await;
    store.toggle_node(&row(&store, "stock"), true).await.unwrap();

    provider.gate("fact");
    let pending = {
        let store = store.clone();
        let fact = row(&store, "fact");
        tokio::spawn(async move { store.on_expansion_changed(&[fact], &[]).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;
    assert!(row(&store, "fact").is_loading);

    let report = store.on_expansion_changed(&[], &[row(&store, "stock")]).await;
    assert_eq!(report.suppressed(), 1);
    assert!(row(&store, "stock").expanded);

    provider.release("fact");
    let first = pending.await.unwrap();
    assert_eq!(first.expanded(), 1);
    assert_eq!(store.in_flight_loads(), 0);

    // with the load finished the same collapse goes through
    let report = store.on_expansion_changed(&[], &[row(&store, "stock")]).await;
    assert_eq!(report.collapsed(), 1);
}

#[tokio::test]
async fn per_node_guard_only_suppresses_the_loading_node() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = FlatTreeStore::with_guard(REPO, provider.clone(), CollapseGuard::PerNode);
    store.load_roots().await.unwrap();
    store.toggle_node(&row(&store, "stock"), true).await.unwrap();

    provider.gate("fact");
    let pending = {
        let store = store.clone();
        let fact = row(&store, "fact");
        tokio::spawn(async move { store.toggle_node(&fact, true).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;

    let report = store
        .on_expansion_changed(&[], &[row(&store, "stock"), row(&store, "fact")])
        .await;
    assert_eq!(report.collapsed(), 1);
    assert_eq!(report.suppressed(), 1);
    assert!(!row(&store, "stock").expanded);

    provider.release("fact");
    assert_eq!(
        pending.await.unwrap().unwrap(),
        ToggleOutcome::Expanded { inserted: 3 }
    );
}

#[tokio::test]
async fn listing_for_a_collapsed_node_is_discarded() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider.clone()).await;

    provider.gate("fact");
    let pending = {
        let store = store.clone();
        let fact = row(&store, "fact");
        tokio::spawn(async move { store.toggle_node(&fact, true).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;

    // a direct toggle is not subject to the batch guard
    store.toggle_node(&row(&store, "fact"), false).await.unwrap();
    assert_eq!(store.in_flight_loads(), 0);

    provider.release("fact");
    assert_eq!(pending.await.unwrap().unwrap(), ToggleOutcome::Discarded);
    assert_eq!(paths(&store), vec!["fact", "stock", "hinted", "README.md"]);
}

#[tokio::test]
async fn listing_for_a_removed_descendant_is_discarded() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider.clone()).await;
    store.toggle_node(&row(&store, "fact"), true).await.unwrap();

    provider.gate("fact/sub");
    let pending = {
        let store = store.clone();
        let sub = row(&store, "fact/sub");
        tokio::spawn(async move { store.toggle_node(&sub, true).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;

    store.toggle_node(&row(&store, "fact"), false).await.unwrap();
    provider.release("fact/sub");
    assert_eq!(pending.await.unwrap().unwrap(), ToggleOutcome::Discarded);
    assert_eq!(paths(&store), vec!["fact", "stock", "hinted", "README.md"]);
}

#[tokio::test]
async fn listing_after_root_reload_is_discarded() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider.clone()).await;

    provider.gate("stock");
    let pending = {
        let store = store.clone();
        let stock = row(&store, "stock");
        tokio::spawn(async move { store.toggle_node(&stock, true).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;

    store.load_roots().await.unwrap();
    assert_eq!(store.in_flight_loads(), 0);
    provider.release("stock");
    assert_eq!(pending.await.unwrap().unwrap(), ToggleOutcome::Discarded);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn second_expand_while_loading_is_ignored() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider.clone()).await;

    provider.gate("fact");
    let fact = row(&store, "fact");
    let pending = {
        let store = store.clone();
        let fact = fact.clone();
        tokio::spawn(async move { store.toggle_node(&fact, true).await })
    };
    wait_until(|| store.in_flight_loads() == 1).await;

    assert_eq!(
        store.toggle_node(&fact, true).await.unwrap(),
        ToggleOutcome::Ignored(IgnoreReason::AlreadyLoading)
    );
    provider.release("fact");
    pending.await.unwrap().unwrap();
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.len(), 7);
}

#[tokio::test]
async fn directory_with_empty_listing_stops_being_expandable() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    let hinted = row(&store, "hinted");
    assert!(store.is_expandable(&hinted));

    let outcome = store.toggle_node(&hinted, true).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { inserted: 0 });
    assert!(!row(&store, "hinted").expandable);
}

#[tokio::test]
async fn subscribers_see_loading_then_children() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = store.subscribe(move |nodes| {
        let loading = nodes.iter().filter(|n| n.is_loading).count();
        sink.lock().push((nodes.len(), loading));
    });

    store.toggle_node(&row(&store, "stock"), true).await.unwrap();
    assert_eq!(*seen.lock(), vec![(4, 0), (4, 1), (5, 0)]);

    subscription.unsubscribe();
    store.toggle_node(&row(&store, "stock"), false).await.unwrap();
    assert_eq!(seen.lock().len(), 3);
}

#[tokio::test]
async fn reveal_expands_ancestors() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;

    let node = store.reveal("fact\\sub\\LIB.NCL").await.unwrap();
    assert_eq!(node.level, 2);
    assert!(row(&store, "fact").expanded);
    assert!(row(&store, "fact/sub").expanded);
    assert!(!row(&store, "stock").expanded);
}

#[tokio::test]
async fn expand_to_depth_attempts_each_directory_once() {
    let provider = ControlledProvider::new(fixture_tree());
    provider.fail("stock");
    let store = loaded_store(provider.clone()).await;

    let report = store.expand_to_depth(5).await;
    assert_eq!(report.failures.len(), 1);
    // fact, fact/sub, hinted succeed; stock fails once
    assert_eq!(report.expanded(), 3);
    assert_eq!(provider.calls(), 4);
    assert!(store.find_by_path("fact/sub/LIB.NCL").is_some());
}

#[tokio::test]
async fn statuses_overlay_and_stats() {
    let provider = ControlledProvider::new(fixture_tree());
    let store = loaded_store(provider).await;
    store.expand_to_depth(1).await;

    let mut statuses = HashMap::new();
    statuses.insert("fact/FACT001.SCR".to_string(), repotree::tree::AnalysisStatus::Generated);
    assert_eq!(store.apply_statuses(&statuses), 1);

    let stats = store.stats();
    assert_eq!(stats.directories, 4);
    assert_eq!(stats.files, 4);
    assert_eq!(stats.count_status(repotree::tree::AnalysisStatus::Generated), 1);
    assert_eq!(stats.analysis_progress(), Some(25.0));
}
