use crate::integration::support::{fixture_tree, ControlledProvider, REPO};
use repotree::config::{ProviderKind, RepoTreeConfig};
use repotree::tooling::cli::{CliContext, Commands, OutputFormat};
use repotree::FlatTreeStore;
use std::fs;
use tempfile::TempDir;

fn context() -> CliContext {
    let mut config = RepoTreeConfig::default();
    config.repository.name = REPO.to_string();
    let store = FlatTreeStore::new(REPO, ControlledProvider::new(fixture_tree()));
    CliContext::with_store(config, store)
}

#[tokio::test]
async fn roots_json_contract_has_required_fields() {
    let output = context()
        .execute(&Commands::Roots {
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["repository"], REPO);
    let nodes = parsed["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    for node in nodes {
        assert!(node.get("path").and_then(|v| v.as_str()).is_some());
        assert!(node.get("type").and_then(|v| v.as_str()).is_some());
        assert!(node.get("level").and_then(|v| v.as_u64()).is_some());
        assert!(node.get("expandable").and_then(|v| v.as_bool()).is_some());
        assert!(node.get("is_loading").and_then(|v| v.as_bool()).is_some());
    }
}

#[tokio::test]
async fn tree_json_respects_depth() {
    let ctx = context();
    let output = ctx
        .execute(&Commands::Tree {
            depth: Some(1),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let levels: Vec<u64> = parsed["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["level"].as_u64().unwrap())
        .collect();
    assert_eq!(levels.iter().max(), Some(&1));
    assert_eq!(levels.len(), 8);
    assert!(parsed["failures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tree_text_indents_children() {
    let output = context()
        .execute(&Commands::Tree {
            depth: Some(2),
            format: OutputFormat::Text,
        })
        .await
        .unwrap();

    let line = output
        .lines()
        .find(|l| l.contains("LIB.NCL"))
        .unwrap();
    assert!(line.starts_with("    "));
}

#[tokio::test]
async fn reveal_reports_unknown_paths() {
    let err = context()
        .execute(&Commands::Reveal {
            path: "fact/NOPE.SCR".to_string(),
            format: OutputFormat::Text,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fact/NOPE.SCR"));
}

#[tokio::test]
async fn stats_json_contract_has_required_fields() {
    let output = context()
        .execute(&Commands::Stats {
            depth: Some(3),
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let stats = &parsed["stats"];
    assert_eq!(stats["directories"], 4);
    assert_eq!(stats["files"], 5);
    assert_eq!(stats["by_kind"]["screen"], 2);
    assert_eq!(stats["by_status"]["pending"], 5);
    assert_eq!(parsed["progress"], 0.0);
}

#[tokio::test]
async fn config_command_reads_workspace_file() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("tree.json");
    fs::write(&snapshot, serde_json::to_string(&fixture_tree()).unwrap()).unwrap();
    fs::write(
        dir.path().join("repotree.toml"),
        format!(
            "[provider]\nkind = \"snapshot\"\nsnapshot = {:?}\napi_token = \"hidden\"\n",
            snapshot.to_string_lossy()
        ),
    )
    .unwrap();

    let config = repotree::config::ConfigLoader::load(dir.path()).unwrap();
    assert_eq!(config.provider.kind, ProviderKind::Snapshot);

    let ctx = CliContext::new(config).unwrap();
    let output = ctx
        .execute(&Commands::Config {
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["provider"]["kind"], "snapshot");
    assert_eq!(parsed["provider"]["api_token"], "********");

    let roots = ctx
        .execute(&Commands::Roots {
            format: OutputFormat::Text,
        })
        .await
        .unwrap();
    assert!(roots.contains("README.md"));
}
