//! Text rendering of the flat list, node details, and tree statistics.

use crate::config::RepoTreeConfig;
use crate::error::ApiError;
use crate::tree::{AnalysisStatus, FlatNode, LoadFailure, NodeKey, TreeStats};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn marker(node: &FlatNode) -> &'static str {
    if node.is_loading {
        "…"
    } else if node.expanded {
        "▾"
    } else if node.expandable {
        "▸"
    } else {
        " "
    }
}

fn status_text(status: AnalysisStatus) -> String {
    let label = format!("[{}]", status.label());
    match status {
        AnalysisStatus::Error => label.red().to_string(),
        AnalysisStatus::Analyzed | AnalysisStatus::Generated => label.green().to_string(),
        AnalysisStatus::Analyzing | AnalysisStatus::Generating => label.yellow().to_string(),
        AnalysisStatus::Pending | AnalysisStatus::Unknown => label.dimmed().to_string(),
    }
}

/// One line per row, indented two spaces per level.
pub fn format_tree_text(nodes: &[FlatNode], highlight: Option<NodeKey>) -> String {
    if nodes.is_empty() {
        return "(empty)\n".to_string();
    }
    let mut out = String::new();
    for node in nodes {
        let indent = "  ".repeat(node.level);
        let name = if node.is_directory() {
            node.name().bold().blue().to_string()
        } else {
            node.name().to_string()
        };
        let name = if highlight == Some(node.key) {
            name.reversed().to_string()
        } else {
            name
        };
        out.push_str(&format!("{}{} {}", indent, marker(node), name));
        if !node.is_directory() {
            if let Some(status) = node.status() {
                out.push(' ');
                out.push_str(&status_text(status));
            }
        }
        out.push('\n');
    }
    out
}

/// Key/value table of one row's descriptor.
pub fn format_node_details(node: &FlatNode) -> String {
    let d = &node.descriptor;
    let m = &d.metadata;
    let mut rows: Vec<(&str, String)> = vec![
        ("Name", d.name.clone()),
        ("Path", d.path.clone()),
        ("Kind", format!("{} ({})", d.kind.as_str(), d.kind.icon())),
        ("Level", node.level.to_string()),
    ];
    if let Some(id) = &d.id {
        rows.push(("Id", id.clone()));
    }
    if let Some(status) = d.status {
        rows.push(("Status", status.label().to_string()));
    }
    if d.is_directory() {
        rows.push(("Directories", d.dir_count.unwrap_or(0).to_string()));
        rows.push(("Files", d.file_count.unwrap_or(0).to_string()));
    }
    if let Some(size) = m.size_kb {
        rows.push(("Size (KB)", format!("{:.2}", size)));
    }
    if let Some(lines) = m.line_count {
        rows.push(("Lines", lines.to_string()));
    }
    if let Some(chars) = m.char_count {
        rows.push(("Characters", chars.to_string()));
    }
    if let Some(count) = m.function_count {
        rows.push(("Functions", count.to_string()));
    }
    if let Some(count) = m.field_count {
        rows.push(("Fields", count.to_string()));
    }
    if let Some(count) = m.button_count {
        rows.push(("Buttons", count.to_string()));
    }
    if let Some(date) = m.analysis_date {
        rows.push(("Analyzed at", date.to_rfc3339()));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    format!("{}\n\n{}\n", format_section_heading("Entry"), table)
}

pub fn format_stats_text(repository: &str, stats: &TreeStats) -> String {
    let mut out = format!("{}\n\n", format_section_heading(repository));
    out.push_str(&format!(
        "  Rows: {}  Directories: {}  Files: {}  Expanded: {}\n",
        stats.rows, stats.directories, stats.files, stats.expanded
    ));
    if let Some(progress) = stats.analysis_progress() {
        out.push_str(&format!("  Analysis progress: {:.0}%\n", progress));
    }
    out.push('\n');

    if !stats.by_kind.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("By kind")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "Rows"]);
        for (kind, count) in &stats.by_kind {
            table.add_row(vec![kind.as_str().to_string(), count.to_string()]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    if !stats.by_status.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("By status")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Status", "Files"]);
        for (status, count) in &stats.by_status {
            table.add_row(vec![status.label().to_string(), count.to_string()]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}

/// Empty when nothing failed.
pub fn format_failures_text(failures: &[LoadFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{}\n\n", format_section_heading("Failed to load"));
    for failure in failures {
        out.push_str(&format!("  {}: {}\n", failure.path, failure.error.to_string().red()));
    }
    out
}

pub fn format_config_text(config: &RepoTreeConfig) -> Result<String, ApiError> {
    toml::to_string_pretty(config)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
}
