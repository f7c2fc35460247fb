//! Node descriptors as delivered by the directory-listing service.
//!
//! A descriptor identifies one file-system-like entry of a legacy repository.
//! Hierarchy is never carried by the descriptor itself: the store assigns
//! levels when it inserts rows.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Closed classification of repository entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    Module,
    Screen,
    Include,
    Program,
    Config,
    Document,
    #[default]
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Classify a file by its extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "ncl" => NodeKind::Module,
            "scr" => NodeKind::Screen,
            "inc" => NodeKind::Include,
            "prg" => NodeKind::Program,
            "ora" | "ora_pre" => NodeKind::Config,
            "md" | "txt" | "bat" => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }

    /// Material icon name used by the console for this kind.
    pub fn icon(self) -> &'static str {
        match self {
            NodeKind::Directory => "folder",
            NodeKind::Module => "code",
            NodeKind::Screen => "visibility",
            NodeKind::Include => "link",
            NodeKind::Program => "terminal",
            NodeKind::Config => "settings",
            NodeKind::Document => "description",
            NodeKind::Other => "insert_drive_file",
        }
    }

    /// Legacy source kinds are the ones the analysis pipeline understands.
    pub fn is_legacy_source(self) -> bool {
        matches!(
            self,
            NodeKind::Module | NodeKind::Screen | NodeKind::Include | NodeKind::Program
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Directory => "directory",
            NodeKind::Module => "module",
            NodeKind::Screen => "screen",
            NodeKind::Include => "include",
            NodeKind::Program => "program",
            NodeKind::Config => "config",
            NodeKind::Document => "document",
            NodeKind::Other => "other",
        }
    }
}

/// Analysis state of a file as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Analyzing,
    Analyzed,
    Generating,
    Generated,
    Error,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "Pending",
            AnalysisStatus::Analyzing => "Analyzing",
            AnalysisStatus::Analyzed => "Analyzed",
            AnalysisStatus::Generating => "Generating",
            AnalysisStatus::Generated => "Generated",
            AnalysisStatus::Error => "Error",
            AnalysisStatus::Unknown => "Unknown",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Analyzed => "analyzed",
            AnalysisStatus::Generating => "generating",
            AnalysisStatus::Generated => "generated",
            AnalysisStatus::Error => "error",
            AnalysisStatus::Unknown => "unknown",
        }
    }
}

/// Descriptive metadata passed through the store untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub buttons: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub analysis_date: Option<DateTime<Utc>>,
}

/// `null` decodes to the empty value instead of failing the whole listing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339, or a naive ISO timestamp taken as UTC. Anything else is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Server-side identifier; absent for entries not yet persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Slash- or backslash-delimited path.
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_count: Option<u64>,
    /// Explicit hint from the server that the directory has children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expandable: Option<bool>,
    #[serde(rename = "analysis_status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnalysisStatus>,
    #[serde(flatten)]
    pub metadata: NodeMetadata,
}

impl NodeDescriptor {
    /// Directory descriptor with summary child counts.
    pub fn directory(
        id: impl Into<String>,
        path: impl Into<String>,
        file_count: u64,
        dir_count: u64,
    ) -> Self {
        let path = path.into();
        Self {
            id: Some(id.into()),
            name: super::path::file_name(&path).to_string(),
            path,
            kind: NodeKind::Directory,
            is_dir: true,
            file_count: Some(file_count),
            dir_count: Some(dir_count),
            ..Self::default()
        }
    }

    /// File descriptor classified by extension.
    pub fn file(id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = super::path::file_name(&path).to_string();
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_string());
        Self {
            id: Some(id.into()),
            kind: extension
                .as_deref()
                .map(NodeKind::from_extension)
                .unwrap_or_default(),
            name,
            path,
            is_file: true,
            status: Some(AnalysisStatus::Pending),
            metadata: NodeMetadata {
                extension,
                ..NodeMetadata::default()
            },
            ..Self::default()
        }
    }

    pub fn is_directory(&self) -> bool {
        self.is_dir && !self.is_file
    }

    /// Whether an unexpanded directory is believed to have children.
    pub fn has_children_hint(&self) -> bool {
        if !self.is_directory() {
            return false;
        }
        self.expandable == Some(true)
            || self.file_count.unwrap_or(0) + self.dir_count.unwrap_or(0) > 0
    }
}

/// Nested tree document, as returned by the full repository-tree endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepositoryTreeNode {
    #[serde(flatten)]
    pub descriptor: NodeDescriptor,
    #[serde(default)]
    pub children: Vec<RepositoryTreeNode>,
}

/// A whole repository tree rooted at a synthetic root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryTree {
    pub repository_name: String,
    pub tree: RepositoryTreeNode,
}
