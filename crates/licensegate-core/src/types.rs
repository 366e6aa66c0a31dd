use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a file was touched by a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Added,
    Deleted,
    Renamed,
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "ADDED"),
            ChangeType::Deleted => write!(f, "DELETED"),
            ChangeType::Renamed => write!(f, "RENAMED"),
            ChangeType::Modified => write!(f, "MODIFIED"),
        }
    }
}

/// Whether a file section carries a textual hunk or a binary patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Source,
    Binary,
}

/// One file section of a patch.
///
/// `content` holds the hunk body (lines prefixed `+`, `-`, ` ` and `@@`
/// headers). It is `None` for binary sections and for sections without a
/// textual hunk, such as pure renames and mode-only changes.
///
/// # Examples
///
/// ```
/// use licensegate_core::{ChangeType, FileChange, FileType};
/// use std::path::PathBuf;
///
/// let change = FileChange {
///     path: PathBuf::from("src/lib.c"),
///     file_type: FileType::Source,
///     change_type: ChangeType::Modified,
///     content: Some("@@ -1 +1 @@\n-old\n+new\n".into()),
/// };
/// assert!(change.has_text());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Path on the `b/` side of the diff header.
    pub path: PathBuf,
    /// Source or binary.
    pub file_type: FileType,
    /// Added, deleted, renamed or modified.
    pub change_type: ChangeType,
    /// Hunk body following the `+++` marker, if any.
    pub content: Option<String>,
}

impl FileChange {
    /// `true` when this is a source section with a hunk body to inspect.
    pub fn has_text(&self) -> bool {
        self.file_type == FileType::Source && self.content.is_some()
    }

    /// Iterate over the bodies of lines starting with `prefix`, prefix stripped.
    pub fn lines_with_prefix(&self, prefix: char) -> impl Iterator<Item = &str> {
        self.content
            .as_deref()
            .unwrap_or("")
            .lines()
            .filter_map(move |line| line.strip_prefix(prefix))
    }
}

/// Category of a compliance finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    CopyrightDeletion,
    LicenseDeleted,
    LicenseIncompatibleAdded,
    LicenseChanged,
    LicenseMissingOnNewFile,
}

/// A categorized message attached to one file.
///
/// # Examples
///
/// ```
/// use licensegate_core::{Issue, IssueKind};
///
/// let issue = Issue::new(IssueKind::LicenseDeleted, "License deleted: MIT");
/// assert_eq!(issue.to_string(), "License deleted: MIT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Per-file findings of one analyzer. Files without issues are absent.
pub type IssueMap = BTreeMap<PathBuf, Vec<Issue>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
