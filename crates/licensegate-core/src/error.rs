use std::path::PathBuf;

/// Errors that can occur while gating a patch.
///
/// Malformed diffs and binary content are never errors: they degrade to
/// fewer or emptier [`FileChange`](crate::FileChange) records. Only
/// configuration, I/O and license-oracle failures surface here, and an
/// oracle failure aborts the whole run.
///
/// # Examples
///
/// ```
/// use licensegate_core::GateError;
///
/// let err = GateError::Oracle("scancode exited with status 2".into());
/// assert!(err.to_string().contains("status 2"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or ignore pattern.
    #[error("configuration error: {0}")]
    Config(String),

    /// The license classification oracle could not be run or returned garbage.
    #[error("license oracle failed: {0}")]
    Oracle(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
