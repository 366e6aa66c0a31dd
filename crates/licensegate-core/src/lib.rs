//! Core types, configuration, and error handling for licensegate.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`GateError`]: unified error type using `thiserror`
//! - [`GateConfig`]: configuration loaded from `.licensegate.toml`
//! - Shared types: [`FileChange`], [`FileType`], [`ChangeType`], [`Issue`],
//!   [`IssueKind`], [`IssueMap`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    AllowList, CopyrightConfig, CopyrightTransition, GateConfig, LicenseConfig, OracleConfig,
};
pub use error::GateError;
pub use types::{ChangeType, FileChange, FileType, Issue, IssueKind, IssueMap, OutputFormat};

/// A convenience `Result` type for licensegate operations.
pub type Result<T> = std::result::Result<T, GateError>;
