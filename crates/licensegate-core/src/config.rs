use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration loaded from `.licensegate.toml`.
///
/// Every section is optional; missing values fall back to the defaults below.
///
/// # Examples
///
/// ```
/// use licensegate_core::GateConfig;
///
/// let config = GateConfig::default();
/// assert_eq!(config.oracle.command, "scancode");
/// assert!(config.license.permissive.contains(&"MIT".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// License policy lists.
    #[serde(default)]
    pub license: LicenseConfig,
    /// Copyright check settings.
    #[serde(default)]
    pub copyright: CopyrightConfig,
    /// License classification oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Project identifier to top-level license marking.
    #[serde(default = "default_projects")]
    pub projects: HashMap<String, String>,
    /// Path-exclusion file with glob patterns (default: `.licenseignore`).
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            license: LicenseConfig::default(),
            copyright: CopyrightConfig::default(),
            oracle: OracleConfig::default(),
            projects: default_projects(),
            ignore_file: default_ignore_file(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Io`](crate::GateError::Io) if the file cannot be read, or
    /// [`GateError::Toml`](crate::GateError::Toml) if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Toml`](crate::GateError::Toml) if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use licensegate_core::GateConfig;
    ///
    /// let toml = r#"
    /// [oracle]
    /// command = "/opt/scancode/scancode"
    ///
    /// [projects]
    /// "acme/widgets" = "Apache-2.0"
    /// "#;
    /// let config = GateConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.oracle.command, "/opt/scancode/scancode");
    /// assert_eq!(config.projects["acme/widgets"], "Apache-2.0");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the license allow-list for `project`.
    ///
    /// A permissive marking selects the permissive list, a copyleft marking
    /// the copyleft list, and any other marking allows only itself. An
    /// unknown project yields an empty list, so every detected license in
    /// added text is treated as incompatible.
    ///
    /// # Examples
    ///
    /// ```
    /// use licensegate_core::{AllowList, GateConfig};
    ///
    /// let config = GateConfig::default();
    /// let allowed = config.allowed_licenses("meta-qcom-kernel");
    /// assert!(allowed.contains("GPL-2.0"));
    /// assert_eq!(config.allowed_licenses("nobody/knows"), AllowList::default());
    /// ```
    pub fn allowed_licenses(&self, project: &str) -> AllowList {
        let Some(marking) = self.projects.get(project) else {
            tracing::warn!(
                project,
                "no license marking configured for project; allowing no licenses"
            );
            return AllowList::default();
        };

        let licenses = if self.license.permissive.contains(marking) {
            self.license.permissive.clone()
        } else if self.license.copyleft.contains(marking) {
            self.license.copyleft.clone()
        } else {
            vec![marking.clone()]
        };
        let allowed = AllowList::new(licenses);
        tracing::debug!(
            project,
            %marking,
            allowed = %allowed.iter().collect::<Vec<_>>().join(", "),
            "resolved allow-list"
        );
        allowed
    }
}

/// Set of license identifiers accepted in added code.
///
/// # Examples
///
/// ```
/// use licensegate_core::AllowList;
///
/// let list = AllowList::new(["MIT", "Apache-2.0"]);
/// assert!(list.contains("MIT"));
/// assert!(!list.contains("GPL-3.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn new<I, S>(licenses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(licenses.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, license: &str) -> bool {
        self.0.contains(license)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// License policy lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Licenses without reciprocal obligations.
    #[serde(default = "default_permissive")]
    pub permissive: Vec<String>,
    /// Copyleft / reciprocal licenses.
    #[serde(default = "default_copyleft")]
    pub copyleft: Vec<String>,
    /// File suffixes of new files that must carry a license notice.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

fn default_permissive() -> Vec<String> {
    ["BSD-3-Clause", "MIT", "Apache-2.0", "BSD-3-Clause-Clear"]
        .map(String::from)
        .to_vec()
}

fn default_copyleft() -> Vec<String> {
    ["GPL-3.0", "AGPL-3.0", "LGPL-3.0", "GPL-2.0", "GPL-2.0+"]
        .map(String::from)
        .to_vec()
}

fn default_source_extensions() -> Vec<String> {
    [
        ".c", ".cpp", ".h", ".hpp", ".java", ".py", ".js", ".ts", ".rb", ".go", ".swift", ".kt",
        ".kts", ".sh",
    ]
    .map(String::from)
    .to_vec()
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            permissive: default_permissive(),
            copyleft: default_copyleft(),
            source_extensions: default_source_extensions(),
        }
    }
}

/// Copyright check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyrightConfig {
    /// Sanctioned notice rewordings that are not reported as deletions.
    #[serde(default = "default_transitions")]
    pub transitions: Vec<CopyrightTransition>,
}

impl Default for CopyrightConfig {
    fn default() -> Self {
        Self {
            transitions: default_transitions(),
        }
    }
}

/// An allowed notice rewording: deleting a notice containing `legacy` is
/// accepted when an added notice contains `new`. Both are exact substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyrightTransition {
    pub legacy: String,
    pub new: String,
}

fn default_transitions() -> Vec<CopyrightTransition> {
    vec![CopyrightTransition {
        legacy: "Qualcomm Innovation Center, Inc. All rights".into(),
        new: "Qualcomm Technologies, Inc. and/or its subsidiaries".into(),
    }]
}

/// License classification oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// ScanCode-compatible executable (default: `scancode`).
    #[serde(default = "default_oracle_command")]
    pub command: String,
    /// Per-file scan timeout handed to the oracle, in seconds (default: 120).
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
    /// Parent directory for per-run staging directories (default: the
    /// system temp directory).
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

fn default_oracle_command() -> String {
    "scancode".into()
}

fn default_oracle_timeout() -> u64 {
    120
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: default_oracle_command(),
            timeout_secs: default_oracle_timeout(),
            staging_dir: None,
        }
    }
}

fn default_projects() -> HashMap<String, String> {
    [
        ("meta-qcom-robotics", "BSD-3-Clause"),
        ("meta-qcom-kernel", "GPL-2.0"),
        ("targoy-qti/qli_test_repo", "GPL-2.0"),
    ]
    .into_iter()
    .map(|(name, marking)| (name.to_string(), marking.to_string()))
    .collect()
}

fn default_ignore_file() -> PathBuf {
    PathBuf::from(".licenseignore")
}
