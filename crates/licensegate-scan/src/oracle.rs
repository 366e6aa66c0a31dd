//! License classification oracle.
//!
//! Inferring an SPDX expression from free text is delegated to an external
//! classifier. [`LicenseOracle`] is the narrow seam the analyzer depends on;
//! [`ScancodeOracle`] implements it by staging every text in a temporary
//! directory and running the ScanCode toolkit once over the whole batch.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use licensegate_core::{GateError, OracleConfig};
use serde::Deserialize;

/// Which side of a diff a text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    Added,
    Deleted,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Added => write!(f, "added"),
            Polarity::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Polarity::Added),
            "deleted" => Ok(Polarity::Deleted),
            other => Err(format!("unknown polarity: {other}")),
        }
    }
}

/// Identifies one text in a batch: the file's position in the change list
/// and the side of the diff.
///
/// # Examples
///
/// ```
/// use licensegate_scan::oracle::{OracleKey, Polarity};
///
/// let key = OracleKey { file_index: 3, polarity: Polarity::Deleted };
/// assert_eq!(key.to_string(), "3-deleted");
/// assert_eq!("3-deleted".parse::<OracleKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OracleKey {
    pub file_index: usize,
    pub polarity: Polarity,
}

impl fmt::Display for OracleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.file_index, self.polarity)
    }
}

impl FromStr for OracleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, polarity) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid oracle key: {s}"))?;
        Ok(Self {
            file_index: index
                .parse()
                .map_err(|_| format!("invalid file index in oracle key: {s}"))?,
            polarity: polarity.parse()?,
        })
    }
}

/// Infers license expressions from text.
///
/// Expressions may combine atomic SPDX-style identifiers with `AND` / `OR`.
/// A key missing from the result, or mapped to an empty string, means no
/// license was detected in that text.
pub trait LicenseOracle {
    /// Classify all `entries` in a single invocation.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Oracle`] if the classifier cannot be run or its
    /// output cannot be read. Callers treat this as fatal.
    fn classify_batch(
        &self,
        entries: &[(OracleKey, String)],
    ) -> Result<HashMap<OracleKey, String>, GateError>;

    /// Classify a single text.
    fn classify(&self, text: &str) -> Result<Option<String>, GateError> {
        let key = OracleKey {
            file_index: 0,
            polarity: Polarity::Added,
        };
        let mut results = self.classify_batch(&[(key, text.to_string())])?;
        Ok(results.remove(&key).filter(|expr| !expr.trim().is_empty()))
    }
}

/// Runs the ScanCode toolkit (or any command with the same CLI) as the oracle.
///
/// # Examples
///
/// ```
/// use licensegate_core::OracleConfig;
/// use licensegate_scan::oracle::{LicenseOracle, ScancodeOracle};
///
/// let oracle = ScancodeOracle::new(&OracleConfig::default());
/// // Nothing to classify: the command is never started.
/// assert!(oracle.classify_batch(&[]).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ScancodeOracle {
    command: String,
    timeout_secs: u64,
    staging_dir: Option<PathBuf>,
}

impl ScancodeOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout_secs: config.timeout_secs,
            staging_dir: config.staging_dir.clone(),
        }
    }

    fn stage(dir: &Path, entries: &[(OracleKey, String)]) -> Result<PathBuf, GateError> {
        let input = dir.join("input");
        std::fs::create_dir(&input)?;
        for (key, text) in entries {
            std::fs::write(input.join(format!("{key}.txt")), text)?;
        }
        Ok(input)
    }

    fn invoke(&self, input: &Path, output: &Path) -> Result<(), GateError> {
        let result = Command::new(&self.command)
            .args(["--license", "--strip-root", "--quiet", "--timeout"])
            .arg(self.timeout_secs.to_string())
            .arg("--json-pp")
            .arg(output)
            .arg(input)
            .output()
            .map_err(|e| GateError::Oracle(format!("failed to run {}: {e}", self.command)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(GateError::Oracle(format!(
                "{} exited with {}: {}",
                self.command,
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl LicenseOracle for ScancodeOracle {
    fn classify_batch(
        &self,
        entries: &[(OracleKey, String)],
    ) -> Result<HashMap<OracleKey, String>, GateError> {
        if entries.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("licensegate-");
        // Removed on drop, including every error return below.
        let staging = match &self.staging_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let input = Self::stage(staging.path(), entries)?;
        let output = staging.path().join("scan.json");

        tracing::info!(
            entries = entries.len(),
            command = %self.command,
            "classifying license text"
        );
        self.invoke(&input, &output)?;

        let json = std::fs::read_to_string(&output).map_err(|e| {
            GateError::Oracle(format!("cannot read {}: {e}", output.display()))
        })?;
        let results = parse_scan_output(&json)?;
        tracing::debug!(detected = results.len(), "license oracle finished");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct ScanOutput {
    #[serde(default)]
    files: Vec<ScannedFile>,
}

#[derive(Debug, Deserialize)]
struct ScannedFile {
    path: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    license_detections: Vec<Detection>,
    #[serde(default)]
    detected_license_expression_spdx: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    #[serde(default)]
    license_expression_spdx: Option<String>,
}

/// Map a ScanCode JSON report back to batch keys.
///
/// Each staged file contributes the SPDX expression of its first license
/// detection, or the file-level detected expression when there is no
/// per-detection entry. Files whose name is not a batch key are ignored.
///
/// # Errors
///
/// Returns [`GateError::Oracle`] if the report is not valid ScanCode JSON.
pub fn parse_scan_output(json: &str) -> Result<HashMap<OracleKey, String>, GateError> {
    let output: ScanOutput = serde_json::from_str(json)
        .map_err(|e| GateError::Oracle(format!("malformed scan output: {e}")))?;

    let mut results = HashMap::new();
    for file in output.files {
        if file.kind.as_deref().is_some_and(|kind| kind != "file") {
            continue;
        }
        let Some(key) = Path::new(&file.path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<OracleKey>().ok())
        else {
            continue;
        };

        let expression = file
            .license_detections
            .into_iter()
            .filter_map(|d| d.license_expression_spdx)
            .chain(file.detected_license_expression_spdx)
            .find(|expr| !expr.trim().is_empty());
        if let Some(expression) = expression {
            results.insert(key, expression);
        }
    }
    Ok(results)
}
