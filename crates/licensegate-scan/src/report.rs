use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use licensegate_core::{Issue, IssueMap, Result};
use serde::Serialize;

/// Prefix printed ahead of every line of a text report.
pub const REPORT_PREFIX: &str = "< file license/copyright check >";

/// Findings of both analyzers, merged per file.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use licensegate_core::{Issue, IssueKind, IssueMap};
/// use licensegate_scan::report::ComplianceReport;
///
/// let mut license = IssueMap::new();
/// license.insert(
///     PathBuf::from("bar.py"),
///     vec![Issue::new(IssueKind::LicenseMissingOnNewFile, "No license added for source file: bar.py")],
/// );
/// let report = ComplianceReport::merge(license, IssueMap::new());
/// assert_eq!(report.flagged_count(), 1);
/// assert!(report.to_string().contains("- License issues detected:"));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// Offending files, sorted by path.
    pub entries: Vec<FileReport>,
}

/// All issues found for a single file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    pub license_issues: Vec<Issue>,
    pub copyright_issues: Vec<Issue>,
}

impl ComplianceReport {
    /// Combine the license and copyright maps into one entry per path.
    pub fn merge(license: IssueMap, copyright: IssueMap) -> Self {
        let mut files: BTreeMap<PathBuf, FileReport> = BTreeMap::new();
        for (path, issues) in license {
            files
                .entry(path.clone())
                .or_insert_with(|| FileReport::empty(path))
                .license_issues
                .extend(issues);
        }
        for (path, issues) in copyright {
            files
                .entry(path.clone())
                .or_insert_with(|| FileReport::empty(path))
                .copyright_issues
                .extend(issues);
        }
        Self {
            entries: files.into_values().collect(),
        }
    }

    /// Number of files with at least one issue.
    pub fn flagged_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the report as pretty-printed JSON with camelCase keys.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Serialization`](licensegate_core::GateError::Serialization)
    /// if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as a markdown string.
    ///
    /// # Examples
    ///
    /// ```
    /// use licensegate_scan::report::ComplianceReport;
    ///
    /// let md = ComplianceReport::default().to_markdown();
    /// assert!(md.contains("# License/Copyright Check"));
    /// assert!(md.contains("No issues found."));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# License/Copyright Check\n\n");

        if self.is_clean() {
            out.push_str("No issues found.\n");
            return out;
        }

        out.push_str("| File | Check | Issue |\n");
        out.push_str("|------|-------|-------|\n");
        for entry in &self.entries {
            for issue in &entry.license_issues {
                out.push_str(&format!(
                    "| `{}` | license | {} |\n",
                    entry.path.display(),
                    escape_cell(&issue.message)
                ));
            }
            for issue in &entry.copyright_issues {
                out.push_str(&format!(
                    "| `{}` | copyright | {} |\n",
                    entry.path.display(),
                    escape_cell(&issue.message)
                ));
            }
        }
        out.push('\n');
        out.push_str(&format!(
            "**Summary:** {} file(s) flagged\n",
            self.flagged_count()
        ));
        out
    }
}

impl FileReport {
    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            license_issues: Vec::new(),
            copyright_issues: Vec::new(),
        }
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{REPORT_PREFIX} {}", entry.path.display())?;
            if !entry.license_issues.is_empty() {
                writeln!(f, "{REPORT_PREFIX} - License issues detected:")?;
                for issue in &entry.license_issues {
                    writeln!(f, "{REPORT_PREFIX}   - {issue}")?;
                }
            }
            if !entry.copyright_issues.is_empty() {
                writeln!(f, "{REPORT_PREFIX} - Copyright issues detected:")?;
                for issue in &entry.copyright_issues {
                    writeln!(f, "{REPORT_PREFIX}   - {issue}")?;
                }
            }
            if entry.license_issues.is_empty() && entry.copyright_issues.is_empty() {
                writeln!(f, "{REPORT_PREFIX} - No issues detected")?;
            }
        }
        writeln!(f, "{REPORT_PREFIX} {} file(s) flagged", self.flagged_count())
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
