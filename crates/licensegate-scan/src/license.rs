//! License change detection.
//!
//! Added and deleted lines of every eligible file are classified in one
//! batched oracle call, then each file is judged against the license policy.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use licensegate_core::{
    AllowList, ChangeType, FileChange, GateError, Issue, IssueKind, IssueMap, LicenseConfig,
};

use crate::oracle::{LicenseOracle, OracleKey, Polarity};

/// Which licenses are acceptable and which new files must carry one.
///
/// # Examples
///
/// ```
/// use licensegate_core::{AllowList, LicenseConfig};
/// use licensegate_scan::license::LicensePolicy;
///
/// let policy = LicensePolicy::new(AllowList::new(["MIT", "Apache-2.0"]), &LicenseConfig::default());
/// assert!(policy.is_permissive("MIT OR Apache-2.0"));
/// assert!(policy.is_permissive("MIT AND Apache-2.0"));
/// assert!(!policy.is_permissive("MIT OR GPL-2.0-only"));
/// ```
#[derive(Debug, Clone)]
pub struct LicensePolicy {
    permissive: AllowList,
    source_extensions: Vec<String>,
}

impl LicensePolicy {
    pub fn new(permissive: AllowList, config: &LicenseConfig) -> Self {
        Self {
            permissive,
            source_extensions: config.source_extensions.clone(),
        }
    }

    /// `true` if every license token of `expression` is allowed.
    ///
    /// `AND` is flattened to `OR` before splitting, so conjunctions and
    /// disjunctions over the same tokens get the same verdict.
    pub fn is_permissive(&self, expression: &str) -> bool {
        license_tokens(expression)
            .iter()
            .all(|token| self.permissive.contains(token))
    }

    /// `true` if `path` ends with one of the recognized source suffixes.
    pub fn is_source_file(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.source_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }
}

/// Split an expression into atomic tokens, treating `AND` like `OR`.
///
/// # Examples
///
/// ```
/// use licensegate_scan::license::license_tokens;
///
/// assert_eq!(license_tokens("MIT AND BSD-3-Clause OR Apache-2.0"), ["MIT", "BSD-3-Clause", "Apache-2.0"]);
/// ```
pub fn license_tokens(expression: &str) -> Vec<String> {
    expression
        .replace("AND", "OR")
        .split("OR")
        .map(|token| token.trim().to_string())
        .collect()
}

/// Classifies added/deleted text per file and applies the license rules.
pub struct LicenseAnalyzer<'a> {
    policy: LicensePolicy,
    oracle: &'a dyn LicenseOracle,
}

/// Text partitions of one file, ready for classification.
struct Candidate {
    index: usize,
    added: String,
    deleted: String,
}

impl<'a> LicenseAnalyzer<'a> {
    pub fn new(policy: LicensePolicy, oracle: &'a dyn LicenseOracle) -> Self {
        Self { policy, oracle }
    }

    /// Check every change; returns issues for offending files only.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Oracle`] if classification fails. No partial
    /// result is produced in that case.
    pub fn run(&self, changes: &[FileChange]) -> Result<IssueMap, GateError> {
        let candidates: Vec<Candidate> = changes
            .iter()
            .enumerate()
            .filter_map(|(index, change)| candidate(index, change))
            .collect();

        let mut entries = Vec::new();
        for c in &candidates {
            if !c.added.is_empty() {
                entries.push((key(c.index, Polarity::Added), c.added.clone()));
            }
            if !c.deleted.is_empty() {
                entries.push((key(c.index, Polarity::Deleted), c.deleted.clone()));
            }
        }

        let detected = if entries.is_empty() {
            HashMap::new()
        } else {
            self.oracle.classify_batch(&entries)?
        };

        let lookup = |index: usize, polarity: Polarity| {
            detected
                .get(&key(index, polarity))
                .map(String::as_str)
                .filter(|expr| !expr.trim().is_empty())
        };

        let mut flagged = IssueMap::new();
        for c in &candidates {
            let change = &changes[c.index];
            let issues = self.judge(
                change,
                lookup(c.index, Polarity::Added),
                lookup(c.index, Polarity::Deleted),
            );
            if !issues.is_empty() {
                flagged.insert(change.path.clone(), issues);
            }
        }

        tracing::debug!(
            candidates = candidates.len(),
            classified = entries.len(),
            flagged = flagged.len(),
            "license check finished"
        );
        Ok(flagged)
    }

    fn judge(&self, change: &FileChange, added: Option<&str>, deleted: Option<&str>) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let (Some(added), Some(deleted)) = (added, deleted) {
            // Operators count: only a reordering of the same expression is no change.
            if expression_terms(added) != expression_terms(deleted) {
                issues.push(Issue::new(
                    IssueKind::LicenseChanged,
                    format!("License deleted: {deleted} and license added: {added}"),
                ));
            }
        }

        if let Some(added) = added {
            if !self.policy.is_permissive(added) {
                issues.push(Issue::new(
                    IssueKind::LicenseIncompatibleAdded,
                    format!("Incompatible license added: {added}"),
                ));
            }
        }

        if let (None, Some(deleted)) = (added, deleted) {
            issues.push(Issue::new(
                IssueKind::LicenseDeleted,
                format!("License deleted: {deleted}"),
            ));
        }

        if change.change_type == ChangeType::Added
            && added.is_none()
            && self.policy.is_source_file(&change.path)
        {
            issues.push(Issue::new(
                IssueKind::LicenseMissingOnNewFile,
                format!("No license added for source file: {}", change.path.display()),
            ));
        }

        issues
    }
}

fn candidate(index: usize, change: &FileChange) -> Option<Candidate> {
    // Only modified and new files are judged.
    if !change.has_text() || !matches!(change.change_type, ChangeType::Modified | ChangeType::Added)
    {
        return None;
    }
    let added = change.lines_with_prefix('+').collect::<Vec<_>>().join("\n");
    let deleted = change.lines_with_prefix('-').collect::<Vec<_>>().join("\n");
    if added.is_empty() && deleted.is_empty() {
        return None;
    }
    Some(Candidate {
        index,
        added,
        deleted,
    })
}

fn key(file_index: usize, polarity: Polarity) -> OracleKey {
    OracleKey {
        file_index,
        polarity,
    }
}

/// Identifiers and operators of an expression, ignoring order and grouping.
fn expression_terms(expression: &str) -> BTreeSet<&str> {
    expression
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|term| !term.is_empty())
        .collect()
}
