//! Path exclusion driven by a `.licenseignore` file.
//!
//! Patterns follow a subset of gitignore syntax and are matched with
//! [`glob::Pattern`]: `*` never crosses a `/`, a leading `/` anchors the
//! pattern to the repository root, a trailing `/` restricts it to
//! directories, and `!` re-includes a previously excluded path. The last
//! matching rule wins.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use licensegate_core::{FileChange, GateError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of ignore rules.
///
/// # Examples
///
/// ```
/// use licensegate_difflens::filter::PathExclusion;
///
/// let exclusion = PathExclusion::from_patterns(["third_party/", "*.md", "!KEEP.md"]).unwrap();
/// assert!(exclusion.is_excluded("third_party/zlib/inflate.c"));
/// assert!(exclusion.is_excluded("docs/intro.md"));
/// assert!(!exclusion.is_excluded("KEEP.md"));
/// assert!(!exclusion.is_excluded("src/main.c"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathExclusion {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    source: String,
    negated: bool,
    globs: Vec<Pattern>,
}

impl PathExclusion {
    /// Load rules from an ignore file. A missing file excludes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Io`] if the file exists but cannot be read, or
    /// [`GateError::Config`] if a pattern is not a valid glob.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no ignore file, nothing excluded");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let exclusion = Self::from_patterns(content.lines())?;
        tracing::debug!(
            path = %path.display(),
            rules = %exclusion,
            "loaded ignore rules"
        );
        Ok(exclusion)
    }

    /// Compile rules from pattern lines. Blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if a pattern is not a valid glob.
    pub fn from_patterns<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            rules.push(Rule::compile(line)?);
        }
        Ok(Self { rules })
    }

    /// `true` if `path` is excluded by the last rule that matches it.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .is_some_and(|rule| !rule.negated)
    }

    /// Split changes into the ones to analyze and the excluded paths.
    pub fn retain(&self, changes: Vec<FileChange>) -> (Vec<FileChange>, Vec<PathBuf>) {
        if self.is_empty() {
            return (changes, Vec::new());
        }
        let mut kept = Vec::new();
        let mut excluded = Vec::new();
        for change in changes {
            if self.is_excluded(&change.path.to_string_lossy()) {
                tracing::debug!(path = %change.path.display(), "excluded by ignore rules");
                excluded.push(change.path);
            } else {
                kept.push(change);
            }
        }
        (kept, excluded)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Rule {
    fn compile(line: &str) -> Result<Self> {
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let (anchored, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (body.contains('/'), body),
        };
        let base = if anchored {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        let mut sources = vec![format!("{base}/**")];
        if !dir_only {
            sources.push(base);
        }

        let globs = sources
            .iter()
            .map(|s| {
                Pattern::new(s)
                    .map_err(|e| GateError::Config(format!("invalid ignore pattern '{line}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: line.to_string(),
            negated,
            globs,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.globs
            .iter()
            .any(|glob| glob.matches_with(path, MATCH_OPTIONS))
    }
}

impl std::fmt::Display for PathExclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<&str> = self.rules.iter().map(|r| r.source.as_str()).collect();
        write!(f, "{}", sources.join(", "))
    }
}
