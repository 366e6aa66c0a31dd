//! Copyright notice regression check.
//!
//! For modified source files, every deleted line mentioning `Copyright` must
//! come back among the added lines, compared after stripping everything but
//! letters. Year bumps and whitespace changes therefore pass, while dropped
//! or re-attributed notices are reported. Configured transitions let a
//! sanctioned holder rewording through.

use std::collections::{HashMap, HashSet};

use licensegate_core::{
    ChangeType, CopyrightConfig, CopyrightTransition, FileChange, Issue, IssueKind, IssueMap,
};

const MARKER: &str = "Copyright";

/// Detects deleted copyright notices in modified files.
///
/// # Examples
///
/// ```
/// use licensegate_core::CopyrightConfig;
/// use licensegate_difflens::parser::parse_patch;
/// use licensegate_scan::copyright::CopyrightAnalyzer;
///
/// let patch = "diff --git a/foo.c b/foo.c\n\
///              --- a/foo.c\n\
///              +++ b/foo.c\n\
///              @@ -1,2 +1,1 @@\n\
///              -/* Copyright 2020 Acme Corp */\n \
///               int x;\n";
/// let analyzer = CopyrightAnalyzer::new(&CopyrightConfig::default());
/// let issues = analyzer.run(&parse_patch(patch));
/// assert_eq!(
///     issues[std::path::Path::new("foo.c")][0].message,
///     "Copyright deletions detected: ['/* Copyright 2020 Acme Corp */']"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CopyrightAnalyzer {
    transitions: Vec<CopyrightTransition>,
}

/// A copyright line with its letters-only comparison key.
struct Notice<'a> {
    original: &'a str,
    normalized: String,
}

impl CopyrightAnalyzer {
    pub fn new(config: &CopyrightConfig) -> Self {
        Self {
            transitions: config.transitions.clone(),
        }
    }

    /// Check every change and collect one issue per offending file.
    pub fn run(&self, changes: &[FileChange]) -> IssueMap {
        let mut flagged = IssueMap::new();
        for change in changes {
            if let Some(issue) = self.check(change) {
                flagged.insert(change.path.clone(), vec![issue]);
            }
        }
        tracing::debug!(
            checked = changes.len(),
            flagged = flagged.len(),
            "copyright check finished"
        );
        flagged
    }

    fn check(&self, change: &FileChange) -> Option<Issue> {
        // New and removed files cannot regress a notice.
        if change.change_type != ChangeType::Modified || !change.has_text() {
            return None;
        }

        let added = notices(change, '+');
        let deleted = notices(change, '-');
        if deleted.is_empty() {
            return None;
        }

        let added_keys: HashSet<&str> = added.iter().map(|n| n.normalized.as_str()).collect();

        let mut deleted_by_key: HashMap<&str, &str> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for notice in &deleted {
            if deleted_by_key
                .insert(notice.normalized.as_str(), notice.original)
                .is_none()
            {
                order.push(notice.normalized.as_str());
            }
        }

        let mut remaining: Vec<&str> = order
            .into_iter()
            .filter(|key| !added_keys.contains(key))
            .collect();

        for transition in &self.transitions {
            let sanctioned = added.iter().any(|n| n.original.contains(&transition.new));
            if sanctioned {
                remaining.retain(|key| !deleted_by_key[key].contains(&transition.legacy));
            }
        }

        if remaining.is_empty() {
            return None;
        }

        let originals: Vec<&str> = remaining.iter().map(|key| deleted_by_key[key]).collect();
        Some(Issue::new(
            IssueKind::CopyrightDeletion,
            format!("Copyright deletions detected: {}", quote_list(&originals)),
        ))
    }
}

/// Keep only alphabetic characters, so `2020-2024` and spacing do not matter.
///
/// # Examples
///
/// ```
/// use licensegate_scan::copyright::normalize;
///
/// assert_eq!(normalize("(c) 2020, Acme Corp."), "cAcmeCorp");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| c.is_alphabetic()).collect()
}

fn notices(change: &FileChange, prefix: char) -> Vec<Notice<'_>> {
    change
        .lines_with_prefix(prefix)
        .filter(|line| line.contains(MARKER))
        .map(|original| Notice {
            original,
            normalized: normalize(original),
        })
        .collect()
}

/// Render strings as a bracketed, quoted list: `['a', "it's"]`.
fn quote_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn quote(text: &str) -> String {
    let q = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(q);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}
