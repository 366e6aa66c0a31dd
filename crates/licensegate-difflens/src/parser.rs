use std::path::PathBuf;

use licensegate_core::{ChangeType, FileChange, FileType};

/// Parse a git-style unified diff into one [`FileChange`] per file section.
///
/// Sections start at `diff ... b/<path>` lines. Everything before the first
/// such line (commit message, `format-patch` headers) is ignored; see
/// [`split_metadata`] to get at it. Malformed input never fails: a section
/// missing its `+++` marker simply has no content, and text without any
/// delimiter yields no changes.
///
/// # Examples
///
/// ```
/// use licensegate_core::ChangeType;
/// use licensegate_difflens::parser::parse_patch;
///
/// let patch = "diff --git a/hello.c b/hello.c\n\
///              index 1111111..2222222 100644\n\
///              --- a/hello.c\n\
///              +++ b/hello.c\n\
///              @@ -1,2 +1,3 @@\n \
///               int main(void) {\n\
///              +    return 0;\n \
///               }\n";
/// let changes = parse_patch(patch);
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].change_type, ChangeType::Modified);
/// assert!(changes[0].content.as_deref().unwrap().contains("+    return 0;"));
/// ```
pub fn parse_patch(input: &str) -> Vec<FileChange> {
    let mut changes = Vec::new();
    let mut current: Option<Section<'_>> = None;

    for line in input.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);

        if let Some(path) = delimiter_path(bare) {
            if let Some(section) = current.take() {
                changes.push(section.finish());
            }
            current = Some(Section::new(path));
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };
        section.push(line, bare);
    }

    if let Some(section) = current.take() {
        changes.push(section.finish());
    }

    tracing::debug!(files = changes.len(), "parsed patch");
    changes
}

/// Return the metadata preceding the first file section.
///
/// # Examples
///
/// ```
/// use licensegate_difflens::parser::split_metadata;
///
/// let patch = "From abc Mon Sep 17 00:00:00 2001\nSubject: fix\n\ndiff --git a/x b/x\n";
/// assert_eq!(split_metadata(patch), "From abc Mon Sep 17 00:00:00 2001\nSubject: fix\n\n");
/// ```
pub fn split_metadata(input: &str) -> &str {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if delimiter_path(line.trim_end_matches(['\n', '\r'])).is_some() {
            return &input[..offset];
        }
        offset += line.len();
    }
    input
}

/// Accumulates one file section until the next delimiter.
struct Section<'a> {
    path: String,
    header: Vec<&'a str>,
    body: Option<String>,
    binary: bool,
}

impl<'a> Section<'a> {
    fn new(path: String) -> Self {
        Self {
            path,
            header: Vec::new(),
            body: None,
            binary: false,
        }
    }

    fn push(&mut self, raw: &'a str, bare: &'a str) {
        if let Some(body) = self.body.as_mut() {
            body.push_str(raw);
            return;
        }

        if bare.starts_with("+++ ") {
            self.body = Some(String::new());
        } else if is_binary_marker(bare) {
            self.binary = true;
        } else {
            self.header.push(bare);
        }
    }

    fn finish(self) -> FileChange {
        let has_hunk = self.body.is_some() && !self.binary;
        let change_type = match file_mode_word(&self.header) {
            Some("new") => ChangeType::Added,
            Some("deleted") => ChangeType::Deleted,
            _ if !has_hunk && has_rename_pair(&self.header) => ChangeType::Renamed,
            _ => ChangeType::Modified,
        };
        let file_type = if self.binary {
            FileType::Binary
        } else {
            FileType::Source
        };
        let content = if self.binary { None } else { self.body };

        FileChange {
            path: PathBuf::from(self.path),
            file_type,
            change_type,
            content,
        }
    }
}

fn delimiter_path(line: &str) -> Option<String> {
    if !line.starts_with("diff ") {
        return None;
    }
    if let Some(idx) = line.rfind(" \"b/") {
        let path = &line[idx + 4..];
        return Some(path.strip_suffix('"').unwrap_or(path).to_string());
    }
    let idx = line.rfind(" b/")?;
    Some(line[idx + 3..].to_string())
}

fn is_binary_marker(line: &str) -> bool {
    line == "GIT binary patch" || (line.starts_with("Binary files ") && line.ends_with(" differ"))
}

/// The word in front of the first `... file mode` header, e.g. `new` or `deleted`.
fn file_mode_word<'h>(header: &[&'h str]) -> Option<&'h str> {
    header.iter().find_map(|line| {
        let idx = line.find(" file mode")?;
        Some(line[..idx].rsplit(' ').next().unwrap_or(""))
    })
}

fn has_rename_pair(header: &[&str]) -> bool {
    header
        .windows(2)
        .any(|pair| pair[0].starts_with("rename from ") && pair[1].starts_with("rename to "))
}
