use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const RENAME_ONLY: &str = "\
diff --git a/old/name.c b/new/name.c
similarity index 100%
rename from old/name.c
rename to new/name.c
";

const COPYRIGHT_DROP: &str = "\
diff --git a/foo.c b/foo.c
index 1111111..2222222 100644
--- a/foo.c
+++ b/foo.c
@@ -1,2 +1 @@
-/* Copyright 2020 Acme Corp */
 int x;
";

const NEW_SOURCE: &str = "\
diff --git a/drivers/new.c b/drivers/new.c
new file mode 100644
--- /dev/null
+++ b/drivers/new.c
@@ -0,0 +1,2 @@
+// Licensed under the GNU General Public License v3
+int y;
";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write `.licensegate.toml` pointing the oracle at `command`.
    fn config(&self, command: &str) {
        self.write(
            ".licensegate.toml",
            &format!("[oracle]\ncommand = {command:?}\ntimeout_secs = 5\n"),
        );
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_licensegate"))
            .args(args)
            .current_dir(self.path())
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn pure_rename_exits_zero_without_calling_oracle() {
    let ws = Workspace::new();
    ws.config("/nonexistent/scancode");
    ws.write("change.patch", RENAME_ONLY);

    let output = ws.run(&["change.patch", "meta-qcom-robotics"]);

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert_eq!(out, "< file license/copyright check > 0 file(s) flagged\n");
}

#[test]
fn missing_patch_is_fatal() {
    let ws = Workspace::new();
    let output = ws.run(&["nope.patch", "meta-qcom-robotics"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

#[test]
fn oracle_failure_is_fatal_and_prints_no_report() {
    let ws = Workspace::new();
    ws.config("/nonexistent/scancode");
    ws.write("change.patch", COPYRIGHT_DROP);

    let output = ws.run(&["change.patch", "meta-qcom-robotics"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("< file license/copyright check >"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("license"));
}

#[test]
fn invalid_format_is_rejected() {
    let ws = Workspace::new();
    ws.write("change.patch", RENAME_ONLY);
    let output = ws.run(&["change.patch", "p", "--format", "yaml"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
mod with_fake_scancode {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Reports `expr` for every staged file, or nothing when `expr` is empty.
    const SCRIPT: &str = r#"#!/bin/sh
out=""; input=""
while [ $# -gt 0 ]; do
  case "$1" in
    --json-pp) out="$2"; shift ;;
    --timeout) shift ;;
    --*) ;;
    *) input="$1" ;;
  esac
  shift
done
files=""
if [ -n "@EXPR@" ]; then
  for f in "$input"/*; do
    name=$(basename "$f")
    entry="{\"path\": \"$name\", \"type\": \"file\", \"license_detections\": [{\"license_expression_spdx\": \"@EXPR@\"}]}"
    if [ -z "$files" ]; then files="$entry"; else files="$files, $entry"; fi
  done
fi
printf '{"files": [%s]}' "$files" > "$out"
"#;

    fn fake_scancode(ws: &Workspace, expr: &str) -> String {
        let path = ws.write("fake-scancode", &SCRIPT.replace("@EXPR@", expr));
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn copyright_deletion_flags_one_file() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "");
        ws.config(&command);
        ws.write("change.patch", COPYRIGHT_DROP);

        let output = ws.run(&["change.patch", "meta-qcom-robotics"]);

        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.starts_with("< file license/copyright check > foo.c\n"));
        assert!(out.contains("< file license/copyright check > - Copyright issues detected:"));
        assert!(out.lines().all(|line| line.starts_with("< file license/copyright check >")));
        assert!(out.contains("Copyright deletions detected: ['/* Copyright 2020 Acme Corp */']"));
    }

    #[test]
    fn exit_status_counts_flagged_files() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "GPL-3.0-only");
        ws.config(&command);
        ws.write("change.patch", &format!("{COPYRIGHT_DROP}{NEW_SOURCE}"));

        let output = ws.run(&["change.patch", "meta-qcom-robotics"]);

        assert_eq!(output.status.code(), Some(2));
        assert!(stdout(&output).contains("Incompatible license added: GPL-3.0-only"));
    }

    #[test]
    fn copyleft_project_accepts_copyleft_license() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "GPL-3.0");
        ws.config(&command);
        ws.write("change.patch", NEW_SOURCE);

        let output = ws.run(&["change.patch", "meta-qcom-kernel"]);

        assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));
    }

    #[test]
    fn unknown_project_rejects_any_detected_license() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "MIT");
        ws.config(&command);
        ws.write("change.patch", NEW_SOURCE);

        let output = ws.run(&["change.patch", "somebody/else"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("Incompatible license added: MIT"));
        assert!(String::from_utf8_lossy(&output.stderr).contains("no license marking"));
    }

    #[test]
    fn ignore_file_excludes_paths() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "GPL-3.0-only");
        ws.config(&command);
        ws.write("change.patch", &format!("{COPYRIGHT_DROP}{NEW_SOURCE}"));
        ws.write("skip.txt", "drivers/\n");

        let output = ws.run(&["change.patch", "meta-qcom-robotics", "--ignore-file", "skip.txt"]);

        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("foo.c"));
        assert!(!out.contains("drivers/new.c"));
    }

    #[test]
    fn json_report() {
        let ws = Workspace::new();
        let command = fake_scancode(&ws, "");
        ws.config(&command);
        ws.write("change.patch", COPYRIGHT_DROP);

        let output = ws.run(&["change.patch", "meta-qcom-robotics", "--format", "json"]);

        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let entry = &json["entries"][0];
        assert_eq!(entry["path"], "foo.c");
        assert_eq!(entry["copyrightIssues"][0]["kind"], "copyrightDeletion");
    }
}
