use std::collections::HashMap;
use std::path::Path;

use licensegate_core::{AllowList, CopyrightConfig, GateError, IssueKind, LicenseConfig};
use licensegate_difflens::parser::parse_patch;
use licensegate_scan::copyright::CopyrightAnalyzer;
use licensegate_scan::license::{LicenseAnalyzer, LicensePolicy};
use licensegate_scan::oracle::{LicenseOracle, OracleKey};
use licensegate_scan::report::ComplianceReport;

/// Recognizes a couple of license phrases, like a tiny ScanCode.
struct PhraseOracle;

impl LicenseOracle for PhraseOracle {
    fn classify_batch(
        &self,
        entries: &[(OracleKey, String)],
    ) -> Result<HashMap<OracleKey, String>, GateError> {
        let mut out = HashMap::new();
        for (key, text) in entries {
            let expr = if text.contains("GNU General Public License version 2") {
                "GPL-2.0-only"
            } else if text.contains("Permission is hereby granted") {
                "MIT"
            } else {
                continue;
            };
            out.insert(*key, expr.to_string());
        }
        Ok(out)
    }
}

fn check(patch: &str, allowed: &[&str]) -> ComplianceReport {
    let changes = parse_patch(patch);
    let policy = LicensePolicy::new(
        AllowList::new(allowed.iter().copied()),
        &LicenseConfig::default(),
    );
    let license = LicenseAnalyzer::new(policy, &PhraseOracle)
        .run(&changes)
        .unwrap();
    let copyright = CopyrightAnalyzer::new(&CopyrightConfig::default()).run(&changes);
    ComplianceReport::merge(license, copyright)
}

#[test]
fn deleted_notice_in_modified_file() {
    let patch = "\
diff --git a/foo.c b/foo.c
index 1111111..2222222 100644
--- a/foo.c
+++ b/foo.c
@@ -1,2 +1 @@
-/* Copyright 2020 Acme Corp */
 int x;
";
    let report = check(patch, &["MIT"]);
    assert_eq!(report.flagged_count(), 1);
    let entry = &report.entries[0];
    assert_eq!(entry.path, Path::new("foo.c"));
    assert!(entry.license_issues.is_empty());
    assert_eq!(
        entry.copyright_issues[0].message,
        "Copyright deletions detected: ['/* Copyright 2020 Acme Corp */']"
    );
}

#[test]
fn new_python_file_without_license() {
    let patch = "\
diff --git a/bar.py b/bar.py
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/bar.py
@@ -0,0 +1,2 @@
+def main():
+    print('hi')
";
    let report = check(patch, &["MIT"]);
    assert_eq!(report.flagged_count(), 1);
    let issues = &report.entries[0].license_issues;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::LicenseMissingOnNewFile);
    assert_eq!(issues[0].message, "No license added for source file: bar.py");
}

#[test]
fn header_switch_from_gpl_to_mit() {
    let patch = "\
diff --git a/baz.h b/baz.h
index 4444444..5555555 100644
--- a/baz.h
+++ b/baz.h
@@ -1,3 +1,3 @@
 /*
- * GNU General Public License version 2
+ * Permission is hereby granted, free of charge, to any person
  */
";
    let report = check(patch, &["MIT", "Apache-2.0"]);
    assert_eq!(report.flagged_count(), 1);
    let entry = &report.entries[0];
    let messages: Vec<&str> = entry
        .license_issues
        .iter()
        .map(|i| i.message.as_str())
        .collect();
    assert_eq!(
        messages,
        ["License deleted: GPL-2.0-only and license added: MIT"]
    );
    assert!(entry.copyright_issues.is_empty());
}

#[test]
fn pure_rename_is_clean() {
    let patch = "\
diff --git a/old/name.c b/new/name.c
similarity index 100%
rename from old/name.c
rename to new/name.c
";
    let report = check(patch, &[]);
    assert!(report.is_clean());
}

#[test]
fn multi_file_patch_reports_each_offender_once() {
    let patch = "\
From 0123456789abcdef Mon Sep 17 00:00:00 2001
From: Dev <dev@example.com>
Subject: [PATCH] mixed

---
diff --git a/foo.c b/foo.c
--- a/foo.c
+++ b/foo.c
@@ -1,2 +1,2 @@
-/* Copyright 2020 Acme Corp */
+/* GNU General Public License version 2 */
 int x;
diff --git a/bar.py b/bar.py
new file mode 100644
--- /dev/null
+++ b/bar.py
@@ -0,0 +1 @@
+x = 1
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
-hello
+hello world
";
    let report = check(patch, &["MIT"]);
    let paths: Vec<&Path> = report.entries.iter().map(|e| e.path.as_path()).collect();
    assert_eq!(paths, [Path::new("bar.py"), Path::new("foo.c")]);

    let foo = &report.entries[1];
    assert_eq!(foo.license_issues.len(), 1);
    assert_eq!(
        foo.license_issues[0].message,
        "Incompatible license added: GPL-2.0-only"
    );
    assert_eq!(foo.copyright_issues.len(), 1);
}
