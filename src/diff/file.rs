use super::hunk::Hunk;

/// The hunks of one file in a staged diff.
#[derive(Debug, PartialEq, Eq)]
pub struct FileDiff {
    /// File path in the new version (extracted from the `+++ b/path` header)
    pub path: String,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Parse the section of `git diff` output for one file.
    ///
    /// Returns `None` if the file has no new-side path (deleted files) or no
    /// hunks (binary files, mode-only changes, pure renames).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut path = None;
        let mut chunks: Vec<Vec<&str>> = Vec::new();

        for line in text.lines() {
            if line.starts_with("@@ ") {
                chunks.push(vec![line]);
            } else if let Some(chunk) = chunks.last_mut() {
                chunk.push(line);
            } else if let Some(label) = line.strip_prefix("+++ ") {
                path = new_side_path(label);
            }
        }

        let path = path?;
        let hunks: Vec<Hunk> = chunks
            .iter()
            .filter_map(|chunk| Hunk::parse(&chunk.join("\n")))
            .collect();

        (!hunks.is_empty()).then_some(FileDiff { path, hunks })
    }

    /// Every added line in the file, paired with its line number in the new version.
    pub fn added_lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.hunks.iter().flat_map(|hunk| hunk.numbered())
    }
}

/// Resolve the label after `+++ ` into a repository-relative path.
fn new_side_path(label: &str) -> Option<String> {
    let label = label.trim_end();
    if label == "/dev/null" {
        return None;
    }

    let unquoted = match label.strip_prefix('"').and_then(|l| l.strip_suffix('"')) {
        Some(quoted) => unescape_c_style(quoted),
        None => label.to_string(),
    };

    unquoted
        .strip_prefix("b/")
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Undo git's C-style quoting of unusual path names (`\t`, `\"`, `\\`, octal bytes).
fn unescape_c_style(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut chars = quoted.bytes().peekable();

    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'3') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    if let Some(&next @ b'0'..=b'7') = chars.peek() {
                        value = value * 8 + u32::from(next - b'0');
                        chars.next();
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_single_hunk() {
        let diff = r#"diff --git a/app.js b/app.js
index abc1234..def5678 100644
--- a/app.js
+++ b/app.js
@@ -136,0 +137 @@
+      debugger;
"#;
        let file_diff = FileDiff::parse(diff).unwrap();
        assert_eq!(file_diff.path, "app.js");
        assert_eq!(file_diff.hunks.len(), 1);
        assert_eq!(file_diff.hunks[0].added.start, 137);
        assert_eq!(file_diff.hunks[0].lines, vec!["      debugger;"]);
    }

    #[test]
    fn added_lines_span_hunks() {
        let diff = r#"diff --git a/config.js b/config.js
index fa2da6e..41114ff 100644
--- a/config.js
+++ b/config.js
@@ -2,0 +3 @@ line 2
+// first insertion
@@ -8,2 +10,2 @@ line 8
-old one
-old two
+new one
+new two
"#;
        let file_diff = FileDiff::parse(diff).unwrap();
        let added: Vec<_> = file_diff.added_lines().collect();
        assert_eq!(
            added,
            vec![(3, "// first insertion"), (10, "new one"), (11, "new two")]
        );
    }

    #[test]
    fn new_file_is_parsed() {
        let diff = r#"diff --git a/bar.js b/bar.js
new file mode 100644
index 0000000..ba0e162
--- /dev/null
+++ b/bar.js
@@ -0,0 +1 @@
+bar
\ No newline at end of file
"#;
        let file_diff = FileDiff::parse(diff).unwrap();
        assert_eq!(file_diff.path, "bar.js");
        assert_eq!(file_diff.added_lines().collect::<Vec<_>>(), vec![(1, "bar")]);
    }

    #[test]
    fn deleted_file_has_no_new_side() {
        let diff = r#"diff --git a/gone.js b/gone.js
deleted file mode 100644
index ba0e162..0000000
--- a/gone.js
+++ /dev/null
@@ -1 +0,0 @@
-bar
"#;
        assert!(FileDiff::parse(diff).is_none());
    }

    #[test]
    fn binary_file_has_no_hunks() {
        let diff = r#"diff --git a/logo.png b/logo.png
index 1111111..2222222 100644
Binary files a/logo.png and b/logo.png differ
"#;
        assert!(FileDiff::parse(diff).is_none());
    }

    #[test]
    fn quoted_path_is_unescaped() {
        let diff = "diff --git \"a/my file\\t.js\" \"b/my file\\t.js\"\n--- \"a/my file\\t.js\"\n+++ \"b/my file\\t.js\"\n@@ -0,0 +1 @@\n+x\n";
        let file_diff = FileDiff::parse(diff).unwrap();
        assert_eq!(file_diff.path, "my file\t.js");
    }

    #[test]
    fn octal_escapes_decode_utf8() {
        assert_eq!(unescape_c_style("b/caf\\303\\251.js"), "b/café.js");
    }

    #[test]
    fn deletion_only_file_has_no_hunks_with_additions() {
        let diff = r#"diff --git a/list.md b/list.md
index 111..222 100644
--- a/list.md
+++ b/list.md
@@ -4 +3,0 @@
-removed
"#;
        let file_diff = FileDiff::parse(diff).unwrap();
        assert_eq!(file_diff.added_lines().count(), 0);
    }

    #[test]
    fn content_resembling_headers_stays_in_hunk() {
        let diff = "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -0,0 +1,2 @@\n++++ b/other\n+diff --git x\n";
        let file_diff = FileDiff::parse(diff).unwrap();
        assert_eq!(file_diff.path, "a.txt");
        assert_eq!(
            file_diff.added_lines().collect::<Vec<_>>(),
            vec![(1, "+++ b/other"), (2, "diff --git x")]
        );
    }
}
