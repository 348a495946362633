use similar::{ChangeTag, TextDiff};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub diff_lines: Vec<DiffLine>,
}

#[derive(Debug, Clone)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Context,
    Addition,
    Deletion,
}

impl DiffLineType {
    pub fn prefix(&self) -> &'static str {
        match self {
            DiffLineType::Addition => "+",
            DiffLineType::Deletion => "-",
            DiffLineType::Context => " ",
        }
    }
}

impl FileDiff {
    /// Diff between two versions of a file; a missing side is treated as empty.
    pub fn between(path: &Path, old_content: Option<String>, new_content: Option<String>) -> Self {
        let diff_lines = Self::compute_diff(
            old_content.as_deref().unwrap_or(""),
            new_content.as_deref().unwrap_or(""),
        );

        FileDiff {
            path: path.to_string_lossy().replace('\\', "/"),
            old_content,
            new_content,
            diff_lines,
        }
    }

    fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
        let diff = TextDiff::from_lines(old_text, new_text);
        let mut lines = Vec::new();
        let mut old_line_num = 1;
        let mut new_line_num = 1;

        for change in diff.iter_all_changes() {
            let (line_type, old_num, new_num) = match change.tag() {
                ChangeTag::Delete => {
                    let num = old_line_num;
                    old_line_num += 1;
                    (DiffLineType::Deletion, Some(num), None)
                }
                ChangeTag::Insert => {
                    let num = new_line_num;
                    new_line_num += 1;
                    (DiffLineType::Addition, None, Some(num))
                }
                ChangeTag::Equal => {
                    let old_num = old_line_num;
                    let new_num = new_line_num;
                    old_line_num += 1;
                    new_line_num += 1;
                    (DiffLineType::Context, Some(old_num), Some(new_num))
                }
            };

            let mut content = change.to_string();
            if !content.ends_with('\n') {
                content.push('\n');
            }

            lines.push(DiffLine {
                line_type,
                content,
                old_line_number: old_num,
                new_line_number: new_num,
            });
        }

        lines
    }

    pub fn has_changes(&self) -> bool {
        self.diff_lines
            .iter()
            .any(|line| line.line_type != DiffLineType::Context)
    }

    pub fn format_unified(&self, context_lines: usize) -> String {
        let old = self.old_content.as_deref().unwrap_or("");
        let new = self.new_content.as_deref().unwrap_or("");
        let diff = TextDiff::from_lines(old, new);

        let mut output = String::new();
        for hunk in diff
            .unified_diff()
            .context_radius(context_lines)
            .header(&self.path, &self.path)
            .iter_hunks()
        {
            if output.is_empty() {
                output.push_str(&format!("--- {}\n+++ {}\n", self.path, self.path));
            }
            output.push_str(&hunk.to_string());
            if !output.ends_with('\n') {
                output.push('\n');
            }
        }

        output
    }
}

/// A set of file diffs shown to the operator alongside a confirmation prompt.
#[derive(Debug, Clone, Default)]
pub struct DiffPreview {
    pub title: String,
    pub files: Vec<FileDiff>,
}

impl DiffPreview {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            files: Vec::new(),
        }
    }

    /// Adds the diff unless the two versions are identical.
    pub fn push(&mut self, diff: FileDiff) {
        if diff.has_changes() {
            self.files.push(diff);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut output = format!("{}\n\n", self.title);
        for file in &self.files {
            output.push_str(&file.format_unified(3));
            output.push('\n');
        }
        output
    }

    pub fn to_html(&self) -> String {
        let mut body = String::new();
        for file in &self.files {
            body.push_str(&format!(
                "<h2>{}</h2>\n<table class=\"diff\">\n",
                escape_html(&file.path)
            ));
            for line in &file.diff_lines {
                let class = match line.line_type {
                    DiffLineType::Addition => "add",
                    DiffLineType::Deletion => "del",
                    DiffLineType::Context => "ctx",
                };
                let number = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_default();
                body.push_str(&format!(
                    "<tr class=\"{}\"><td class=\"num\">{}</td><td class=\"num\">{}</td><td><pre>{}{}</pre></td></tr>\n",
                    class,
                    number(line.old_line_number),
                    number(line.new_line_number),
                    line.line_type.prefix(),
                    escape_html(line.content.trim_end_matches('\n')),
                ));
            }
            body.push_str("</table>\n");
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
            title = escape_html(&self.title),
            body = body,
        )
    }
}

const STYLE: &str = "body { font-family: sans-serif; margin: 2em; }
table.diff { border-collapse: collapse; width: 100%; font-family: monospace; }
table.diff pre { margin: 0; white-space: pre-wrap; }
td.num { color: #888; text-align: right; padding-right: 0.5em; width: 3em; }
tr.add { background: #e6ffec; }
tr.del { background: #ffebe9; }
";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_computation() {
        let old_text = "line 1\nline 2\nline 3\n";
        let new_text = "line 1\nline 2 modified\nline 3\nline 4\n";

        let diff_lines = FileDiff::compute_diff(old_text, new_text);

        assert!(!diff_lines.is_empty());
        assert!(diff_lines
            .iter()
            .any(|l| l.line_type == DiffLineType::Addition));
        assert!(diff_lines
            .iter()
            .any(|l| l.line_type == DiffLineType::Deletion));
    }

    #[test]
    fn test_missing_side_is_empty() {
        let diff = FileDiff::between(
            Path::new("keybindings.json"),
            None,
            Some("[]\n".to_string()),
        );

        assert!(diff.has_changes());
        assert_eq!(diff.diff_lines.len(), 1);
        assert_eq!(diff.diff_lines[0].line_type, DiffLineType::Addition);
        assert_eq!(diff.diff_lines[0].new_line_number, Some(1));
    }

    #[test]
    fn test_format_unified() {
        let diff = FileDiff::between(
            Path::new("settings.json"),
            Some("{\n  \"a\": 1\n}\n".to_string()),
            Some("{\n  \"a\": 1,\n  \"b\": 2\n}\n".to_string()),
        );

        let text = diff.format_unified(3);
        similar_asserts::assert_eq!(
            text,
            "--- settings.json\n+++ settings.json\n@@ -1,3 +1,4 @@\n {\n-  \"a\": 1\n+  \"a\": 1,\n+  \"b\": 2\n }\n"
        );
    }

    #[test]
    fn test_identical_files_render_nothing() {
        let diff = FileDiff::between(
            Path::new("settings.json"),
            Some("{}\n".to_string()),
            Some("{}\n".to_string()),
        );

        assert!(!diff.has_changes());
        assert_eq!(diff.format_unified(3), "");

        let mut preview = DiffPreview::new("Remote changes");
        preview.push(diff);
        assert!(preview.is_empty());
    }

    #[test]
    fn test_preview_html_escapes_content() {
        let mut preview = DiffPreview::new("Incoming <remote> changes");
        preview.push(FileDiff::between(
            Path::new("settings.json"),
            Some("{}\n".to_string()),
            Some("{\"html\": \"<b>&\"}\n".to_string()),
        ));

        let html = preview.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Incoming &lt;remote&gt; changes"));
        assert!(html.contains("&lt;b&gt;&amp;"));
        assert!(html.contains("<tr class=\"add\">"));
        assert!(html.contains("<tr class=\"del\">"));
    }

    #[test]
    fn test_preview_text_names_changed_key() {
        let mut preview = DiffPreview::new("Remote changes");
        preview.push(FileDiff::between(
            Path::new("settings.json"),
            Some("{\n  \"a\": 1\n}\n".to_string()),
            Some("{\n  \"a\": 1,\n  \"editor.minimap.enabled\": false\n}\n".to_string()),
        ));

        let text = preview.to_text();
        assert!(text.starts_with("Remote changes\n"));
        assert!(text.contains("+  \"editor.minimap.enabled\": false"));
    }
}
