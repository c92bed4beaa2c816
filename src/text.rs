//! @name Text
//! @description Line normalization shared by the tokenizer, splitter and dispatch engine
//!
//! `normalize` strips leading/trailing blank lines, removes the indentation
//! common to every non-blank line, and trims trailing whitespace. It is
//! idempotent.

/// Splits text into lines after folding `\r\n` and lone `\r` into `\n`.
pub fn normal_lines(contents: &str) -> Vec<String> {
    normal_string(contents).split('\n').map(str::to_string).collect()
}

/// Folds Windows and old Mac line endings into `\n`.
pub fn normal_string(contents: &str) -> String {
    contents.replace("\r\n", "\n").replace('\r', "\n")
}

/// Number of leading whitespace characters.
pub fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Normalizes a block of lines (see module docs).
pub fn normalize<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();

    let first = match lines.iter().position(|l| !is_blank(l)) {
        Some(first) => first,
        None => return Vec::new(),
    };
    // a non-blank line exists, so rposition can't miss
    let last = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(first);
    let lines = &lines[first..=last];

    let trim_by = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if is_blank(line) {
                return String::new();
            }
            let offset = line
                .char_indices()
                .nth(trim_by)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            line[offset..].trim_end().to_string()
        })
        .collect()
}

/// Normalizes a single string that may span several lines.
pub fn normalize_str(text: &str) -> String {
    normalize(&normal_lines(text)).join("\n")
}

/// Joins non-empty parts with newlines.
pub fn join_text<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// HTML-escapes code so it can be embedded as text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dedents_and_trims() {
        let lines = vec!["", "   foo  ", "     bar", "", "   baz", "  "];
        assert_eq!(normalize(&lines), vec!["foo", "  bar", "", "baz"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples: Vec<Vec<&str>> = vec![
            vec!["", "  a", "    b", "", ""],
            vec!["\t\tx", "\t\t\ty  ", ""],
            vec!["   ", "", "  "],
            vec!["no indent", "  some", " one"],
        ];
        for sample in samples {
            let once = normalize(&sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_all_blank_is_empty() {
        assert!(normalize(&["", "   ", "\t"]).is_empty());
    }

    #[test]
    fn test_normalize_str_single_line() {
        assert_eq!(normalize_str(" {string} bar - a value  "), "{string} bar - a value");
    }

    #[test]
    fn test_normal_lines_folds_crlf() {
        assert_eq!(normal_lines("a\r\nb\rc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
