//! @name Annotation
//! @description Named annotation segments cut out of a comment block
//!
//! An annotation starts at `@name` (the prefix is configurable) and runs
//! until the next known annotation or the end of the comment block.

pub mod split;

use serde::{Deserialize, Serialize};

pub use split::Splitter;

use crate::text::{normalize, normalize_str};

/// One annotation inside a comment block.
///
/// `line` is the text after the name on the head line. `contents` holds the
/// head line plus the following lines until the splitter closes the
/// annotation; the dispatch engine shifts the head line off before `parse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    pub line: String,
    pub contents: Vec<String>,
    /// Index of the head line within the comment contents
    pub start: Option<usize>,
    /// Index of the last line that belongs to this annotation
    pub end: Option<usize>,
}

impl Annotation {
    /// Builds an annotation from free text, as `add()` does: the first line
    /// is the head line and stays in `contents`.
    pub fn synthesize(name: &str, alias: Vec<String>, text: &str) -> Self {
        let contents = normalize(&crate::text::normal_lines(text));
        let line = contents.first().cloned().unwrap_or_default();
        Self {
            name: name.to_string(),
            alias,
            line,
            contents,
            start: None,
            end: None,
        }
    }

    /// Drops the head line and normalizes what is left. Safe to call once.
    pub fn prepare(&mut self) {
        if !self.contents.is_empty() {
            self.contents.remove(0);
        }
        self.contents = normalize(&self.contents);
        self.line = normalize_str(&self.line);
    }

    /// Body lines joined with newlines
    pub fn body(&self) -> String {
        self.contents.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_shifts_head_line() {
        let mut annotation = Annotation {
            name: "description".to_string(),
            alias: vec![],
            line: "  short  ".to_string(),
            contents: vec![
                "@description  short  ".to_string(),
                "  longer".to_string(),
                "    text".to_string(),
                "".to_string(),
            ],
            start: Some(0),
            end: Some(3),
        };
        annotation.prepare();

        assert_eq!(annotation.line, "short");
        assert_eq!(annotation.contents, vec!["longer", "  text"]);
    }

    #[test]
    fn test_synthesize_keeps_head_line_for_prepare() {
        let mut annotation = Annotation::synthesize("note", vec![], "  {5} first\n  second");
        assert_eq!(annotation.line, "{5} first");
        annotation.prepare();
        assert_eq!(annotation.contents, vec!["second"]);
    }
}
