//! @name Comment grammar
//! @description Per-language comment markers and the annotation prefix

use serde::{Deserialize, Serialize};

use crate::error::{DocsError, Result};

/// How comment blocks are delimited in one file type.
///
/// Either `single` is set (`///`, `##`) or both `start` and `end` are
/// (`/**` ... `**/`). When both styles are present, `single` marks the
/// continuation lines inside a delimited block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentGrammar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Annotation identifier, `@` unless configured otherwise
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Marks annotations inside code below a comment block (`# @name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_prefix: Option<String>,
}

pub fn default_prefix() -> String {
    "@".to_string()
}

/// Comment style of a grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Single,
    Multi,
}

impl CommentGrammar {
    /// Single-line grammar (`///`)
    pub fn single(marker: &str) -> Self {
        Self {
            single: Some(marker.to_string()),
            start: None,
            end: None,
            prefix: default_prefix(),
            inline_prefix: None,
        }
    }

    /// Delimited grammar (`/*` ... `*/`)
    pub fn multi(start: &str, end: &str) -> Self {
        Self {
            single: None,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            prefix: default_prefix(),
            inline_prefix: None,
        }
    }

    pub fn with_single(mut self, marker: &str) -> Self {
        self.single = non_empty(Some(marker.to_string()));
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_inline_prefix(mut self, inline_prefix: &str) -> Self {
        self.inline_prefix = non_empty(Some(inline_prefix.to_string()));
        self
    }

    /// Multi-line style wins whenever both delimiters exist
    pub fn style(&self) -> CommentStyle {
        if self.start.is_some() && self.end.is_some() {
            CommentStyle::Multi
        } else {
            CommentStyle::Single
        }
    }

    pub fn is_multi(&self) -> bool {
        self.style() == CommentStyle::Multi
    }

    /// `start == end`, e.g. `###` ... `###`
    pub fn is_symmetric(&self) -> bool {
        self.is_multi() && self.start == self.end
    }

    /// True when the text contains at least one marker this grammar scans for.
    pub fn appears_in(&self, contents: &str) -> bool {
        match self.style() {
            CommentStyle::Multi => {
                let start = self.start.as_deref().unwrap_or_default();
                let end = self.end.as_deref().unwrap_or_default();
                contents.contains(start) && contents.contains(end)
            }
            CommentStyle::Single => self
                .single
                .as_deref()
                .map(|s| contents.contains(s))
                .unwrap_or(false),
        }
    }

    /// Drops empty markers; `""` would otherwise match at offset 0 of every line.
    pub fn cleaned(mut self) -> Self {
        self.single = non_empty(self.single);
        self.start = non_empty(self.start);
        self.end = non_empty(self.end);
        self.inline_prefix = non_empty(self.inline_prefix);
        self
    }

    /// Checks the grammar can be scanned.
    pub fn validate(&self) -> Result<()> {
        let single = self.single.as_deref().filter(|s| !s.is_empty());
        let start = self.start.as_deref().filter(|s| !s.is_empty());
        let end = self.end.as_deref().filter(|s| !s.is_empty());

        if self.prefix.is_empty() {
            return Err(DocsError::InvalidCommentGrammar(
                "the annotation prefix can't be empty".to_string(),
            ));
        }

        match (start, end) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(DocsError::InvalidCommentGrammar(format!(
                    "'start' and 'end' must be set together (start: {:?}, end: {:?})",
                    start, end
                )));
            }
            (None, None) if single.is_none() => {
                return Err(DocsError::InvalidCommentGrammar(
                    "needs a 'single' marker or both 'start' and 'end'".to_string(),
                ));
            }
            (Some(start), Some(end)) => {
                if let Some(single) = single {
                    if start.len() <= single.len() || end.len() <= single.len() {
                        return Err(DocsError::InvalidCommentGrammar(format!(
                            "'{}'/'{}' must be longer than the single marker '{}'",
                            start, end, single
                        )));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
