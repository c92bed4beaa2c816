//! @name Alias rewriter
//! @description Rewrites annotation aliases to canonical names before tokenizing
//!
//! `/// @param` becomes `/// @arg` when `param` is an alias of `arg`. Only
//! aliases that follow a comment prefix are touched: at the start of a line
//! (optionally after a comment marker) or after the inline prefix
//! (`# @param`).

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use regex::{Captures, Regex};

use crate::config::LanguageComments;
use crate::error::Result;

/// @description "Alias to canonical name rewriter for one language"
#[derive(Debug, Clone)]
pub struct AliasRewriter {
    pattern: Option<Regex>,
    canonical: BTreeMap<String, String>,
}

impl AliasRewriter {
    /// `aliases` maps alias → canonical name
    pub fn new(comments: &LanguageComments, aliases: BTreeMap<String, String>) -> Result<Self> {
        if aliases.is_empty() {
            return Ok(Self {
                pattern: None,
                canonical: aliases,
            });
        }

        let grammars = [&comments.header, &comments.body];
        let markers = alternation(grammars.iter().flat_map(|g| [g.start.as_deref(), g.single.as_deref()]).flatten());
        let prefixes = alternation(grammars.iter().map(|g| g.prefix.as_str()));
        let inline = alternation(grammars.iter().filter_map(|g| g.inline_prefix.as_deref()));
        let names = alternation(aliases.keys().map(String::as_str));

        let line_start = if markers.is_empty() {
            r"^\s*".to_string()
        } else {
            format!(r"^(?:\s*(?:{}))?\s*", markers)
        };
        let lead = if inline.is_empty() {
            line_start
        } else if markers.is_empty() {
            format!(r"(?:{})|(?:(?:{})\s+)", line_start, inline)
        } else {
            format!(r"(?:{})|(?:(?:{})?(?:{})\s+)", line_start, markers, inline)
        };

        let pattern = format!(r"(?m)((?:{})(?:{}))({})\b", lead, prefixes, names);
        Ok(Self {
            pattern: Some(Regex::new(&pattern)?),
            canonical: aliases,
        })
    }

    /// Rewrites every alias occurrence; untouched text is borrowed.
    pub fn rewrite<'t>(&self, contents: &'t str) -> Cow<'t, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(contents);
        };

        pattern.replace_all(contents, |caps: &Captures<'_>| {
            let alias = &caps[2];
            let name = self.canonical.get(alias).map(String::as_str).unwrap_or(alias);
            format!("{}{}", &caps[1], name)
        })
    }
}

/// Escaped, deduplicated, longest-first regex alternation
fn alternation<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let unique: BTreeSet<&str> = items.filter(|s| !s.is_empty()).collect();
    let mut items: Vec<&str> = unique.into_iter().collect();
    items.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    items
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommentTable;

    fn aliases(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(a, n)| (a.to_string(), n.to_string())).collect()
    }

    #[test]
    fn test_rewrites_after_markers() {
        let table = CommentTable::default();
        let rewriter = AliasRewriter::new(
            table.for_filetype("js"),
            aliases(&[("param", "arg"), ("parameter", "arg"), ("title", "name")]),
        )
        .unwrap();

        let out = rewriter.rewrite("/// @title Foo\n  /// @parameter {string} a\n/// @param b");
        assert_eq!(out, "/// @name Foo\n  /// @arg {string} a\n/// @arg b");
    }

    #[test]
    fn test_leaves_prose_and_longer_words_alone() {
        let table = CommentTable::default();
        let rewriter = AliasRewriter::new(table.for_filetype("js"), aliases(&[("param", "arg")])).unwrap();

        let text = "/// mail me @param\n/// @params foo\nlet x = \"@param\";";
        assert!(matches!(rewriter.rewrite(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_inline_prefix() {
        let table = CommentTable::default();
        let rewriter = AliasRewriter::new(table.for_filetype("js"), aliases(&[("desc", "description")])).unwrap();

        assert_eq!(rewriter.rewrite("foo(); # @desc inline"), "foo(); # @description inline");
    }

    #[test]
    fn test_css_continuation_lines() {
        let table = CommentTable::default();
        let rewriter = AliasRewriter::new(table.for_filetype("css"), aliases(&[("return", "returns")])).unwrap();

        assert_eq!(rewriter.rewrite("/**\n * @return {string}\n **/"), "/**\n * @returns {string}\n **/");
    }

    #[test]
    fn test_no_aliases_is_a_no_op() {
        let table = CommentTable::default();
        let rewriter = AliasRewriter::new(table.for_filetype("js"), BTreeMap::new()).unwrap();
        assert!(matches!(rewriter.rewrite("/// @param"), Cow::Borrowed(_)));
    }
}
