//! @name Annotation splitter
//! @description Cuts a normalized comment block into annotations

use std::collections::{BTreeMap, BTreeSet};

use super::Annotation;

/// Splits comment lines on `prefix + known name`.
///
/// A prefix that isn't followed by a known name is plain text, so `@` can
/// appear in prose. Escaped prefixes (`\@`) and lines quoting another
/// comment (`/// @name` inside an example) never start an annotation.
#[derive(Debug, Clone)]
pub struct Splitter<'a> {
    prefix: &'a str,
    names: &'a BTreeSet<String>,
    aliases: Option<&'a BTreeMap<String, Vec<String>>>,
    quoted: Vec<String>,
}

impl<'a> Splitter<'a> {
    pub fn new(prefix: &'a str, names: &'a BTreeSet<String>) -> Self {
        Self {
            prefix,
            names,
            aliases: None,
            quoted: Vec::new(),
        }
    }

    /// Alias lists copied onto each annotation's `alias` field
    pub fn with_aliases(mut self, aliases: &'a BTreeMap<String, Vec<String>>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Comment markers whose `marker + " " + prefix` quotes a nested comment
    pub fn with_quoted_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.quoted = markers
            .into_iter()
            .filter(|m| !m.as_ref().is_empty())
            .map(|m| format!("{} {}", m.as_ref(), self.prefix))
            .collect();
        self
    }

    /// Returns the annotations in source order.
    pub fn split<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        let mut current: Option<Annotation> = None;

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();

            if let Some((name, rest)) = self.head(line) {
                if let Some(mut done) = current.take() {
                    done.end = Some(i.saturating_sub(1));
                    annotations.push(done);
                }
                current = Some(Annotation {
                    name: name.to_string(),
                    alias: self.alias_list(name),
                    line: rest.to_string(),
                    contents: Vec::new(),
                    start: Some(i),
                    end: None,
                });
            }

            if let Some(open) = current.as_mut() {
                open.contents.push(line.to_string());
            }
        }

        if let Some(mut done) = current.take() {
            done.end = Some(lines.len().saturating_sub(1));
            annotations.push(done);
        }

        annotations
    }

    /// Name and remainder of a head line, if `line` starts an annotation.
    fn head<'l>(&self, line: &'l str) -> Option<(&'l str, &'l str)> {
        if self.prefix.is_empty() || self.quoted.iter().any(|q| line.contains(q.as_str())) {
            return None;
        }

        let at = line.find(self.prefix)?;
        if line[..at].ends_with('\\') {
            return None;
        }

        let after = &line[at + self.prefix.len()..];
        let name_len = after.find(char::is_whitespace).unwrap_or(after.len());
        let name = &after[..name_len];

        if self.names.contains(name) {
            Some((name, &after[name_len..]))
        } else {
            None
        }
    }

    fn alias_list(&self, name: &str) -> Vec<String> {
        self.aliases
            .and_then(|aliases| aliases.get(name))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_two_annotations() {
        let known = names(&["name", "description"]);
        let lines = vec!["@name Foo", "@description", "line one", "line two"];
        let annotations = Splitter::new("@", &known).split(&lines);

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].name, "name");
        assert_eq!(annotations[0].line, " Foo");
        assert_eq!(annotations[0].contents, vec!["@name Foo"]);
        assert_eq!(annotations[0].start, Some(0));
        assert_eq!(annotations[0].end, Some(0));

        assert_eq!(annotations[1].name, "description");
        assert_eq!(annotations[1].line, "");
        assert_eq!(annotations[1].contents, vec!["@description", "line one", "line two"]);
        assert_eq!(annotations[1].start, Some(1));
        assert_eq!(annotations[1].end, Some(3));
    }

    #[test]
    fn test_unknown_name_is_literal_text() {
        let known = names(&["description"]);
        let lines = vec!["@description mail me", "at me@example.com", "@unknown thing"];
        let annotations = Splitter::new("@", &known).split(&lines);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].contents.len(), 3);
    }

    #[test]
    fn test_escaped_and_quoted_prefixes_are_literal() {
        let known = names(&["markup", "name"]);
        let lines = vec!["@markup Usage", "/// @name Example", "\\@name escaped"];
        let annotations = Splitter::new("@", &known)
            .with_quoted_markers(["///"])
            .split(&lines);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].name, "markup");
        assert_eq!(annotations[0].contents.len(), 3);
    }

    #[test]
    fn test_lines_before_first_annotation_are_ignored() {
        let known = names(&["name"]);
        let lines = vec!["free text", "@name Foo"];
        let annotations = Splitter::new("@", &known).split(&lines);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].contents, vec!["@name Foo"]);
    }

    #[test]
    fn test_alias_lists_are_attached() {
        let known = names(&["returns"]);
        let mut aliases = BTreeMap::new();
        aliases.insert("returns".to_string(), vec!["return".to_string()]);
        let annotations = Splitter::new("@", &known)
            .with_aliases(&aliases)
            .split(&["@returns {string}"]);

        assert_eq!(annotations[0].alias, vec!["return"]);
    }
}
