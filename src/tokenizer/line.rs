//! @name Line classifier
//! @description Reports which comment markers appear on a physical line

use serde::Serialize;

use super::grammar::CommentGrammar;
use crate::text::{indent_of, is_blank};

/// Offsets of each marker on a line. `None` means absent, so a marker at
/// column 0 is still a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Markers {
    pub single: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl Markers {
    pub fn any(&self) -> bool {
        self.single.is_some() || self.start.is_some() || self.end.is_some()
    }
}

/// One classified source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line<'a> {
    pub lineno: usize,
    pub raw: &'a str,
    pub indent: usize,
    pub markers: Markers,
}

impl<'a> Line<'a> {
    pub fn classify(lineno: usize, raw: &'a str, grammar: &CommentGrammar) -> Self {
        let markers = Markers {
            single: grammar.single.as_deref().and_then(|m| find_marker(raw, m)),
            start: grammar.start.as_deref().and_then(|m| find_marker(raw, m)),
            end: grammar.end.as_deref().and_then(|m| find_marker(raw, m)),
        };

        Self {
            lineno,
            raw,
            indent: indent_of(raw),
            markers,
        }
    }

    pub fn is_blank(&self) -> bool {
        is_blank(self.raw)
    }

    pub fn has_comment(&self) -> bool {
        self.markers.any()
    }

    /// Something other than whitespace sits before the first marker (or the
    /// line has no marker at all).
    pub fn has_code(&self) -> bool {
        if self.is_blank() {
            return false;
        }
        let first = [self.markers.single, self.markers.start, self.markers.end]
            .into_iter()
            .flatten()
            .min();
        match first {
            Some(offset) => !self.raw[..offset].trim().is_empty(),
            None => true,
        }
    }
}

/// Byte offset of the first bounded occurrence of `marker` in `line`.
///
/// An occurrence counts when it is followed by whitespace or the end of the
/// line, and isn't the tail of a longer run of the marker's last character
/// (`*` inside `/**`, `///` inside `////`).
pub fn find_marker(line: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    let last = marker.chars().last()?;

    line.match_indices(marker).map(|(i, _)| i).find(|&i| {
        let after = line[i + marker.len()..].chars().next();
        let before = line[..i].chars().last();
        let trailing_ok = after.map(char::is_whitespace).unwrap_or(true);
        trailing_ok && before != Some(last)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_zero_is_a_hit() {
        assert_eq!(find_marker("/// @name foo", "///"), Some(0));
        assert_eq!(find_marker("///", "///"), Some(0));
    }

    #[test]
    fn test_marker_inside_longer_run_is_ignored() {
        assert_eq!(find_marker("////", "///"), None);
        assert_eq!(find_marker("/**", "*"), None);
        assert_eq!(find_marker("###", "##"), None);
    }

    #[test]
    fn test_marker_must_be_followed_by_space_or_eol() {
        assert_eq!(find_marker("a//b", "//"), None);
        assert_eq!(find_marker("  * foo", "*"), Some(2));
        assert_eq!(find_marker("  */", "*/"), Some(2));
    }

    #[test]
    fn test_classify_css_lines() {
        let grammar = CommentGrammar::multi("/**", "**/").with_single("*");

        let open = Line::classify(0, "/**", &grammar);
        assert_eq!(open.markers.start, Some(0));
        assert_eq!(open.markers.single, None);

        let body = Line::classify(1, " * @name foo", &grammar);
        assert_eq!(body.markers.single, Some(1));
        assert_eq!(body.markers.start, None);

        let close = Line::classify(2, " **/", &grammar);
        assert_eq!(close.markers.end, Some(1));
    }

    #[test]
    fn test_has_code() {
        let grammar = CommentGrammar::single("//");
        assert!(Line::classify(0, "let x = 1; // note", &grammar).has_code());
        assert!(!Line::classify(0, "   // note", &grammar).has_code());
        assert!(!Line::classify(0, "   ", &grammar).has_code());
        assert!(Line::classify(0, "fn main() {}", &grammar).has_code());
    }
}
