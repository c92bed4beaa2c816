//! @name Tokenizer
//! @description Splits a file into comment/code token pairs
//!
//! A line-oriented state machine over a [`CommentGrammar`]. Every comment
//! block becomes one [`Token`] whose code span holds the lines documented by
//! that comment. Code capture stops at the next comment, at a line indented
//! less than the comment, or after `blank_lines` consecutive blank lines.
//!
//! Scanning never fails; a grammar that can't be scanned is rejected by
//! [`Tokenizer::new`].

pub mod grammar;
pub mod line;

use serde::{Serialize, Serializer};
use tracing::trace;

pub use grammar::{CommentGrammar, CommentStyle};
pub use line::{find_marker, Line, Markers};

use crate::error::Result;
use crate::text::{is_blank, normalize};

/// Default number of consecutive blank lines that ends a code span
pub const DEFAULT_BLANK_LINES: usize = 4;

// ============================================================================
// Spans and tokens
// ============================================================================

/// A run of lines with absolute 0-based start/end line numbers.
/// Unset bounds serialize as `-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub contents: Vec<String>,
    #[serde(serialize_with = "serialize_lineno")]
    pub start: Option<usize>,
    #[serde(serialize_with = "serialize_lineno")]
    pub end: Option<usize>,
    /// Leading blank lines dropped by normalization, e.g. a bare `/**` opener
    #[serde(skip)]
    pub offset: usize,
}

fn serialize_lineno<S: Serializer>(value: &Option<usize>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(n) => serializer.serialize_i64(*n as i64),
        None => serializer.serialize_i64(-1),
    }
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// 0-based source line of `contents[index]`
    pub fn lineno(&self, index: usize) -> Option<usize> {
        Some(self.start? + self.offset + index)
    }

    fn normalize(&mut self) {
        self.offset = self.contents.iter().take_while(|l| is_blank(l)).count();
        self.contents = normalize(&self.contents);
    }
}

/// Which grammar produced a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Header,
    Body,
}

/// One documented unit: a comment block and the code it documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: CommentKind,
    pub comment: Span,
    pub code: Span,
}

impl Token {
    fn open(kind: CommentKind, lineno: usize) -> Self {
        Self {
            kind,
            comment: Span {
                start: Some(lineno),
                ..Span::default()
            },
            code: Span::default(),
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Header mode keeps only the first comment block and never collects code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeMode {
    Header,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No open token
    Outside,
    /// Inside a comment block
    InComment,
    /// Comment closed, no code seen yet
    AfterComment,
    /// Collecting code lines
    InCode,
}

/// @description "Comment/code tokenizer for one comment grammar"
#[derive(Debug, Clone)]
pub struct Tokenizer {
    grammar: CommentGrammar,
    blank_lines: usize,
    mode: TokenizeMode,
}

impl Tokenizer {
    /// Validates the grammar up front; scanning itself can't fail.
    pub fn new(grammar: CommentGrammar, blank_lines: usize, mode: TokenizeMode) -> Result<Self> {
        let grammar = grammar.cleaned();
        grammar.validate()?;
        Ok(Self {
            grammar,
            blank_lines: blank_lines.max(1),
            mode,
        })
    }

    pub fn grammar(&self) -> &CommentGrammar {
        &self.grammar
    }

    /// Tokenizes `lines`, starting at line index `start_at`.
    pub fn tokenize<S: AsRef<str>>(&self, lines: &[S], start_at: usize) -> Vec<Token> {
        let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        let mut scan = Scan::new(self);

        let mut i = start_at;
        while i < lines.len() {
            if scan.step(&lines, i) == Flow::Stop {
                break;
            }
            i += 1;
        }

        scan.finish(lines.len());
        trace!(tokens = scan.tokens.len(), mode = ?self.mode, "tokenized");
        scan.tokens
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Mutable state of one tokenizer run
struct Scan<'t> {
    tokenizer: &'t Tokenizer,
    tokens: Vec<Token>,
    token: Option<Token>,
    state: State,
    blank_count: usize,
    comment_indent: usize,
    last_code_line: Option<usize>,
    stopped: bool,
}

impl<'t> Scan<'t> {
    fn new(tokenizer: &'t Tokenizer) -> Self {
        Self {
            tokenizer,
            tokens: Vec::new(),
            token: None,
            state: State::Outside,
            blank_count: 0,
            comment_indent: 0,
            last_code_line: None,
            stopped: false,
        }
    }

    fn grammar(&self) -> &CommentGrammar {
        &self.tokenizer.grammar
    }

    fn kind(&self) -> CommentKind {
        match self.tokenizer.mode {
            TokenizeMode::Header => CommentKind::Header,
            TokenizeMode::Body => CommentKind::Body,
        }
    }

    fn step(&mut self, lines: &[&str], i: usize) -> Flow {
        let mut line = Line::classify(i, lines[i], self.grammar());

        // the second marker of a symmetric pair closes the block
        if self.state == State::InComment && self.grammar().is_symmetric() {
            line.markers.start = None;
        }

        if line.is_blank() {
            return self.blank(i);
        }
        self.blank_count = 0;

        match (self.state, self.grammar().style()) {
            (State::InComment, CommentStyle::Multi) => {
                self.continue_multi(&line);
                Flow::Continue
            }
            (State::InComment, CommentStyle::Single) => {
                self.push_comment(strip_single(&line, self.grammar()));
                self.lookahead_single(lines, i);
                Flow::Continue
            }
            _ => {
                if self.opens_comment(&line) {
                    let seen = self.token.is_some() || !self.tokens.is_empty();
                    if seen && self.tokenizer.mode == TokenizeMode::Header {
                        return self.stop();
                    }
                    self.close_token();
                    self.open_comment(&line, lines);
                    Flow::Continue
                } else if self.token.is_some() {
                    self.code(&line)
                } else {
                    Flow::Continue
                }
            }
        }
    }

    fn opens_comment(&self, line: &Line<'_>) -> bool {
        match self.grammar().style() {
            CommentStyle::Multi => line.markers.start.is_some(),
            CommentStyle::Single => line.markers.single.is_some(),
        }
    }

    fn open_comment(&mut self, line: &Line<'_>, lines: &[&str]) {
        self.token = Some(Token::open(self.kind(), line.lineno));
        self.comment_indent = line.indent;
        self.last_code_line = None;

        match self.grammar().style() {
            CommentStyle::Multi => {
                let start = line.markers.start.unwrap_or(0);
                let start_len = self.grammar().start.as_deref().map(str::len).unwrap_or(0);
                let rest = &line.raw[start + start_len..];
                let end = self.grammar().end.as_deref().and_then(|m| find_marker(rest, m));

                match end {
                    // opened and closed on the same line
                    Some(end) => {
                        self.push_comment(strip_inner(&rest[..end], self.grammar()));
                        self.close_comment(line.lineno);
                    }
                    None => {
                        self.push_comment(strip_inner(rest, self.grammar()));
                        self.state = State::InComment;
                    }
                }
            }
            CommentStyle::Single => {
                self.push_comment(strip_single(line, self.grammar()));
                self.state = State::InComment;
                self.lookahead_single(lines, line.lineno);
            }
        }
    }

    fn continue_multi(&mut self, line: &Line<'_>) {
        match line.markers.end {
            Some(end) => {
                let before = &line.raw[..end];
                if !before.trim().is_empty() {
                    self.push_comment(strip_inner(before, self.grammar()));
                }
                self.close_comment(line.lineno);
            }
            None => self.push_comment(strip_inner(line.raw, self.grammar())),
        }
    }

    /// Single-line blocks end when the next line isn't a comment line.
    fn lookahead_single(&mut self, lines: &[&str], i: usize) {
        let next_is_comment = lines
            .get(i + 1)
            .map(|next| Line::classify(i + 1, next, self.grammar()).markers.single.is_some())
            .unwrap_or(false);

        if !next_is_comment {
            self.close_comment(i);
        }
    }

    fn close_comment(&mut self, lineno: usize) {
        if let Some(token) = self.token.as_mut() {
            token.comment.end = Some(lineno);
        }
        self.state = State::AfterComment;
    }

    fn push_comment(&mut self, text: String) {
        if let Some(token) = self.token.as_mut() {
            token.comment.contents.push(text);
        }
    }

    fn code(&mut self, line: &Line<'_>) -> Flow {
        if self.tokenizer.mode == TokenizeMode::Header {
            return self.stop();
        }

        if line.indent < self.comment_indent {
            trace!(line = line.lineno, "code dedented below its comment");
            self.close_token();
            return Flow::Continue;
        }

        if let Some(token) = self.token.as_mut() {
            if token.code.start.is_none() {
                token.code.start = Some(line.lineno);
            }
            token.code.contents.push(line.raw.to_string());
        }
        self.last_code_line = Some(line.lineno);
        self.state = State::InCode;
        Flow::Continue
    }

    fn blank(&mut self, i: usize) -> Flow {
        match self.state {
            State::Outside => Flow::Continue,
            State::InComment => {
                if self.grammar().is_multi() {
                    self.push_comment(String::new());
                }
                Flow::Continue
            }
            State::AfterComment | State::InCode => {
                self.blank_count += 1;
                if self.state == State::InCode {
                    if let Some(token) = self.token.as_mut() {
                        token.code.contents.push(String::new());
                    }
                }
                if self.blank_count >= self.tokenizer.blank_lines {
                    trace!(line = i, "blank line limit reached");
                    self.close_token();
                }
                Flow::Continue
            }
        }
    }

    fn stop(&mut self) -> Flow {
        self.close_token();
        self.stopped = true;
        Flow::Stop
    }

    /// Fixes the open token's bounds, normalizes it, and pushes it.
    fn close_token(&mut self) {
        if let Some(mut token) = self.token.take() {
            if token.code.start.is_some() {
                token.code.end = self.last_code_line;
            }
            token.comment.normalize();
            token.code.normalize();
            self.tokens.push(token);
        }
        self.state = State::Outside;
        self.last_code_line = None;
    }

    fn finish(&mut self, line_count: usize) {
        if self.stopped {
            return;
        }
        if self.state == State::InComment {
            // unterminated block runs to the end of the file
            if let Some(token) = self.token.as_mut() {
                token.comment.end = Some(line_count.saturating_sub(1));
            }
        }
        self.close_token();
    }
}

/// Text after the single-line marker, or the whole line without one.
fn strip_single(line: &Line<'_>, grammar: &CommentGrammar) -> String {
    match (line.markers.single, grammar.single.as_deref()) {
        (Some(offset), Some(marker)) => line.raw[offset + marker.len()..].to_string(),
        _ => line.raw.to_string(),
    }
}

/// Strips a leading single-line marker from a fragment of a delimited block.
fn strip_inner(fragment: &str, grammar: &CommentGrammar) -> String {
    if let Some(marker) = grammar.single.as_deref() {
        if let Some(offset) = find_marker(fragment, marker) {
            if fragment[..offset].trim().is_empty() {
                return fragment[offset + marker.len()..].to_string();
            }
        }
    }
    fragment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(grammar: CommentGrammar) -> Tokenizer {
        Tokenizer::new(grammar, DEFAULT_BLANK_LINES, TokenizeMode::Body).unwrap()
    }

    #[test]
    fn test_single_line_block_with_code() {
        let lines = vec![
            "/// @name foo",
            "/// @description bar",
            "function foo() {",
            "  return 1",
            "}",
        ];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        let token = &tokens[0];
        assert_eq!(token.comment.contents, vec!["@name foo", "@description bar"]);
        assert_eq!(token.comment.start, Some(0));
        assert_eq!(token.comment.end, Some(1));
        assert_eq!(token.code.contents, vec!["function foo() {", "  return 1", "}"]);
        assert_eq!(token.code.start, Some(2));
        assert_eq!(token.code.end, Some(4));
    }

    #[test]
    fn test_consecutive_blocks_split_code() {
        let lines = vec!["/// @name a", "let a = 1", "/// @name b", "let b = 2"];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].code.contents, vec!["let a = 1"]);
        assert_eq!(tokens[0].code.end, Some(1));
        assert_eq!(tokens[1].comment.start, Some(2));
        assert_eq!(tokens[1].code.contents, vec!["let b = 2"]);
    }

    #[test]
    fn test_multi_line_block() {
        let grammar = CommentGrammar::multi("/**", "**/").with_single("*");
        let lines = vec![
            "/**",
            " * @name foo",
            " * @arg {string} a",
            " **/",
            ".foo { color: red; }",
        ];
        let tokens = body(grammar).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["@name foo", "@arg {string} a"]);
        assert_eq!(tokens[0].comment.start, Some(0));
        assert_eq!(tokens[0].comment.end, Some(3));
        assert_eq!(tokens[0].code.contents, vec![".foo { color: red; }"]);
        assert_eq!(tokens[0].code.start, Some(4));
    }

    #[test]
    fn test_same_line_delimited_block() {
        let lines = vec!["/* @name inline */", "code()"];
        let tokens = body(CommentGrammar::multi("/*", "*/")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["@name inline"]);
        assert_eq!(tokens[0].comment.end, Some(0));
        assert_eq!(tokens[0].code.contents, vec!["code()"]);
    }

    #[test]
    fn test_symmetric_delimiters_toggle() {
        let lines = vec!["###", "a", "###"];
        let tokens = body(CommentGrammar::multi("###", "###")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["a"]);
        assert_eq!(tokens[0].comment.end, Some(2));
        assert!(tokens[0].code.is_empty());
    }

    #[test]
    fn test_unterminated_block_is_flushed_at_eof() {
        let lines = vec!["/*", " @name dangling"];
        let tokens = body(CommentGrammar::multi("/*", "*/")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["@name dangling"]);
        assert_eq!(tokens[0].comment.end, Some(1));
    }

    #[test]
    fn test_blank_line_threshold_ends_code() {
        let tokenizer = Tokenizer::new(CommentGrammar::single("///"), 2, TokenizeMode::Body).unwrap();
        let lines = vec![
            "/// @name first",
            "first()",
            "",
            "",
            "unrelated()",
            "/// @name second",
            "second()",
        ];
        let tokens = tokenizer.tokenize(&lines, 0);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].code.contents, vec!["first()"]);
        assert_eq!(tokens[0].code.end, Some(1));
        assert_eq!(tokens[1].code.contents, vec!["second()"]);
    }

    #[test]
    fn test_blank_lines_below_threshold_stay_in_code() {
        let lines = vec!["/// @name f", "a()", "", "b()"];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);

        assert_eq!(tokens[0].code.contents, vec!["a()", "", "b()"]);
        assert_eq!(tokens[0].code.end, Some(3));
    }

    #[test]
    fn test_dedent_ends_code() {
        let lines = vec![
            "class A {",
            "  /// @name method",
            "  method() {",
            "    return 1",
            "  }",
            "}",
            "outside()",
        ];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].code.contents, vec!["method() {", "  return 1", "}"]);
        assert_eq!(tokens[0].code.end, Some(4));
    }

    #[test]
    fn test_dedented_first_line_is_not_code() {
        let lines = vec!["class A {", "  /// @name x", "}", "foo()"];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].code.is_empty());
        assert_eq!(tokens[0].code.start, None);
    }

    #[test]
    fn test_inner_marker_only_stripped_at_line_start() {
        let grammar = CommentGrammar::multi("/**", "**/").with_single("*");
        let lines = vec!["/**", " * @name math", "   multiply a * b here", " **/"];
        let tokens = body(grammar).tokenize(&lines, 0);

        assert_eq!(tokens[0].comment.contents, vec!["@name math", "  multiply a * b here"]);
    }

    #[test]
    fn test_dropped_opener_keeps_line_numbers() {
        let grammar = CommentGrammar::multi("/**", "**/").with_single("*");
        let lines = vec!["", "/**", " * @name foo", " **/"];
        let tokens = body(grammar).tokenize(&lines, 0);

        assert_eq!(tokens[0].comment.start, Some(1));
        assert_eq!(tokens[0].comment.offset, 1);
        assert_eq!(tokens[0].comment.lineno(0), Some(2));
    }

    #[test]
    fn test_header_mode_ignores_later_header_blocks() {
        let grammar = CommentGrammar::multi("////", "////").with_single("///");
        let tokenizer = Tokenizer::new(grammar, 2, TokenizeMode::Header).unwrap();
        let lines = vec!["////", "/// @name a", "////", "", "", "////", "/// @name b", "////"];
        let tokens = tokenizer.tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["@name a"]);
    }

    #[test]
    fn test_header_mode_takes_first_block_only() {
        let grammar = CommentGrammar::multi("////", "////").with_single("///");
        let tokenizer = Tokenizer::new(grammar, DEFAULT_BLANK_LINES, TokenizeMode::Header).unwrap();
        let lines = vec![
            "////",
            "/// @name file",
            "////",
            "",
            "/// @name body",
            "code()",
        ];
        let tokens = tokenizer.tokenize(&lines, 0);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, CommentKind::Header);
        assert_eq!(tokens[0].comment.contents, vec!["@name file"]);
        assert_eq!(tokens[0].comment.end, Some(2));
        assert!(tokens[0].code.is_empty());
    }

    #[test]
    fn test_start_at_skips_lines() {
        let lines = vec!["/// @name skipped", "x", "/// @name kept", "y"];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 2);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].comment.contents, vec!["@name kept"]);
    }

    #[test]
    fn test_round_trip_reproduces_line_range() {
        let lines = vec!["/// @name foo", "///   indented", "bar()", "  baz()"];
        let tokens = body(CommentGrammar::single("///")).tokenize(&lines, 0);
        let token = &tokens[0];

        let rebuilt: Vec<String> = token
            .comment
            .contents
            .iter()
            .map(|l| format!("/// {}", l))
            .chain(token.code.contents.iter().cloned())
            .collect();

        let start = token.comment.start.unwrap();
        let end = token.code.end.unwrap();
        assert_eq!(rebuilt, lines[start..=end].to_vec());
    }

    #[test]
    fn test_invalid_grammar_rejected_before_scan() {
        let grammar = CommentGrammar {
            single: None,
            start: Some("/*".to_string()),
            end: None,
            prefix: "@".to_string(),
            inline_prefix: None,
        };
        assert!(Tokenizer::new(grammar, 4, TokenizeMode::Body).is_err());
    }
}
