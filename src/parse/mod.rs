//! @name Parser
//! @description Turns one source file into header and body blocks
//!
//! Pipeline per file: normalize line endings, rewrite aliases, tokenize the
//! header (first header-style comment) and the body (everything after the
//! header), then dispatch every token through the annotation registry.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alias::AliasRewriter;
use crate::annotations::default_registry;
use crate::config::{CommentTable, Config, LanguageComments};
use crate::dispatch::{Block, DispatchEngine};
use crate::error::Result;
use crate::registry::AnnotationRegistry;
use crate::report::{Diagnostic, Event, Reporter};
use crate::text::normal_string;
use crate::tokenizer::{TokenizeMode, Tokenizer};

// ============================================================================
// Files and results
// ============================================================================

/// One file handed to the dispatch engine
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    /// File name without the extension
    pub name: String,
    /// Extension without the dot
    pub filetype: String,
    /// Contents after line ending normalization and alias rewriting
    pub contents: String,
    pub comments: LanguageComments,
    /// First line index, always 0
    pub start: usize,
    /// Last line index
    pub end: usize,
}

impl SourceFile {
    pub fn new(path: &str, contents: String, comments: LanguageComments) -> Self {
        let file = Path::new(path);
        let filetype = file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let end = contents.split('\n').count().saturating_sub(1);

        Self {
            path: path.to_string(),
            name,
            filetype,
            contents,
            comments,
            start: 0,
            end,
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        self.contents.split('\n').collect()
    }
}

/// Extension of `path` without the dot
pub fn filetype_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// @description "Parsed documentation of one file"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDocs {
    pub header: Block,
    pub body: Vec<Block>,
}

impl FileDocs {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty()
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Drops warnings when `Config::warnings` is off
struct Quiet<'a>(&'a dyn Reporter);

impl Reporter for Quiet<'_> {
    fn emit(&self, event: Event, diagnostic: &Diagnostic) {
        if event != Event::Warning {
            self.0.emit(event, diagnostic);
        }
    }
}

/// @description "File parser bound to a registry and configuration"
#[derive(Debug, Clone)]
pub struct Parser {
    registry: Arc<AnnotationRegistry>,
    config: Config,
    comments: CommentTable,
}

impl Parser {
    /// Fails when the configured comment styles don't resolve.
    pub fn new(registry: Arc<AnnotationRegistry>, config: Config) -> Result<Self> {
        let comments = config.comment_table()?;
        Ok(Self {
            registry,
            config,
            comments,
        })
    }

    /// Built-in annotations and default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(Arc::new(default_registry()?), Config::default())
    }

    pub fn registry(&self) -> &AnnotationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn comments(&self) -> &CommentTable {
        &self.comments
    }

    /// Reads and parses a file
    pub fn parse_file<P: AsRef<Path>>(&self, path: P, reporter: &dyn Reporter) -> Result<FileDocs> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        self.parse_source(&path.to_string_lossy(), &contents, reporter)
    }

    /// Parses already loaded contents; `path` picks the comment style.
    pub fn parse_source(&self, path: &str, contents: &str, reporter: &dyn Reporter) -> Result<FileDocs> {
        let quiet = Quiet(reporter);
        let reporter: &dyn Reporter = if self.config.warnings { reporter } else { &quiet };

        let filetype = filetype_of(path);
        let comments = self.comments.for_filetype(&filetype).clone();

        let contents = normal_string(contents);
        let rewriter = AliasRewriter::new(&comments, self.registry.alias_map(&filetype))?;
        let contents = rewriter.rewrite(&contents).into_owned();

        if !comments.appears_in(&contents) {
            reporter.warning(Diagnostic::new("doesn't contain any documentation").in_file(path));
            return Ok(FileDocs::default());
        }

        let file = SourceFile::new(path, contents, comments);
        let lines = file.lines();
        let blank_lines = self.config.blank_lines;

        let header_tokens =
            Tokenizer::new(file.comments.header.clone(), blank_lines, TokenizeMode::Header)?.tokenize(&lines, 0);
        let body_start = header_tokens
            .first()
            .and_then(|t| t.comment.end)
            .map(|end| end + 1)
            .unwrap_or(0);
        let body_tokens =
            Tokenizer::new(file.comments.body.clone(), blank_lines, TokenizeMode::Body)?.tokenize(&lines, body_start);

        let engine =
            DispatchEngine::new(&self.registry, &file, reporter).with_max_depth(self.config.max_add_depth);
        let header = engine
            .dispatch_all(&header_tokens)?
            .into_iter()
            .next()
            .unwrap_or_default();
        let body = engine.dispatch_all(&body_tokens)?;

        debug!(
            file = %path,
            header = !header.is_empty(),
            blocks = body.len(),
            "parsed file"
        );
        reporter.emit(Event::File, &Diagnostic::new(format!("parsed {}", path)).in_file(path));

        Ok(FileDocs { header, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_file_fields() {
        let file = SourceFile::new("src/button.scss", "a\nb\nc".to_string(), CommentTable::default().for_filetype("scss").clone());
        assert_eq!(file.name, "button");
        assert_eq!(file.filetype, "scss");
        assert_eq!(file.start, 0);
        assert_eq!(file.end, 2);
    }

    #[test]
    fn test_file_without_markers_warns() {
        let parser = Parser::with_defaults().unwrap();
        let reporter = CollectingReporter::new();
        let docs = parser.parse_source("plain.js", "let a = 1;\n", &reporter).unwrap();

        assert!(docs.is_empty());
        assert_eq!(reporter.count(Event::Warning), 1);
    }

    #[test]
    fn test_header_and_body() {
        let content = "////\n/// @name File\n/// @author Me\n////\n\n/// @name thing\n/// @returns {string}\nfunction thing() {}\n";
        let parser = Parser::with_defaults().unwrap();
        let reporter = CollectingReporter::new();
        let docs = parser.parse_source("thing.js", content, &reporter).unwrap();

        assert_eq!(docs.header.get("name"), Some(&json!("File")));
        assert_eq!(docs.header.get("author"), Some(&json!(["Me"])));
        assert_eq!(docs.header.get("access"), Some(&json!("public")));
        assert_eq!(docs.body.len(), 1);
        assert_eq!(docs.body[0].get("name"), Some(&json!("thing")));
        assert_eq!(
            docs.body[0].get("returns"),
            Some(&json!({ "types": ["string"], "description": "" }))
        );
        assert_eq!(reporter.count(Event::File), 1);
    }

    #[test]
    fn test_parse_file_from_disk() {
        let mut file = NamedTempFile::with_suffix(".css").unwrap();
        write!(file, "/**\n * @name button\n * @description Big button\n **/\n.button {{ color: red; }}\n").unwrap();

        let parser = Parser::with_defaults().unwrap();
        let docs = parser.parse_file(file.path(), &CollectingReporter::new()).unwrap();

        assert_eq!(docs.body.len(), 1);
        assert_eq!(docs.body[0].get("description"), Some(&json!("Big button")));
        assert_eq!(docs.body[0]["blockinfo"]["code"]["start"], json!(4));
    }

    #[test]
    fn test_warnings_can_be_silenced() {
        let config = Config {
            warnings: false,
            ..Config::default()
        };
        let parser = Parser::new(Arc::new(default_registry().unwrap()), config).unwrap();
        let reporter = CollectingReporter::new();
        let docs = parser.parse_source("a.js", "/// @type\nlet a;\n", &reporter).unwrap();

        assert_eq!(docs.body[0]["type"]["type"], json!("undefined"));
        assert_eq!(reporter.count(Event::Warning), 0);
    }
}
