//! @name Dispatch
//! @description Runs annotation callbacks over tokenized comment blocks
//!
//! For every token the comment is split into annotations and each one goes
//! through its definition's `parse`. Results are merged into a [`Block`].
//! Once all annotations ran, `autofill` fills in missing names and
//! `resolve` rewrites present ones.
//!
//! Callbacks get an explicit context instead of shared mutable state. The
//! parse context can `add` another annotation from inside a callback; the
//! nesting depth is capped.

pub mod block;

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

pub use block::Block;

use crate::annotation::{Annotation, Splitter};
use crate::error::{DocsError, Result};
use crate::parse::SourceFile;
use crate::registry::{AnnotationRegistry, Lifecycle};
use crate::report::{snippet, Diagnostic, Reporter, SnippetRange};
use crate::tokenizer::{CommentKind, Span, Token};

/// Default cap on nested `add` calls
pub const DEFAULT_MAX_ADD_DEPTH: usize = 8;

/// Where one annotation sat inside its comment block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPosition {
    pub name: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

// ============================================================================
// Callback contexts
// ============================================================================

/// What a `parse` callback sees
pub struct ParseContext<'a> {
    pub annotation: &'a Annotation,
    pub comment: &'a Span,
    pub code: &'a Span,
    pub kind: CommentKind,
    pub file: &'a SourceFile,
    /// Result of the default definition's parse when a filetype overrides it
    pub default: Option<Value>,
    pub log: &'a dyn Reporter,
    run: &'a BlockRun<'a>,
    depth: usize,
}

impl ParseContext<'_> {
    /// Dispatches `text` as another annotation and merges the result into
    /// the current block. The first line of `text` is the head line.
    ///
    /// Returns `Ok(None)` when the parse produced nothing or the nesting cap
    /// was hit (reported as an error event).
    pub fn add(&self, name: &str, text: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.run.add(name, text, self.depth + 1)?)
    }

    /// 1-based source line of the annotation's head line
    pub fn lineno(&self) -> Option<usize> {
        self.comment
            .lineno(self.annotation.start.unwrap_or(0))
            .map(|line| line + 1)
    }

    /// Reports a soft validation failure with a snippet showing the
    /// `expected` form of the annotation's lines.
    pub fn warn(&self, message: impl Into<String>, expected: &[String]) {
        let mut diagnostic = Diagnostic::new(message).in_file(&self.file.path);
        if let Some(line) = self.lineno() {
            diagnostic = diagnostic.at_line(line);
        }
        if let (Some(start), Some(end)) = (self.annotation.start, self.annotation.end) {
            let grammar = self.file.comments.grammar(self.kind);
            let marker = grammar
                .single
                .as_deref()
                .or(grammar.start.as_deref())
                .unwrap_or_default();
            diagnostic = diagnostic.with_snippet(snippet(
                &self.file.path,
                marker,
                self.comment,
                self.code,
                SnippetRange { start, end },
                expected,
            ));
        }
        self.log.warning(diagnostic);
    }
}

/// What an `autofill` callback sees
pub struct AutofillContext<'a> {
    pub name: &'a str,
    pub comment: &'a Span,
    pub code: &'a Span,
    pub kind: CommentKind,
    pub file: &'a SourceFile,
    /// Values parsed so far
    pub parsed: &'a Block,
    pub log: &'a dyn Reporter,
}

/// What a `resolve` callback sees
pub struct ResolveContext<'a> {
    pub name: &'a str,
    pub alias: &'a [String],
    pub parsed: &'a Block,
    /// Every annotation of the block in source order
    pub annotations: &'a [AnnotationPosition],
    pub comment: &'a Span,
    pub code: &'a Span,
    pub kind: CommentKind,
    pub file: &'a SourceFile,
    pub log: &'a dyn Reporter,
}

impl ResolveContext<'_> {
    /// Positions of the annotations called `name`, in source order
    pub fn positions(&self, name: &str) -> Vec<&AnnotationPosition> {
        self.annotations.iter().filter(|p| p.name == name).collect()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// @description "Per-file annotation dispatcher"
pub struct DispatchEngine<'a> {
    registry: &'a AnnotationRegistry,
    file: &'a SourceFile,
    reporter: &'a dyn Reporter,
    max_depth: usize,
}

impl<'a> DispatchEngine<'a> {
    pub fn new(registry: &'a AnnotationRegistry, file: &'a SourceFile, reporter: &'a dyn Reporter) -> Self {
        Self {
            registry,
            file,
            reporter,
            max_depth: DEFAULT_MAX_ADD_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Dispatches every token; blocks that end up empty are dropped.
    pub fn dispatch_all(&self, tokens: &[Token]) -> Result<Vec<Block>> {
        let mut blocks = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(block) = self.dispatch(token)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Parses one token into a block. `None` when no annotation (parsed or
    /// autofilled) produced a value.
    pub fn dispatch(&self, token: &Token) -> Result<Option<Block>> {
        let filetype = self.file.filetype.as_str();
        let grammar = self.file.comments.grammar(token.kind);
        let names = self.registry.names(filetype);
        let aliases = self.registry.aliases(filetype);

        let annotations = Splitter::new(&grammar.prefix, &names)
            .with_aliases(&aliases)
            .with_quoted_markers(self.file.comments.quoted_markers())
            .split(&token.comment.contents);

        let run = BlockRun {
            engine: self,
            token,
            aliases: &aliases,
            block: RefCell::new(Block::new()),
        };

        let mut positions = Vec::with_capacity(annotations.len());
        for annotation in annotations {
            let name = annotation.name.clone();
            positions.push(AnnotationPosition {
                name: name.clone(),
                start: annotation.start,
                end: annotation.end,
            });
            if let Some(value) = run.run_annotation(annotation, 0)? {
                run.block.borrow_mut().merge(&name, value);
            }
        }
        let mut block = run.block.into_inner();

        self.autofill(token, &mut block)?;
        if block.is_empty() {
            return Ok(None);
        }
        self.resolve(token, &positions, &mut block)?;

        debug!(
            file = %self.file.path,
            line = token.comment.start.map(|l| l + 1).unwrap_or(0),
            annotations = positions.len(),
            "dispatched block"
        );
        Ok(Some(block))
    }

    fn autofill(&self, token: &Token, block: &mut Block) -> Result<()> {
        for (name, definition) in self.registry.list_with(&self.file.filetype, Lifecycle::Autofill) {
            let Some(autofill) = &definition.autofill else {
                continue;
            };
            if block.contains(name) {
                continue;
            }

            let context = AutofillContext {
                name,
                comment: &token.comment,
                code: &token.code,
                kind: token.kind,
                file: self.file,
                parsed: block,
                log: self.reporter,
            };
            let value = autofill(&context).map_err(|source| self.callback_error(name, "autofill", source))?;
            if let Some(value) = value.filter(|v| !v.is_null()) {
                block.insert(name, value);
            }
        }
        Ok(())
    }

    fn resolve(&self, token: &Token, positions: &[AnnotationPosition], block: &mut Block) -> Result<()> {
        for (name, definition) in self.registry.list_with(&self.file.filetype, Lifecycle::Resolve) {
            let Some(resolve) = &definition.resolve else {
                continue;
            };
            let Some(value) = block.get(name).cloned() else {
                continue;
            };

            let context = ResolveContext {
                name,
                alias: &definition.alias,
                parsed: block,
                annotations: positions,
                comment: &token.comment,
                code: &token.code,
                kind: token.kind,
                file: self.file,
                log: self.reporter,
            };
            let value = resolve(value, &context).map_err(|source| self.callback_error(name, "resolve", source))?;
            if let Some(value) = value.filter(|v| !v.is_null()) {
                block.insert(name, value);
            }
        }
        Ok(())
    }

    fn callback_error(&self, annotation: &str, hook: &'static str, source: anyhow::Error) -> DocsError {
        DocsError::Callback {
            annotation: annotation.to_string(),
            hook,
            file: self.file.path.clone(),
            source,
        }
    }
}

/// State shared by the annotations of one block
struct BlockRun<'a> {
    engine: &'a DispatchEngine<'a>,
    token: &'a Token,
    aliases: &'a BTreeMap<String, Vec<String>>,
    block: RefCell<Block>,
}

impl<'a> BlockRun<'a> {
    fn context<'c>(&'c self, annotation: &'c Annotation, default: Option<Value>, depth: usize) -> ParseContext<'c> {
        ParseContext {
            annotation,
            comment: &self.token.comment,
            code: &self.token.code,
            kind: self.token.kind,
            file: self.engine.file,
            default,
            log: self.engine.reporter,
            run: self,
            depth,
        }
    }

    fn run_annotation(&self, mut annotation: Annotation, depth: usize) -> Result<Option<Value>> {
        let engine = self.engine;
        let filetype = engine.file.filetype.as_str();
        let name = annotation.name.clone();

        let Some(definition) = engine.registry.get(filetype, &name) else {
            engine
                .reporter
                .error(Diagnostic::new(format!("'@{}' isn't a registered annotation", name)).in_file(&engine.file.path));
            return Ok(None);
        };

        annotation.prepare();

        let default = match (
            engine.registry.filetype_definition(filetype, &name),
            engine.registry.default_definition(&name),
        ) {
            (Some(_), Some(fallback)) => {
                let context = self.context(&annotation, None, depth);
                let value = (fallback.parse)(&context).map_err(|source| engine.callback_error(&name, "parse", source))?;
                Some(value)
            }
            _ => None,
        };

        let context = self.context(&annotation, default, depth);
        let value = (definition.parse)(&context).map_err(|source| engine.callback_error(&name, "parse", source))?;

        Ok((!value.is_null()).then_some(value))
    }

    fn add(&self, name: &str, text: &str, depth: usize) -> Result<Option<Value>> {
        let engine = self.engine;
        if depth > engine.max_depth {
            engine.reporter.error(
                Diagnostic::new(format!(
                    "'@{}' was added more than {} levels deep, ignoring it",
                    name, engine.max_depth
                ))
                .in_file(&engine.file.path),
            );
            return Ok(None);
        }

        let name = engine
            .registry
            .canonical(&engine.file.filetype, name)
            .unwrap_or_else(|| name.to_string());
        let alias = self.aliases.get(&name).cloned().unwrap_or_default();
        let annotation = Annotation::synthesize(&name, alias, text);

        let value = self.run_annotation(annotation, depth)?;
        if let Some(value) = &value {
            self.block.borrow_mut().merge(&name, value.clone());
        }
        Ok(value)
    }
}
