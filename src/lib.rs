#![forbid(unsafe_code)]

//! @name Docs
//! @description Extracts structured documentation from annotated source comments
//!
//! # docs
//!
//! Finds documentation comments in source files of any language, splits them
//! into `@name`-style annotations and runs each annotation through a
//! registered parse callback, producing one JSON-friendly block per comment.
//!
//! ## Features
//!
//! - **Language agnostic**: comment markers are configured per file type
//! - **Pluggable annotations**: parse, autofill and resolve callbacks
//! - **Aliases**: `@param` and `@arg` land under the same name
//! - **Parallel**: many files are parsed at once with rayon
//!
//! ## Example
//!
//! ```rust,no_run
//! use docs::{Collector, Parser, TracingReporter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let collector = Collector::new(Parser::with_defaults()?);
//!     let collection = collector.collect(&["src/button.scss"], &TracingReporter);
//!     collection.write_json("docs.json", true)?;
//!     Ok(())
//! }
//! ```

pub mod alias;
pub mod annotation;
pub mod annotations;
pub mod collect;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod parse;
pub mod registry;
pub mod report;
pub mod text;
pub mod tokenizer;

// Re-exports
pub use alias::AliasRewriter;
pub use annotation::{Annotation, Splitter};
pub use annotations::{default_registry, register_defaults};
pub use collect::{Collection, Collector, Failure};
pub use config::{CommentStyleConfig, CommentTable, Config, LanguageComments, MarkerConfig};
pub use dispatch::{AutofillContext, Block, DispatchEngine, ParseContext, ResolveContext};
pub use error::{DocsError, Result};
pub use parse::{FileDocs, Parser, SourceFile};
pub use registry::{AnnotationConfig, AnnotationDefinition, AnnotationRegistry, Lifecycle};
pub use report::{CollectingReporter, Diagnostic, Event, Reporter, TracingReporter};
pub use tokenizer::{CommentGrammar, CommentKind, Span, Token, TokenizeMode, Tokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
