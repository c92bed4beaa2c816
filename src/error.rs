//! @name Errors
//! @description Crate-wide error type and result alias
//!
//! Configuration problems (comment grammars, annotation registration) are
//! returned at setup time. Callback failures carry the annotation, hook and
//! file they came from so a broken annotation is easy to find.

use thiserror::Error;

/// Crate result alias
pub type Result<T> = std::result::Result<T, DocsError>;

/// @description "Everything that can go wrong while setting up or running the parser"
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A comment grammar that can't be scanned
    #[error("invalid comment grammar: {0}")]
    InvalidCommentGrammar(String),

    /// Comment style table problems (bad `extend` target etc.)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid annotation name '{0}'")]
    InvalidAnnotationName(String),

    #[error("invalid config for annotation '{name}': {reason}")]
    InvalidAnnotationConfig { name: String, reason: String },

    /// An alias that is also a canonical name, or claimed by two names
    #[error("'{alias}' can't be an alias of '{name}': {reason}")]
    AliasCollision {
        alias: String,
        name: String,
        reason: String,
    },

    /// A `parse`, `autofill` or `resolve` callback failed
    #[error("@{annotation} {hook} failed in {file}")]
    Callback {
        annotation: String,
        hook: &'static str,
        file: String,
        #[source]
        source: anyhow::Error,
    },
}
