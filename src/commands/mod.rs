//! @name Commands
//! @description CLI command implementations
//!
//! Each command is in its own submodule and takes an options struct.

pub mod annotations;
pub mod comments;
pub mod parse;

pub use annotations::{execute_annotations, summarize, AnnotationSummary, AnnotationsOptions};
pub use comments::{execute_comments, CommentsOptions};
pub use parse::{execute_parse, ParseOptions};
