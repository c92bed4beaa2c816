//! @name Configuration
//! @description Parser settings and comment styles, loaded from JSON or YAML

pub mod comments;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use comments::{builtin_styles, CommentStyleConfig, CommentTable, LanguageComments, MarkerConfig};

use crate::dispatch::DEFAULT_MAX_ADD_DEPTH;
use crate::error::Result;
use crate::tokenizer::DEFAULT_BLANK_LINES;

/// Looked up in the working directory by [`Config::load_or_default`]
pub const CONFIG_FILES: [&str; 3] = [".docs.config.json", ".docs.config.yml", ".docs.config.yaml"];

fn default_blank_lines() -> usize {
    DEFAULT_BLANK_LINES
}

fn default_max_add_depth() -> usize {
    DEFAULT_MAX_ADD_DEPTH
}

fn default_true() -> bool {
    true
}

/// @description "Parser configuration"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Consecutive blank lines that end a code span
    #[serde(default = "default_blank_lines")]
    pub blank_lines: usize,

    /// Cap on nested `add` calls from annotation callbacks
    #[serde(default = "default_max_add_depth")]
    pub max_add_depth: usize,

    /// Report soft validation warnings
    #[serde(default = "default_true")]
    pub warnings: bool,

    /// Comment styles, merged over the built-in ones
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<String, CommentStyleConfig>,

    /// Keys this version doesn't know about
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blank_lines: default_blank_lines(),
            max_add_depth: default_max_add_depth(),
            warnings: true,
            comments: BTreeMap::new(),
            unknown: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from a `.json`, `.yml` or `.yaml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        for key in config.unknown.keys() {
            warn!(file = %path.display(), "'{}' is not a valid option", key);
        }
        Ok(config)
    }

    /// Save config to a file; the extension picks the format
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the first default location that exists, or use defaults
    pub fn load_or_default() -> Self {
        let Some(path) = CONFIG_FILES.iter().find(|p| Path::new(p).exists()) else {
            return Self::default();
        };
        Self::load(path).unwrap_or_else(|e| {
            warn!(file = %path, "ignoring config: {}", e);
            Self::default()
        })
    }

    /// Built-in comment styles overlaid with the configured ones
    pub fn comment_table(&self) -> Result<CommentTable> {
        CommentTable::resolve(&self.comments)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
