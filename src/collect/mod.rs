//! @name Collector
//! @description Parses many files in parallel into one JSON document
//!
//! Files are parsed independently with rayon. A file that fails to read or
//! whose callbacks fail is recorded as a failure; the rest of the run goes on.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::parse::{FileDocs, Parser};
use crate::report::{Diagnostic, Reporter};

/// A file that couldn't be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub path: String,
    pub error: String,
}

/// @description "Documentation of every parsed file, keyed by path"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<String, FileDocs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            files: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Body blocks across all files, headers not included
    pub fn block_count(&self) -> usize {
        self.files.values().map(|docs| docs.body.len()).sum()
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let collection = serde_json::from_reader(reader)?;
        Ok(collection)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

/// @description "Parallel parser over an explicit list of files"
pub struct Collector {
    parser: Arc<Parser>,
}

impl Collector {
    pub fn new(parser: Parser) -> Self {
        Self {
            parser: Arc::new(parser),
        }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn collect<P: AsRef<Path> + Sync>(&self, paths: &[P], reporter: &dyn Reporter) -> Collection {
        self.collect_with(paths, reporter, |_| {})
    }

    /// Like [`Collector::collect`], calling `on_file` after each file is done
    pub fn collect_with<P, F>(&self, paths: &[P], reporter: &dyn Reporter, on_file: F) -> Collection
    where
        P: AsRef<Path> + Sync,
        F: Fn(&str) + Sync + Send,
    {
        let parser = Arc::clone(&self.parser);

        let results: Vec<_> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref().to_string_lossy().to_string();
                let result = parser.parse_file(&path, reporter);
                on_file(&path);
                (path, result)
            })
            .collect();

        let mut collection = Collection::new();
        for (path, result) in results {
            match result {
                Ok(docs) if docs.is_empty() => debug!(file = %path, "no documentation"),
                Ok(docs) => {
                    collection.files.insert(path, docs);
                }
                Err(e) => {
                    reporter.error(Diagnostic::new(e.to_string()).in_file(&path));
                    collection.failures.push(Failure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(
            files = collection.files.len(),
            failures = collection.failures.len(),
            "collected documentation"
        );
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, Event};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_collects_documented_files() {
        let a = source(".js", "/// @name a\nlet a;\n");
        let b = source(".js", "/// @name b\nlet b;\n\n/// @name c\nlet c;\n");
        let plain = source(".js", "let nothing;\n");

        let collector = Collector::new(Parser::with_defaults().unwrap());
        let reporter = CollectingReporter::new();
        let collection = collector.collect(&[a.path(), b.path(), plain.path()], &reporter);

        assert_eq!(collection.files.len(), 2);
        assert_eq!(collection.block_count(), 3);
        assert!(collection.failures.is_empty());
        assert_eq!(reporter.count(Event::Warning), 1);
    }

    #[test]
    fn test_missing_file_is_a_failure() {
        let collector = Collector::new(Parser::with_defaults().unwrap());
        let reporter = CollectingReporter::new();
        let collection = collector.collect(&["/definitely/not/here.js"], &reporter);

        assert!(collection.files.is_empty());
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].path, "/definitely/not/here.js");
        assert_eq!(reporter.count(Event::Error), 1);
    }

    #[test]
    fn test_write_and_read_back() {
        let a = source(".js", "/// @name a\nlet a;\n");
        let collector = Collector::new(Parser::with_defaults().unwrap());
        let collection = collector.collect(&[a.path()], &CollectingReporter::new());

        let out = NamedTempFile::with_suffix(".json").unwrap();
        collection.write_json(out.path(), true).unwrap();
        let loaded = Collection::from_json(out.path()).unwrap();

        assert_eq!(loaded.version, crate::VERSION);
        assert_eq!(loaded.files, collection.files);
    }
}
