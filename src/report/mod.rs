//! @name Report
//! @description Logging sink handed to the parser and annotation callbacks
//!
//! The parser never prints or exits on its own. Anything a user should see
//! (soft validation failures, files without documentation) is sent to a
//! [`Reporter`]. The CLI uses [`TracingReporter`]; tests use
//! [`CollectingReporter`] and assert on what was collected.

use std::fmt;
use std::sync::Mutex;

use console::style;
use serde::Serialize;

use crate::tokenizer::Span;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Warning,
    Error,
    /// Progress: a file was parsed
    File,
    Debug,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Event::Warning => "warning",
            Event::Error => "error",
            Event::File => "file",
            Event::Debug => "debug",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}", file, line, self.message)?,
            (Some(file), None) => write!(f, "{}: {}", file, self.message)?,
            _ => f.write_str(&self.message)?,
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n{}", snippet)?;
        }
        Ok(())
    }
}

// ============================================================================
// Reporters
// ============================================================================

/// Receives parser events. Shared across rayon workers.
pub trait Reporter: Send + Sync {
    fn emit(&self, event: Event, diagnostic: &Diagnostic);

    fn warning(&self, diagnostic: Diagnostic) {
        self.emit(Event::Warning, &diagnostic);
    }

    fn error(&self, diagnostic: Diagnostic) {
        self.emit(Event::Error, &diagnostic);
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn emit(&self, event: Event, diagnostic: &Diagnostic) {
        let file = diagnostic.file.as_deref().unwrap_or("-");
        let line = diagnostic.line.unwrap_or(0);
        match event {
            Event::Warning => {
                tracing::warn!(file, line, "{}", diagnostic.message);
                if let Some(snippet) = &diagnostic.snippet {
                    eprintln!("{}", snippet);
                }
            }
            Event::Error => {
                tracing::error!(file, line, "{}", diagnostic.message);
                if let Some(snippet) = &diagnostic.snippet {
                    eprintln!("{}", snippet);
                }
            }
            Event::File => tracing::info!(file, "{}", diagnostic.message),
            Event::Debug => tracing::debug!(file, line, "{}", diagnostic.message),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<(Event, Diagnostic)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Event, Diagnostic)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Diagnostics of one event kind
    pub fn of(&self, event: Event) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, d)| d)
            .collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.of(event).len()
    }
}

impl Reporter for CollectingReporter {
    fn emit(&self, event: Event, diagnostic: &Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event, diagnostic.clone()));
        }
    }
}

// ============================================================================
// Snippets
// ============================================================================

/// Where an annotation sits, for [`snippet`]
#[derive(Debug, Clone, Copy)]
pub struct SnippetRange {
    /// Index of the annotation's first line within the comment contents
    pub start: usize,
    /// Index of its last line within the comment contents
    pub end: usize,
}

/// Renders the comment (and the code below it) around a bad annotation.
///
/// Lines inside `range` that have an `expected` counterpart are shown twice:
/// `-` with the actual text and `+` with the expected text. Line numbers are
/// 1-based and right aligned.
pub fn snippet(
    path: &str,
    marker: &str,
    comment: &Span,
    code: &Span,
    range: SnippetRange,
    expected: &[String],
) -> String {
    let lines: Vec<(usize, bool, &str)> = comment
        .contents
        .iter()
        .enumerate()
        .map(|(i, l)| (comment.lineno(i).unwrap_or(i) + 1, true, l.as_str()))
        .chain(
            code.contents
                .iter()
                .enumerate()
                .map(|(i, l)| (code.lineno(i).unwrap_or(i) + 1, false, l.as_str())),
        )
        .collect();

    let width = lines
        .iter()
        .map(|(number, ..)| number.to_string().len())
        .max()
        .unwrap_or(1);
    let context = (11 + range.end.saturating_sub(range.start)) / 2;
    let from = range.start.saturating_sub(context);
    let to = (range.end + context + 1).min(lines.len());

    let mut out = vec![
        String::new(),
        format!("    {}", style(path).bold()),
        format!("    {} {}", style("+ expected").green(), style("- actual").red()),
        String::new(),
    ];

    let mut pending = Vec::new();
    for (index, (lineno, in_comment, text)) in lines.iter().enumerate().take(to).skip(from) {
        let number = format!("{:>width$}", lineno, width = width);
        let text = if *in_comment {
            format!("{} {}", marker, text)
        } else {
            text.to_string()
        };

        let wanted = (range.start..=range.end)
            .contains(&index)
            .then(|| expected.get(index - range.start))
            .flatten();

        match wanted {
            Some(wanted) => {
                out.push(format!("  {} {} | {}", style("-").red(), style(&number).red(), text));
                pending.push(format!(
                    "  {} {} | {} {}",
                    style("+").green(),
                    style(&number).green(),
                    marker,
                    wanted
                ));
                if index == range.end {
                    out.append(&mut pending);
                }
            }
            None => {
                out.append(&mut pending);
                out.push(format!("    {} | {}", number, text));
            }
        }
    }
    out.append(&mut pending);
    out.push(String::new());

    out.join("\n")
}
