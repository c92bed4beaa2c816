//! @name Parse Command
//! @description Parse source files and emit their documentation as JSON
//!
//! Implements `docs parse`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::annotations::default_registry;
use crate::collect::Collector;
use crate::config::Config;
use crate::parse::Parser;
use crate::report::{Diagnostic, Event, Reporter, TracingReporter};

/// Options for the parse command
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Files to parse
    pub files: Vec<PathBuf>,
    /// Write JSON here instead of stdout
    pub output: Option<PathBuf>,
    /// Overrides `blank_lines` from the config
    pub blank_lines: Option<usize>,
    /// Pretty-print the JSON
    pub pretty: bool,
}

/// Logs through tracing and counts what it saw
#[derive(Default)]
struct Tally {
    warnings: AtomicUsize,
    errors: AtomicUsize,
}

impl Reporter for Tally {
    fn emit(&self, event: Event, diagnostic: &Diagnostic) {
        match event {
            Event::Warning => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
            }
            Event::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        TracingReporter.emit(event, diagnostic);
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if !Term::stderr().is_term() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(template) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}") {
        bar.set_style(template.progress_chars("=> "));
    }
    bar
}

/// Execute the parse command
pub fn execute_parse(options: ParseOptions, mut config: Config) -> Result<()> {
    if options.files.is_empty() {
        bail!("no files given");
    }
    if let Some(blank_lines) = options.blank_lines {
        config.blank_lines = blank_lines;
    }

    let registry = default_registry().context("registering built-in annotations")?;
    let parser = Parser::new(Arc::new(registry), config).context("resolving comment styles")?;
    let collector = Collector::new(parser);

    let tally = Tally::default();
    let bar = progress_bar(options.files.len());
    let collection = collector.collect_with(&options.files, &tally, |path| {
        bar.set_message(path.to_string());
        bar.inc(1);
    });
    bar.finish_and_clear();

    match &options.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            collection
                .write_json(output, options.pretty)
                .with_context(|| format!("writing {}", output.display()))?;
            eprintln!(
                "{} Documentation written to {}",
                style("✓").green(),
                output.display()
            );
        }
        None => println!("{}", collection.to_json(options.pretty)?),
    }

    eprintln!("  Files: {}", collection.files.len());
    eprintln!("  Blocks: {}", collection.block_count());

    let warnings = tally.warnings.load(Ordering::Relaxed);
    if warnings > 0 {
        eprintln!("  {} {} warning(s)", style("⚠").yellow(), warnings);
    }
    let errors = tally.errors.load(Ordering::Relaxed);
    if errors > 0 {
        eprintln!("  {} {} error(s)", style("✗").red(), errors);
    }

    if !collection.failures.is_empty() {
        for failure in &collection.failures {
            eprintln!("  {} {}: {}", style("✗").red(), failure.path, failure.error);
        }
        bail!("{} file(s) failed to parse", collection.failures.len());
    }
    Ok(())
}
