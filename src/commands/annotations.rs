//! @name Annotations Command
//! @description List registered annotations, their aliases and hooks

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::annotations::default_registry;
use crate::registry::{AnnotationRegistry, Lifecycle, DEFAULT_FILETYPE};

/// Options for the annotations command
#[derive(Debug, Clone)]
pub struct AnnotationsOptions {
    /// Filetype whose overrides are applied
    pub filetype: String,
    /// Output as JSON
    pub json: bool,
}

impl Default for AnnotationsOptions {
    fn default() -> Self {
        Self {
            filetype: DEFAULT_FILETYPE.to_string(),
            json: false,
        }
    }
}

/// One row of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSummary {
    pub name: String,
    pub alias: Vec<String>,
    pub autofill: bool,
    pub resolve: bool,
    /// Registered for this filetype rather than inherited from the defaults
    pub overridden: bool,
}

/// Rows for every annotation that applies to `filetype`
pub fn summarize(registry: &AnnotationRegistry, filetype: &str) -> Vec<AnnotationSummary> {
    registry
        .list(filetype)
        .into_iter()
        .map(|(name, def)| AnnotationSummary {
            name: name.to_string(),
            alias: def.alias.clone(),
            autofill: def.has(Lifecycle::Autofill),
            resolve: def.has(Lifecycle::Resolve),
            overridden: registry.filetype_definition(filetype, name).is_some(),
        })
        .collect()
}

/// Execute the annotations command
pub fn execute_annotations(options: AnnotationsOptions) -> Result<()> {
    let registry = default_registry().context("registering built-in annotations")?;
    let rows = summarize(&registry, &options.filetype);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} {} annotations for {}",
        style("→").cyan(),
        rows.len(),
        style(&options.filetype).bold()
    );
    for row in &rows {
        let mut hooks = Vec::new();
        if row.autofill {
            hooks.push("autofill");
        }
        if row.resolve {
            hooks.push("resolve");
        }

        print!("  {}", style(format!("@{}", row.name)).green());
        if !row.alias.is_empty() {
            print!(" {}", style(format!("({})", row.alias.join(", "))).dim());
        }
        if !hooks.is_empty() {
            print!(" [{}]", hooks.join(", "));
        }
        println!();
    }
    Ok(())
}
