//! @name Comments Command
//! @description Show the resolved comment grammar for a filetype

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::tokenizer::CommentGrammar;

/// Options for the comments command
#[derive(Debug, Clone, Default)]
pub struct CommentsOptions {
    /// Filetype to show; every configured language when unset
    pub filetype: Option<String>,
}

fn describe(grammar: &CommentGrammar) -> String {
    let mut parts = Vec::new();
    if let (Some(start), Some(end)) = (&grammar.start, &grammar.end) {
        parts.push(format!("{} ... {}", start, end));
    }
    if let Some(single) = &grammar.single {
        parts.push(format!("line {}", single));
    }
    parts.push(format!("prefix {}", grammar.prefix));
    if let Some(inline) = &grammar.inline_prefix {
        parts.push(format!("inline {}", inline));
    }
    parts.join(", ")
}

/// Execute the comments command
pub fn execute_comments(options: CommentsOptions, config: Config) -> Result<()> {
    let table = config.comment_table().context("resolving comment styles")?;

    let rows: Vec<(String, _)> = match &options.filetype {
        Some(filetype) => vec![(filetype.clone(), table.for_filetype(filetype))],
        None => std::iter::once(("_".to_string(), table.fallback()))
            .chain(table.languages().map(|(lang, c)| (lang.to_string(), c)))
            .collect(),
    };

    for (lang, comments) in rows {
        println!("{}", style(lang).bold());
        println!("  header: {}", describe(&comments.header));
        println!("  body:   {}", describe(&comments.body));
    }
    Ok(())
}
