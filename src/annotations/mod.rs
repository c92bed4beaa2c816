//! @name Built-in annotations
//! @description The default annotation set and its registration
//!
//! Bodies are kept as plain text; rendering (markdown or otherwise) is up to
//! whoever consumes the output.

pub mod code;
pub mod meta;
pub mod params;
pub mod util;

use crate::error::Result;
use crate::registry::{AnnotationDefinition, AnnotationRegistry};

/// Built-in annotations in registration order
pub fn defaults() -> Vec<(&'static str, AnnotationDefinition)> {
    vec![
        ("access", meta::access()),
        ("arg", params::arg()),
        ("author", meta::author()),
        ("blockinfo", code::blockinfo()),
        ("chainable", meta::chainable()),
        ("deprecated", meta::deprecated()),
        ("description", meta::description_annotation()),
        ("markup", code::markup()),
        ("name", meta::name()),
        ("note", meta::note()),
        ("property", params::property()),
        ("raw-code", code::raw_code()),
        ("requires", params::requires()),
        ("returns", params::returns()),
        ("since", meta::since()),
        ("states", code::states()),
        ("throws", params::throws()),
        ("todo", meta::todo()),
        ("type", meta::type_annotation()),
        ("version", meta::version()),
    ]
}

/// Registers the built-in set on an existing registry
pub fn register_defaults(registry: &mut AnnotationRegistry) -> Result<()> {
    for (name, definition) in defaults() {
        registry.register(name, definition)?;
    }
    Ok(())
}

/// A registry holding only the built-in set
pub fn default_registry() -> Result<AnnotationRegistry> {
    let mut registry = AnnotationRegistry::new();
    register_defaults(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Lifecycle;

    #[test]
    fn test_default_registry_builds() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 20);

        let autofill: Vec<&str> = registry.list_with("js", Lifecycle::Autofill).into_keys().collect();
        assert_eq!(autofill, vec!["access", "blockinfo"]);

        let resolve: Vec<&str> = registry.list_with("js", Lifecycle::Resolve).into_keys().collect();
        assert_eq!(resolve, vec!["markup", "states"]);
    }

    #[test]
    fn test_default_aliases() {
        let registry = default_registry().unwrap();
        let aliases = registry.alias_map("scss");

        assert_eq!(aliases.get("param").map(String::as_str), Some("arg"));
        assert_eq!(aliases.get("desc").map(String::as_str), Some("description"));
        assert_eq!(aliases.get("example").map(String::as_str), Some("markup"));
        assert_eq!(aliases.get("catch").map(String::as_str), Some("throws"));
        assert!(!aliases.contains_key("name"));
    }
}
