//! Annotation registry integration tests
//!
//! Registration rules, alias collisions and filetype overlays.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;

use docs::annotations::default_registry;
use docs::{AnnotationConfig, AnnotationDefinition, AnnotationRegistry, DocsError, Lifecycle};

// =============================================================================
// Alias collisions
// =============================================================================

mod collision_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alias_matching_an_existing_name() {
        let mut registry = AnnotationRegistry::new();
        registry.register("title", AnnotationDefinition::new()).unwrap();

        let result = registry.register("name", AnnotationConfig::alias(["title"]));
        match result {
            Err(DocsError::AliasCollision { alias, name, .. }) => {
                assert_eq!(alias, "title");
                assert_eq!(name, "name");
            }
            other => panic!("expected an alias collision, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_name_matching_an_existing_alias() {
        let mut registry = AnnotationRegistry::new();
        registry.register("name", AnnotationConfig::alias(["title"])).unwrap();

        assert!(matches!(
            registry.register("title", AnnotationDefinition::new()),
            Err(DocsError::AliasCollision { .. })
        ));
    }

    #[test]
    fn test_alias_claimed_twice() {
        let mut registry = AnnotationRegistry::new();
        registry.register("arg", AnnotationConfig::alias(["param"])).unwrap();

        assert!(matches!(
            registry.register("property", AnnotationConfig::alias(["param"])),
            Err(DocsError::AliasCollision { .. })
        ));
    }

    #[test]
    fn test_alias_equal_to_own_name_is_dropped() {
        let mut registry = AnnotationRegistry::new();
        registry.register("note", AnnotationConfig::alias(["note", "notes"])).unwrap();

        assert_eq!(registry.aliases("js").get("note"), Some(&vec!["notes".to_string()]));
    }

    #[test]
    fn test_collisions_stay_within_a_filetype() {
        let mut registry = AnnotationRegistry::new();
        registry
            .register("name", AnnotationDefinition::new().alias(["title"]).filetypes(["scss"]))
            .unwrap();

        // js files never see the scss alias
        registry
            .register("title", AnnotationDefinition::new().filetypes(["js"]))
            .unwrap();
        assert_eq!(registry.canonical("js", "title").as_deref(), Some("title"));
        assert_eq!(registry.canonical("scss", "title").as_deref(), Some("name"));
    }
}

// =============================================================================
// Filetypes
// =============================================================================

mod filetype_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filetype_map_registers_each_entry() {
        let mut by_filetype = BTreeMap::new();
        by_filetype.insert("default".to_string(), AnnotationDefinition::new());
        by_filetype.insert(
            "css".to_string(),
            AnnotationDefinition::new().parse(|_| Ok(json!("css"))),
        );

        let mut registry = AnnotationRegistry::new();
        registry.register("name", AnnotationConfig::Filetypes(by_filetype)).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.default_definition("name").is_some());
        assert!(registry.filetype_definition("css", "name").is_some());
        assert!(registry.filetype_definition("js", "name").is_none());
        assert_eq!(registry.filetypes().collect::<Vec<_>>(), vec!["css", "default"]);
    }

    #[test]
    fn test_empty_filetype_map_is_rejected() {
        let mut registry = AnnotationRegistry::new();
        assert!(matches!(
            registry.register("name", AnnotationConfig::Filetypes(BTreeMap::new())),
            Err(DocsError::InvalidAnnotationConfig { .. })
        ));
    }

    #[test]
    fn test_list_overlays_filetype_entries() {
        let mut registry = default_registry().unwrap();
        registry
            .register("chainable", AnnotationDefinition::new().filetypes(["rb"]))
            .unwrap();

        assert_eq!(registry.list("rb").len(), 20);
        assert!(registry.get("rb", "chainable").is_some_and(|d| d.alias.is_empty()));
        assert!(registry.get("js", "chainable").is_some_and(|d| !d.alias.is_empty()));
    }
}

// =============================================================================
// Lookups
// =============================================================================

mod lookup_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_with_lifecycle() {
        let registry = default_registry().unwrap();

        let with_alias = registry.list_with("js", Lifecycle::Alias);
        assert!(with_alias.contains_key("arg"));
        assert!(!with_alias.contains_key("raw-code"));
    }

    #[test]
    fn test_canonical_names() {
        let registry = default_registry().unwrap();

        assert_eq!(registry.canonical("js", "param").as_deref(), Some("arg"));
        assert_eq!(registry.canonical("js", "arg").as_deref(), Some("arg"));
        assert_eq!(registry.canonical("js", "nope"), None);
    }

    #[test]
    fn test_invalid_alias_is_rejected() {
        let mut registry = AnnotationRegistry::new();
        assert!(matches!(
            registry.register("name", AnnotationConfig::alias(["two words"])),
            Err(DocsError::InvalidAnnotationConfig { .. })
        ));
    }
}
