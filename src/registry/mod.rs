//! @name Registry
//! @description Annotation definitions keyed by filetype and name
//!
//! Every definition lives under the filetypes it applies to. `"default"`
//! applies to every file, and a filetype-specific definition overlays it for
//! files of that type. Aliases are checked at registration: an alias can't
//! be another annotation's name, and two annotations can't claim the same
//! alias.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::{AutofillContext, ParseContext, ResolveContext};
use crate::error::{DocsError, Result};

/// Filetype key that applies to every file
pub const DEFAULT_FILETYPE: &str = "default";

/// Keys of a definition; these can't be used as filetype names
pub const RESERVED_KEYS: [&str; 5] = ["alias", "filetypes", "parse", "autofill", "resolve"];

// ============================================================================
// Callbacks
// ============================================================================

/// Turns an annotation into a value. `Null` means "record nothing".
pub type ParseFn = Arc<dyn Fn(&ParseContext<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Supplies a value for an annotation that is missing from a block
pub type AutofillFn = Arc<dyn Fn(&AutofillContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Rewrites the value of an annotation that is present in a block
pub type ResolveFn =
    Arc<dyn Fn(Value, &ResolveContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Lifecycle hooks an annotation can opt into, for [`AnnotationRegistry::list_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Alias,
    Autofill,
    Resolve,
}

// ============================================================================
// Definitions
// ============================================================================

/// @description "One annotation: aliases, filetypes and lifecycle callbacks"
#[derive(Clone)]
pub struct AnnotationDefinition {
    pub alias: Vec<String>,
    pub filetypes: Vec<String>,
    pub parse: ParseFn,
    pub autofill: Option<AutofillFn>,
    pub resolve: Option<ResolveFn>,
}

impl fmt::Debug for AnnotationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationDefinition")
            .field("alias", &self.alias)
            .field("filetypes", &self.filetypes)
            .field("autofill", &self.autofill.is_some())
            .field("resolve", &self.resolve.is_some())
            .finish()
    }
}

impl Default for AnnotationDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationDefinition {
    /// A definition whose parse returns the annotation's head line
    pub fn new() -> Self {
        Self {
            alias: Vec::new(),
            filetypes: vec![DEFAULT_FILETYPE.to_string()],
            parse: Arc::new(default_parse),
            autofill: None,
            resolve: None,
        }
    }

    pub fn alias<I, S>(mut self, alias: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias = alias.into_iter().map(Into::into).collect();
        self
    }

    pub fn filetypes<I, S>(mut self, filetypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filetypes = filetypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&ParseContext<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.parse = Arc::new(parse);
        self
    }

    pub fn autofill<F>(mut self, autofill: F) -> Self
    where
        F: Fn(&AutofillContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.autofill = Some(Arc::new(autofill));
        self
    }

    pub fn resolve<F>(mut self, resolve: F) -> Self
    where
        F: Fn(Value, &ResolveContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.resolve = Some(Arc::new(resolve));
        self
    }

    /// True when the definition uses the given hook
    pub fn has(&self, lifecycle: Lifecycle) -> bool {
        match lifecycle {
            Lifecycle::Alias => !self.alias.is_empty(),
            Lifecycle::Autofill => self.autofill.is_some(),
            Lifecycle::Resolve => self.resolve.is_some(),
        }
    }
}

fn default_parse(context: &ParseContext<'_>) -> anyhow::Result<Value> {
    Ok(Value::String(context.annotation.line.clone()))
}

/// What can be passed to [`AnnotationRegistry::register`]
#[derive(Clone)]
pub enum AnnotationConfig {
    /// Just a parse callback
    Parse(ParseFn),
    /// Just aliases; parse returns the head line
    Alias(Vec<String>),
    /// One definition per filetype key (`"default"` included)
    Filetypes(BTreeMap<String, AnnotationDefinition>),
    Definition(AnnotationDefinition),
}

impl AnnotationConfig {
    pub fn parse<F>(parse: F) -> Self
    where
        F: Fn(&ParseContext<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Parse(Arc::new(parse))
    }

    pub fn alias<I, S>(alias: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Alias(alias.into_iter().map(Into::into).collect())
    }
}

impl From<AnnotationDefinition> for AnnotationConfig {
    fn from(definition: AnnotationDefinition) -> Self {
        Self::Definition(definition)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// @description "Annotation definitions by filetype, with alias checking"
#[derive(Debug, Clone, Default)]
pub struct AnnotationRegistry {
    /// filetype → name → definition
    tables: BTreeMap<String, BTreeMap<String, AnnotationDefinition>>,
}

impl AnnotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an annotation.
    pub fn register(&mut self, name: &str, config: impl Into<AnnotationConfig>) -> Result<&mut Self> {
        validate_name(name)?;

        match config.into() {
            AnnotationConfig::Parse(parse) => {
                let mut definition = AnnotationDefinition::new();
                definition.parse = parse;
                self.insert(name, definition)?;
            }
            AnnotationConfig::Alias(alias) => {
                self.insert(name, AnnotationDefinition::new().alias(alias))?;
            }
            AnnotationConfig::Filetypes(by_filetype) => {
                if by_filetype.is_empty() {
                    return Err(DocsError::InvalidAnnotationConfig {
                        name: name.to_string(),
                        reason: "no filetypes given".to_string(),
                    });
                }
                if let Some(key) = by_filetype.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
                    return Err(DocsError::InvalidAnnotationConfig {
                        name: name.to_string(),
                        reason: format!("'{}' is a definition key, not a filetype", key),
                    });
                }
                for (filetype, definition) in by_filetype {
                    let definition = definition.filetypes([filetype]);
                    self.register(name, definition)?;
                }
            }
            AnnotationConfig::Definition(definition) => {
                self.insert(name, definition)?;
            }
        }

        Ok(self)
    }

    fn insert(&mut self, name: &str, mut definition: AnnotationDefinition) -> Result<()> {
        if definition.filetypes.is_empty() {
            definition.filetypes = vec![DEFAULT_FILETYPE.to_string()];
        }
        for filetype in &definition.filetypes {
            if filetype.trim().is_empty() {
                return Err(DocsError::InvalidAnnotationConfig {
                    name: name.to_string(),
                    reason: "empty filetype".to_string(),
                });
            }
        }
        for alias in &definition.alias {
            if alias.is_empty() || alias.contains(char::is_whitespace) {
                return Err(DocsError::InvalidAnnotationConfig {
                    name: name.to_string(),
                    reason: format!("invalid alias '{}'", alias),
                });
            }
        }
        definition.alias.retain(|alias| alias != name);
        definition.alias.dedup();

        for filetype in &definition.filetypes {
            self.check_collisions(filetype, name, &definition.alias)?;
        }

        for filetype in definition.filetypes.clone() {
            self.tables
                .entry(filetype)
                .or_default()
                .insert(name.to_string(), definition.clone());
        }
        Ok(())
    }

    /// Checks `name`/`alias` against every table that shares files with `filetype`.
    fn check_collisions(&self, filetype: &str, name: &str, alias: &[String]) -> Result<()> {
        let tables = self.tables.iter().filter(|(key, _)| {
            filetype == DEFAULT_FILETYPE || key.as_str() == DEFAULT_FILETYPE || key.as_str() == filetype
        });

        for (_, table) in tables {
            for (other, definition) in table.iter().filter(|(other, _)| other.as_str() != name) {
                if let Some(alias) = alias.iter().find(|a| *a == other) {
                    return Err(DocsError::AliasCollision {
                        alias: alias.clone(),
                        name: name.to_string(),
                        reason: "it is already an annotation name".to_string(),
                    });
                }
                if let Some(alias) = alias.iter().find(|a| definition.alias.contains(a)) {
                    return Err(DocsError::AliasCollision {
                        alias: alias.clone(),
                        name: name.to_string(),
                        reason: format!("it is already an alias of '{}'", other),
                    });
                }
                if definition.alias.iter().any(|a| a == name) {
                    return Err(DocsError::AliasCollision {
                        alias: name.to_string(),
                        name: other.clone(),
                        reason: format!("'{}' is being registered as an annotation name", name),
                    });
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Definitions that apply to `filetype`: defaults overlaid with the
    /// filetype's own entries.
    pub fn list(&self, filetype: &str) -> BTreeMap<&str, &AnnotationDefinition> {
        let mut list: BTreeMap<&str, &AnnotationDefinition> = BTreeMap::new();
        for key in [DEFAULT_FILETYPE, filetype] {
            if let Some(table) = self.tables.get(key) {
                list.extend(table.iter().map(|(name, def)| (name.as_str(), def)));
            }
        }
        list
    }

    /// Entries of [`list`](Self::list) that use the given lifecycle hook
    pub fn list_with(&self, filetype: &str, lifecycle: Lifecycle) -> BTreeMap<&str, &AnnotationDefinition> {
        self.list(filetype)
            .into_iter()
            .filter(|(_, def)| def.has(lifecycle))
            .collect()
    }

    pub fn names(&self, filetype: &str) -> BTreeSet<String> {
        self.list(filetype).keys().map(|name| name.to_string()).collect()
    }

    /// name → its alias list
    pub fn aliases(&self, filetype: &str) -> BTreeMap<String, Vec<String>> {
        self.list_with(filetype, Lifecycle::Alias)
            .into_iter()
            .map(|(name, def)| (name.to_string(), def.alias.clone()))
            .collect()
    }

    /// alias → canonical name. Aliases that are canonical names here are left out.
    pub fn alias_map(&self, filetype: &str) -> BTreeMap<String, String> {
        let list = self.list(filetype);
        let mut map = BTreeMap::new();
        for (name, def) in &list {
            for alias in &def.alias {
                if !list.contains_key(alias.as_str()) {
                    map.insert(alias.clone(), name.to_string());
                }
            }
        }
        map
    }

    /// Canonical name for a name or alias
    pub fn canonical(&self, filetype: &str, name: &str) -> Option<String> {
        if self.get(filetype, name).is_some() {
            return Some(name.to_string());
        }
        self.alias_map(filetype).remove(name)
    }

    /// Filetype definition if there is one, else the default
    pub fn get(&self, filetype: &str, name: &str) -> Option<&AnnotationDefinition> {
        self.filetype_definition(filetype, name)
            .or_else(|| self.default_definition(name))
    }

    pub fn default_definition(&self, name: &str) -> Option<&AnnotationDefinition> {
        self.tables.get(DEFAULT_FILETYPE)?.get(name)
    }

    /// Only a definition registered for exactly `filetype`
    pub fn filetype_definition(&self, filetype: &str, name: &str) -> Option<&AnnotationDefinition> {
        if filetype == DEFAULT_FILETYPE {
            return None;
        }
        self.tables.get(filetype)?.get(name)
    }

    /// Filetypes with their own table, `"default"` included
    pub fn filetypes(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(DocsError::InvalidAnnotationName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_alias_config() {
        let mut registry = AnnotationRegistry::new();
        registry.register("name", AnnotationConfig::alias(["title"])).unwrap();

        assert_eq!(registry.alias_map("js").get("title").map(String::as_str), Some("name"));
        assert_eq!(registry.canonical("js", "title").as_deref(), Some("name"));
        assert!(registry.get("js", "name").is_some());
    }

    #[test]
    fn test_filetype_overlay() {
        let mut registry = AnnotationRegistry::new();
        registry.register("name", AnnotationDefinition::new()).unwrap();
        registry
            .register("name", AnnotationDefinition::new().alias(["title"]).filetypes(["scss"]))
            .unwrap();

        assert!(registry.filetype_definition("scss", "name").is_some());
        assert!(registry.filetype_definition("js", "name").is_none());
        assert_eq!(registry.get("scss", "name").map(|d| d.alias.len()), Some(1));
        assert_eq!(registry.get("js", "name").map(|d| d.alias.len()), Some(0));
    }

    #[test]
    fn test_invalid_names() {
        let mut registry = AnnotationRegistry::new();
        assert!(matches!(
            registry.register("", AnnotationDefinition::new()),
            Err(DocsError::InvalidAnnotationName(_))
        ));
        assert!(matches!(
            registry.register("two words", AnnotationDefinition::new()),
            Err(DocsError::InvalidAnnotationName(_))
        ));
    }

    #[test]
    fn test_reserved_filetype_key() {
        let mut registry = AnnotationRegistry::new();
        let mut by_filetype = BTreeMap::new();
        by_filetype.insert("parse".to_string(), AnnotationDefinition::new());
        assert!(matches!(
            registry.register("name", AnnotationConfig::Filetypes(by_filetype)),
            Err(DocsError::InvalidAnnotationConfig { .. })
        ));
    }

    #[test]
    fn test_later_registration_replaces() {
        let mut registry = AnnotationRegistry::new();
        registry.register("note", AnnotationConfig::alias(["notes"])).unwrap();
        registry.register("note", AnnotationDefinition::new()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.alias_map("js").is_empty());
    }
}
