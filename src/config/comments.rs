//! @name Comment styles
//! @description Per-language comment markers, with a `_` fallback
//!
//! Styles are keyed by comma separated language lists (`"rb, py"`). A
//! language inherits every field it leaves out from `_`, or from another
//! language named in `extend`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DocsError, Result};
use crate::tokenizer::{CommentGrammar, CommentKind};

/// Key of the fallback style
pub const FALLBACK: &str = "_";

/// Markers of one comment kind as written in a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, alias = "line", skip_serializing_if = "Option::is_none")]
    pub single: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl MarkerConfig {
    pub fn new(start: &str, single: &str, end: &str) -> Self {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            start: opt(start),
            single: opt(single),
            end: opt(end),
        }
    }
}

/// Comment style of one language entry. Missing fields are inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStyleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_prefix: Option<String>,
    /// File level comment block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<MarkerConfig>,
    /// Comment blocks documenting code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<MarkerConfig>,
    /// Language whose style this one copies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend: Option<String>,
}

impl CommentStyleConfig {
    fn markers(header: MarkerConfig, body: MarkerConfig) -> Self {
        Self {
            header: Some(header),
            body: Some(body),
            ..Self::default()
        }
    }

    /// Fills fields left out here from `base`
    fn over(&self, base: &CommentStyleConfig) -> CommentStyleConfig {
        CommentStyleConfig {
            prefix: self.prefix.clone().or_else(|| base.prefix.clone()),
            inline_prefix: self.inline_prefix.clone().or_else(|| base.inline_prefix.clone()),
            header: self.header.clone().or_else(|| base.header.clone()),
            body: self.body.clone().or_else(|| base.body.clone()),
            extend: None,
        }
    }
}

/// The comment styles shipped with the crate
pub fn builtin_styles() -> BTreeMap<String, CommentStyleConfig> {
    let mut styles = BTreeMap::new();

    styles.insert(
        FALLBACK.to_string(),
        CommentStyleConfig {
            prefix: Some("@".to_string()),
            inline_prefix: Some("#".to_string()),
            ..CommentStyleConfig::markers(MarkerConfig::new("////", "///", "////"), MarkerConfig::new("", "///", ""))
        },
    );
    styles.insert(
        "css".to_string(),
        CommentStyleConfig::markers(MarkerConfig::new("/***", "*", "***/"), MarkerConfig::new("/**", "*", "**/")),
    );
    styles.insert(
        "rb, py, coffee, sh, bash, pl".to_string(),
        CommentStyleConfig::markers(MarkerConfig::new("###", "##", "###"), MarkerConfig::new("", "##", "")),
    );
    styles.insert(
        "html, md, markdown, mark, mdown, mkdn, mdml, mkd, mdwn, mdtxt, mdtext, text".to_string(),
        CommentStyleConfig::markers(MarkerConfig::new("<!----", "", "---->"), MarkerConfig::new("<!---", "", "--->")),
    );
    styles.insert(
        "jade".to_string(),
        CommentStyleConfig::markers(MarkerConfig::new("//-//", "//-/", "//-//"), MarkerConfig::new("", "//-/", "")),
    );
    styles.insert(
        "cfm".to_string(),
        CommentStyleConfig::markers(
            MarkerConfig::new("<!-----", "", "----->"),
            MarkerConfig::new("<!----", "", "---->"),
        ),
    );

    styles
}

/// Splits `"rb, py"` style keys into one entry per language.
fn expand(styles: &BTreeMap<String, CommentStyleConfig>, into: &mut BTreeMap<String, CommentStyleConfig>) {
    for (key, style) in styles {
        for lang in key.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            into.insert(lang.to_string(), style.clone());
        }
    }
}

// ============================================================================
// Resolved table
// ============================================================================

/// Header and body grammars of one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageComments {
    pub header: CommentGrammar,
    pub body: CommentGrammar,
}

impl LanguageComments {
    pub fn grammar(&self, kind: CommentKind) -> &CommentGrammar {
        match kind {
            CommentKind::Header => &self.header,
            CommentKind::Body => &self.body,
        }
    }

    /// Markers that, followed by the prefix, quote a nested comment
    pub fn quoted_markers(&self) -> Vec<&str> {
        [&self.header, &self.body]
            .into_iter()
            .filter_map(|g| g.single.as_deref().or(g.start.as_deref()))
            .collect()
    }

    /// True when the text could contain a header or body comment
    pub fn appears_in(&self, contents: &str) -> bool {
        self.header.appears_in(contents) || self.body.appears_in(contents)
    }
}

/// @description "Resolved comment grammars for every configured language"
#[derive(Debug, Clone, Serialize)]
pub struct CommentTable {
    fallback: LanguageComments,
    languages: BTreeMap<String, LanguageComments>,
}

impl Default for CommentTable {
    fn default() -> Self {
        // the built-in table is known to resolve
        Self::resolve(&BTreeMap::new()).unwrap_or_else(|_| Self {
            fallback: LanguageComments {
                header: CommentGrammar::multi("////", "////").with_single("///"),
                body: CommentGrammar::single("///"),
            },
            languages: BTreeMap::new(),
        })
    }
}

impl CommentTable {
    /// Resolves the built-in styles overlaid with `user` styles.
    ///
    /// A user entry for a language replaces the built-in one. A user `_`
    /// entry only overrides the fields it sets.
    pub fn resolve(user: &BTreeMap<String, CommentStyleConfig>) -> Result<Self> {
        let mut raw = BTreeMap::new();
        expand(&builtin_styles(), &mut raw);

        let mut overrides = BTreeMap::new();
        expand(user, &mut overrides);
        for (lang, style) in overrides {
            let style = match (lang.as_str(), raw.get(FALLBACK)) {
                (FALLBACK, Some(builtin)) => style.over(builtin),
                _ => style,
            };
            raw.insert(lang, style);
        }

        let fallback_style = raw.get(FALLBACK).cloned().unwrap_or_default();
        let fallback = build(FALLBACK, &fallback_style)?;

        let mut languages = BTreeMap::new();
        for lang in raw.keys().filter(|l| l.as_str() != FALLBACK) {
            let style = flatten(lang, &raw, &fallback_style, 0)?;
            languages.insert(lang.clone(), build(lang, &style)?);
        }

        Ok(Self { fallback, languages })
    }

    /// Grammars for a filetype, falling back to `_`
    pub fn for_filetype(&self, filetype: &str) -> &LanguageComments {
        self.languages.get(filetype).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &LanguageComments {
        &self.fallback
    }

    pub fn languages(&self) -> impl Iterator<Item = (&str, &LanguageComments)> {
        self.languages.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Follows `extend` chains and fills the rest from the fallback.
fn flatten(
    lang: &str,
    raw: &BTreeMap<String, CommentStyleConfig>,
    fallback: &CommentStyleConfig,
    depth: usize,
) -> Result<CommentStyleConfig> {
    let style = raw
        .get(lang)
        .ok_or_else(|| DocsError::Config(format!("the '{}' comment style doesn't exist", lang)))?;

    let Some(target) = style.extend.as_deref() else {
        return Ok(style.over(fallback));
    };
    if depth >= raw.len() {
        return Err(DocsError::Config(format!("'extend' loops back to '{}'", lang)));
    }
    if target == FALLBACK {
        return Ok(style.over(fallback));
    }
    if !raw.contains_key(target) {
        return Err(DocsError::Config(format!(
            "'{}' extends the '{}' comment style, which doesn't exist",
            lang, target
        )));
    }
    let base = flatten(target, raw, fallback, depth + 1)?;
    Ok(style.over(&base))
}

fn build(lang: &str, style: &CommentStyleConfig) -> Result<LanguageComments> {
    let prefix = style.prefix.clone().unwrap_or_else(crate::tokenizer::grammar::default_prefix);
    let grammar = |markers: &Option<MarkerConfig>, kind: &str| -> Result<CommentGrammar> {
        let markers = markers
            .clone()
            .ok_or_else(|| DocsError::Config(format!("'{}' has no {} comment markers", lang, kind)))?;
        let grammar = CommentGrammar {
            single: markers.single,
            start: markers.start,
            end: markers.end,
            prefix: prefix.clone(),
            inline_prefix: style.inline_prefix.clone(),
        }
        .cleaned();
        grammar
            .validate()
            .map_err(|e| DocsError::Config(format!("{} comments of '{}': {}", kind, lang, e)))?;
        Ok(grammar)
    };

    Ok(LanguageComments {
        header: grammar(&style.header, "header")?,
        body: grammar(&style.body, "body")?,
    })
}
