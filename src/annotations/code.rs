//! @name Code annotations
//! @description `@markup`, `@states`, `@raw-code` and the autofilled `@blockinfo`

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{json, Map, Value};

use super::util::{list, parts, MARKUP, STATE, STATE_ID};
use crate::dispatch::{ParseContext, ResolveContext};
use crate::registry::AnnotationDefinition;
use crate::report::Diagnostic;
use crate::text::escape_html;
use crate::tokenizer::{CommentKind, Span};

/// `${@state...}` references inside markup
static STATE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*\$\{@states?[^}]*\}\s*").unwrap());

fn lineno(value: Option<usize>) -> Value {
    value.map(|n| json!(n)).unwrap_or_else(|| json!(-1))
}

fn span_info(span: &Span) -> Value {
    json!({ "start": lineno(span.start), "end": lineno(span.end) })
}

// ============================================================================
// @blockinfo
// ============================================================================

/// Where the block sits in its file. Only meant to be autofilled.
pub fn blockinfo() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .parse(|context| {
            context.warn("Passed @blockinfo, it's only supposed to be an autofilled annotation", &[]);
            Ok(Value::Null)
        })
        .autofill(|context| {
            let kind = match context.kind {
                CommentKind::Header => "header",
                CommentKind::Body => "body",
            };
            let mut comment = span_info(context.comment);
            comment["type"] = json!(kind);

            Ok(Some(json!({
                "comment": comment,
                "code": span_info(context.code),
                "file": {
                    "path": context.file.path,
                    "start": context.file.start,
                    "end": context.file.end,
                },
            })))
        })
}

// ============================================================================
// @raw-code
// ============================================================================

/// The code below the comment, raw and HTML-escaped
pub fn raw_code() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let raw = context.code.contents.join("\n");
        Ok(json!({ "escaped": escape_html(&raw), "raw": raw }))
    })
}

// ============================================================================
// @markup
// ============================================================================

/// `/// @markup (id) {language} [settings] - description` followed by code
pub fn markup() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["code", "example", "output", "outputs"])
        .parse(parse_markup)
        .resolve(|value, _| {
            let Value::Array(mut items) = value else {
                return Ok(None);
            };
            for (i, item) in items.iter_mut().enumerate() {
                if item.get("id").map(Value::is_null).unwrap_or(false) {
                    item["id"] = json!(i.to_string());
                }
            }
            Ok(Some(Value::Array(items)))
        })
}

fn parse_markup(context: &ParseContext<'_>) -> anyhow::Result<Value> {
    let annotation = context.annotation;
    let parts = parts(&MARKUP, &annotation.line);
    let part = |i: usize| parts.get(i).copied().flatten();

    let settings: Map<String, Value> = list(part(2))
        .into_iter()
        .map(|setting| match setting.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), json!(value.trim())),
            None => (setting, Value::Null),
        })
        .collect();

    let raw = annotation.body();
    let escaped = escape_html(&raw);

    Ok(json!([{
        "id": part(0),
        "language": part(1).unwrap_or(context.file.filetype.as_str()),
        "settings": settings,
        "description": part(3).unwrap_or_default(),
        "raw_stateless": STATE_REFERENCE.replace_all(&raw, "").into_owned(),
        "escaped_stateless": STATE_REFERENCE.replace_all(&escaped, "").into_owned(),
        "raw": raw,
        "escaped": escaped,
    }]))
}

// ============================================================================
// @states
// ============================================================================

/// States of the documented item, linked to a `@markup` block.
///
/// ```text
/// /// @states (markup-id)
/// /// {.is-active} [active] - description
/// ```
pub fn states() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["state"])
        .parse(|context| {
            let annotation = context.annotation;
            let head = parts(&STATE_ID, &annotation.line);
            let markup_id = head.first().copied().flatten();

            let lines = head
                .get(1)
                .copied()
                .flatten()
                .into_iter()
                .chain(annotation.contents.iter().map(String::as_str))
                .filter(|l| !l.trim().is_empty());

            let mut state = Map::new();
            for (i, line) in lines.enumerate() {
                let parts = parts(&STATE, line);
                let part = |i: usize| parts.get(i).copied().flatten();
                let id = part(1).map(str::to_string).unwrap_or_else(|| i.to_string());
                state.insert(
                    id,
                    json!({
                        "state": part(0).unwrap_or_default(),
                        "description": part(2).unwrap_or_default(),
                    }),
                );
            }

            Ok(json!([{ "markup_id": markup_id, "state": state }]))
        })
        .resolve(resolve_states)
}

fn resolve_states(value: Value, context: &ResolveContext<'_>) -> anyhow::Result<Option<Value>> {
    let Value::Array(items) = value else {
        return Ok(None);
    };
    let markups = context.parsed.get("markup").and_then(Value::as_array);
    let positions = context.positions(context.name);
    let markup_positions = context.positions("markup");
    let error = |message: String| {
        context
            .log
            .error(Diagnostic::new(message).in_file(&context.file.path));
    };

    let mut result = Map::new();
    for (k, item) in items.into_iter().enumerate() {
        let state = item.get("state").cloned().unwrap_or_else(|| json!({}));
        let wanted = item.get("markup_id").and_then(Value::as_str).map(str::to_string);

        let markup = match (markups, &wanted) {
            (None, _) => {
                error("There's no instance of a '@markup' annotation".to_string());
                None
            }
            (Some(markups), Some(id)) => {
                let found = markups.iter().find(|m| m.get("id").and_then(Value::as_str) == Some(id.as_str()));
                if found.is_none() {
                    error(format!("There's no instance of a '@markup' annotation with an id of {}", id));
                }
                found
            }
            (Some(markups), None) => {
                let start = positions.get(k).and_then(|p| p.start).unwrap_or(0);
                let index = markup_positions.iter().position(|p| p.start.map(|s| s > start).unwrap_or(false));
                let found = index.and_then(|i| markups.get(i));
                if found.is_none() {
                    error(format!("There's no instance of a '@markup' annotation after line {}", start));
                }
                found
            }
        };

        let key = markup
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(wanted)
            .unwrap_or_else(|| "undefined".to_string());

        let markup = match markup {
            Some(markup) => link_markup(markup, &state, context),
            None => json!({}),
        };

        let entry = result.entry(key).or_insert_with(|| json!([]));
        if let Value::Array(entries) = entry {
            entries.push(json!({ "state": state, "markup": markup }));
        }
    }

    Ok(Some(Value::Object(result)))
}

/// Copy of `markup` with `${@state...}` references filled in from `state`
fn link_markup(markup: &Value, state: &Value, context: &ResolveContext<'_>) -> Value {
    let mut markup = markup.clone();
    if let Value::Object(fields) = &mut markup {
        fields.remove("raw_stateless");
        fields.remove("escaped_stateless");
    }

    // `@state.description` reads the first state
    let mut lookup = state.as_object().cloned().unwrap_or_default();
    let first = lookup.values().next().and_then(Value::as_object).cloned();
    if let Some(first) = first {
        lookup.extend(first);
    }

    let names: Vec<String> = std::iter::once(context.name.to_string())
        .chain(context.alias.iter().cloned())
        .map(|n| regex::escape(&n))
        .collect();
    let Ok(reference) = Regex::new(&format!(r"\$\{{@(?:{})([^}}]*)\}}", names.join("|"))) else {
        return markup;
    };

    for field in ["raw", "escaped"] {
        if let Some(text) = markup.get(field).and_then(Value::as_str) {
            let replaced = reference
                .replace_all(text, |caps: &Captures<'_>| interpolate(&caps[1], &lookup))
                .into_owned();
            markup[field] = json!(replaced);
        }
    }
    markup
}

/// Value for one reference. `path` is what follows the annotation name:
/// `""`, `.description`, `[1].state`.
fn interpolate(path: &str, states: &Map<String, Value>) -> String {
    let path = path.get(1..).unwrap_or_default();
    let clean = |s: &str| s.replace(['[', ']', '.'], "");

    let value = if path.is_empty() {
        states.get("state")
    } else {
        let split = match (path.find('.'), path.find('[')) {
            (Some(dot), Some(bracket)) => Some(dot.max(bracket)),
            (dot, bracket) => dot.or(bracket),
        };
        match split {
            Some(i) => states
                .get(&clean(&path[..i]))
                .and_then(|s| s.get(clean(&path[i..]))),
            None => states.get(&clean(path)).map(|v| v.get("state").unwrap_or(v)),
        }
    };

    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states_map() -> Map<String, Value> {
        let state = json!({
            "0": { "state": ".is-active", "description": "active" },
            "hover": { "state": ":hover", "description": "hovered" },
        });
        let mut lookup = state.as_object().cloned().unwrap();
        let first = lookup["0"].as_object().cloned().unwrap();
        lookup.extend(first);
        lookup
    }

    #[test]
    fn test_interpolate_paths() {
        let states = states_map();
        assert_eq!(interpolate("", &states), ".is-active");
        assert_eq!(interpolate(".description", &states), "active");
        assert_eq!(interpolate("[hover].state", &states), ":hover");
        assert_eq!(interpolate(".hover", &states), ":hover");
        assert_eq!(interpolate(".missing", &states), "undefined");
    }

    #[test]
    fn test_state_references_are_stripped() {
        let raw = "<div class=\"btn ${@state}\">";
        assert_eq!(STATE_REFERENCE.replace_all(raw, ""), "<div class=\"btn\">");
    }
}
