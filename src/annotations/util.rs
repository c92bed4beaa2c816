//! @name Annotation helpers
//! @description Head-line patterns and value helpers shared by the built-in annotations
//!
//! Head lines follow a loose `(id) {types} name [value] - description`
//! shape where every part is optional. Each annotation picks the parts it
//! understands.

use std::sync::LazyLock;

use regex::Regex;

use crate::annotation::Annotation;

const TYPES: &str = r"(?:\{(.*)\})?";
const NAME: &str = r"([^\s]*)?";
const SPACE: &str = r"(?:\s*)?";
const VALUE: &str = r"(?:\[(.*)\])?";
const ID: &str = r"(?:\((.*)\))?";
const DESCRIPTION: &str = r"(?:\s*-?\s+)?(.*)?";

fn pattern(parts: &[&str]) -> Regex {
    Regex::new(&format!("(?i)^{}", parts.concat())).unwrap()
}

/// `{types} name [value] - description`
pub static ARG: LazyLock<Regex> =
    LazyLock::new(|| pattern(&[TYPES, SPACE, NAME, SPACE, VALUE, SPACE, DESCRIPTION]));

/// `{types} - description`
pub static TYPED: LazyLock<Regex> = LazyLock::new(|| pattern(&[TYPES, SPACE, DESCRIPTION]));

/// `(id) {language} [settings] - description`
pub static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| pattern(&[ID, SPACE, TYPES, SPACE, VALUE, SPACE, DESCRIPTION]));

/// `{types} name - description`
pub static REQUIRES: LazyLock<Regex> = LazyLock::new(|| pattern(&[TYPES, SPACE, NAME, DESCRIPTION]));

/// `(markup id) rest`
pub static STATE_ID: LazyLock<Regex> = LazyLock::new(|| pattern(&[ID, SPACE, "(.*)"]));

/// `{state} [id] - description`, also `@todo {importance} [assignees] - description`
pub static STATE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&[TYPES, SPACE, VALUE, SPACE, DESCRIPTION]));

/// Capture groups after the whole match. Empty groups count as missing.
pub fn parts<'t>(pattern: &Regex, text: &'t str) -> Vec<Option<&'t str>> {
    let Some(caps) = pattern.captures(text) else {
        return vec![None; pattern.captures_len().saturating_sub(1)];
    };
    caps.iter()
        .skip(1)
        .map(|m| m.map(|m| m.as_str()).filter(|s| !s.is_empty()))
        .collect()
}

/// Comma separated list, trimmed, empties dropped
pub fn list(text: Option<&str>) -> Vec<String> {
    text.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma or newline separated entries from the head line and the body
pub fn multiple(annotation: &Annotation) -> Vec<String> {
    std::iter::once(annotation.line.as_str())
        .chain(annotation.contents.iter().map(String::as_str))
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `""`/`"true"` → true, `"false"` → false. `None` for anything else or
/// when the annotation has a body.
pub fn to_boolean(annotation: &Annotation) -> Option<bool> {
    if !annotation.contents.is_empty() {
        return None;
    }
    match annotation.line.as_str() {
        "false" => Some(false),
        "" | "true" => Some(true),
        _ => None,
    }
}

/// The description from the head line followed by the annotation body
pub fn description(head: Option<&str>, annotation: &Annotation) -> String {
    let mut parts: Vec<&str> = head.into_iter().collect();
    parts.extend(annotation.contents.iter().map(String::as_str));
    crate::text::join_text(&parts)
}
