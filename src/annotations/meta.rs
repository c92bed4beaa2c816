//! @name Descriptive annotations
//! @description Names, descriptions, authorship and versioning

use serde_json::{json, Value};

use super::util::{description, list, multiple, parts, to_boolean, STATE, TYPED};
use crate::registry::AnnotationDefinition;

/// `public` unless the line says `private` or `protected`. Autofilled.
pub fn access() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .parse(|context| {
            let access = match context.annotation.line.as_str() {
                line @ ("private" | "protected") => line,
                _ => "public",
            };
            Ok(json!(access))
        })
        .autofill(|_| Ok(Some(json!("public"))))
}

/// `/// @author One, Two`
pub fn author() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["authors"])
        .parse(|context| Ok(json!(multiple(context.annotation))))
}

/// `true`/`false`, or the list of things it chains
pub fn chainable() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["chain"]).parse(|context| {
        Ok(match to_boolean(context.annotation) {
            Some(flag) => Value::Bool(flag),
            None => json!(multiple(context.annotation)),
        })
    })
}

/// `/// @deprecated {version} - description`
pub fn deprecated() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);

        Ok(json!({
            "version": parts.first().copied().flatten().unwrap_or("0"),
            "description": description(parts.get(1).copied().flatten(), annotation),
        }))
    })
}

pub fn description_annotation() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["desc", "definition", "explanation", "writeup", "summary", "summarization"])
        .parse(|context| {
            let annotation = context.annotation;
            Ok(json!(description(Some(annotation.line.as_str()), annotation)))
        })
}

/// The head line as-is
pub fn name() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["title", "heading", "header"])
}

/// `/// @note {importance} - description`
pub fn note() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["notes"]).parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);

        Ok(json!([{
            "importance": parts.first().copied().flatten().unwrap_or("0"),
            "description": description(parts.get(1).copied().flatten(), annotation),
        }]))
    })
}

/// `/// @since {version} - description`
pub fn since() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);

        Ok(json!({
            "version": parts.first().copied().flatten().unwrap_or("undefined"),
            "description": description(parts.get(1).copied().flatten(), annotation),
        }))
    })
}

/// `/// @todo {importance} [assignee, assignee] - description`
pub fn todo() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&STATE, &annotation.line);
        let part = |i: usize| parts.get(i).copied().flatten();

        Ok(json!([{
            "importance": part(0).unwrap_or("0"),
            "assignees": list(part(1)),
            "description": description(part(2), annotation),
        }]))
    })
}

/// `/// @type {type} - description`; warns and records `undefined` without a type
pub fn type_annotation() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);
        let head = parts.get(1).copied().flatten();

        let kind = match parts.first().copied().flatten() {
            Some(kind) => kind,
            None => {
                context.warn("You didn't pass in a type to @type", &[expected_line("type", head)]);
                "undefined"
            }
        };

        Ok(json!({
            "type": kind,
            "description": description(head, annotation),
        }))
    })
}

/// `/// @version {version} - description`; warns and records `undefined` without a version
pub fn version() -> AnnotationDefinition {
    AnnotationDefinition::new().parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);
        let head = parts.get(1).copied().flatten();

        let version = match parts.first().copied().flatten() {
            Some(version) => version,
            None => {
                context.warn("You didn't pass in a version to @version", &[expected_line("version", head)]);
                "undefined"
            }
        };

        Ok(json!({
            "version": version,
            "description": description(head, annotation),
        }))
    })
}

/// What the head line should have looked like, for warning snippets
fn expected_line(name: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("@{} {{{}}} - {}", name, name, description),
        None => format!("@{} {{{}}}", name, name),
    }
}
