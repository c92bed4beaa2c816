//! @name Signature annotations
//! @description `@arg`, `@property`, `@requires`, `@returns` and `@throws`

use serde_json::{json, Value};

use super::util::{description, list, parts, ARG, REQUIRES, TYPED};
use crate::dispatch::ParseContext;
use crate::registry::AnnotationDefinition;

/// Shared by `@arg` and `@property`: `{types} name [value] - description`
fn typed_name(context: &ParseContext<'_>) -> anyhow::Result<Value> {
    let annotation = context.annotation;
    let parts = parts(&ARG, &annotation.line);
    let part = |i: usize| parts.get(i).copied().flatten();

    Ok(json!([{
        "types": list(part(0)),
        "name": part(1).unwrap_or_default(),
        "value": part(2).unwrap_or_default(),
        "description": description(part(3), annotation),
    }]))
}

/// `/// @arg {type, othertype} name [default] - description`
pub fn arg() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["argument", "param", "parameter"])
        .parse(typed_name)
}

/// `/// @property {type} name [keys] - description`
pub fn property() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["prop", "key"]).parse(typed_name)
}

/// `/// @requires {type} name - description`
pub fn requires() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["require"]).parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&REQUIRES, &annotation.line);
        let part = |i: usize| parts.get(i).copied().flatten();

        Ok(json!([{
            "types": list(part(0)),
            "name": part(1).unwrap_or_default(),
            "description": description(part(2), annotation),
        }]))
    })
}

/// `/// @returns {type} - description`; no type is recorded as `undefined`
pub fn returns() -> AnnotationDefinition {
    AnnotationDefinition::new().alias(["return"]).parse(|context| {
        let annotation = context.annotation;
        let parts = parts(&TYPED, &annotation.line);
        let types = parts.first().copied().flatten().unwrap_or("undefined");

        Ok(json!({
            "types": list(Some(types)),
            "description": description(parts.get(1).copied().flatten(), annotation),
        }))
    })
}

/// `/// @throws {type} - description`
pub fn throws() -> AnnotationDefinition {
    AnnotationDefinition::new()
        .alias(["throw", "exception", "error", "catch"])
        .parse(|context| {
            let annotation = context.annotation;
            let parts = parts(&TYPED, &annotation.line);

            Ok(json!([{
                "types": list(parts.first().copied().flatten()),
                "description": description(parts.get(1).copied().flatten(), annotation),
            }]))
        })
}
