//! Value marshaler - target values to client records, and text back to
//! target values.
//!
//! Summaries are short single-line renderings; field enumeration walks the
//! declaring-class chain; parsing supports the primitive grammars and the
//! runtime's string type. Every object-backed value that leaves this module
//! is recorded in the session's identity cache so the client can dereference
//! it later.

use std::sync::Arc;

use ember_wire::{
    ArrayReference, ObjectReference, ReferenceType, VirtualMachine, WireError, WireValue,
};

use crate::objects::ObjectRegistry;
use crate::protocol::{ClassField, DebugValue};

/// Array summaries show at most this many leading elements.
const ARRAY_PREVIEW_LEN: usize = 3;

/// Nesting bound for summaries, so self-referential structures terminate.
const MAX_SUMMARY_DEPTH: usize = 8;

/// Rendering of a value whose contents could not be read.
pub const UNREADABLE: &str = "???";

// ── Summaries ────────────────────────────────────────────────────────────────

/// Render a short single-line summary of a target value.
///
/// Booleans and numbers render their literal; characters are single-quoted;
/// strings are double-quoted; arrays show up to three elements; plain
/// objects render `Instance of <Type>`. Reference-box objects (a single
/// `elem` field on a `*.XxxRef` type) summarize as their boxed value.
pub fn summary(value: &WireValue) -> String {
    summary_at(value, 0)
}

fn summary_at(value: &WireValue, depth: usize) -> String {
    if depth > MAX_SUMMARY_DEPTH {
        return "...".to_string();
    }
    match value {
        WireValue::Null => "null".to_string(),
        WireValue::Boolean(v) => v.to_string(),
        WireValue::Byte(v) => v.to_string(),
        WireValue::Short(v) => v.to_string(),
        WireValue::Int(v) => v.to_string(),
        WireValue::Long(v) => v.to_string(),
        WireValue::Float(v) => v.to_string(),
        WireValue::Double(v) => v.to_string(),
        WireValue::Char(v) => format!("'{v}'"),
        WireValue::String(s) => format!("\"{}\"", s.value()),
        WireValue::Array(a) => array_summary(a, depth),
        WireValue::Object(o) => object_summary(o, depth),
    }
}

fn array_summary(array: &Arc<dyn ArrayReference>, depth: usize) -> String {
    let len = array.length();
    let preview = len.min(ARRAY_PREVIEW_LEN);
    let elements = match array.get_values(0, preview) {
        Ok(values) => values,
        Err(_) => return UNREADABLE.to_string(),
    };
    let mut parts: Vec<String> = elements
        .iter()
        .map(|v| summary_at(v, depth + 1))
        .collect();
    if len > ARRAY_PREVIEW_LEN {
        parts.push("...".to_string());
    }
    format!("[{}]", parts.join(", "))
}

fn object_summary(object: &Arc<dyn ObjectReference>, depth: usize) -> String {
    let type_name = object.reference_type().name();
    if is_ref_box_type(&type_name) {
        if let Some(elem) = object.get_field("elem") {
            return summary_at(&elem, depth + 1);
        }
    }
    format!("Instance of {}", last_name_component(&type_name))
}

/// The last dot-separated component of a qualified type name.
pub fn last_name_component(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

// Recognizes reference-box types: a qualified name whose last component is a
// capitalized word followed by `Ref` (e.g. `scala.runtime.IntRef`).
fn is_ref_box_type(type_name: &str) -> bool {
    if !type_name.contains('.') {
        return false;
    }
    let last = last_name_component(type_name);
    let Some(stem) = last.strip_suffix("Ref") else {
        return false;
    };
    let mut chars = stem.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.clone().next().is_some() && chars.all(|c| c.is_ascii_lowercase())
}

// ── Field enumeration ────────────────────────────────────────────────────────

/// Collect the fields of an object, walking the declaring-class chain upward.
///
/// Fields keep declaration order within each class; ordinals run over the
/// concatenated list. Static fields read from the declaring class, instance
/// fields from the object. A field whose value cannot be read renders as
/// `"???"` instead of failing the enumeration.
pub fn object_fields(object: &Arc<dyn ObjectReference>) -> Vec<ClassField> {
    let mut out = Vec::new();
    let mut class: Option<Arc<dyn ReferenceType>> = Some(object.reference_type());
    while let Some(current) = class {
        for field in current.fields() {
            let value = if field.is_static {
                current.get_static(&field.name)
            } else {
                object.get_field(&field.name)
            };
            let summary = value
                .map(|v| summary_at(&v, 1))
                .unwrap_or_else(|| UNREADABLE.to_string());
            out.push(ClassField {
                index: out.len() as i32,
                name: field.name,
                type_name: field.type_name,
                summary,
            });
        }
        class = current.superclass();
    }
    out
}

// ── Marshaling ───────────────────────────────────────────────────────────────

/// Convert a target value into its client record, recording object-backed
/// values in the identity cache.
pub fn marshal(value: &WireValue, objects: &mut ObjectRegistry) -> DebugValue {
    match value {
        WireValue::Null => DebugValue::Null,
        WireValue::Boolean(_)
        | WireValue::Byte(_)
        | WireValue::Short(_)
        | WireValue::Int(_)
        | WireValue::Long(_)
        | WireValue::Float(_)
        | WireValue::Double(_)
        | WireValue::Char(_) => DebugValue::Primitive {
            summary: summary(value),
            type_name: value.type_name(),
        },
        WireValue::String(s) => {
            objects.remember(value);
            let object = s.clone() as Arc<dyn ObjectReference>;
            DebugValue::String {
                summary: summary(value),
                fields: object_fields(&object),
                type_name: value.type_name(),
                object_id: s.unique_id(),
            }
        }
        WireValue::Array(a) => {
            objects.remember(value);
            DebugValue::Array {
                length: a.length() as u32,
                type_name: value.type_name(),
                element_type_name: a.element_type_name(),
                object_id: a.unique_id(),
            }
        }
        WireValue::Object(o) => {
            objects.remember(value);
            DebugValue::Object {
                summary: summary(value),
                fields: object_fields(o),
                type_name: value.type_name(),
                object_id: o.unique_id(),
            }
        }
    }
}

// ── Text to value ────────────────────────────────────────────────────────────

/// Parse client text into a target value of the given declared type.
///
/// Primitive types use their literal grammar on the trimmed input. The
/// runtime's string type strips one pair of surrounding double quotes if
/// present and mirrors the rest verbatim. Any other type is unsupported.
pub fn parse_value(
    vm: &Arc<dyn VirtualMachine>,
    type_name: &str,
    text: &str,
) -> Result<WireValue, WireError> {
    let trimmed = text.trim();
    match type_name {
        "boolean" => parse_literal(trimmed, WireValue::Boolean),
        "byte" => parse_literal(trimmed, WireValue::Byte),
        "short" => parse_literal(trimmed, WireValue::Short),
        "int" => parse_literal(trimmed, WireValue::Int),
        "long" => parse_literal(trimmed, WireValue::Long),
        "float" => parse_literal(trimmed, WireValue::Float),
        "double" => parse_literal(trimmed, WireValue::Double),
        "char" => parse_char(trimmed),
        _ if is_string_type(type_name) => vm.mirror_string(strip_quotes(trimmed, '"')),
        other => Err(WireError::Unsupported(format!(
            "cannot create a value of type {other} from text"
        ))),
    }
}

fn parse_literal<T: std::str::FromStr>(
    text: &str,
    wrap: impl FnOnce(T) -> WireValue,
) -> Result<WireValue, WireError> {
    text.parse::<T>()
        .map(wrap)
        .map_err(|_| WireError::Unsupported(format!("invalid literal: {text}")))
}

fn parse_char(text: &str) -> Result<WireValue, WireError> {
    let inner = strip_quotes(text, '\'');
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(WireValue::Char(c)),
        _ => Err(WireError::Unsupported(format!(
            "invalid character literal: {text}"
        ))),
    }
}

fn is_string_type(type_name: &str) -> bool {
    last_name_component(type_name) == "String"
}

// Strips exactly one pair of surrounding quotes, when both are present.
fn strip_quotes(text: &str, quote: char) -> &str {
    let stripped = text
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote));
    stripped.unwrap_or(text)
}
