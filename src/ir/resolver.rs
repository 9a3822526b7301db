//! Schema Resolution
//!
//! Turns raw schema fragments into [`ParsedSchema`] nodes, following `$ref`
//! pointers and merging composition keywords.
//!
//! Termination is guaranteed by a depth counter threaded through every call:
//! each `$ref` hop, property, item and composition branch adds one, and past
//! [`MAX_RESOLVE_DEPTH`] resolution yields an opaque node. Recursive models
//! therefore resolve to a few inline levels followed by `Any`; generators never
//! see the inline levels because the first named reference short-circuits.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{trace, warn};

use super::{Constraints, ParsedProperty, ParsedSchema, SchemaKind};
use crate::loader::{reference_name, resolve_pointer};

/// Depth past which resolution returns an opaque node
pub const MAX_RESOLVE_DEPTH: usize = 8;

/// Resolves schema fragments against one document
pub struct SchemaResolver<'a> {
    root: &'a Value,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Resolve a schema fragment at the given depth
    pub fn resolve(&self, value: &Value, depth: usize) -> ParsedSchema {
        if depth > MAX_RESOLVE_DEPTH {
            trace!(depth, "resolution depth exceeded; degrading to unknown");
            return ParsedSchema::any();
        }

        let Value::Object(obj) = value else {
            return ParsedSchema::any();
        };

        if let Some(Value::String(reference)) = obj.get("$ref") {
            return self.resolve_ref(reference, depth);
        }

        if let Some(Value::Array(branches)) = obj.get("allOf") {
            return self.resolve_all_of(obj, branches, depth);
        }

        for (keyword, exclusive) in [("oneOf", true), ("anyOf", false)] {
            if let Some(Value::Array(branches)) = obj.get(keyword) {
                let variants = branches
                    .iter()
                    .map(|branch| self.resolve(branch, depth + 1))
                    .collect();
                let mut node = ParsedSchema::new(SchemaKind::Union { variants, exclusive });
                apply_common(obj, &mut node);
                return node;
            }
        }

        let (type_name, type_nullable) = declared_type(obj);
        let kind = match type_name {
            Some("string") => SchemaKind::String,
            Some("integer") => SchemaKind::Integer,
            Some("number") => SchemaKind::Number,
            Some("boolean") => SchemaKind::Boolean,
            Some("array") => SchemaKind::Array {
                items: Box::new(
                    obj.get("items")
                        .map(|items| self.resolve(items, depth + 1))
                        .unwrap_or_else(ParsedSchema::any),
                ),
            },
            Some("object") => self.resolve_object(obj, depth),
            None if obj.contains_key("properties") || obj.contains_key("additionalProperties") => {
                self.resolve_object(obj, depth)
            }
            None => infer_enum_kind(obj),
            Some(_) => SchemaKind::Any,
        };

        let mut node = ParsedSchema::new(kind);
        node.nullable = type_nullable;
        apply_common(obj, &mut node);
        node
    }

    /// Follow a local reference, keeping the target's name on the node
    pub fn resolve_ref(&self, reference: &str, depth: usize) -> ParsedSchema {
        if depth + 1 > MAX_RESOLVE_DEPTH {
            trace!(reference, depth, "reference past depth ceiling; degrading to unknown");
            return ParsedSchema::any();
        }
        match resolve_pointer(self.root, reference) {
            Some(target) => {
                let mut node = self.resolve(target, depth + 1);
                node.ref_name = reference_name(reference);
                node
            }
            None => {
                warn!(reference, "unresolvable reference; degrading to unknown");
                ParsedSchema::any()
            }
        }
    }

    /// Dereference a non-schema object (parameter, request body, response).
    ///
    /// Chains of references are followed up to the depth ceiling.
    pub fn deref_object<'v>(&self, value: &'v Value) -> Option<&'v Value>
    where
        'a: 'v,
    {
        let mut current = value;
        for _ in 0..=MAX_RESOLVE_DEPTH {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => current = resolve_pointer(self.root, reference)?,
                None => return Some(current),
            }
        }
        None
    }

    fn resolve_object(&self, obj: &Map<String, Value>, depth: usize) -> SchemaKind {
        let properties = match obj.get("properties") {
            Some(Value::Object(props)) => props
                .iter()
                .map(|(name, schema)| ParsedProperty {
                    name: name.clone(),
                    schema: self.resolve(schema, depth + 1),
                })
                .collect(),
            _ => Vec::new(),
        };

        let required = match obj.get("required") {
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => BTreeSet::new(),
        };

        let additional = match obj.get("additionalProperties") {
            Some(schema @ Value::Object(_)) => Some(Box::new(self.resolve(schema, depth + 1))),
            Some(Value::Bool(true)) => Some(Box::new(ParsedSchema::any())),
            _ => None,
        };

        SchemaKind::Object {
            properties,
            required,
            additional,
        }
    }

    fn resolve_all_of(&self, obj: &Map<String, Value>, branches: &[Value], depth: usize) -> ParsedSchema {
        let mut parsed: Vec<ParsedSchema> = branches
            .iter()
            .map(|branch| self.resolve(branch, depth + 1))
            .collect();
        let has_siblings = obj.contains_key("properties") || obj.contains_key("required");

        // `allOf: [$ref]` wrappers (used to attach nullable/description) stay named
        if parsed.len() == 1 && !has_siblings {
            let mut node = parsed.remove(0);
            apply_common(obj, &mut node);
            return node;
        }

        if has_siblings {
            parsed.push(ParsedSchema::new(self.resolve_object(obj, depth)));
        }

        let mut node = merge_all_of(parsed);
        apply_common(obj, &mut node);
        node
    }
}

/// Structurally merge `allOf` branches into one object node.
///
/// Property maps and required sets are unioned. When two branches declare the
/// same property, the later branch's schema replaces the earlier one while the
/// property keeps its first position. Non-object branches contribute nothing.
pub fn merge_all_of(branches: Vec<ParsedSchema>) -> ParsedSchema {
    let mut properties: Vec<ParsedProperty> = Vec::new();
    let mut required = BTreeSet::new();
    let mut additional = None;

    for branch in branches {
        let SchemaKind::Object {
            properties: branch_props,
            required: branch_required,
            additional: branch_additional,
        } = branch.kind
        else {
            continue;
        };

        for prop in branch_props {
            match properties.iter_mut().find(|p| p.name == prop.name) {
                Some(existing) => existing.schema = prop.schema,
                None => properties.push(prop),
            }
        }
        required.extend(branch_required);
        if branch_additional.is_some() {
            additional = branch_additional;
        }
    }

    ParsedSchema::new(SchemaKind::Object {
        properties,
        required,
        additional,
    })
}

/// Read `type`, accepting the 3.1 array form (`["string", "null"]`)
fn declared_type(obj: &Map<String, Value>) -> (Option<&str>, bool) {
    match obj.get("type") {
        Some(Value::String(name)) => (Some(name.as_str()), false),
        Some(Value::Array(names)) => {
            let nullable = names.iter().any(|n| n.as_str() == Some("null"));
            let name = names
                .iter()
                .filter_map(Value::as_str)
                .find(|n| *n != "null");
            (name, nullable)
        }
        _ => (None, false),
    }
}

/// Untyped schemas with an `enum` take their kind from the values
fn infer_enum_kind(obj: &Map<String, Value>) -> SchemaKind {
    let values: Vec<&Value> = match (obj.get("enum"), obj.get("const")) {
        (Some(Value::Array(values)), _) => values.iter().filter(|v| !v.is_null()).collect(),
        (None, Some(value)) => vec![value],
        _ => return SchemaKind::Any,
    };
    if values.is_empty() {
        SchemaKind::Any
    } else if values.iter().all(|v| v.is_string()) {
        SchemaKind::String
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        SchemaKind::Integer
    } else if values.iter().all(|v| v.is_number()) {
        SchemaKind::Number
    } else if values.iter().all(|v| v.is_boolean()) {
        SchemaKind::Boolean
    } else {
        SchemaKind::Any
    }
}

/// Copy keyword-level attributes that apply to every kind
fn apply_common(obj: &Map<String, Value>, node: &mut ParsedSchema) {
    if let Some(Value::String(format)) = obj.get("format") {
        node.format = Some(format.clone());
    }
    if obj.get("nullable") == Some(&Value::Bool(true)) {
        node.nullable = true;
    }
    if let Some(Value::String(description)) = obj.get("description") {
        node.description = Some(description.clone());
    }

    match (obj.get("enum"), obj.get("const")) {
        (Some(Value::Array(values)), _) => {
            if values.iter().any(Value::is_null) {
                node.nullable = true;
            }
            node.enum_values = values.iter().filter(|v| !v.is_null()).cloned().collect();
        }
        (None, Some(value)) if !value.is_null() => node.enum_values = vec![value.clone()],
        _ => {}
    }

    let constraints = Constraints {
        min_length: obj.get("minLength").and_then(Value::as_u64),
        max_length: obj.get("maxLength").and_then(Value::as_u64),
        pattern: obj.get("pattern").and_then(Value::as_str).map(str::to_string),
        minimum: obj.get("minimum").and_then(Value::as_f64),
        maximum: obj.get("maximum").and_then(Value::as_f64),
        min_items: obj.get("minItems").and_then(Value::as_u64),
        max_items: obj.get("maxItems").and_then(Value::as_u64),
    };
    if !constraints.is_empty() {
        node.constraints = constraints;
    }
}
