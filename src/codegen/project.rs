//! Schema Projectors
//!
//! Two pure recursive transforms over one IR node:
//! - [`project_type`]: IR → TypeScript type expression
//! - [`project_validator`]: IR → zod validator expression
//!
//! Optional/nullable decisions for object members come from
//! [`field_modifiers`] alone, so the two trees always agree.

use std::collections::BTreeSet;

use serde_json::Value;

use super::ast::{Expr, Field, Param, Prop, TypeExpr};
use super::printer::{print_expr, print_type};
use crate::ir::{ParsedSchema, SchemaKind};
use crate::names::to_pascal_case;

/// Suffix for named validator constants (`Product` → `ProductSchema`)
pub const VALIDATOR_SUFFIX: &str = "Schema";

/// TypeScript name for a component
pub fn type_ident(name: &str) -> String {
    to_pascal_case(name)
}

/// Validator constant name for a component
pub fn validator_ident(name: &str) -> String {
    format!("{}{}", type_ident(name), VALIDATOR_SUFFIX)
}

/// How an object member is modified in both projections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldModifiers {
    pub optional: bool,
    pub nullable: bool,
}

pub fn field_modifiers(name: &str, schema: &ParsedSchema, required: &BTreeSet<String>) -> FieldModifiers {
    FieldModifiers {
        optional: !required.contains(name),
        nullable: schema.nullable,
    }
}

// =============================================================================
// Type Projector
// =============================================================================

/// Project a node to a type; nullable nodes gain `| null`
pub fn project_type(schema: &ParsedSchema) -> TypeExpr {
    let base = base_type(schema);
    if schema.nullable {
        base.or_null()
    } else {
        base
    }
}

fn base_type(schema: &ParsedSchema) -> TypeExpr {
    if let Some(name) = &schema.ref_name {
        return TypeExpr::Named(type_ident(name));
    }

    let literals: Vec<TypeExpr> = schema
        .enum_values
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| TypeExpr::Literal(v.clone()))
        .collect();
    if !literals.is_empty() {
        return single_or_union(literals);
    }

    match &schema.kind {
        SchemaKind::String => TypeExpr::Keyword("string"),
        SchemaKind::Integer | SchemaKind::Number => TypeExpr::Keyword("number"),
        SchemaKind::Boolean => TypeExpr::Keyword("boolean"),
        SchemaKind::Array { items } => TypeExpr::Array(Box::new(project_type(items))),
        SchemaKind::Object { properties, required, additional } => {
            if properties.is_empty() {
                let value = additional
                    .as_deref()
                    .map(project_type)
                    .unwrap_or(TypeExpr::Keyword("unknown"));
                return TypeExpr::Record(Box::new(value));
            }
            TypeExpr::Object(
                properties
                    .iter()
                    .map(|prop| {
                        let modifiers = field_modifiers(&prop.name, &prop.schema, required);
                        let ty = base_type(&prop.schema);
                        Field {
                            name: prop.name.clone(),
                            ty: if modifiers.nullable { ty.or_null() } else { ty },
                            optional: modifiers.optional,
                            doc: prop.schema.description.clone(),
                        }
                    })
                    .collect(),
            )
        }
        SchemaKind::Union { variants, .. } => {
            if variants.is_empty() {
                return TypeExpr::Keyword("unknown");
            }
            single_or_union(variants.iter().map(project_type).collect())
        }
        SchemaKind::Any => TypeExpr::Keyword("unknown"),
    }
}

fn single_or_union(mut members: Vec<TypeExpr>) -> TypeExpr {
    if members.len() == 1 {
        members.remove(0)
    } else {
        TypeExpr::Union(members)
    }
}

/// Members of an object node as interface fields, `None` for other shapes
pub fn interface_fields(schema: &ParsedSchema) -> Option<Vec<Field>> {
    if schema.ref_name.is_some() || schema.nullable || !schema.enum_values.is_empty() {
        return None;
    }
    match base_type(schema) {
        TypeExpr::Object(fields) => Some(fields),
        _ => None,
    }
}

// =============================================================================
// Validator Projector
// =============================================================================

fn z(method: &str, args: Vec<Expr>) -> Expr {
    Expr::ident("z").method(method, args)
}

/// Project a node to a zod expression; references to names in `lazy` are
/// deferred with `z.lazy`
pub fn project_validator(schema: &ParsedSchema, lazy: &BTreeSet<String>) -> Expr {
    let base = base_validator(schema, lazy);
    if schema.nullable {
        base.method("nullable", vec![])
    } else {
        base
    }
}

fn base_validator(schema: &ParsedSchema, lazy: &BTreeSet<String>) -> Expr {
    if let Some(name) = &schema.ref_name {
        let target = Expr::ident(validator_ident(name));
        return if lazy.contains(name) {
            z("lazy", vec![Expr::arrow(Vec::<Param>::new(), target)])
        } else {
            target
        };
    }

    let values: Vec<&Value> = schema.enum_values.iter().filter(|v| !v.is_null()).collect();
    if !values.is_empty() {
        return enum_validator(&values);
    }

    let c = &schema.constraints;
    match &schema.kind {
        SchemaKind::String => {
            let mut expr = z("string", vec![]);
            match schema.format.as_deref() {
                Some("email") => expr = expr.method("email", vec![]),
                Some("uuid") => expr = expr.method("uuid", vec![]),
                Some("uri") | Some("url") => expr = expr.method("url", vec![]),
                Some("date-time") => expr = expr.method("datetime", vec![]),
                _ => {}
            }
            if let Some(min) = c.min_length {
                expr = expr.method("min", vec![Expr::number(min as f64)]);
            }
            if let Some(max) = c.max_length {
                expr = expr.method("max", vec![Expr::number(max as f64)]);
            }
            if let Some(pattern) = &c.pattern {
                expr = expr.method("regex", vec![Expr::Regex(pattern.clone())]);
            }
            expr
        }
        SchemaKind::Integer | SchemaKind::Number => {
            let mut expr = z("number", vec![]);
            if matches!(schema.kind, SchemaKind::Integer) {
                expr = expr.method("int", vec![]);
            }
            if let Some(min) = c.minimum {
                expr = expr.method("min", vec![Expr::number(min)]);
            }
            if let Some(max) = c.maximum {
                expr = expr.method("max", vec![Expr::number(max)]);
            }
            expr
        }
        SchemaKind::Boolean => z("boolean", vec![]),
        SchemaKind::Array { items } => {
            let mut expr = z("array", vec![project_validator(items, lazy)]);
            if let Some(min) = c.min_items {
                expr = expr.method("min", vec![Expr::number(min as f64)]);
            }
            if let Some(max) = c.max_items {
                expr = expr.method("max", vec![Expr::number(max as f64)]);
            }
            expr
        }
        SchemaKind::Object { properties, required, additional } => {
            if properties.is_empty() {
                let value = additional
                    .as_deref()
                    .map(|a| project_validator(a, lazy))
                    .unwrap_or_else(|| z("unknown", vec![]));
                return z("record", vec![z("string", vec![]), value]);
            }
            let props = properties
                .iter()
                .map(|prop| {
                    let modifiers = field_modifiers(&prop.name, &prop.schema, required);
                    let mut value = base_validator(&prop.schema, lazy);
                    if modifiers.nullable {
                        value = value.method("nullable", vec![]);
                    }
                    if modifiers.optional {
                        value = value.method("optional", vec![]);
                    }
                    Prop::KeyValue(prop.name.clone(), value)
                })
                .collect();
            z("object", vec![Expr::Object(props)])
        }
        SchemaKind::Union { variants, .. } => match variants.len() {
            0 => z("unknown", vec![]),
            1 => project_validator(&variants[0], lazy),
            _ => z(
                "union",
                vec![Expr::Array(variants.iter().map(|v| project_validator(v, lazy)).collect())],
            ),
        },
        SchemaKind::Any => z("unknown", vec![]),
    }
}

fn enum_validator(values: &[&Value]) -> Expr {
    if values.len() == 1 {
        return z("literal", vec![Expr::Literal(values[0].clone())]);
    }
    if values.iter().all(|v| v.is_string()) {
        let members = values.iter().map(|v| Expr::Literal((*v).clone())).collect();
        return z("enum", vec![Expr::Array(members)]);
    }
    let literals = values
        .iter()
        .map(|v| z("literal", vec![Expr::Literal((*v).clone())]))
        .collect();
    z("union", vec![Expr::Array(literals)])
}

// =============================================================================
// Text Wrappers
// =============================================================================

/// Type text for a node, parameterized only by indent
pub fn type_syntax(schema: &ParsedSchema, indent: usize) -> String {
    print_type(&project_type(schema), indent)
}

/// Validator text for a node, parameterized only by indent; no lazy references
pub fn validator_syntax(schema: &ParsedSchema, indent: usize) -> String {
    print_expr(&project_validator(schema, &BTreeSet::new()), indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SchemaResolver;
    use serde_json::json;

    fn resolve(value: Value) -> ParsedSchema {
        let root = json!({});
        SchemaResolver::new(&root).resolve(&value, 0)
    }

    fn resolve_in(root: &Value, pointer: &str) -> ParsedSchema {
        SchemaResolver::new(root).resolve(&json!({ "$ref": pointer }), 0)
    }

    /// Optional members of every object node, as seen by the type tree
    fn type_optionals(ty: &TypeExpr, path: &str, out: &mut BTreeSet<String>) {
        match ty {
            TypeExpr::Object(fields) => {
                for field in fields {
                    let field_path = format!("{}.{}", path, field.name);
                    if field.optional {
                        out.insert(field_path.clone());
                    }
                    type_optionals(&field.ty, &field_path, out);
                }
            }
            TypeExpr::Array(inner) | TypeExpr::Record(inner) => type_optionals(inner, path, out),
            TypeExpr::Union(members) => members.iter().for_each(|m| type_optionals(m, path, out)),
            _ => {}
        }
    }

    /// Optional members of every object node, as seen by the validator tree
    fn validator_optionals(expr: &Expr, path: &str, out: &mut BTreeSet<String>) {
        match expr {
            Expr::Object(props) => {
                for prop in props {
                    if let Prop::KeyValue(key, value) = prop {
                        let field_path = format!("{}.{}", path, key);
                        if value.outer_method() == Some("optional") {
                            out.insert(field_path.clone());
                        }
                        validator_optionals(value, &field_path, out);
                    }
                }
            }
            Expr::Call { callee, args, .. } => {
                validator_optionals(callee, path, out);
                args.iter().for_each(|a| validator_optionals(a, path, out));
            }
            Expr::Member { object, .. } => validator_optionals(object, path, out),
            Expr::Array(items) => items.iter().for_each(|i| validator_optionals(i, path, out)),
            _ => {}
        }
    }

    fn type_nullables(ty: &TypeExpr, path: &str, out: &mut BTreeSet<String>) {
        if let TypeExpr::Object(fields) = ty {
            for field in fields {
                let field_path = format!("{}.{}", path, field.name);
                if matches!(&field.ty, TypeExpr::Union(m) if m.last() == Some(&TypeExpr::Keyword("null"))) {
                    out.insert(field_path.clone());
                }
                type_nullables(&field.ty, &field_path, out);
            }
        }
    }

    fn validator_nullables(expr: &Expr, path: &str, out: &mut BTreeSet<String>) {
        if let Some(Expr::Object(props)) = object_literal(expr) {
            for prop in props {
                if let Prop::KeyValue(key, value) = prop {
                    let field_path = format!("{}.{}", path, key);
                    let unwrapped = if value.outer_method() == Some("optional") {
                        value.receiver().unwrap_or(value)
                    } else {
                        value
                    };
                    if unwrapped.outer_method() == Some("nullable") {
                        out.insert(field_path.clone());
                    }
                    validator_nullables(unwrapped, &field_path, out);
                }
            }
        }
    }

    /// The literal passed to `z.object(..)`, through trailing modifiers
    fn object_literal(expr: &Expr) -> Option<&Expr> {
        match expr {
            Expr::Call { callee, args, .. } => match callee.as_ref() {
                Expr::Member { property, .. } if property == "object" => args.first(),
                Expr::Member { object, .. } => object_literal(object),
                _ => None,
            },
            _ => None,
        }
    }

    fn sample_nodes() -> Vec<ParsedSchema> {
        vec![
            resolve(json!({
                "type": "object",
                "required": ["id", "owner"],
                "properties": {
                    "id": { "type": "string", "format": "uuid" },
                    "nickname": { "type": "string", "nullable": true },
                    "owner": {
                        "type": "object",
                        "required": ["email"],
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "phone": { "type": ["string", "null"] }
                        }
                    },
                    "lines": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["sku"],
                            "properties": { "sku": { "type": "string" }, "qty": { "type": "integer" } }
                        }
                    }
                }
            })),
            resolve(json!({
                "type": "object",
                "properties": { "status": { "type": "string", "enum": ["on", "off", null] } }
            })),
            resolve(json!({ "type": "string" })),
        ]
    }

    #[test]
    fn test_projectors_agree_on_optional_fields() {
        let lazy = BTreeSet::new();
        for node in sample_nodes() {
            let mut from_type = BTreeSet::new();
            let mut from_validator = BTreeSet::new();
            type_optionals(&project_type(&node), "$", &mut from_type);
            validator_optionals(&project_validator(&node, &lazy), "$", &mut from_validator);
            assert_eq!(from_type, from_validator);
        }

        let mut optionals = BTreeSet::new();
        type_optionals(&project_type(&sample_nodes()[0]), "$", &mut optionals);
        let expected: BTreeSet<String> = ["$.nickname", "$.owner.phone", "$.lines", "$.lines.qty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(optionals, expected);
    }

    #[test]
    fn test_projectors_agree_on_nullable_fields() {
        let lazy = BTreeSet::new();
        for node in sample_nodes() {
            let mut from_type = BTreeSet::new();
            let mut from_validator = BTreeSet::new();
            type_nullables(&project_type(&node), "$", &mut from_type);
            validator_nullables(&project_validator(&node, &lazy), "$", &mut from_validator);
            assert_eq!(from_type, from_validator);
        }
    }

    #[test]
    fn test_primitive_types() {
        assert_eq!(type_syntax(&resolve(json!({ "type": "integer" })), 0), "number");
        assert_eq!(type_syntax(&resolve(json!({ "type": "boolean" })), 0), "boolean");
        assert_eq!(type_syntax(&resolve(json!({})), 0), "unknown");
        assert_eq!(
            type_syntax(&resolve(json!({ "type": "string", "nullable": true })), 0),
            "string | null"
        );
        assert_eq!(
            type_syntax(&resolve(json!({ "type": "string", "enum": ["a", "b"] })), 0),
            "\"a\" | \"b\""
        );
    }

    #[test]
    fn test_container_types() {
        let array = resolve(json!({ "type": "array", "items": { "type": "string" } }));
        assert_eq!(type_syntax(&array, 0), "Array<string>");

        let open = resolve(json!({ "type": "object" }));
        assert_eq!(type_syntax(&open, 0), "Record<string, unknown>");

        let map = resolve(json!({ "type": "object", "additionalProperties": { "type": "integer" } }));
        assert_eq!(type_syntax(&map, 0), "Record<string, number>");

        let union = resolve(json!({ "oneOf": [{ "type": "string" }, { "type": "integer" }] }));
        assert_eq!(type_syntax(&union, 0), "string | number");
    }

    #[test]
    fn test_object_type_syntax() {
        let node = resolve(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));
        assert_eq!(type_syntax(&node, 0), "{\n  id: string;\n  tags?: Array<string>;\n}");
        assert_eq!(type_syntax(&node, 1), "{\n    id: string;\n    tags?: Array<string>;\n  }");
    }

    #[test]
    fn test_reference_short_circuits() {
        let root = json!({
            "components": { "schemas": {
                "Product": { "type": "object", "properties": { "id": { "type": "string" } } },
                "order_line": { "type": "object", "properties": { "sku": { "type": "string" } } }
            } }
        });
        let product = resolve_in(&root, "#/components/schemas/Product");
        assert_eq!(type_syntax(&product, 0), "Product");
        assert_eq!(validator_syntax(&product, 0), "ProductSchema");

        let line = resolve_in(&root, "#/components/schemas/order_line");
        assert_eq!(type_syntax(&line, 0), "OrderLine");
        assert_eq!(validator_syntax(&line, 0), "OrderLineSchema");

        let lazy: BTreeSet<String> = ["Product".to_string()].into_iter().collect();
        assert_eq!(
            print_expr(&project_validator(&product, &lazy), 0),
            "z.lazy(() => ProductSchema)"
        );
    }

    #[test]
    fn test_string_validators() {
        let node = resolve(json!({
            "type": "string",
            "format": "email",
            "minLength": 3,
            "maxLength": 120,
            "pattern": "^[^@]+@example\\.com$"
        }));
        assert_eq!(
            validator_syntax(&node, 0),
            "z.string().email().min(3).max(120).regex(/^[^@]+@example\\.com$/)"
        );
        assert_eq!(
            validator_syntax(&resolve(json!({ "type": "string", "format": "date-time" })), 0),
            "z.string().datetime()"
        );
        assert_eq!(
            validator_syntax(&resolve(json!({ "type": "string", "format": "uri" })), 0),
            "z.string().url()"
        );
    }

    #[test]
    fn test_number_validators() {
        let node = resolve(json!({ "type": "integer", "minimum": 1, "maximum": 100 }));
        assert_eq!(validator_syntax(&node, 0), "z.number().int().min(1).max(100)");

        let price = resolve(json!({ "type": "number", "minimum": 0.01 }));
        assert_eq!(validator_syntax(&price, 0), "z.number().min(0.01)");
    }

    #[test]
    fn test_enum_validators() {
        let strings = resolve(json!({ "type": "string", "enum": ["draft", "live"] }));
        assert_eq!(validator_syntax(&strings, 0), "z.enum([\"draft\", \"live\"])");

        let numbers = resolve(json!({ "type": "integer", "enum": [1, 2] }));
        assert_eq!(validator_syntax(&numbers, 0), "z.union([z.literal(1), z.literal(2)])");

        let single = resolve(json!({ "type": "string", "enum": ["only"] }));
        assert_eq!(validator_syntax(&single, 0), "z.literal(\"only\")");
    }

    #[test]
    fn test_container_validators() {
        let array = resolve(json!({ "type": "array", "items": { "type": "string" }, "minItems": 1 }));
        assert_eq!(validator_syntax(&array, 0), "z.array(z.string()).min(1)");

        let open = resolve(json!({ "type": "object" }));
        assert_eq!(validator_syntax(&open, 0), "z.record(z.string(), z.unknown())");

        let union = resolve(json!({ "anyOf": [{ "type": "string" }, { "type": "boolean" }], "nullable": true }));
        assert_eq!(validator_syntax(&union, 0), "z.union([z.string(), z.boolean()]).nullable()");

        let object = resolve(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "string" }, "note": { "type": "string", "nullable": true } }
        }));
        assert_eq!(
            validator_syntax(&object, 0),
            "z.object({ id: z.string(), note: z.string().nullable().optional() })"
        );
    }

    #[test]
    fn test_self_reference_projects_by_name() {
        let root = json!({
            "components": { "schemas": {
                "Node": { "type": "object", "properties": { "next": { "$ref": "#/components/schemas/Node" } } }
            } }
        });
        let body = SchemaResolver::new(&root).resolve(&root["components"]["schemas"]["Node"], 0);
        assert_eq!(type_syntax(&body, 0), "{\n  next?: Node;\n}");

        let lazy: BTreeSet<String> = ["Node".to_string()].into_iter().collect();
        assert_eq!(
            print_expr(&project_validator(&body, &lazy), 0),
            "z.object({ next: z.lazy(() => NodeSchema).optional() })"
        );
    }

    #[test]
    fn test_unnamed_any_projects_to_unknown() {
        let any = ParsedSchema::any();
        assert_eq!(type_syntax(&any, 0), "unknown");
        assert_eq!(validator_syntax(&any, 0), "z.unknown()");
    }
}
