//! Render helper table
//!
//! Backends reach every piece of shared naming and operation logic through an
//! explicit table of named pure functions handed to each render call. Asking
//! for a name the table does not hold is a generation error.

use std::collections::BTreeMap;

use super::ast::{Expr, TemplatePart};
use crate::error::{CodegenError, Result};
use crate::ir::{ParamLocation, ParsedOperation, ParsedResponse};
use crate::names::{
    safe_identifier, to_camel_case, to_constant_case, to_kebab_case, to_pascal_case, to_snake_case,
};

/// Argument to a helper
#[derive(Debug, Clone, Copy)]
pub enum HelperArg<'a> {
    Text(&'a str),
    Operation(&'a ParsedOperation),
}

/// Result of a helper
#[derive(Debug, Clone, PartialEq)]
pub enum HelperValue<'a> {
    Text(String),
    Flag(bool),
    Expr(Expr),
    Segments(Vec<String>),
    Response(Option<&'a ParsedResponse>),
}

/// A helper; `None` means the argument kind did not fit
pub type HelperFn = for<'a> fn(HelperArg<'a>) -> Option<HelperValue<'a>>;

#[derive(Clone)]
pub struct HelperTable {
    helpers: BTreeMap<&'static str, HelperFn>,
}

impl Default for HelperTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for HelperTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.helpers.keys()).finish()
    }
}

impl HelperTable {
    pub fn empty() -> Self {
        Self {
            helpers: BTreeMap::new(),
        }
    }

    /// The helpers every built-in backend relies on
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register("camelCase", |arg| text(arg, to_camel_case));
        table.register("pascalCase", |arg| text(arg, to_pascal_case));
        table.register("snakeCase", |arg| text(arg, to_snake_case));
        table.register("kebabCase", |arg| text(arg, to_kebab_case));
        table.register("constantCase", |arg| text(arg, to_constant_case));
        table.register("pathTemplate", |arg| match arg {
            HelperArg::Text(path) => Some(HelperValue::Expr(path_template(path))),
            HelperArg::Operation(op) => Some(HelperValue::Expr(path_template(&op.path))),
        });
        table.register("hasPathParams", |arg| {
            flag(arg, |op| op.params_in(ParamLocation::Path).next().is_some())
        });
        table.register("hasQueryParams", |arg| {
            flag(arg, |op| op.params_in(ParamLocation::Query).next().is_some())
        });
        table.register("isMutation", |arg| flag(arg, |op| !op.method.is_read()));
        table.register("isQuery", |arg| flag(arg, |op| op.method.is_read()));
        table.register("requiresAuth", |arg| flag(arg, |op| op.requires_auth));
        table.register("successResponse", |arg| match arg {
            HelperArg::Operation(op) => Some(HelperValue::Response(op.responses.iter().find(|r| r.is_success()))),
            HelperArg::Text(_) => None,
        });
        table.register("queryKey", |arg| match arg {
            HelperArg::Operation(op) => Some(HelperValue::Segments(vec![
                op.primary_tag().to_string(),
                op.operation_id.clone(),
            ])),
            HelperArg::Text(_) => None,
        });
        table
    }

    /// Add or replace a helper
    pub fn register(&mut self, name: &'static str, helper: HelperFn) {
        self.helpers.insert(name, helper);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.helpers.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Invoke a helper by name
    pub fn call<'a>(&self, name: &str, arg: HelperArg<'a>) -> Result<HelperValue<'a>> {
        let helper = self
            .helpers
            .get(name)
            .ok_or_else(|| CodegenError::UnknownHelper(name.to_string()))?;
        helper(arg).ok_or_else(|| CodegenError::render(format!("helper '{}'", name), "argument of the wrong kind"))
    }

    // =========================================================================
    // Typed shorthands used by the backends
    // =========================================================================

    pub fn text(&self, name: &str, input: &str) -> Result<String> {
        match self.call(name, HelperArg::Text(input))? {
            HelperValue::Text(text) => Ok(text),
            other => Err(unexpected(name, &other)),
        }
    }

    pub fn flag(&self, name: &str, op: &ParsedOperation) -> Result<bool> {
        match self.call(name, HelperArg::Operation(op))? {
            HelperValue::Flag(flag) => Ok(flag),
            other => Err(unexpected(name, &other)),
        }
    }

    pub fn expr(&self, name: &str, op: &ParsedOperation) -> Result<Expr> {
        match self.call(name, HelperArg::Operation(op))? {
            HelperValue::Expr(expr) => Ok(expr),
            other => Err(unexpected(name, &other)),
        }
    }

    pub fn segments(&self, name: &str, op: &ParsedOperation) -> Result<Vec<String>> {
        match self.call(name, HelperArg::Operation(op))? {
            HelperValue::Segments(segments) => Ok(segments),
            other => Err(unexpected(name, &other)),
        }
    }

    pub fn response<'a>(&self, name: &str, op: &'a ParsedOperation) -> Result<Option<&'a ParsedResponse>> {
        match self.call(name, HelperArg::Operation(op))? {
            HelperValue::Response(response) => Ok(response),
            other => Err(unexpected(name, &other)),
        }
    }
}

fn unexpected(name: &str, value: &HelperValue<'_>) -> CodegenError {
    CodegenError::render(
        format!("helper '{}'", name),
        format!("returned an unexpected value: {:?}", value),
    )
}

fn text<'a>(arg: HelperArg<'a>, convert: fn(&str) -> String) -> Option<HelperValue<'a>> {
    match arg {
        HelperArg::Text(s) => Some(HelperValue::Text(convert(s))),
        HelperArg::Operation(_) => None,
    }
}

fn flag<'a>(arg: HelperArg<'a>, test: fn(&ParsedOperation) -> bool) -> Option<HelperValue<'a>> {
    match arg {
        HelperArg::Operation(op) => Some(HelperValue::Flag(test(op))),
        HelperArg::Text(_) => None,
    }
}

/// `/v1/products/{id}` → `` `/v1/products/${encodeURIComponent(String(id))}` ``
pub fn path_template(path: &str) -> Expr {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        text.push_str(&rest[..open]);
        if !text.is_empty() {
            parts.push(TemplatePart::Text(std::mem::take(&mut text)));
        }
        let name = safe_identifier(&rest[open + 1..close]);
        let encoded = Expr::ident("encodeURIComponent").call(vec![Expr::ident("String").call(vec![Expr::ident(name)])]);
        parts.push(TemplatePart::Expr(encoded));
        rest = &rest[close + 1..];
    }
    text.push_str(rest);
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }

    match parts.as_slice() {
        [TemplatePart::Text(only)] => Expr::string(only.clone()),
        [] => Expr::string(""),
        _ => Expr::Template(parts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::printer::print_expr;
    use crate::ir::build_spec;
    use serde_json::json;

    fn operation() -> ParsedOperation {
        let doc = json!({
            "paths": {
                "/v1/products/{product-id}/reviews": {
                    "post": {
                        "tags": ["reviews"],
                        "security": [{ "bearer": [] }],
                        "parameters": [
                            { "name": "product-id", "in": "path", "schema": { "type": "string" } },
                            { "name": "draft", "in": "query", "schema": { "type": "boolean" } }
                        ],
                        "responses": {
                            "400": { "description": "bad" },
                            "201": { "description": "created" }
                        }
                    }
                }
            }
        });
        build_spec(&doc).operations.remove(0)
    }

    #[test]
    fn test_standard_table_names() {
        let table = HelperTable::standard();
        for name in [
            "camelCase",
            "pascalCase",
            "snakeCase",
            "kebabCase",
            "constantCase",
            "pathTemplate",
            "hasPathParams",
            "hasQueryParams",
            "isMutation",
            "isQuery",
            "requiresAuth",
            "successResponse",
            "queryKey",
        ] {
            assert!(table.contains(name), "missing helper {}", name);
        }
        assert_eq!(table.names().count(), 13);
    }

    #[test]
    fn test_unknown_helper_is_an_error() {
        let table = HelperTable::standard();
        let err = table.text("shout", "hello").unwrap_err();
        assert!(matches!(err, CodegenError::UnknownHelper(name) if name == "shout"));
    }

    #[test]
    fn test_wrong_argument_kind_is_an_error() {
        let table = HelperTable::standard();
        let op = operation();
        assert!(matches!(table.flag("camelCase", &op), Err(CodegenError::Render { .. })));
    }

    #[test]
    fn test_case_helpers() {
        let table = HelperTable::standard();
        assert_eq!(table.text("camelCase", "order-items").unwrap(), "orderItems");
        assert_eq!(table.text("pascalCase", "order-items").unwrap(), "OrderItems");
        assert_eq!(table.text("snakeCase", "OrderItems").unwrap(), "order_items");
        assert_eq!(table.text("kebabCase", "OrderItems").unwrap(), "order-items");
        assert_eq!(table.text("constantCase", "orderItems").unwrap(), "ORDER_ITEMS");
    }

    #[test]
    fn test_operation_helpers() {
        let table = HelperTable::standard();
        let op = operation();
        assert!(table.flag("hasPathParams", &op).unwrap());
        assert!(table.flag("hasQueryParams", &op).unwrap());
        assert!(table.flag("isMutation", &op).unwrap());
        assert!(!table.flag("isQuery", &op).unwrap());
        assert!(table.flag("requiresAuth", &op).unwrap());
        assert_eq!(
            table.response("successResponse", &op).unwrap().map(|r| r.status.as_str()),
            Some("201")
        );
        assert_eq!(
            table.segments("queryKey", &op).unwrap(),
            vec!["reviews".to_string(), op.operation_id.clone()]
        );
    }

    #[test]
    fn test_path_template() {
        assert_eq!(
            print_expr(&path_template("/v1/products/{product-id}/reviews"), 0),
            "`/v1/products/${encodeURIComponent(String(productId))}/reviews`"
        );
        assert_eq!(print_expr(&path_template("/v1/health"), 0), "\"/v1/health\"");
    }

    #[test]
    fn test_custom_helper_registration() {
        let mut table = HelperTable::empty();
        table.register("shout", |arg| match arg {
            HelperArg::Text(s) => Some(HelperValue::Text(s.to_uppercase())),
            HelperArg::Operation(_) => None,
        });
        assert_eq!(table.text("shout", "hi").unwrap(), "HI");
        assert!(table.text("camelCase", "hi").is_err());
    }
}
