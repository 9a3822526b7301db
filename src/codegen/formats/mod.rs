//! Format backends
//!
//! One [`FormatBackend`](super::FormatBackend) per output format, plus the
//! declaration builders the TypeScript-emitting backends share.

mod axios;
mod openapi;
mod react_query;
mod typescript;

pub use axios::AxiosBackend;
pub use openapi::OpenApiBackend;
pub use react_query::ReactQueryBackend;
pub use typescript::TypescriptBackend;

use super::ast::{Expr, Field, Item, Param, TypeExpr};
use super::context::RenderContext;
use super::helpers::HelperTable;
use super::project::{interface_fields, project_type, project_validator, type_ident, validator_ident};
use crate::error::{CodegenError, Result};
use crate::ir::{ParamLocation, ParsedOperation};
use crate::names::safe_identifier;

/// Name of the exported base URL constant
pub(crate) const BASE_URL_CONST: &str = "API_BASE_URL";

pub(crate) fn header(ctx: &RenderContext<'_>, label: &str) -> Item {
    Item::DocBlock(ctx.header_lines(label))
}

pub(crate) fn base_url_item(ctx: &RenderContext<'_>) -> Item {
    Item::Const {
        name: BASE_URL_CONST.to_string(),
        annotation: None,
        value: Expr::string(ctx.base_url.clone()),
        doc: None,
    }
}

/// Interfaces for object models, aliases for everything else, document order
pub(crate) fn model_items(ctx: &RenderContext<'_>) -> Vec<Item> {
    ctx.spec
        .models
        .iter()
        .map(|model| {
            let name = type_ident(&model.name);
            let doc = model.description.clone();
            match interface_fields(&model.schema) {
                Some(fields) => Item::Interface { name, fields, doc },
                None => Item::TypeAlias {
                    name,
                    ty: project_type(&model.schema),
                    doc,
                },
            }
        })
        .collect()
}

/// Validator constants, dependencies first; recursive models are annotated
/// so the lazy self-reference type-checks
pub(crate) fn validator_items(ctx: &RenderContext<'_>) -> Vec<Item> {
    let lazy = ctx.recursive_models();
    ctx.models_in_declaration_order()
        .into_iter()
        .map(|model| Item::Const {
            name: validator_ident(&model.name),
            annotation: ctx
                .is_recursive(&model.name)
                .then(|| TypeExpr::generic("z.ZodType", vec![TypeExpr::named(type_ident(&model.name))])),
            value: project_validator(&model.schema, lazy),
            doc: None,
        })
        .collect()
}

/// `{placeholder}` names in a path template, in order
pub(crate) fn placeholders(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .collect()
}

// =============================================================================
// Operation Surface
// =============================================================================

/// Names and signatures generated for one operation
#[derive(Debug, Clone)]
pub(crate) struct OperationSurface<'a> {
    pub op: &'a ParsedOperation,
    /// `getProductsById`
    pub function: String,
    /// `GetProductsById`
    pub type_base: String,
    /// Interface name when the operation takes path or query parameters
    pub params: Option<String>,
    /// Alias name and whether the body is required
    pub body: Option<(String, bool)>,
    pub response: String,
}

impl<'a> OperationSurface<'a> {
    pub fn new(op: &'a ParsedOperation, helpers: &HelperTable) -> Result<Self> {
        let type_base = helpers.text("pascalCase", &op.operation_id)?;
        if type_base.is_empty() {
            return Err(CodegenError::render(
                format!("operation '{}' ({} {})", op.operation_id, op.method, op.path),
                "operation id has no characters usable in an identifier",
            ));
        }
        let function = safe_identifier(&helpers.text("camelCase", &op.operation_id)?);

        let has_params = helpers.flag("hasPathParams", op)? || helpers.flag("hasQueryParams", op)?;
        Ok(Self {
            op,
            params: has_params.then(|| format!("{}Params", type_base)),
            body: op
                .request_body
                .as_ref()
                .map(|body| (format!("{}Body", type_base), body.required)),
            response: format!("{}Response", type_base),
            function,
            type_base,
        })
    }

    /// Path and query parameters, in declaration order
    pub fn surface_parameters(&self) -> impl Iterator<Item = &'a crate::ir::ParsedParameter> {
        self.op
            .parameters
            .iter()
            .filter(|p| matches!(p.location, ParamLocation::Path | ParamLocation::Query))
    }

    /// `XParams`, `XBody`, `XResponse`
    pub fn type_items(&self, helpers: &HelperTable) -> Result<Vec<Item>> {
        let mut items = Vec::new();

        if let Some(name) = &self.params {
            let fields = self
                .surface_parameters()
                .map(|param| Field {
                    name: param.name.clone(),
                    ty: project_type(&param.schema),
                    optional: !param.required,
                    doc: param.description.clone(),
                })
                .collect();
            items.push(Item::Interface {
                name: name.clone(),
                fields,
                doc: None,
            });
        }

        if let (Some((name, _)), Some(body)) = (&self.body, &self.op.request_body) {
            items.push(Item::TypeAlias {
                name: name.clone(),
                ty: project_type(&body.schema),
                doc: None,
            });
        }

        let response = helpers
            .response("successResponse", self.op)?
            .and_then(|r| r.schema.as_ref())
            .map(project_type)
            .unwrap_or(TypeExpr::Keyword("void"));
        items.push(Item::TypeAlias {
            name: self.response.clone(),
            ty: response,
            doc: None,
        });

        Ok(items)
    }

    /// Parameters of the client function, without the trailing config
    pub fn call_params(&self) -> Vec<Param> {
        let mut params = Vec::new();
        if let Some(name) = &self.params {
            params.push(Param::new("params", TypeExpr::named(name.clone())));
        }
        if let Some((name, required)) = &self.body {
            let ty = TypeExpr::named(name.clone());
            params.push(if *required { Param::new("body", ty) } else { Param::optional("body", ty) });
        }
        params
    }

    /// Doc comment: summary (or method and path), auth and deprecation notes
    pub fn doc(&self, helpers: &HelperTable) -> Result<Option<String>> {
        let mut lines = vec![self
            .op
            .summary
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.op.method, self.op.path))];
        if helpers.flag("requiresAuth", self.op)? {
            lines.push("Requires authentication.".to_string());
        }
        if self.op.deprecated {
            lines.push("@deprecated".to_string());
        }
        Ok(Some(lines.join("\n")))
    }
}
