//! HTTP transport client over axios

use super::{base_url_item, header, model_items, placeholders, OperationSurface, BASE_URL_CONST};
use crate::codegen::ast::{Binding, Expr, Item, Param, Prop, Stmt, TemplatePart, TypeExpr};
use crate::codegen::printer::print_module;
use crate::codegen::{FormatBackend, HelperTable, OutputFormat, RenderContext};
use crate::error::{CodegenError, Result};
use crate::ir::ParamLocation;
use crate::names::safe_identifier;

/// Name of the shared axios instance
const HTTP: &str = "http";

pub struct AxiosBackend;

impl FormatBackend for AxiosBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::Axios
    }

    fn render(&self, ctx: &RenderContext<'_>, helpers: &HelperTable) -> Result<String> {
        let mut items = vec![
            header(ctx, "HTTP client"),
            Item::Import {
                default: Some("axios".to_string()),
                names: vec![],
                from: "axios".to_string(),
                type_only: false,
            },
            Item::Import {
                default: None,
                names: vec!["AxiosInstance".to_string(), "AxiosRequestConfig".to_string()],
                from: "axios".to_string(),
                type_only: true,
            },
            base_url_item(ctx),
        ];

        if ctx.model_count > 0 {
            items.push(Item::Banner("Models".to_string()));
            items.extend(model_items(ctx));
        }

        let mut surfaces = Vec::new();
        for group in &ctx.groups {
            items.push(Item::Banner(format!("Operation types: {}", group.tag)));
            for op in &group.operations {
                let surface = OperationSurface::new(op, helpers)?;
                items.extend(surface.type_items(helpers)?);
                surfaces.push(surface);
            }
        }

        items.push(Item::Banner("Client".to_string()));
        items.push(Item::Const {
            name: HTTP.to_string(),
            annotation: Some(TypeExpr::named("AxiosInstance")),
            value: Expr::ident("axios").method(
                "create",
                vec![Expr::Object(vec![Prop::KeyValue(
                    "baseURL".to_string(),
                    Expr::ident(BASE_URL_CONST),
                )])],
            ),
            doc: None,
        });
        if ctx.has_security {
            items.push(set_auth_token());
        }

        for surface in &surfaces {
            items.push(client_function(surface, helpers)?);
        }

        items.push(Item::Const {
            name: "apiClient".to_string(),
            annotation: None,
            value: Expr::Object(surfaces.iter().map(|s| Prop::Shorthand(s.function.clone())).collect()),
            doc: None,
        });

        Ok(print_module(&items))
    }
}

fn auth_header() -> Expr {
    Expr::ident(HTTP)
        .member("defaults")
        .member("headers")
        .member("common")
        .index(Expr::string("Authorization"))
}

/// Installs or clears the bearer token on the shared instance
fn set_auth_token() -> Item {
    Item::Function {
        name: "setAuthToken".to_string(),
        is_async: false,
        params: vec![Param::new("token", TypeExpr::Keyword("string").or_null())],
        returns: Some(TypeExpr::Keyword("void")),
        body: vec![Stmt::If {
            cond: Expr::ident("token"),
            then: vec![Stmt::Assign {
                target: auth_header(),
                value: Expr::Template(vec![
                    TemplatePart::Text("Bearer ".to_string()),
                    TemplatePart::Expr(Expr::ident("token")),
                ]),
            }],
            otherwise: vec![Stmt::Expr(Expr::prefix("delete", auth_header()))],
        }],
        doc: Some("Set the bearer token sent with every request; `null` clears it".to_string()),
    }
}

fn client_function(surface: &OperationSurface<'_>, helpers: &HelperTable) -> Result<Item> {
    let op = surface.op;
    let path_params: Vec<_> = op.params_in(ParamLocation::Path).collect();
    let has_query = helpers.flag("hasQueryParams", op)?;

    for placeholder in placeholders(&op.path) {
        if !path_params.iter().any(|p| p.name == placeholder) {
            return Err(CodegenError::render(
                format!("operation '{}'", op.operation_id),
                format!("path placeholder '{{{}}}' has no path parameter", placeholder),
            ));
        }
    }

    let mut body = Vec::new();
    let mut request = vec![
        Prop::Spread(Expr::ident("config")),
        Prop::KeyValue("method".to_string(), Expr::string(op.method.to_string())),
        Prop::KeyValue("url".to_string(), helpers.expr("pathTemplate", op)?),
    ];

    if helpers.flag("hasPathParams", op)? {
        body.push(Stmt::Const {
            binding: Binding::Destructure {
                fields: path_params
                    .iter()
                    .map(|p| (p.name.clone(), safe_identifier(&p.name)))
                    .collect(),
                rest: has_query.then(|| "query".to_string()),
            },
            value: Expr::ident("params"),
        });
        if has_query {
            request.push(Prop::KeyValue("params".to_string(), Expr::ident("query")));
        }
    } else if has_query {
        request.push(Prop::Shorthand("params".to_string()));
    }

    if surface.body.is_some() {
        request.push(Prop::KeyValue("data".to_string(), Expr::ident("body")));
    }

    let response_type = TypeExpr::named(surface.response.clone());
    body.push(Stmt::Const {
        binding: Binding::Name("response".to_string()),
        value: Expr::prefix(
            "await",
            Expr::ident(HTTP)
                .member("request")
                .call_generic(vec![response_type.clone()], vec![Expr::Object(request)]),
        ),
    });
    body.push(Stmt::Return(Expr::ident("response").member("data")));

    let mut params = surface.call_params();
    params.push(Param::optional("config", TypeExpr::named("AxiosRequestConfig")));

    Ok(Item::Function {
        name: surface.function.clone(),
        is_async: true,
        params,
        returns: Some(TypeExpr::generic("Promise", vec![response_type])),
        body,
        doc: surface.doc(helpers)?,
    })
}
