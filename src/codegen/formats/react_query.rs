//! Query and mutation hooks over the generated axios client
//!
//! The hooks import `apiClient` and the per-operation types from `./client`,
//! the conventional location of the `axios` artifact.

use std::collections::BTreeSet;

use super::{header, OperationSurface};
use crate::codegen::ast::{Binding, Expr, Field, Item, Param, Prop, Stmt, TypeExpr};
use crate::codegen::printer::print_module;
use crate::codegen::{FormatBackend, HelperTable, OutputFormat, RenderContext};
use crate::error::Result;
use crate::names::safe_identifier;

/// Module the hooks import the transport client from
const CLIENT_MODULE: &str = "./client";

pub struct ReactQueryBackend;

impl FormatBackend for ReactQueryBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::ReactQuery
    }

    fn render(&self, ctx: &RenderContext<'_>, helpers: &HelperTable) -> Result<String> {
        let mut key_groups = Vec::new();
        let mut hooks = Vec::new();
        let mut imported_types = BTreeSet::new();
        let (mut uses_query, mut uses_mutation) = (false, false);

        for group in &ctx.groups {
            let tag_key = safe_identifier(&helpers.text("camelCase", &group.tag)?);
            let mut keys = vec![Prop::KeyValue(
                "all".to_string(),
                Expr::Array(vec![Expr::string(group.tag.clone())]).as_const(),
            )];
            hooks.push(Item::Banner(format!("Hooks: {}", group.tag)));

            for op in &group.operations {
                let surface = OperationSurface::new(op, helpers)?;
                imported_types.extend(surface.params.iter().cloned());
                imported_types.extend(surface.body.iter().map(|(name, _)| name.clone()));
                imported_types.insert(surface.response.clone());

                if helpers.flag("isQuery", op)? {
                    uses_query = true;
                    keys.push(query_key(&surface, helpers)?);
                    hooks.push(query_hook(&surface, &tag_key, helpers)?);
                } else if helpers.flag("isMutation", op)? {
                    uses_mutation = true;
                    hooks.extend(mutation_hook(&surface, &tag_key, helpers)?);
                }
            }

            key_groups.push(Prop::KeyValue(tag_key, Expr::Object(keys)));
        }

        let mut runtime = Vec::new();
        let mut types = Vec::new();
        if uses_mutation {
            runtime.extend(["useMutation", "useQueryClient"]);
            types.push("UseMutationOptions");
        }
        if uses_query {
            runtime.push("useQuery");
            types.push("UseQueryOptions");
        }
        runtime.sort_unstable();
        types.sort_unstable();

        let mut items = vec![header(ctx, "React Query hooks")];
        if !runtime.is_empty() {
            items.push(import(runtime, "@tanstack/react-query", false));
            items.push(import(types, "@tanstack/react-query", true));
        }
        items.push(import(vec!["apiClient"], CLIENT_MODULE, false));
        if !imported_types.is_empty() {
            items.push(Item::Import {
                default: None,
                names: imported_types.into_iter().collect(),
                from: CLIENT_MODULE.to_string(),
                type_only: true,
            });
        }

        items.push(Item::Banner("Query Keys".to_string()));
        items.push(Item::Const {
            name: "queryKeys".to_string(),
            annotation: None,
            value: Expr::Object(key_groups).as_const(),
            doc: None,
        });
        items.extend(hooks);

        Ok(print_module(&items))
    }
}

fn import(names: Vec<&str>, from: &str, type_only: bool) -> Item {
    Item::Import {
        default: None,
        names: names.into_iter().map(str::to_string).collect(),
        from: from.to_string(),
        type_only,
    }
}

/// Arguments shared by the client call and the query key
fn argument_names(surface: &OperationSurface<'_>) -> Vec<String> {
    surface.call_params().into_iter().map(|p| p.name).collect()
}

/// `getProductsById: (params: P) => ["products", "getProductsById", params] as const`
fn query_key(surface: &OperationSurface<'_>, helpers: &HelperTable) -> Result<Prop> {
    let mut elements: Vec<Expr> = helpers
        .segments("queryKey", surface.op)?
        .into_iter()
        .map(Expr::string)
        .collect();
    elements.extend(argument_names(surface).into_iter().map(Expr::ident));

    Ok(Prop::KeyValue(
        surface.function.clone(),
        Expr::arrow(surface.call_params(), Expr::Array(elements).as_const()),
    ))
}

fn hook_name(surface: &OperationSurface<'_>) -> String {
    format!("use{}", surface.type_base)
}

fn omit(options: TypeExpr, keys: &[&str]) -> TypeExpr {
    let keys = keys.iter().map(|k| TypeExpr::string_literal(k)).collect::<Vec<_>>();
    let keys = if keys.len() == 1 {
        keys.into_iter().next().unwrap_or(TypeExpr::Keyword("never"))
    } else {
        TypeExpr::Union(keys)
    };
    TypeExpr::generic("Omit", vec![options, keys])
}

fn query_hook(surface: &OperationSurface<'_>, tag_key: &str, helpers: &HelperTable) -> Result<Item> {
    let args: Vec<Expr> = argument_names(surface).into_iter().map(Expr::ident).collect();
    let response = TypeExpr::named(surface.response.clone());

    let mut params = surface.call_params();
    params.push(Param::optional(
        "options",
        omit(TypeExpr::generic("UseQueryOptions", vec![response]), &["queryKey", "queryFn"]),
    ));

    let call = Expr::ident("useQuery").call(vec![Expr::Object(vec![
        Prop::KeyValue(
            "queryKey".to_string(),
            Expr::ident("queryKeys")
                .member(tag_key)
                .member(surface.function.clone())
                .call(args.clone()),
        ),
        Prop::KeyValue(
            "queryFn".to_string(),
            Expr::arrow(vec![], Expr::ident("apiClient").method(surface.function.clone(), args)),
        ),
        Prop::Spread(Expr::ident("options")),
    ])]);

    Ok(Item::Function {
        name: hook_name(surface),
        is_async: false,
        params,
        returns: None,
        body: vec![Stmt::Return(call)],
        doc: surface.doc(helpers)?,
    })
}

/// Variables type plus the hook; success invalidates the tag's queries
fn mutation_hook(surface: &OperationSurface<'_>, tag_key: &str, helpers: &HelperTable) -> Result<Vec<Item>> {
    let variables_name = format!("{}Variables", surface.type_base);
    let call_params = surface.call_params();

    let variables_type = if call_params.is_empty() {
        TypeExpr::Keyword("void")
    } else {
        TypeExpr::Object(
            call_params
                .iter()
                .map(|p| Field {
                    name: p.name.clone(),
                    ty: p.ty.clone().unwrap_or(TypeExpr::Keyword("unknown")),
                    optional: p.optional,
                    doc: None,
                })
                .collect(),
        )
    };

    let mutation_fn = if call_params.is_empty() {
        Expr::arrow(vec![], Expr::ident("apiClient").method(surface.function.clone(), vec![]))
    } else {
        let args = call_params
            .iter()
            .map(|p| Expr::ident("variables").member(p.name.clone()))
            .collect();
        Expr::arrow(
            vec![Param::new("variables", TypeExpr::named(variables_name.clone()))],
            Expr::ident("apiClient").method(surface.function.clone(), args),
        )
    };

    let options = omit(
        TypeExpr::generic(
            "UseMutationOptions",
            vec![
                TypeExpr::named(surface.response.clone()),
                TypeExpr::named("Error"),
                TypeExpr::named(variables_name.clone()),
            ],
        ),
        &["mutationFn"],
    );

    let invalidate = Expr::arrow(
        vec![],
        Expr::ident("queryClient").method(
            "invalidateQueries",
            vec![Expr::Object(vec![Prop::KeyValue(
                "queryKey".to_string(),
                Expr::ident("queryKeys").member(tag_key).member("all"),
            )])],
        ),
    );

    let hook = Item::Function {
        name: hook_name(surface),
        is_async: false,
        params: vec![Param::optional("options", options)],
        returns: None,
        body: vec![
            Stmt::Const {
                binding: Binding::Name("queryClient".to_string()),
                value: Expr::ident("useQueryClient").call(vec![]),
            },
            Stmt::Return(Expr::ident("useMutation").call(vec![Expr::Object(vec![
                Prop::KeyValue("mutationFn".to_string(), mutation_fn),
                Prop::KeyValue("onSuccess".to_string(), invalidate),
                Prop::Spread(Expr::ident("options")),
            ])])),
        ],
        doc: surface.doc(helpers)?,
    };

    Ok(vec![
        Item::TypeAlias {
            name: variables_name,
            ty: variables_type,
            doc: None,
        },
        hook,
    ])
}
