//! Typed client surface: model types, zod validators and per-operation types

use serde_json::Value;

use super::{base_url_item, header, model_items, validator_items, OperationSurface};
use crate::codegen::ast::{Expr, Item, Prop};
use crate::codegen::printer::print_module;
use crate::codegen::project::project_validator;
use crate::codegen::{FormatBackend, HelperTable, OutputFormat, RenderContext};
use crate::error::Result;

pub struct TypescriptBackend;

impl FormatBackend for TypescriptBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::Typescript
    }

    fn render(&self, ctx: &RenderContext<'_>, helpers: &HelperTable) -> Result<String> {
        let mut items = vec![
            header(ctx, "Types and validators"),
            Item::Import {
                default: None,
                names: vec!["z".to_string()],
                from: "zod".to_string(),
                type_only: false,
            },
            base_url_item(ctx),
        ];

        if ctx.model_count > 0 {
            items.push(Item::Banner("Models".to_string()));
            items.extend(model_items(ctx));
            items.push(Item::Banner("Validators".to_string()));
            items.extend(validator_items(ctx));
        }

        let mut index = Vec::new();
        for group in &ctx.groups {
            items.push(Item::Banner(format!("Operations: {}", group.tag)));
            let mut ids = Vec::new();

            for op in &group.operations {
                let surface = OperationSurface::new(op, helpers)?;
                items.extend(surface.type_items(helpers)?);

                if let (Some((name, _)), Some(body)) = (&surface.body, &op.request_body) {
                    items.push(Item::Const {
                        name: format!("{}Schema", name),
                        annotation: None,
                        value: project_validator(&body.schema, ctx.recursive_models()),
                        doc: None,
                    });
                }

                ids.push(Expr::string(op.operation_id.clone()));
                index.push(Prop::KeyValue(
                    surface.function.clone(),
                    Expr::Object(vec![
                        Prop::KeyValue("method".to_string(), Expr::string(op.method.to_string())),
                        Prop::KeyValue("path".to_string(), Expr::string(op.path.clone())),
                        Prop::KeyValue("tag".to_string(), Expr::string(group.tag.clone())),
                        Prop::KeyValue(
                            "requiresAuth".to_string(),
                            Expr::boolean(helpers.flag("requiresAuth", op)?),
                        ),
                        Prop::KeyValue("deprecated".to_string(), Expr::Literal(Value::Bool(op.deprecated))),
                    ]),
                ));
            }

            items.push(Item::Const {
                name: format!("{}_OPERATIONS", helpers.text("constantCase", &group.tag)?),
                annotation: None,
                value: Expr::Array(ids).as_const(),
                doc: None,
            });
        }

        if !index.is_empty() {
            items.push(Item::Banner("Operation Index".to_string()));
            items.push(Item::Const {
                name: "operations".to_string(),
                annotation: None,
                value: Expr::Object(index).as_const(),
                doc: None,
            });
        }

        Ok(print_module(&items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::RenderOverrides;
    use crate::ir::build_spec;
    use serde_json::json;

    fn render(doc: Value) -> String {
        let spec = build_spec(&doc);
        let ctx = RenderContext::build(&spec, &RenderOverrides::default()).unwrap();
        TypescriptBackend.render(&ctx, &HelperTable::standard()).unwrap()
    }

    fn shop() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": { "title": "Shop", "version": "1.0.0" },
            "servers": [{ "url": "https://api.shop.test" }],
            "paths": {
                "/v1/products/{id}": {
                    "get": {
                        "tags": ["products"],
                        "summary": "Fetch one product",
                        "parameters": [{ "name": "id", "in": "path", "schema": { "type": "string" } }],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Product" } } }
                            }
                        }
                    }
                },
                "/v1/categories": {
                    "post": {
                        "operationId": "createCategory",
                        "tags": ["catalog"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Category" } } }
                        },
                        "responses": { "204": { "description": "created" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Product": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "category": { "$ref": "#/components/schemas/Category" }
                        }
                    },
                    "Category": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": { "type": "string" },
                            "children": { "type": "array", "items": { "$ref": "#/components/schemas/Category" } }
                        }
                    },
                    "Status": { "type": "string", "enum": ["draft", "live"] }
                }
            }
        })
    }

    #[test]
    fn test_models_and_validators() {
        let out = render(shop());
        assert!(out.contains("export interface Product {\n  id: string;\n  category?: Category;\n}\n"));
        assert!(out.contains("export type Status = \"draft\" | \"live\";\n"));
        assert!(out.contains("export const StatusSchema = z.enum([\"draft\", \"live\"]);\n"));
        assert!(out.contains(
            "export const CategorySchema: z.ZodType<Category> = z.object({ name: z.string(), children: z.array(z.lazy(() => CategorySchema)).optional() });\n"
        ));
        // recursive dependency is declared before its referrer
        let category = out.find("export const CategorySchema").unwrap();
        let product = out.find("export const ProductSchema").unwrap();
        assert!(category < product);
    }

    #[test]
    fn test_operation_surface() {
        let out = render(shop());
        assert!(out.contains("export interface GetProductsByIdParams {\n  id: string;\n}\n"));
        assert!(out.contains("export type GetProductsByIdResponse = Product;\n"));
        assert!(out.contains("export type CreateCategoryBody = Category;\n"));
        assert!(out.contains("export const CreateCategoryBodySchema = z.lazy(() => CategorySchema);\n"));
        assert!(out.contains("export type CreateCategoryResponse = void;\n"));
        assert!(out.contains("export const PRODUCTS_OPERATIONS = [\"getProductsById\"] as const;\n"));
        assert!(out.contains(
            "  getProductsById: {\n    method: \"GET\",\n    path: \"/v1/products/{id}\",\n    tag: \"products\",\n    requiresAuth: false,\n    deprecated: false,\n  },\n"
        ));
    }

    #[test]
    fn test_header_and_base_url() {
        let out = render(shop());
        assert!(out.starts_with("/**\n * Shop v1.0.0\n"));
        assert!(out.contains("import { z } from \"zod\";\n"));
        assert!(out.contains("export const API_BASE_URL = \"https://api.shop.test\";\n"));
        assert!(!out.contains("Generated at"));
    }

    #[test]
    fn test_contract_without_models() {
        let out = render(json!({ "paths": { "/v1/health": { "get": { "responses": {} } } } }));
        assert!(!out.contains("Models"));
        assert!(out.contains("// Operations: default\n"));
        assert!(out.contains("export type GetHealthResponse = void;\n"));
    }
}
