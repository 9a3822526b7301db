//! TypeScript pretty-printer
//!
//! The single place where generated code becomes text. Two-space indents,
//! trailing commas in multi-line literals, one blank line between
//! declarations. Output is a pure function of the tree.

use serde_json::Value;

use super::ast::{Binding, Expr, Field, Item, Param, Prop, Stmt, TemplatePart, TypeExpr};
use crate::names::is_plain_property;

const INDENT: &str = "  ";
/// Literals that fit in this width stay on one line
const INLINE_WIDTH: usize = 80;

fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn literal(value: &Value) -> String {
    value.to_string()
}

fn property_key(name: &str) -> String {
    if is_plain_property(name) {
        name.to_string()
    } else {
        literal(&Value::String(name.to_string()))
    }
}

fn doc_line(doc: &str, level: usize) -> String {
    let doc = doc.replace("*/", "*\\/");
    let lines: Vec<&str> = doc.lines().map(str::trim_end).collect();
    if lines.len() <= 1 {
        return format!("{}/** {} */\n", pad(level), doc.trim());
    }
    let mut out = format!("{}/**\n", pad(level));
    for line in lines {
        if line.is_empty() {
            out.push_str(&format!("{} *\n", pad(level)));
        } else {
            out.push_str(&format!("{} * {}\n", pad(level), line));
        }
    }
    out.push_str(&format!("{} */\n", pad(level)));
    out
}

// =============================================================================
// Types
// =============================================================================

/// Print a type; `level` is the indent of the line the type starts on
pub fn print_type(ty: &TypeExpr, level: usize) -> String {
    match ty {
        TypeExpr::Keyword(keyword) => keyword.to_string(),
        TypeExpr::Literal(value) => literal(value),
        TypeExpr::Named(name) => name.clone(),
        TypeExpr::Generic { name, args } => {
            let args: Vec<String> = args.iter().map(|a| print_type(a, level)).collect();
            format!("{}<{}>", name, args.join(", "))
        }
        TypeExpr::Array(item) => format!("Array<{}>", print_type(item, level)),
        TypeExpr::Record(value) => format!("Record<string, {}>", print_type(value, level)),
        TypeExpr::Object(fields) if fields.is_empty() => "{}".to_string(),
        TypeExpr::Object(fields) => format!("{{\n{}{}}}", print_fields(fields, level + 1), pad(level)),
        TypeExpr::Union(members) => members
            .iter()
            .map(|m| print_type(m, level))
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

fn print_fields(fields: &[Field], level: usize) -> String {
    let mut out = String::new();
    for field in fields {
        if let Some(doc) = &field.doc {
            out.push_str(&doc_line(doc, level));
        }
        out.push_str(&format!(
            "{}{}{}: {};\n",
            pad(level),
            property_key(&field.name),
            if field.optional { "?" } else { "" },
            print_type(&field.ty, level)
        ));
    }
    out
}

// =============================================================================
// Expressions
// =============================================================================

/// Print an expression; `level` is the indent of the line it starts on
pub fn print_expr(expr: &Expr, level: usize) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Literal(value) => literal(value),
        Expr::Regex(pattern) => format!("/{}/", escape_regex(pattern)),
        Expr::Template(parts) => {
            let mut out = String::from("`");
            for part in parts {
                match part {
                    TemplatePart::Text(text) => out.push_str(&escape_template(text)),
                    TemplatePart::Expr(expr) => out.push_str(&format!("${{{}}}", print_expr(expr, level))),
                }
            }
            out.push('`');
            out
        }
        Expr::Array(items) => {
            let printed: Vec<String> = items.iter().map(|i| print_expr(i, level + 1)).collect();
            wrap_list("[", "]", printed, level, false)
        }
        Expr::Object(props) => {
            let printed: Vec<String> = props.iter().map(|p| print_prop(p, level + 1)).collect();
            wrap_list("{", "}", printed, level, true)
        }
        Expr::Member { object, property } => format!("{}.{}", print_expr(object, level), property),
        Expr::Index { object, index } => {
            format!("{}[{}]", print_expr(object, level), print_expr(index, level))
        }
        Expr::Call { callee, type_args, args } => {
            let generics = if type_args.is_empty() {
                String::new()
            } else {
                let types: Vec<String> = type_args.iter().map(|t| print_type(t, level)).collect();
                format!("<{}>", types.join(", "))
            };
            let args: Vec<String> = args.iter().map(|a| print_expr(a, level)).collect();
            format!("{}{}({})", print_expr(callee, level), generics, args.join(", "))
        }
        Expr::Arrow { params, body } => {
            let body_text = print_expr(body, level);
            let body_text = if matches!(body.as_ref(), Expr::Object(_)) {
                format!("({})", body_text)
            } else {
                body_text
            };
            format!("({}) => {}", print_params(params, level), body_text)
        }
        Expr::Prefix { op, operand } => {
            let separator = if op.chars().all(char::is_alphabetic) { " " } else { "" };
            format!("{}{}{}", op, separator, print_expr(operand, level))
        }
        Expr::AsConst(inner) => format!("{} as const", print_expr(inner, level)),
    }
}

fn print_prop(prop: &Prop, level: usize) -> String {
    match prop {
        Prop::KeyValue(key, value) => format!("{}: {}", property_key(key), print_expr(value, level)),
        Prop::Shorthand(name) => name.clone(),
        Prop::Spread(expr) => format!("...{}", print_expr(expr, level)),
    }
}

/// Inline when short and flat, otherwise one entry per line with trailing commas
fn wrap_list(open: &str, close: &str, entries: Vec<String>, level: usize, spaced: bool) -> String {
    if entries.is_empty() {
        return format!("{}{}", open, close);
    }
    let inline = entries.join(", ");
    if !inline.contains('\n') && inline.len() + level * INDENT.len() <= INLINE_WIDTH {
        return if spaced {
            format!("{} {} {}", open, inline, close)
        } else {
            format!("{}{}{}", open, inline, close)
        };
    }
    let mut out = format!("{}\n", open);
    for entry in entries {
        out.push_str(&format!("{}{},\n", pad(level + 1), entry));
    }
    out.push_str(&format!("{}{}", pad(level), close));
    out
}

fn print_params(params: &[Param], level: usize) -> String {
    params
        .iter()
        .map(|p| match &p.ty {
            Some(ty) => format!("{}{}: {}", p.name, if p.optional { "?" } else { "" }, print_type(ty, level)),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for c in pattern.chars() {
        if c == '/' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

// =============================================================================
// Statements
// =============================================================================

fn print_stmts(stmts: &[Stmt], level: usize) -> String {
    stmts.iter().map(|s| print_stmt(s, level)).collect()
}

fn print_stmt(stmt: &Stmt, level: usize) -> String {
    match stmt {
        Stmt::Const { binding, value } => {
            let binding = match binding {
                Binding::Name(name) => name.clone(),
                Binding::Destructure { fields, rest } => {
                    let mut entries: Vec<String> = fields
                        .iter()
                        .map(|(key, local)| {
                            if key == local {
                                local.clone()
                            } else {
                                format!("{}: {}", property_key(key), local)
                            }
                        })
                        .collect();
                    if let Some(rest) = rest {
                        entries.push(format!("...{}", rest));
                    }
                    format!("{{ {} }}", entries.join(", "))
                }
            };
            format!("{}const {} = {};\n", pad(level), binding, print_expr(value, level))
        }
        Stmt::Assign { target, value } => format!(
            "{}{} = {};\n",
            pad(level),
            print_expr(target, level),
            print_expr(value, level)
        ),
        Stmt::Return(value) => format!("{}return {};\n", pad(level), print_expr(value, level)),
        Stmt::Expr(value) => format!("{}{};\n", pad(level), print_expr(value, level)),
        Stmt::If { cond, then, otherwise } => {
            let mut out = format!(
                "{}if ({}) {{\n{}{}}}",
                pad(level),
                print_expr(cond, level),
                print_stmts(then, level + 1),
                pad(level)
            );
            if !otherwise.is_empty() {
                out.push_str(&format!(" else {{\n{}{}}}", print_stmts(otherwise, level + 1), pad(level)));
            }
            out.push('\n');
            out
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

pub fn print_item(item: &Item) -> String {
    match item {
        Item::DocBlock(lines) => {
            let mut out = String::from("/**\n");
            for line in lines {
                if line.is_empty() {
                    out.push_str(" *\n");
                } else {
                    out.push_str(&format!(" * {}\n", line.replace("*/", "*\\/")));
                }
            }
            out.push_str(" */\n");
            out
        }
        Item::Banner(title) => {
            let rule = format!("// {}", "=".repeat(77));
            format!("{}\n// {}\n{}\n", rule, title, rule)
        }
        Item::Import { default, names, from, type_only } => {
            let mut clauses = Vec::new();
            if let Some(default) = default {
                clauses.push(default.clone());
            }
            if !names.is_empty() {
                clauses.push(format!("{{ {} }}", names.join(", ")));
            }
            format!(
                "import {}{} from {};\n",
                if *type_only { "type " } else { "" },
                clauses.join(", "),
                literal(&Value::String(from.clone()))
            )
        }
        Item::TypeAlias { name, ty, doc } => {
            let mut out = doc.as_deref().map(|d| doc_line(d, 0)).unwrap_or_default();
            out.push_str(&format!("export type {} = {};\n", name, print_type(ty, 0)));
            out
        }
        Item::Interface { name, fields, doc } => {
            let mut out = doc.as_deref().map(|d| doc_line(d, 0)).unwrap_or_default();
            out.push_str(&format!("export interface {} {{\n{}}}\n", name, print_fields(fields, 1)));
            out
        }
        Item::Const { name, annotation, value, doc } => {
            let mut out = doc.as_deref().map(|d| doc_line(d, 0)).unwrap_or_default();
            let annotation = annotation
                .as_ref()
                .map(|ty| format!(": {}", print_type(ty, 0)))
                .unwrap_or_default();
            out.push_str(&format!("export const {}{} = {};\n", name, annotation, print_expr(value, 0)));
            out
        }
        Item::Function { name, is_async, params, returns, body, doc } => {
            let mut out = doc.as_deref().map(|d| doc_line(d, 0)).unwrap_or_default();
            let returns = returns
                .as_ref()
                .map(|ty| format!(": {}", print_type(ty, 0)))
                .unwrap_or_default();
            out.push_str(&format!(
                "export {}function {}({}){} {{\n{}}}\n",
                if *is_async { "async " } else { "" },
                name,
                print_params(params, 0),
                returns,
                print_stmts(body, 1)
            ));
            out
        }
    }
}

/// Print a whole module: imports grouped, one blank line between declarations
pub fn print_module(items: &[Item]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Item> = None;
    for item in items {
        if let Some(previous) = previous {
            let both_imports = matches!(previous, Item::Import { .. }) && matches!(item, Item::Import { .. });
            if !both_imports {
                out.push('\n');
            }
        }
        out.push_str(&print_item(item));
        previous = Some(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_print_object_type() {
        let ty = TypeExpr::Object(vec![
            Field {
                name: "id".to_string(),
                ty: TypeExpr::Keyword("string"),
                optional: false,
                doc: None,
            },
            Field {
                name: "display-name".to_string(),
                ty: TypeExpr::Keyword("string").or_null(),
                optional: true,
                doc: Some("Shown in the UI".to_string()),
            },
        ]);
        assert_eq!(
            print_type(&ty, 0),
            "{\n  id: string;\n  /** Shown in the UI */\n  \"display-name\"?: string | null;\n}"
        );
        assert_eq!(
            print_type(&TypeExpr::Array(Box::new(ty.clone())), 1),
            "Array<{\n    id: string;\n    /** Shown in the UI */\n    \"display-name\"?: string | null;\n  }>"
        );
    }

    #[test]
    fn test_print_call_chain() {
        let expr = Expr::ident("z")
            .method("string", vec![])
            .method("min", vec![Expr::number(1.0)])
            .method("regex", vec![Expr::Regex("^a/b$".to_string())]);
        assert_eq!(print_expr(&expr, 0), "z.string().min(1).regex(/^a\\/b$/)");
    }

    #[test]
    fn test_print_numbers() {
        assert_eq!(print_expr(&Expr::number(10.0), 0), "10");
        assert_eq!(print_expr(&Expr::number(0.5), 0), "0.5");
        assert_eq!(print_expr(&Expr::number(-3.0), 0), "-3");
    }

    #[test]
    fn test_object_literal_wraps_when_long() {
        let short = Expr::Object(vec![Prop::KeyValue("baseURL".to_string(), Expr::ident("API_BASE_URL"))]);
        assert_eq!(print_expr(&short, 0), "{ baseURL: API_BASE_URL }");

        let long = Expr::Object(
            (0..6)
                .map(|i| Prop::KeyValue(format!("field{}", i), Expr::ident("z").method("string", vec![])))
                .collect(),
        );
        let text = print_expr(&long, 0);
        assert!(text.starts_with("{\n  field0: z.string(),\n"));
        assert!(text.ends_with("  field5: z.string(),\n}"));
    }

    #[test]
    fn test_print_template() {
        let expr = Expr::Template(vec![
            TemplatePart::Text("/v1/products/".to_string()),
            TemplatePart::Expr(Expr::ident("id")),
        ]);
        assert_eq!(print_expr(&expr, 0), "`/v1/products/${id}`");
    }

    #[test]
    fn test_print_function() {
        let item = Item::Function {
            name: "getHealth".to_string(),
            is_async: true,
            params: vec![Param::optional("config", TypeExpr::named("AxiosRequestConfig"))],
            returns: Some(TypeExpr::generic("Promise", vec![TypeExpr::Keyword("void")])),
            body: vec![
                Stmt::Const {
                    binding: Binding::Destructure {
                        fields: vec![("id".to_string(), "id".to_string()), ("user-id".to_string(), "userId".to_string())],
                        rest: Some("query".to_string()),
                    },
                    value: Expr::ident("params"),
                },
                Stmt::Return(Expr::Literal(json!(null))),
            ],
            doc: None,
        };
        assert_eq!(
            print_item(&item),
            "export async function getHealth(config?: AxiosRequestConfig): Promise<void> {\n  const { id, \"user-id\": userId, ...query } = params;\n  return null;\n}\n"
        );
    }

    #[test]
    fn test_print_module_groups_imports() {
        let items = vec![
            Item::Import {
                default: Some("axios".to_string()),
                names: vec![],
                from: "axios".to_string(),
                type_only: false,
            },
            Item::Import {
                default: None,
                names: vec!["AxiosInstance".to_string()],
                from: "axios".to_string(),
                type_only: true,
            },
            Item::TypeAlias {
                name: "Id".to_string(),
                ty: TypeExpr::Keyword("string"),
                doc: None,
            },
        ];
        assert_eq!(
            print_module(&items),
            "import axios from \"axios\";\nimport type { AxiosInstance } from \"axios\";\n\nexport type Id = string;\n"
        );
    }
}
