//! Individual lint passes

use std::collections::BTreeSet;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::{Map, Value};

use super::{ContractLinter, Findings};
use crate::ir::{HttpMethod, MAX_RESOLVE_DEPTH};
use crate::loader::{reference_name, resolve_pointer, scalar_text};

const COMPOSITION_KEYWORDS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn missing_text(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key)
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty())
}

/// Like `missing_text`, but numbers count as text
fn missing_scalar(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key)
        .and_then(scalar_text)
        .map_or(true, |s| s.trim().is_empty())
}

/// Follow `$ref` chains for non-schema objects; `None` when unresolvable
fn deref<'a>(doc: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..=MAX_RESOLVE_DEPTH {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => current = resolve_pointer(doc, reference)?,
            None => return Some(current),
        }
    }
    None
}

/// Parse the `openapi` field, padding `3` / `3.1` to full semver
pub(crate) fn parse_contract_version(text: &str) -> Option<semver::Version> {
    let parts = text.trim().split('.').count();
    let padded = match parts {
        1 => format!("{}.0.0", text.trim()),
        2 => format!("{}.0", text.trim()),
        _ => text.trim().to_string(),
    };
    semver::Version::parse(&padded).ok()
}

/// Normalize a path template for comparison: `{anything}` → `{}`
fn normalize_template(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Iterate `(path, method, operation)` over every operation in the document
pub(super) fn operations<'a>(doc: &'a Value) -> Vec<(&'a str, HttpMethod, &'a Map<String, Value>)> {
    let Some(Value::Object(paths)) = doc.get("paths") else {
        return Vec::new();
    };
    paths
        .iter()
        .filter_map(|(path, item)| Some((path.as_str(), deref(doc, item)?.as_object()?)))
        .flat_map(|(path, item)| {
            item.iter()
                .filter_map(move |(key, op)| Some((path, HttpMethod::parse(key)?, op.as_object()?)))
        })
        .collect()
}

impl ContractLinter {
    // =========================================================================
    // Version / Metadata
    // =========================================================================

    pub(super) fn check_metadata(&self, doc: &Value, out: &mut Findings) {
        match doc.get("openapi") {
            None if doc.get("swagger").is_some() => out.error(
                "INCOMPATIBLE_VERSION",
                "swagger",
                "Swagger 2.0 documents are not supported; convert to OpenAPI 3.x",
            ),
            None => out.error("MISSING_VERSION", "openapi", "Missing 'openapi' version field"),
            Some(value) => {
                let text = scalar_text(value);
                match text.as_deref().map(|t| (t, parse_contract_version(t))) {
                    Some((_, Some(version))) if version.major == 3 => {}
                    Some((text, Some(_))) => out.error(
                        "INCOMPATIBLE_VERSION",
                        "openapi",
                        format!("OpenAPI version '{}' is not supported; expected 3.x", text),
                    ),
                    _ => out.error(
                        "INVALID_VERSION",
                        "openapi",
                        format!("Invalid 'openapi' version: {}", value),
                    ),
                }
            }
        }

        let Some(Value::Object(info)) = doc.get("info") else {
            out.error("MISSING_INFO", "info", "Missing 'info' object");
            return;
        };
        if missing_scalar(info, "title") {
            out.error("MISSING_TITLE", "info.title", "Contract has no title");
        }
        if missing_scalar(info, "version") {
            out.error("MISSING_API_VERSION", "info.version", "Contract has no version");
        }
        if missing_text(info, "description") {
            out.warning("MISSING_DESCRIPTION", "info.description", "Contract has no description");
        }
    }

    // =========================================================================
    // Servers
    // =========================================================================

    pub(super) fn check_servers(&self, doc: &Value, out: &mut Findings) {
        match doc.get("servers") {
            Some(Value::Array(servers)) if !servers.is_empty() => {
                for (i, server) in servers.iter().enumerate() {
                    let has_url = server
                        .get("url")
                        .and_then(Value::as_str)
                        .is_some_and(|url| !url.trim().is_empty());
                    if !has_url {
                        out.error(
                            "MISSING_SERVER_URL",
                            format!("servers[{}]", i),
                            "Server declaration has no 'url'",
                        );
                    }
                }
            }
            _ => out.warning(
                "NO_SERVERS",
                "servers",
                "No servers declared; generated clients will need an explicit base URL",
            ),
        }
    }

    // =========================================================================
    // Reference Integrity
    // =========================================================================

    pub(super) fn check_references(&self, doc: &Value, out: &mut Findings) {
        let mut references = Vec::new();
        collect_references(doc, "", &mut references);
        if references.is_empty() {
            return;
        }

        let candidates = component_pointers(doc);
        for (location, reference) in references {
            if resolve_pointer(doc, &reference).is_some() {
                continue;
            }
            let message = match suggest(&candidates, &reference) {
                Some(suggestion) => format!(
                    "Unresolvable reference '{}' (did you mean '{}'?)",
                    reference, suggestion
                ),
                None => format!("Unresolvable reference '{}'", reference),
            };
            out.error("UNRESOLVED_REFERENCE", location, message);
        }
    }

    // =========================================================================
    // Paths / Operations
    // =========================================================================

    pub(super) fn check_operations(&self, doc: &Value, out: &mut Findings) {
        let Some(Value::Object(paths)) = doc.get("paths") else {
            out.error("MISSING_PATHS", "paths", "Contract declares no 'paths'");
            return;
        };

        for (path, item) in paths {
            let item_path = child("paths", path);
            let Some(item) = deref(doc, item).and_then(Value::as_object) else {
                continue;
            };

            let placeholders: Vec<&str> = self
                .placeholder
                .captures_iter(path)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();

            for (key, op) in item {
                let Some(method) = HttpMethod::parse(key) else { continue };
                let Some(op) = op.as_object() else { continue };
                let op_path = child(&item_path, key);
                let label = format!("{} {}", method, path);

                self.check_responses(op, &op_path, &label, out);

                if missing_text(op, "operationId") {
                    out.warning("MISSING_OPERATION_ID", &op_path, format!("{} has no operationId", label));
                }
                if missing_text(op, "summary") {
                    out.warning("MISSING_SUMMARY", &op_path, format!("{} has no summary", label));
                }
                if op.get("tags").and_then(Value::as_array).map_or(true, Vec::is_empty) {
                    out.warning("MISSING_TAGS", &op_path, format!("{} has no tags", label));
                }
                if method.expects_body() && !op.contains_key("requestBody") {
                    out.warning(
                        "MISSING_REQUEST_BODY",
                        &op_path,
                        format!("{} is a mutating operation without a request body", label),
                    );
                }

                let mut declared_path_params = BTreeSet::new();
                let shared = item.get("parameters").map(|p| (child(&item_path, "parameters"), p));
                let own = op.get("parameters").map(|p| (child(&op_path, "parameters"), p));
                for (params_path, params) in shared.into_iter().chain(own) {
                    let Some(params) = params.as_array() else { continue };
                    for (i, param) in params.iter().enumerate() {
                        let param_path = format!("{}[{}]", params_path, i);
                        // unresolvable parameter refs are reported by the reference pass
                        let Some(param) = deref(doc, param).and_then(Value::as_object) else {
                            continue;
                        };
                        if let Some(name) = self.check_parameter(param, &param_path, out) {
                            declared_path_params.insert(name);
                        }
                    }
                }

                for placeholder in &placeholders {
                    if !declared_path_params.contains(*placeholder) {
                        out.error(
                            "UNBOUND_PATH_PARAMETER",
                            &op_path,
                            format!(
                                "Path placeholder '{{{}}}' in {} has no matching path parameter '{}'",
                                placeholder, label, placeholder
                            ),
                        );
                    }
                }
                for declared in &declared_path_params {
                    if !placeholders.contains(&declared.as_str()) {
                        out.warning(
                            "UNUSED_PATH_PARAMETER",
                            &op_path,
                            format!("Path parameter '{}' does not appear in {}", declared, path),
                        );
                    }
                }
            }
        }
    }

    fn check_responses(&self, op: &Map<String, Value>, op_path: &str, label: &str, out: &mut Findings) {
        let codes: Vec<&str> = op
            .get("responses")
            .and_then(Value::as_object)
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default();

        if !codes.iter().any(|c| c.starts_with('2')) {
            out.warning(
                "MISSING_SUCCESS_RESPONSE",
                child(op_path, "responses"),
                format!("{} declares no 2xx response", label),
            );
        }
        if !codes.iter().any(|c| c.starts_with('4')) {
            out.warning(
                "MISSING_ERROR_RESPONSE",
                child(op_path, "responses"),
                format!("{} declares no 4xx response", label),
            );
        }
    }

    /// Check one parameter; returns its name when it is a path parameter
    fn check_parameter(&self, param: &Map<String, Value>, path: &str, out: &mut Findings) -> Option<String> {
        let name = param.get("name").and_then(Value::as_str).filter(|n| !n.is_empty());
        let location = param.get("in").and_then(Value::as_str);

        if name.is_none() {
            out.error("MISSING_PARAMETER_NAME", path, "Parameter has no 'name'");
        }
        if location.is_none() {
            out.error(
                "MISSING_PARAMETER_LOCATION",
                path,
                format!("Parameter '{}' has no 'in' location", name.unwrap_or("?")),
            );
        }
        if !param.contains_key("schema") && !param.contains_key("content") {
            out.warning(
                "MISSING_PARAMETER_SCHEMA",
                path,
                format!("Parameter '{}' has no schema", name.unwrap_or("?")),
            );
        }

        match (name, location) {
            (Some(name), Some("path")) => Some(name.to_string()),
            _ => None,
        }
    }

    // =========================================================================
    // Contract Coverage
    // =========================================================================

    pub(super) fn check_coverage(&self, doc: &Value, out: &mut Findings) {
        let defined: BTreeSet<(HttpMethod, String)> = operations(doc)
            .into_iter()
            .map(|(path, method, _)| (method, normalize_template(path)))
            .collect();

        for route in &self.policy.required_routes {
            if !defined.contains(&(route.method, normalize_template(&route.path))) {
                out.warning(
                    "MISSING_REQUIRED_ROUTE",
                    "paths",
                    format!("Required route {} is not defined", route),
                );
            }
        }
    }

    // =========================================================================
    // Security Coverage
    // =========================================================================

    pub(super) fn check_security(&self, doc: &Value, out: &mut Findings) {
        let default_secured = matches!(doc.get("security"), Some(Value::Array(list)) if !list.is_empty());

        for (path, method, op) in operations(doc) {
            if !self.policy.protected_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
                continue;
            }
            let secured = match op.get("security") {
                Some(Value::Array(list)) => !list.is_empty(),
                _ => default_secured,
            };
            if !secured {
                out.warning(
                    "UNPROTECTED_ROUTE",
                    child(&child("paths", path), method.as_str()),
                    format!("{} {} is under a protected prefix but has no security requirement", method, path),
                );
            }
        }
    }

    // =========================================================================
    // Content-Type Policy
    // =========================================================================

    pub(super) fn check_content_types(&self, doc: &Value, out: &mut Findings) {
        for (path, method, op) in operations(doc) {
            if !method.expects_body() {
                continue;
            }
            let Some(content) = op
                .get("requestBody")
                .and_then(|body| deref(doc, body))
                .and_then(|body| body.get("content"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            for media_type in content.keys() {
                let essence = media_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                let allowed = self
                    .policy
                    .allowed_content_types
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(&essence));
                if !allowed {
                    out.warning(
                        "UNSUPPORTED_CONTENT_TYPE",
                        format!("paths.{}.{}.requestBody.content", path, method.as_str()),
                        format!("{} {} accepts unsupported media type '{}'", method, path, media_type),
                    );
                }
            }
        }
    }

    // =========================================================================
    // Component Integrity
    // =========================================================================

    pub(super) fn check_components(&self, doc: &Value, out: &mut Findings) {
        let Some(Value::Object(schemas)) = doc.pointer("/components/schemas") else {
            return;
        };
        for (name, schema) in schemas {
            check_schema(schema, &format!("components.schemas.{}", name), 0, out);
        }
    }
}

/// Recursively check a schema; `$ref` nodes are leaves
fn check_schema(schema: &Value, path: &str, depth: usize, out: &mut Findings) {
    if depth > MAX_RESOLVE_DEPTH {
        return;
    }
    let obj = match schema {
        Value::Object(obj) => obj,
        Value::Bool(_) => return,
        _ => {
            out.error("INVALID_SCHEMA", path, "Schema must be an object");
            return;
        }
    };
    if obj.contains_key("$ref") {
        return;
    }

    let type_name = match obj.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    };

    if type_name == Some("array") && !obj.contains_key("items") {
        out.error("ARRAY_WITHOUT_ITEMS", path, "Array schema has no 'items'");
    }

    let has_shape = type_name.is_some() || COMPOSITION_KEYWORDS.iter().any(|k| obj.contains_key(*k));
    if !has_shape {
        out.warning(
            "UNTYPED_SCHEMA",
            path,
            "Schema has no type or composition keyword; it will be generated as unknown",
        );
    }

    if let Some(Value::Object(props)) = obj.get("properties") {
        for (name, prop) in props {
            check_schema(prop, &format!("{}.properties.{}", path, name), depth + 1, out);
        }
    }
    if let Some(items) = obj.get("items") {
        check_schema(items, &child(path, "items"), depth + 1, out);
    }
    if let Some(additional @ Value::Object(_)) = obj.get("additionalProperties") {
        check_schema(additional, &child(path, "additionalProperties"), depth + 1, out);
    }
    for keyword in COMPOSITION_KEYWORDS {
        if let Some(Value::Array(branches)) = obj.get(keyword) {
            for (i, branch) in branches.iter().enumerate() {
                check_schema(branch, &format!("{}.{}[{}]", path, keyword, i), depth + 1, out);
            }
        }
    }
}

/// Walk the whole tree collecting `(location, reference)` for every `$ref`
fn collect_references(value: &Value, path: &str, refs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                let child_path = child(path, key);
                match (key.as_str(), val) {
                    ("$ref", Value::String(reference)) => refs.push((child_path, reference.clone())),
                    _ => collect_references(val, &child_path, refs),
                }
            }
        }
        Value::Array(items) => {
            for (i, val) in items.iter().enumerate() {
                collect_references(val, &format!("{}[{}]", path, i), refs);
            }
        }
        _ => {}
    }
}

/// Every `#/components/<section>/<name>` pointer in the document
fn component_pointers(doc: &Value) -> Vec<String> {
    let Some(Value::Object(components)) = doc.get("components") else {
        return Vec::new();
    };
    components
        .iter()
        .filter_map(|(section, entries)| Some((section, entries.as_object()?)))
        .flat_map(|(section, entries)| {
            entries
                .keys()
                .map(move |name| format!("#/components/{}/{}", section, name.replace('~', "~0").replace('/', "~1")))
        })
        .collect()
}

/// Closest known component pointer to a dangling reference
fn suggest(candidates: &[String], reference: &str) -> Option<String> {
    let wanted = reference_name(reference)?;
    let matcher = SkimMatcherV2::default();
    candidates
        .iter()
        .filter_map(|candidate| {
            let name = reference_name(candidate)?;
            let score = matcher.fuzzy_match(&name, &wanted)?;
            Some((score, candidate))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate.clone())
}
