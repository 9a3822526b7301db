//! IR Builder
//!
//! Walks the raw document once and produces a [`ParsedSpec`]. Building never
//! fails: missing metadata falls back to defaults and malformed fragments are
//! skipped with a debug event. Structural problems are the linter's job.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::resolver::SchemaResolver;
use super::{
    HttpMethod, ParamLocation, ParsedModel, ParsedOperation, ParsedParameter, ParsedRequestBody,
    ParsedResponse, ParsedSchema, ParsedSpec, SecurityScheme, DEFAULT_TAG,
};
use crate::loader::scalar_text;
use crate::names::to_pascal_case;

/// Media type preferred when a body declares several
const PREFERRED_CONTENT_TYPE: &str = "application/json";

/// Build the IR from a parsed contract document
pub fn build_spec(doc: &Value) -> ParsedSpec {
    let resolver = SchemaResolver::new(doc);
    let info = doc.get("info");
    let text = |v: Option<&Value>, key: &str| v.and_then(|v| v.get(key)).and_then(scalar_text);

    let root_requires_auth = matches!(doc.get("security"), Some(Value::Array(list)) if !list.is_empty());

    let mut operations = Vec::new();
    if let Some(Value::Object(paths)) = doc.get("paths") {
        for (path, item) in paths {
            let Some(item) = resolver.deref_object(item).and_then(Value::as_object) else {
                continue;
            };
            operations.extend(build_path_item(&resolver, path, item, root_requires_auth));
        }
    }

    let tags: BTreeSet<String> = operations
        .iter()
        .flat_map(|op: &ParsedOperation| op.tags.iter().cloned())
        .collect();

    let models = build_models(&resolver, doc);
    let security_schemes = build_security_schemes(doc);

    let base_url = doc
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
        .and_then(|server| server.get("url"))
        .and_then(Value::as_str)
        .unwrap_or("/")
        .to_string();

    let spec = ParsedSpec {
        title: text(info, "title").unwrap_or_else(|| "Untitled API".to_string()),
        version: text(info, "version").unwrap_or_else(|| "0.0.0".to_string()),
        description: text(info, "description"),
        base_url,
        operations,
        models,
        tags: tags.into_iter().collect(),
        security_schemes,
    };

    info!(
        title = %spec.title,
        operations = spec.operations.len(),
        models = spec.models.len(),
        tags = spec.tags.len(),
        "built contract IR"
    );
    spec
}

fn build_path_item(
    resolver: &SchemaResolver<'_>,
    path: &str,
    item: &Map<String, Value>,
    root_requires_auth: bool,
) -> Vec<ParsedOperation> {
    let shared_params = parse_parameters(resolver, item.get("parameters"));

    item.iter()
        .filter_map(|(key, op)| Some((HttpMethod::parse(key)?, op.as_object()?)))
        .map(|(method, op)| {
            let operation_id = op
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| derive_operation_id(method, path));

            let mut tags: Vec<String> = op
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            if tags.is_empty() {
                tags.push(DEFAULT_TAG.to_string());
            }

            let parameters = merge_parameters(
                shared_params.clone(),
                parse_parameters(resolver, op.get("parameters")),
            );

            let request_body = op
                .get("requestBody")
                .and_then(|body| parse_request_body(resolver, body));

            let responses = op
                .get("responses")
                .and_then(Value::as_object)
                .map(|responses| parse_responses(resolver, responses))
                .unwrap_or_default();

            let requires_auth = match op.get("security") {
                Some(Value::Array(list)) => !list.is_empty(),
                _ => root_requires_auth,
            };

            debug!(%method, path, operation_id = %operation_id, "parsed operation");

            ParsedOperation {
                operation_id,
                method,
                path: path.to_string(),
                summary: op.get("summary").and_then(Value::as_str).map(str::to_string),
                description: op.get("description").and_then(Value::as_str).map(str::to_string),
                tags,
                parameters,
                request_body,
                responses,
                requires_auth,
                deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
            }
        })
        .collect()
}

/// Derive an operation id from method and path.
///
/// A leading version segment is dropped, `{param}` becomes `By` + `Param`,
/// other segments are PascalCased and the lower-cased method is prefixed:
/// `GET /v1/products/{id}` → `getProductsById`.
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if segments.peek().is_some_and(|s| is_version_segment(s)) {
        segments.next();
    }

    let mut id = method.as_str().to_string();
    for segment in segments {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(param) => {
                id.push_str("By");
                id.push_str(&to_pascal_case(param));
            }
            None => id.push_str(&to_pascal_case(segment)),
        }
    }
    id
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Union path-item and operation parameters by name.
///
/// An operation-level declaration replaces a path-item declaration of the
/// same name in place; operation-only parameters follow in declaration order.
pub fn merge_parameters(path_level: Vec<ParsedParameter>, op_level: Vec<ParsedParameter>) -> Vec<ParsedParameter> {
    let mut merged: Vec<ParsedParameter> = Vec::with_capacity(path_level.len() + op_level.len());
    for param in path_level.into_iter().chain(op_level) {
        match merged.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    merged
}

fn parse_parameters(resolver: &SchemaResolver<'_>, value: Option<&Value>) -> Vec<ParsedParameter> {
    let Some(Value::Array(params)) = value else {
        return Vec::new();
    };
    params
        .iter()
        .filter_map(|param| parse_parameter(resolver, param))
        .collect()
}

fn parse_parameter(resolver: &SchemaResolver<'_>, value: &Value) -> Option<ParsedParameter> {
    let param = resolver.deref_object(value)?;
    let name = param.get("name").and_then(Value::as_str);
    let location = param.get("in").and_then(Value::as_str).and_then(ParamLocation::parse);
    let (Some(name), Some(location)) = (name, location) else {
        debug!(?param, "skipping parameter without name or location");
        return None;
    };

    let schema = param
        .get("schema")
        .or_else(|| first_media_schema(param.get("content")))
        .map(|schema| resolver.resolve(schema, 0))
        .unwrap_or_else(ParsedSchema::any);

    Some(ParsedParameter {
        name: name.to_string(),
        location,
        required: location == ParamLocation::Path
            || param.get("required").and_then(Value::as_bool).unwrap_or(false),
        schema,
        description: param.get("description").and_then(Value::as_str).map(str::to_string),
    })
}

fn parse_request_body(resolver: &SchemaResolver<'_>, value: &Value) -> Option<ParsedRequestBody> {
    let body = resolver.deref_object(value)?;
    let (content_type, media) = pick_media(body.get("content"))?;
    Some(ParsedRequestBody {
        content_type,
        schema: media
            .get("schema")
            .map(|schema| resolver.resolve(schema, 0))
            .unwrap_or_else(ParsedSchema::any),
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn parse_responses(resolver: &SchemaResolver<'_>, responses: &Map<String, Value>) -> Vec<ParsedResponse> {
    responses
        .iter()
        .filter_map(|(status, response)| {
            let response = resolver.deref_object(response)?;
            let media = pick_media(response.get("content"));
            Some(ParsedResponse {
                status: status.clone(),
                description: response.get("description").and_then(Value::as_str).map(str::to_string),
                content_type: media.as_ref().map(|(content_type, _)| content_type.clone()),
                schema: media
                    .and_then(|(_, media)| media.get("schema"))
                    .map(|schema| resolver.resolve(schema, 0)),
            })
        })
        .collect()
}

/// Pick the JSON media entry if present, otherwise the first one
fn pick_media(content: Option<&Value>) -> Option<(String, &Value)> {
    let content = content?.as_object()?;
    content
        .get_key_value(PREFERRED_CONTENT_TYPE)
        .or_else(|| content.iter().next())
        .map(|(content_type, media)| (content_type.clone(), media))
}

fn first_media_schema(content: Option<&Value>) -> Option<&Value> {
    pick_media(content).and_then(|(_, media)| media.get("schema"))
}

fn build_models(resolver: &SchemaResolver<'_>, doc: &Value) -> Vec<ParsedModel> {
    let Some(Value::Object(schemas)) = doc.pointer("/components/schemas") else {
        return Vec::new();
    };
    schemas
        .iter()
        .map(|(name, raw)| {
            let schema = resolver.resolve(raw, 0);
            ParsedModel {
                name: name.clone(),
                description: schema.description.clone(),
                properties: schema.properties().to_vec(),
                required: schema.required(),
                schema,
            }
        })
        .collect()
}

fn build_security_schemes(doc: &Value) -> Vec<SecurityScheme> {
    let Some(Value::Object(schemes)) = doc.pointer("/components/securitySchemes") else {
        return Vec::new();
    };
    let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
    schemes
        .iter()
        .map(|(name, scheme)| SecurityScheme {
            name: name.clone(),
            kind: text(scheme, "type").unwrap_or_else(|| "unknown".to_string()),
            scheme: text(scheme, "scheme"),
            bearer_format: text(scheme, "bearerFormat"),
            location: text(scheme, "in"),
            param_name: text(scheme, "name"),
        })
        .collect()
}
