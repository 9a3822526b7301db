//! Contract document loading and pointer resolution
//!
//! A contract is parsed into a `serde_json::Value` tree regardless of its
//! source syntax. Everything downstream (resolver, linter) walks that tree.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{CodegenError, Result};

/// Source syntax of a contract document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// Unrecognized extension: try JSON, then YAML
    Unknown,
}

impl DocumentFormat {
    /// Detect the syntax from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Unknown,
        }
    }
}

/// Read and parse a contract document from disk
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
    let format = DocumentFormat::from_path(path);
    debug!(path = %path.display(), ?format, bytes = content.len(), "loaded contract");
    parse_document(&content, format).map_err(|message| CodegenError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Parse contract text in the given syntax
pub fn parse_document(content: &str, format: DocumentFormat) -> std::result::Result<Value, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => parse_yaml(content),
        DocumentFormat::Unknown => match serde_json::from_str(content) {
            Ok(value) => Ok(value),
            Err(_) => parse_yaml(content),
        },
    }
}

fn parse_yaml(content: &str) -> std::result::Result<Value, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    Ok(yaml_to_tree(yaml))
}

/// Convert a YAML tree into the JSON tagged-value tree.
///
/// YAML allows non-string mapping keys (`200:` under `responses`), which are
/// stringified here.
fn yaml_to_tree(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_tree).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = serde_json::Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => serde_yaml::to_string(&other)
                        .map(|s| s.trim().to_string())
                        .unwrap_or_default(),
                };
                map.insert(key, yaml_to_tree(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_tree(tagged.value),
    }
}

/// Resolve a local reference (`#/a/b/c`) against the document root.
///
/// Returns `None` for non-local references and for any segment that does not
/// exist in the tree.
pub fn resolve_pointer<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let path = reference.strip_prefix('#')?;
    if path.is_empty() {
        return Some(root);
    }
    let path = path.strip_prefix('/')?;

    let mut current = root;
    for raw in path.split('/') {
        let segment = unescape_segment(raw);
        current = match current {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// The textual name a reference points at (its last segment)
pub fn reference_name(reference: &str) -> Option<String> {
    reference
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "#")
        .map(unescape_segment)
}

/// Text of a scalar metadata field; YAML reads `version: 1.0` as a number
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn unescape_segment(raw: &str) -> String {
    raw.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_text() {
        let doc = parse_document("version: 1.0\nbuild: 7\nname: Shop\nflag: true\n", DocumentFormat::Yaml).unwrap();
        assert_eq!(scalar_text(&doc["version"]).as_deref(), Some("1.0"));
        assert_eq!(scalar_text(&doc["build"]).as_deref(), Some("7"));
        assert_eq!(scalar_text(&doc["name"]).as_deref(), Some("Shop"));
        assert_eq!(scalar_text(&doc["flag"]), None);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_path(Path::new("api.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("api.YAML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("api.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("api")), DocumentFormat::Unknown);
    }

    #[test]
    fn test_yaml_and_json_parse_to_same_tree() {
        let json = parse_document(r#"{"openapi": "3.0.3", "info": {"title": "Shop"}}"#, DocumentFormat::Json).unwrap();
        let yaml = parse_document("openapi: 3.0.3\ninfo:\n  title: Shop\n", DocumentFormat::Yaml).unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let doc = parse_document("responses:\n  200:\n    description: ok\n", DocumentFormat::Yaml).unwrap();
        assert_eq!(doc["responses"]["200"]["description"], "ok");
    }

    #[test]
    fn test_unknown_format_falls_back_to_yaml() {
        let doc = parse_document("openapi: 3.1.0\n", DocumentFormat::Unknown).unwrap();
        assert_eq!(doc["openapi"], "3.1.0");
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(parse_document("{ not json", DocumentFormat::Json).is_err());
    }

    #[test]
    fn test_resolve_pointer() {
        let doc = json!({
            "components": {
                "schemas": { "Product": { "type": "object" }, "a/b": { "type": "string" } }
            },
            "list": [1, 2, 3]
        });
        assert_eq!(
            resolve_pointer(&doc, "#/components/schemas/Product"),
            Some(&json!({ "type": "object" }))
        );
        assert_eq!(
            resolve_pointer(&doc, "#/components/schemas/a~1b"),
            Some(&json!({ "type": "string" }))
        );
        assert_eq!(resolve_pointer(&doc, "#/list/1"), Some(&json!(2)));
        assert_eq!(resolve_pointer(&doc, "#"), Some(&doc));
        assert!(resolve_pointer(&doc, "#/components/schemas/Missing").is_none());
        assert!(resolve_pointer(&doc, "other.json#/Product").is_none());
    }

    #[test]
    fn test_reference_name() {
        assert_eq!(reference_name("#/components/schemas/Product").as_deref(), Some("Product"));
        assert_eq!(reference_name("#"), None);
    }
}
