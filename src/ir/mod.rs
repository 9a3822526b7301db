//! Intermediate Representation
//!
//! The canonical, resolved view of a contract document. Built once by
//! [`build_spec`] and read-only afterwards; every code generator consumes
//! these types and never the raw document.
//!
//! ```text
//! raw Value ──resolver──▶ ParsedSchema
//!           ──builder───▶ ParsedOperation / ParsedModel ──▶ ParsedSpec
//!                          ParsedModel refs ──graph──▶ ModelGraph
//! ```

pub mod builder;
pub mod graph;
pub mod resolver;

pub use builder::{build_spec, derive_operation_id, merge_parameters};
pub use graph::ModelGraph;
pub use resolver::{SchemaResolver, MAX_RESOLVE_DEPTH};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Schema Nodes
// =============================================================================

/// Structural type tag of a resolved schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array {
        items: Box<ParsedSchema>,
    },
    Object {
        properties: Vec<ParsedProperty>,
        required: BTreeSet<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional: Option<Box<ParsedSchema>>,
    },
    /// `oneOf`/`anyOf`; variants keep document order
    Union {
        variants: Vec<ParsedSchema>,
        exclusive: bool,
    },
    /// Opaque node: unresolvable reference, depth cutoff, or untyped schema
    Any,
}

/// Validation constraints carried over from the schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A resolved schema fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSchema {
    #[serde(flatten)]
    pub kind: SchemaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Name of the component this node was dereferenced from
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl ParsedSchema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            format: None,
            nullable: false,
            description: None,
            enum_values: Vec::new(),
            ref_name: None,
            constraints: Constraints::default(),
        }
    }

    /// The opaque node
    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind, SchemaKind::Any) && self.ref_name.is_none()
    }

    /// Object properties, empty for non-object nodes
    pub fn properties(&self) -> &[ParsedProperty] {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Required property names, empty for non-object nodes
    pub fn required(&self) -> BTreeSet<String> {
        match &self.kind {
            SchemaKind::Object { required, .. } => required.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Names of every component referenced anywhere below this node
    pub fn referenced_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_refs(&mut names);
        names
    }

    fn collect_refs(&self, names: &mut BTreeSet<String>) {
        if let Some(name) = &self.ref_name {
            names.insert(name.clone());
            return;
        }
        match &self.kind {
            SchemaKind::Array { items } => items.collect_refs(names),
            SchemaKind::Object { properties, additional, .. } => {
                for prop in properties {
                    prop.schema.collect_refs(names);
                }
                if let Some(additional) = additional {
                    additional.collect_refs(names);
                }
            }
            SchemaKind::Union { variants, .. } => {
                for variant in variants {
                    variant.collect_refs(names);
                }
            }
            _ => {}
        }
    }
}

/// A named object property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProperty {
    pub name: String,
    pub schema: ParsedSchema,
}

// =============================================================================
// Operations
// =============================================================================

/// HTTP methods recognized under a path item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
        Self::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// POST, PUT and PATCH are expected to carry request bodies
    pub fn expects_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Safe methods that only read state
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedParameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: ParsedSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRequestBody {
    pub content_type: String,
    pub schema: ParsedSchema,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Status code as written (`200`, `2XX`, `default`)
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParsedSchema>,
}

impl ParsedResponse {
    pub fn is_success(&self) -> bool {
        self.status.starts_with('2')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedOperation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParsedParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<ParsedRequestBody>,
    pub responses: Vec<ParsedResponse>,
    pub requires_auth: bool,
    pub deprecated: bool,
}

impl ParsedOperation {
    /// First tag, used for grouping
    pub fn primary_tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(DEFAULT_TAG)
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParsedParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

/// Tag assigned to operations that declare none
pub const DEFAULT_TAG: &str = "default";

// =============================================================================
// Models and Spec
// =============================================================================

/// A named reusable schema from `components.schemas`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: ParsedSchema,
    pub properties: Vec<ParsedProperty>,
    pub required: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_name: Option<String>,
}

/// The resolved contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSpec {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_url: String,
    pub operations: Vec<ParsedOperation>,
    pub models: Vec<ParsedModel>,
    pub tags: Vec<String>,
    pub security_schemes: Vec<SecurityScheme>,
}

impl ParsedSpec {
    pub fn model(&self, name: &str) -> Option<&ParsedModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn operation(&self, operation_id: &str) -> Option<&ParsedOperation> {
        self.operations.iter().find(|o| o.operation_id == operation_id)
    }
}
