//! Contract Structural Linting
//!
//! Runs independent passes over the raw document tree. The linter does not
//! consult the IR: it re-derives everything from the document so that it can
//! catch what the depth-bounded resolver silently degrades.
//!
//! ## Passes
//! 1. **Version/metadata**: `openapi` version, `info` title/version/description
//! 2. **Servers**: declared servers and their addresses
//! 3. **Reference integrity**: every `$ref` re-resolved independently
//! 4. **Operations**: responses, ids, bodies, parameters, path placeholders
//! 5. **Coverage**: baseline routes every contract must define
//! 6. **Security**: protected prefixes need a security requirement
//! 7. **Content types**: request media types outside the allow-list
//! 8. **Components**: component schema integrity, depth bounded
//!
//! Passes never fail. Errors make the contract invalid; warnings never do.

mod passes;

use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ir::HttpMethod;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One structural issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFinding {
    pub code: &'static str,
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "{}: {} [{}]", path, self.message, self.code)
    }
}

/// Outcome of linting one document
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
    pub operation_count: usize,
    pub model_count: usize,
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the result passes, optionally treating warnings as failures
    pub fn passes(&self, strict: bool) -> bool {
        self.is_valid() && !(strict && self.has_warnings())
    }
}

/// A route every contract is expected to define
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirement {
    pub method: HttpMethod,
    pub path: String,
}

impl RouteRequirement {
    /// Parse `"POST /v1/auth/login"`
    pub fn parse(s: &str) -> Option<Self> {
        let (method, path) = s.trim().split_once(char::is_whitespace)?;
        Some(Self {
            method: HttpMethod::parse(method)?,
            path: path.trim().to_string(),
        })
    }
}

impl fmt::Display for RouteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Policy lists consulted by the coverage, security and content-type passes
#[derive(Debug, Clone)]
pub struct LintPolicy {
    pub required_routes: Vec<RouteRequirement>,
    pub protected_prefixes: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

impl Default for LintPolicy {
    fn default() -> Self {
        Self {
            required_routes: DEFAULT_REQUIRED_ROUTES
                .iter()
                .filter_map(|r| RouteRequirement::parse(r))
                .collect(),
            protected_prefixes: DEFAULT_PROTECTED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub const DEFAULT_REQUIRED_ROUTES: &[&str] = &[
    "POST /v1/auth/login",
    "POST /v1/auth/register",
    "GET /v1/products",
    "GET /v1/products/{id}",
    "GET /v1/health",
];

pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &["/v1/admin", "/v1/orders", "/v1/users"];

pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/json",
    "multipart/form-data",
    "application/x-www-form-urlencoded",
];

/// Accumulates findings across passes
#[derive(Debug, Default)]
struct Findings {
    errors: Vec<ValidationFinding>,
    warnings: Vec<ValidationFinding>,
}

impl Findings {
    fn error(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationFinding {
            code,
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationFinding {
            code,
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// The contract linter
pub struct ContractLinter {
    policy: LintPolicy,
    /// `{name}` placeholders in path templates
    placeholder: Regex,
}

impl Default for ContractLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractLinter {
    pub fn new() -> Self {
        Self::with_policy(LintPolicy::default())
    }

    pub fn with_policy(policy: LintPolicy) -> Self {
        Self {
            policy,
            placeholder: Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern is valid"),
        }
    }

    pub fn policy(&self) -> &LintPolicy {
        &self.policy
    }

    /// Lint a contract document
    pub fn lint(&self, doc: &Value) -> ValidationResult {
        let mut findings = Findings::default();

        self.check_metadata(doc, &mut findings);
        self.check_servers(doc, &mut findings);
        self.check_references(doc, &mut findings);
        self.check_operations(doc, &mut findings);
        self.check_coverage(doc, &mut findings);
        self.check_security(doc, &mut findings);
        self.check_content_types(doc, &mut findings);
        self.check_components(doc, &mut findings);

        let result = ValidationResult {
            valid: findings.errors.is_empty(),
            errors: findings.errors,
            warnings: findings.warnings,
            operation_count: passes::operations(doc).len(),
            model_count: doc
                .pointer("/components/schemas")
                .and_then(Value::as_object)
                .map_or(0, |schemas| schemas.len()),
            validated_at: Utc::now(),
        };

        debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            operations = result.operation_count,
            models = result.model_count,
            "lint complete"
        );
        result
    }
}

/// Lint with the default policy
pub fn lint_document(doc: &Value) -> ValidationResult {
    ContractLinter::new().lint(doc)
}
