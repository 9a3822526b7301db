//! Configuration management for the contract compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (contract-codegen.toml)
//! - Environment variables (CONTRACT_CODEGEN__*)
//!
//! ## Example config file (contract-codegen.toml):
//! ```toml
//! [generate]
//! format = "axios"
//! base_url = "https://api.example.com"
//! timestamp = false
//!
//! [generate.formatter]
//! command = "npx"
//! args = ["prettier", "--write"]
//!
//! [validation]
//! strict = false
//! required_routes = ["POST /v1/auth/login", "GET /v1/health"]
//! protected_prefixes = ["/v1/admin"]
//! allowed_content_types = ["application/json"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lint::{
    LintPolicy, RouteRequirement, DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_PROTECTED_PREFIXES,
    DEFAULT_REQUIRED_ROUTES,
};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Generation settings
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Structural validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Output format name (typescript, axios, react-query, openapi)
    #[serde(default = "default_format")]
    pub format: String,

    /// Override for the contract's base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// External formatter run on the written artifact
    #[serde(default)]
    pub formatter: Option<FormatterConfig>,

    /// Stamp generated artifacts with the generation time
    #[serde(default)]
    pub timestamp: bool,
}

/// External formatter command; the artifact path is appended to `args`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings as failures
    #[serde(default)]
    pub strict: bool,

    /// Routes every contract must define, as `"METHOD /path"`
    #[serde(default = "default_required_routes")]
    pub required_routes: Vec<String>,

    /// Path prefixes whose operations need a security requirement
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,

    /// Request media types accepted by the content-type pass
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

// Default value functions
fn default_format() -> String {
    "typescript".to_string()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_required_routes() -> Vec<String> {
    to_strings(DEFAULT_REQUIRED_ROUTES)
}

fn default_protected_prefixes() -> Vec<String> {
    to_strings(DEFAULT_PROTECTED_PREFIXES)
}

fn default_allowed_content_types() -> Vec<String> {
    to_strings(DEFAULT_ALLOWED_CONTENT_TYPES)
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            base_url: None,
            formatter: None,
            timestamp: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            required_routes: default_required_routes(),
            protected_prefixes: default_protected_prefixes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

impl ValidationConfig {
    /// Build the linter policy; malformed route entries are skipped with a warning
    pub fn to_policy(&self) -> LintPolicy {
        let required_routes = self
            .required_routes
            .iter()
            .filter_map(|route| {
                let parsed = RouteRequirement::parse(route);
                if parsed.is_none() {
                    warn!(route = %route, "ignoring malformed required route");
                }
                parsed
            })
            .collect();

        LintPolicy {
            required_routes,
            protected_prefixes: self.protected_prefixes.clone(),
            allowed_content_types: self.allowed_content_types.clone(),
        }
    }
}

impl CodegenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "contract-codegen.toml",
            ".contract-codegen.toml",
            "config/contract-codegen.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "contract-codegen") {
            let xdg_config = config_dir.config_dir().join("contract-codegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CONTRACT_CODEGEN__GENERATE__FORMAT=axios
        builder = builder.add_source(
            Environment::with_prefix("CONTRACT_CODEGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
