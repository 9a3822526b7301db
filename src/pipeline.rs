//! Pipeline wiring
//!
//! load → lint → build IR → render → emit, plus the validate-only and drift
//! check invocations. Each stage fails fast with its own error variant.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use similar::TextDiff;
use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::codegen::{render, HelperTable, OutputFormat, RenderOverrides};
use crate::config::{CodegenConfig, FormatterConfig};
use crate::emit::{artifact_path, write_artifact, EmitReport};
use crate::error::{CodegenError, Result};
use crate::ir::build_spec;
use crate::lint::{ContractLinter, LintPolicy, ValidationResult};
use crate::loader::load_document;

/// Everything `generate` and `check` need beyond the input and output paths
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub format: OutputFormat,
    pub overrides: RenderOverrides,
    pub policy: LintPolicy,
    /// Warnings fail the run
    pub strict: bool,
    pub skip_validation: bool,
    pub formatter: Option<FormatterConfig>,
}

impl GenerateOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            overrides: RenderOverrides::default(),
            policy: LintPolicy::default(),
            strict: false,
            skip_validation: false,
            formatter: None,
        }
    }

    /// Options from loaded configuration; an unknown format name fails here
    pub fn from_config(config: &CodegenConfig) -> Result<Self> {
        let format = config.generate.format.parse::<OutputFormat>()?;
        Ok(Self {
            format,
            overrides: RenderOverrides {
                base_url: config.generate.base_url.clone(),
                generated_at: config.generate.timestamp.then(Utc::now),
            },
            policy: config.validation.to_policy(),
            strict: config.validation.strict,
            skip_validation: false,
            formatter: config.generate.formatter.clone(),
        })
    }
}

/// Turn a lint result into a pass/fail gate
pub fn enforce(result: ValidationResult, strict: bool) -> Result<ValidationResult> {
    if !result.is_valid() {
        return Err(CodegenError::ContractInvalid { errors: result.errors });
    }
    if strict && result.has_warnings() {
        return Err(CodegenError::StrictWarnings { warnings: result.warnings });
    }
    for warning in &result.warnings {
        warn!(code = warning.code, path = %warning.path, "{}", warning.message);
    }
    Ok(result)
}

/// Lint (unless skipped), build the IR and render it
pub fn compile(doc: &Value, options: &GenerateOptions, helpers: &HelperTable) -> Result<String> {
    if options.skip_validation {
        debug!("skipping structural validation");
    } else {
        let result = ContractLinter::with_policy(options.policy.clone()).lint(doc);
        enforce(result, options.strict)?;
    }

    let spec = build_spec(doc);
    render(&spec, options.format, &options.overrides, helpers)
}

/// Generate an artifact from a contract file
pub fn generate(input: &Path, output: &Path, options: &GenerateOptions) -> Result<EmitReport> {
    let doc = load_document(input)?;
    let content = compile(&doc, options, &HelperTable::standard())?;
    write_artifact(output, options.format, &content, options.formatter.as_ref())
}

/// Lint a contract file
pub fn validate(input: &Path, policy: &LintPolicy) -> Result<ValidationResult> {
    let doc = load_document(input)?;
    Ok(ContractLinter::with_policy(policy.clone()).lint(&doc))
}

/// Outcome of comparing an artifact on disk with a fresh render
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub path: PathBuf,
    pub up_to_date: bool,
    /// Checksum of the regenerated text
    pub expected: Checksum,
    /// Unified diff from the file on disk to the regenerated text
    pub diff: Option<String>,
}

/// Regenerate in memory and compare with the artifact on disk.
///
/// The render is unstamped and unformatted; a missing artifact counts as
/// drift against empty text.
pub fn check(input: &Path, output: &Path, options: &GenerateOptions) -> Result<DriftReport> {
    let doc = load_document(input)?;
    let mut options = options.clone();
    options.overrides.generated_at = None;
    let expected = compile(&doc, &options, &HelperTable::standard())?;

    let path = artifact_path(output, options.format);
    let actual = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(CodegenError::io(&path, e)),
    };

    Ok(compare(&path, &actual, &expected))
}

/// Diff on-disk text against the expected text
pub fn compare(path: &Path, actual: &str, expected: &str) -> DriftReport {
    let checksum = Checksum::of_text(expected);
    if checksum.verify(actual) {
        debug!(path = %path.display(), checksum = checksum.short(), "artifact up to date");
        return DriftReport {
            path: path.to_path_buf(),
            up_to_date: true,
            expected: checksum,
            diff: None,
        };
    }

    let on_disk = path.display().to_string();
    let diff = TextDiff::from_lines(actual, expected)
        .unified_diff()
        .context_radius(3)
        .header(&on_disk, "regenerated")
        .to_string();

    DriftReport {
        path: path.to_path_buf(),
        up_to_date: false,
        expected: checksum,
        diff: Some(diff),
    }
}
