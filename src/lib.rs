//! Contract Codegen
//!
//! Compiles an API contract document (an OpenAPI 3.x subset) into a validated
//! in-memory representation and generated client bindings.
//!
//! ## Features
//!
//! - **Reference Resolution**: local `$ref` pointers with depth-bounded cycle protection
//! - **Composition**: `allOf` branches merged into one object shape
//! - **Structural Linting**: multi-pass checks with stable finding codes
//! - **Dual Projection**: one IR rendered as TypeScript types and zod validators
//! - **Format Backends**: typescript, axios, react-query, openapi echo
//! - **Checksums**: SHA-256 over every emitted artifact
//!
//! ## Pipeline
//!
//! ```text
//! contract.yaml
//!   └─ loader     → serde_json::Value
//!      ├─ lint    → ValidationResult (errors gate generation)
//!      └─ ir      → ParsedSpec
//!         └─ codegen (RenderContext + HelperTable + FormatBackend)
//!            └─ emit → artifact + EmitReport
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod lint;
pub mod loader;
pub mod names;
pub mod pipeline;

pub use checksum::Checksum;
pub use codegen::{render, FormatBackend, HelperTable, OutputFormat, RenderContext, RenderOverrides};
pub use config::CodegenConfig;
pub use emit::{write_artifact, EmitReport};
pub use error::{CodegenError, Result};
pub use ir::{build_spec, ParsedSpec};
pub use lint::{lint_document, ContractLinter, LintPolicy, Severity, ValidationFinding, ValidationResult};
pub use loader::load_document;
pub use pipeline::{check, generate, validate, DriftReport, GenerateOptions};
