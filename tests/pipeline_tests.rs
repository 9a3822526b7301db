//! End-to-end tests over the shop contract fixtures
//!
//! `shop.json` and `shop.yaml` describe the same contract, which passes every
//! lint pass under the default policy without findings.

use std::fs;
use std::path::{Path, PathBuf};

use contract_codegen::{
    build_spec, check, generate, lint_document, load_document, validate, Checksum, CodegenError,
    GenerateOptions, LintPolicy, OutputFormat,
};
use serde_json::{json, Value};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn shop() -> Value {
    serde_json::from_str(include_str!("fixtures/shop.json")).unwrap()
}

/// Write a modified contract into a temp dir and return its path
fn write_contract(dir: &Path, doc: &Value) -> PathBuf {
    let path = dir.join("contract.json");
    fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    path
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_shop_contract_is_clean() {
    let result = lint_document(&shop());
    assert!(result.valid);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
    assert_eq!(result.operation_count, 6);
    assert_eq!(result.model_count, 8);
}

#[test]
fn test_missing_login_route_is_one_warning() {
    let mut doc = shop();
    doc["paths"].as_object_mut().unwrap().remove("/v1/auth/login");

    let result = lint_document(&doc);
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, "MISSING_REQUIRED_ROUTE");
    assert!(result.warnings[0].message.contains("POST /v1/auth/login"));
}

#[test]
fn test_dangling_reference_is_one_error() {
    let mut doc = shop();
    doc["components"]["schemas"]["Product"]["properties"]["category"] =
        json!({ "$ref": "#/components/schemas/Categroy" });

    let result = lint_document(&doc);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.code, "UNRESOLVED_REFERENCE");
    assert_eq!(error.path, "components.schemas.Product.properties.category.$ref");
    assert!(error.message.contains("#/components/schemas/Categroy"));
}

#[test]
fn test_dangling_reference_suggests_close_component() {
    let mut doc = shop();
    doc["components"]["schemas"]["Product"]["properties"]["category"] =
        json!({ "$ref": "#/components/schemas/Categ" });

    let result = lint_document(&doc);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0]
        .message
        .contains("did you mean '#/components/schemas/Category'"));
}

#[test]
fn test_unbound_placeholder_is_one_error() {
    let mut doc = shop();
    doc["paths"]["/v1/items/{itemId}"] = json!({
        "get": {
            "operationId": "getItem",
            "summary": "Fetch one item",
            "tags": ["items"],
            "responses": {
                "200": { "description": "Item" },
                "404": { "description": "No such item" }
            }
        }
    });

    let result = lint_document(&doc);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "UNBOUND_PATH_PARAMETER");
    assert!(result.errors[0].message.contains("itemId"));
}

#[test]
fn test_unprotected_order_route() {
    let mut doc = shop();
    doc["paths"]["/v1/orders"]["post"]
        .as_object_mut()
        .unwrap()
        .remove("security");

    let result = lint_document(&doc);
    assert!(result.valid);
    let codes: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec!["UNPROTECTED_ROUTE"]);
    assert_eq!(result.warnings[0].path, "paths./v1/orders.post");

    // a document-level requirement covers it
    doc["security"] = json!([{ "bearer": [] }]);
    assert!(lint_document(&doc).warnings.is_empty());
}

#[test]
fn test_validate_from_disk_with_policy() {
    let result = validate(&fixture("shop.yaml"), &LintPolicy::default()).unwrap();
    assert!(result.passes(true));

    let policy = LintPolicy {
        protected_prefixes: vec!["/v1/products".to_string()],
        ..LintPolicy::default()
    };
    let result = validate(&fixture("shop.yaml"), &policy).unwrap();
    assert!(result.passes(false));
    assert!(!result.passes(true));
    assert_eq!(result.warnings.len(), 2);
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_yaml_and_json_build_the_same_ir() {
    let from_json = load_document(&fixture("shop.json")).unwrap();
    let from_yaml = load_document(&fixture("shop.yaml")).unwrap();
    assert_eq!(build_spec(&from_json), build_spec(&from_yaml));
}

#[test]
fn test_missing_input_is_an_io_error() {
    let err = load_document(&fixture("nope.json")).unwrap_err();
    assert!(matches!(err, CodegenError::Io { .. }));
}

#[test]
fn test_malformed_input_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"openapi\": ").unwrap();
    assert!(matches!(load_document(&path).unwrap_err(), CodegenError::Parse { .. }));
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_generation_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for format in OutputFormat::ALL {
        let options = GenerateOptions::new(format);
        let first = generate(&fixture("shop.json"), &dir.path().join("first"), &options).unwrap();
        let second = generate(&fixture("shop.json"), &dir.path().join("second"), &options).unwrap();

        assert_eq!(first.checksum, second.checksum, "{} output differs", format);
        assert_eq!(
            fs::read(&first.path).unwrap(),
            fs::read(&second.path).unwrap(),
            "{} output differs",
            format
        );
    }
}

#[test]
fn test_emit_report_matches_file() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions::new(OutputFormat::Axios);
    let report = generate(&fixture("shop.yaml"), &dir.path().join("src/api/client"), &options).unwrap();

    assert_eq!(report.path, dir.path().join("src/api/client.ts"));
    let written = fs::read_to_string(&report.path).unwrap();
    assert_eq!(report.bytes, written.len() as u64);
    assert_eq!(report.checksum, Checksum::of_text(&written));
    assert!(report.checksum.to_string().starts_with("sha256:"));
}

#[test]
fn test_typescript_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions::new(OutputFormat::Typescript);
    let report = generate(&fixture("shop.json"), &dir.path().join("api"), &options).unwrap();
    let out = fs::read_to_string(report.path).unwrap();

    assert!(out.starts_with("/**\n * Shop API v1.2.0\n"));
    assert!(out.contains("export const API_BASE_URL = \"https://api.shop.test\";\n"));
    assert!(out.contains("export interface Order {\n  lines: Array<OrderLine>;\n  id: string;\n}\n"));
    assert!(out.contains("export const CategorySchema: z.ZodType<Category> = "));
    assert!(out.contains("parent: z.lazy(() => CategorySchema).optional()"));
    assert!(out.contains("export interface GetProductParams {\n  id: string;\n}\n"));
    assert!(out.contains("export const AUTH_OPERATIONS = [\"login\", \"register\"] as const;\n"));
}

#[test]
fn test_base_url_override_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = GenerateOptions::new(OutputFormat::Axios);
    options.overrides.base_url = Some("http://localhost:3000".to_string());
    options.overrides.generated_at = Some(chrono::Utc::now());

    let report = generate(&fixture("shop.json"), &dir.path().join("client"), &options).unwrap();
    let out = fs::read_to_string(report.path).unwrap();
    assert!(out.contains("export const API_BASE_URL = \"http://localhost:3000\";\n"));
    assert!(out.contains(" * Generated at: "));
    assert!(out.contains("export function setAuthToken(token: string | null): void {"));
}

#[test]
fn test_openapi_echo() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions::new(OutputFormat::OpenApi);
    let report = generate(&fixture("shop.json"), &dir.path().join("contract"), &options).unwrap();
    assert_eq!(report.path.extension().unwrap(), "json");

    let echo: Value = serde_json::from_str(&fs::read_to_string(report.path).unwrap()).unwrap();
    assert_eq!(echo["title"], "Shop API");
    assert_eq!(echo["operation_count"], 6);
    assert_eq!(echo["model_count"], 8);
    assert_eq!(echo["recursive_models"], json!(["Category"]));
}

#[test]
fn test_invalid_contract_is_not_generated() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = shop();
    doc["components"]["schemas"]["Product"]["properties"]["category"] =
        json!({ "$ref": "#/components/schemas/Categroy" });
    let input = write_contract(dir.path(), &doc);
    let output = dir.path().join("api.ts");

    let err = generate(&input, &output, &GenerateOptions::new(OutputFormat::Typescript)).unwrap_err();
    match &err {
        CodegenError::ContractInvalid { errors } => assert_eq!(errors.len(), 1),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(err.findings().len(), 1);
    assert!(!output.exists());

    // skipping validation degrades the dangling reference to unknown
    let mut options = GenerateOptions::new(OutputFormat::Typescript);
    options.skip_validation = true;
    let report = generate(&input, &output, &options).unwrap();
    let out = fs::read_to_string(report.path).unwrap();
    assert!(out.contains("  category?: unknown;\n"));
}

// =============================================================================
// Drift
// =============================================================================

#[test]
fn test_drift_check() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions::new(OutputFormat::ReactQuery);
    let output = dir.path().join("hooks.ts");

    // nothing generated yet
    let report = check(&fixture("shop.json"), &output, &options).unwrap();
    assert!(!report.up_to_date);

    generate(&fixture("shop.json"), &output, &options).unwrap();
    let report = check(&fixture("shop.json"), &output, &options).unwrap();
    assert!(report.up_to_date);
    assert!(report.diff.is_none());

    let edited = fs::read_to_string(&output).unwrap().replace("queryKeys", "keys");
    fs::write(&output, edited).unwrap();
    let report = check(&fixture("shop.json"), &output, &options).unwrap();
    assert!(!report.up_to_date);
    let diff = report.diff.unwrap();
    assert!(diff.contains("+++ regenerated"));
    assert!(diff.contains("+export const queryKeys = {"));
}
