//! Contract echo: the normalized IR as pretty JSON

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codegen::{FormatBackend, HelperTable, OutputFormat, RenderContext};
use crate::error::Result;
use crate::ir::ParsedSpec;

pub struct OpenApiBackend;

#[derive(Serialize)]
struct Echo<'a> {
    generator: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_at: Option<DateTime<Utc>>,
    operation_count: usize,
    model_count: usize,
    recursive_models: Vec<&'a str>,
    #[serde(flatten)]
    spec: ParsedSpec,
}

impl FormatBackend for OpenApiBackend {
    fn format(&self) -> OutputFormat {
        OutputFormat::OpenApi
    }

    fn render(&self, ctx: &RenderContext<'_>, _helpers: &HelperTable) -> Result<String> {
        let mut spec = ctx.spec.clone();
        spec.base_url = ctx.base_url.clone();

        let echo = Echo {
            generator: concat!("contract-codegen ", env!("CARGO_PKG_VERSION")),
            generated_at: ctx.generated_at,
            operation_count: ctx.operation_count,
            model_count: ctx.model_count,
            recursive_models: ctx.recursive_models().iter().map(String::as_str).collect(),
            spec,
        };

        let mut out = serde_json::to_string_pretty(&echo)?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::RenderOverrides;
    use crate::ir::build_spec;
    use serde_json::{json, Value};

    #[test]
    fn test_echo_round_trips_the_ir() {
        let spec = build_spec(&json!({
            "info": { "title": "Shop", "version": "2.0.0" },
            "servers": [{ "url": "https://api.shop.test" }],
            "paths": { "/v1/health": { "get": { "operationId": "health", "responses": {} } } },
            "components": { "schemas": { "Tag": { "type": "string", "maxLength": 20 } } }
        }));
        let overrides = RenderOverrides {
            base_url: Some("http://localhost:3000".to_string()),
            ..RenderOverrides::default()
        };
        let ctx = RenderContext::build(&spec, &overrides).unwrap();
        let out = OpenApiBackend.render(&ctx, &HelperTable::standard()).unwrap();
        assert!(out.ends_with("}\n"));

        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["base_url"], "http://localhost:3000");
        assert_eq!(value["operation_count"], 1);
        assert!(value.get("generated_at").is_none());

        let echoed: ParsedSpec = serde_json::from_value(value).unwrap();
        assert_eq!(echoed.operations, spec.operations);
        assert_eq!(echoed.models, spec.models);
    }
}
