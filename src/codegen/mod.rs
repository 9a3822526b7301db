//! Code Generation
//!
//! Renders a [`ParsedSpec`] into one text artifact.
//!
//! Architecture:
//! - `project`: pure IR → type / validator tree projectors
//! - `ast` + `printer`: the typed tree and its single TypeScript printer
//! - `context`: immutable per-render facts computed from the IR
//! - `helpers`: the explicit helper table passed into every render
//! - `formats`: one [`FormatBackend`] per [`OutputFormat`]
//!
//! The engine knows nothing format-specific beyond picking the backend and
//! the output extension. Backends never read the raw document.

pub mod ast;
pub mod context;
pub mod formats;
pub mod helpers;
pub mod printer;
pub mod project;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{CodegenError, Result};
use crate::ir::ParsedSpec;

pub use context::{RenderContext, RenderOverrides};
pub use helpers::HelperTable;
pub use project::{field_modifiers, project_type, project_validator, type_syntax, validator_syntax};

/// The closed set of output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Types, validators and the typed operation surface
    Typescript,
    /// HTTP transport client
    Axios,
    /// Query and mutation hooks over the transport client
    ReactQuery,
    /// The normalized contract, echoed as JSON
    OpenApi,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Typescript, Self::Axios, Self::ReactQuery, Self::OpenApi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typescript => "typescript",
            Self::Axios => "axios",
            Self::ReactQuery => "react-query",
            Self::OpenApi => "openapi",
        }
    }

    /// Extension appended to output paths that have none
    pub fn extension(&self) -> &'static str {
        match self {
            Self::OpenApi => "json",
            _ => "ts",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Self::Typescript),
            "axios" => Ok(Self::Axios),
            "react-query" | "reactquery" => Ok(Self::ReactQuery),
            "openapi" | "json" => Ok(Self::OpenApi),
            _ => Err(CodegenError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A renderer for one output format
pub trait FormatBackend {
    fn format(&self) -> OutputFormat;

    fn render(&self, ctx: &RenderContext<'_>, helpers: &HelperTable) -> Result<String>;
}

/// The backend for a format
pub fn backend_for(format: OutputFormat) -> Box<dyn FormatBackend> {
    match format {
        OutputFormat::Typescript => Box::new(formats::TypescriptBackend),
        OutputFormat::Axios => Box::new(formats::AxiosBackend),
        OutputFormat::ReactQuery => Box::new(formats::ReactQueryBackend),
        OutputFormat::OpenApi => Box::new(formats::OpenApiBackend),
    }
}

/// Render a spec in the given format
pub fn render(
    spec: &ParsedSpec,
    format: OutputFormat,
    overrides: &RenderOverrides,
    helpers: &HelperTable,
) -> Result<String> {
    let ctx = RenderContext::build(spec, overrides)?;
    let output = backend_for(format).render(&ctx, helpers)?;
    debug!(
        format = %format,
        bytes = output.len(),
        operations = ctx.operation_count,
        models = ctx.model_count,
        "rendered artifact"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("typescript".parse::<OutputFormat>().unwrap(), OutputFormat::Typescript);
        assert_eq!("React-Query".parse::<OutputFormat>().unwrap(), OutputFormat::ReactQuery);
        assert_eq!("openapi".parse::<OutputFormat>().unwrap(), OutputFormat::OpenApi);
        assert!(matches!(
            "swift".parse::<OutputFormat>(),
            Err(CodegenError::UnknownFormat(name)) if name == "swift"
        ));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::Typescript.extension(), "ts");
        assert_eq!(OutputFormat::Axios.extension(), "ts");
        assert_eq!(OutputFormat::ReactQuery.extension(), "ts");
        assert_eq!(OutputFormat::OpenApi.extension(), "json");
    }

    #[test]
    fn test_backends_cover_every_format() {
        for format in OutputFormat::ALL {
            assert_eq!(backend_for(format).format(), format);
            assert_eq!(format.as_str().parse::<OutputFormat>().unwrap(), format);
        }
    }
}
