//! Render context
//!
//! Everything a backend needs, computed once from the IR: operations grouped
//! by primary tag, the effective base URL, counts, the optional timestamp and
//! the model graph's recursion/ordering facts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::error::{CodegenError, Result};
use crate::ir::{ModelGraph, ParamLocation, ParsedModel, ParsedOperation, ParsedSchema, ParsedSpec};

use super::project::type_ident;

/// Caller-supplied adjustments to a render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOverrides {
    /// Replaces the contract's first server URL
    pub base_url: Option<String>,
    /// Printed in artifact headers when set
    pub generated_at: Option<DateTime<Utc>>,
}

/// Operations sharing a primary tag
#[derive(Debug, Clone)]
pub struct OperationGroup<'a> {
    pub tag: String,
    pub operations: Vec<&'a ParsedOperation>,
}

#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub spec: &'a ParsedSpec,
    pub base_url: String,
    /// Sorted by tag; operations keep document order within a group
    pub groups: Vec<OperationGroup<'a>>,
    /// Any security scheme declared
    pub has_security: bool,
    pub operation_count: usize,
    pub model_count: usize,
    pub generated_at: Option<DateTime<Utc>>,
    graph: ModelGraph,
}

impl<'a> RenderContext<'a> {
    pub fn build(spec: &'a ParsedSpec, overrides: &RenderOverrides) -> Result<Self> {
        check_model_names(spec)?;
        check_operation_ids(spec)?;
        check_references(spec)?;

        let mut grouped: BTreeMap<String, Vec<&'a ParsedOperation>> = BTreeMap::new();
        for op in &spec.operations {
            grouped.entry(op.primary_tag().to_string()).or_default().push(op);
        }
        let groups = grouped
            .into_iter()
            .map(|(tag, operations)| OperationGroup { tag, operations })
            .collect();

        Ok(Self {
            spec,
            base_url: overrides.base_url.clone().unwrap_or_else(|| spec.base_url.clone()),
            groups,
            has_security: !spec.security_schemes.is_empty(),
            operation_count: spec.operations.len(),
            model_count: spec.models.len(),
            generated_at: overrides.generated_at,
            graph: ModelGraph::build(&spec.models),
        })
    }

    pub fn recursive_models(&self) -> &BTreeSet<String> {
        self.graph.recursive_models()
    }

    pub fn is_recursive(&self, name: &str) -> bool {
        self.graph.is_recursive(name)
    }

    /// Models with every referenced model ahead of its referrers
    pub fn models_in_declaration_order(&self) -> Vec<&'a ParsedModel> {
        self.graph
            .declaration_order()
            .iter()
            .filter_map(|name| self.spec.model(name))
            .collect()
    }

    /// Operations in tag-group order
    pub fn operations(&self) -> impl Iterator<Item = &'a ParsedOperation> + '_ {
        self.groups.iter().flat_map(|g| g.operations.iter().copied())
    }

    /// Header lines shared by every code artifact
    pub fn header_lines(&self, format_label: &str) -> Vec<String> {
        let mut lines = vec![format!("{} v{}", self.spec.title, self.spec.version)];
        if let Some(description) = &self.spec.description {
            lines.push(String::new());
            lines.extend(description.lines().map(|l| l.trim_end().to_string()));
        }
        lines.push(String::new());
        lines.push(format!(
            "{} generated by contract-codegen from {} operation(s) and {} model(s). Do not edit.",
            format_label, self.operation_count, self.model_count
        ));
        if let Some(at) = self.generated_at {
            lines.push(format!("Generated at: {}", at.to_rfc3339()));
        }
        lines
    }
}

fn check_model_names(spec: &ParsedSpec) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for model in &spec.models {
        let ident = type_ident(&model.name);
        if ident.is_empty() {
            return Err(CodegenError::render(
                format!("model '{}'", model.name),
                "name has no characters usable in an identifier",
            ));
        }
        if let Some(previous) = seen.insert(ident.clone(), &model.name) {
            return Err(CodegenError::render(
                format!("model '{}'", model.name),
                format!("generated name '{}' collides with model '{}'", ident, previous),
            ));
        }
    }
    Ok(())
}

/// Operation ids must map to distinct identifiers, and the per-operation type
/// aliases must not shadow a model
fn check_operation_ids(spec: &ParsedSpec) -> Result<()> {
    let models: BTreeMap<String, &str> = spec
        .models
        .iter()
        .map(|m| (type_ident(&m.name), m.name.as_str()))
        .collect();
    let mut seen: BTreeMap<String, &ParsedOperation> = BTreeMap::new();

    for op in &spec.operations {
        let base = type_ident(&op.operation_id);
        // an unusable id is reported when its surface is built
        if base.is_empty() {
            continue;
        }
        if let Some(previous) = seen.insert(base.clone(), op) {
            return Err(CodegenError::render(
                format!("operation '{}'", op.operation_id),
                format!(
                    "{} {} and {} {} both generate '{}'; give one an explicit operationId",
                    previous.method, previous.path, op.method, op.path, base
                ),
            ));
        }
        for alias in surface_aliases(op, &base) {
            if let Some(model) = models.get(&alias) {
                return Err(CodegenError::render(
                    format!("operation '{}'", op.operation_id),
                    format!("generated type '{}' collides with model '{}'", alias, model),
                ));
            }
        }
    }
    Ok(())
}

/// `XResponse`, plus `XParams` and `XBody` when the operation has them
fn surface_aliases(op: &ParsedOperation, base: &str) -> Vec<String> {
    let mut aliases = vec![format!("{}Response", base)];
    if op
        .parameters
        .iter()
        .any(|p| matches!(p.location, ParamLocation::Path | ParamLocation::Query))
    {
        aliases.push(format!("{}Params", base));
    }
    if op.request_body.is_some() {
        aliases.push(format!("{}Body", base));
    }
    aliases
}

/// Every named reference must land on a declared model, or the generated
/// code would mention a type it never declares
fn check_references(spec: &ParsedSpec) -> Result<()> {
    let known: BTreeSet<&str> = spec.models.iter().map(|m| m.name.as_str()).collect();
    let dangling = |schema: &ParsedSchema| {
        schema
            .referenced_names()
            .into_iter()
            .find(|name| !known.contains(name.as_str()))
    };

    for model in &spec.models {
        // the model's own alias target counts as a reference too
        if let Some(name) = dangling(&model.schema) {
            return Err(CodegenError::render(
                format!("model '{}'", model.name),
                format!("references '{}', which is not a component schema", name),
            ));
        }
    }

    for op in &spec.operations {
        let schemas = op
            .parameters
            .iter()
            .map(|p| &p.schema)
            .chain(op.request_body.iter().map(|b| &b.schema))
            .chain(op.responses.iter().filter_map(|r| r.schema.as_ref()));
        for schema in schemas {
            if let Some(name) = dangling(schema) {
                return Err(CodegenError::render(
                    format!("operation '{}'", op.operation_id),
                    format!("references '{}', which is not a component schema", name),
                ));
            }
        }
    }
    Ok(())
}
