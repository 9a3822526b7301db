//! Contract Validator CLI
//!
//! Lints a contract document and reports findings.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use contract_codegen::{validate, CodegenConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contract-validator")]
#[command(about = "Lint an API contract document")]
struct Cli {
    /// Contract document (.json, .yaml, .yml)
    input: PathBuf,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Treat warnings as failures
    #[arg(long)]
    strict: bool,

    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the contract passed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = CodegenConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let strict = cli.strict || config.validation.strict;

    let result = validate(&cli.input, &config.validation.to_policy())?;
    let passed = result.passes(strict);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(passed);
    }

    println!("🔍 Validating {:?}", cli.input);
    println!(
        "   {} operation(s), {} model(s)",
        result.operation_count, result.model_count
    );
    println!();

    if !result.errors.is_empty() {
        println!("❌ {} error(s):", result.errors.len());
        for finding in &result.errors {
            println!("   {}", finding);
        }
    }
    if !result.warnings.is_empty() {
        println!("⚠️  {} warning(s):", result.warnings.len());
        for finding in &result.warnings {
            println!("   {}", finding);
        }
    }

    println!();
    if passed {
        println!("✅ Contract is valid");
    } else if result.is_valid() {
        println!("❌ Strict mode: warnings are failures");
    } else {
        println!("❌ Contract is invalid");
    }
    Ok(passed)
}
