//! Contract Codegen CLI
//!
//! Generates client bindings from a contract and checks generated artifacts
//! for drift.
//!
//! Usage:
//!   contract-codegen init
//!   contract-codegen generate --input api.yaml --output src/api/client --format axios
//!   contract-codegen check --input api.yaml --output src/api/client.ts --format axios

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use chrono::Utc;
use contract_codegen::{check, generate, CodegenConfig, CodegenError, GenerateOptions, OutputFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contract-codegen")]
#[command(about = "Generate typed client bindings from an API contract")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Contract document (.json, .yaml, .yml)
    #[arg(short, long)]
    input: PathBuf,

    /// Artifact path; the format's extension is appended when missing
    #[arg(short, long)]
    output: PathBuf,

    /// typescript, axios, react-query or openapi (default from config)
    #[arg(short, long)]
    format: Option<String>,

    /// Override the contract's server URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an artifact
    Generate {
        #[command(flatten)]
        target: Target,

        /// Generate even when the contract has errors
        #[arg(long)]
        skip_validation: bool,

        /// Do not run the configured formatter
        #[arg(long)]
        no_format: bool,

        /// Stamp the artifact header with the generation time
        #[arg(long)]
        timestamp: bool,
    },

    /// Fail when the artifact on disk differs from a fresh generation
    Check {
        #[command(flatten)]
        target: Target,
    },

    /// Write a configuration file with the default settings
    Init {
        /// Where to write it
        #[arg(default_value = "contract-codegen.toml")]
        path: String,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        if let Some(findings) = e.downcast_ref::<CodegenError>().map(CodegenError::findings) {
            for finding in findings {
                eprintln!("   {}", finding);
            }
        }
        std::process::exit(1);
    }
}

fn options(config: &CodegenConfig, target: &Target) -> anyhow::Result<GenerateOptions> {
    let mut options = GenerateOptions::from_config(config)?;
    if let Some(format) = &target.format {
        options.format = format.parse::<OutputFormat>()?;
    }
    if let Some(base_url) = &target.base_url {
        options.overrides.base_url = Some(base_url.clone());
    }
    Ok(options)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    let load = || CodegenConfig::load_from(config_path).context("loading configuration");

    match cli.command {
        Commands::Generate {
            target,
            skip_validation,
            no_format,
            timestamp,
        } => {
            let config = load()?;
            let mut options = options(&config, &target)?;
            options.skip_validation = skip_validation;
            if no_format {
                options.formatter = None;
            }
            if timestamp {
                options.overrides.generated_at = Some(Utc::now());
            }

            println!("🔧 Generating {} from {:?}", options.format, target.input);
            let report = generate(&target.input, &target.output, &options)?;

            println!("✅ Wrote {}", report.path.display());
            println!("   Size: {} bytes", report.bytes);
            println!("   Checksum: {}", report.checksum);
            if options.formatter.is_some() && !report.formatted {
                println!("   ⚠️  Formatter did not run; artifact left unformatted");
            }
            Ok(())
        }

        Commands::Check { target } => {
            let config = load()?;
            let options = options(&config, &target)?;

            println!("🔍 Checking {} against {:?}", options.format, target.input);
            let report = check(&target.input, &target.output, &options)?;

            match report.diff {
                None => {
                    println!("✅ {} is up to date", report.path.display());
                    println!("   Checksum: {}", report.expected);
                    Ok(())
                }
                Some(diff) => {
                    println!("{}", diff);
                    println!("❌ {} is out of date", report.path.display());
                    std::process::exit(1);
                }
            }
        }

        Commands::Init { path, force } => {
            if Path::new(&path).exists() && !force {
                anyhow::bail!("{} already exists (use --force to replace it)", path);
            }
            CodegenConfig::default()
                .save(&path)
                .with_context(|| format!("writing {}", path))?;
            println!("✅ Wrote default configuration to {}", path);
            Ok(())
        }
    }
}
