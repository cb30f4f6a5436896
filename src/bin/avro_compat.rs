//! Avro Compatibility CLI
//!
//! Checks two versions of an Avro schema against an evolution policy and
//! manages the checker configuration.
//!
//! Exit codes: 0 compatible, 1 incompatible, 2 input rejected.

use std::path::PathBuf;

use anyhow::Context;
use avro_compat::config::OutputFormat;
use avro_compat::ingest::{compare_inputs, Comparison};
use avro_compat::{CompatConfig, CompatibilityReport, SchemaInput};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

const EXIT_INCOMPATIBLE: i32 = 1;
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(name = "avro-compat")]
#[command(about = "Check Avro schema evolution compatibility")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a new schema version against the old one
    Check {
        /// Previously published schema (.avsc / JSON)
        #[arg(long)]
        old: PathBuf,
        /// Candidate schema (.avsc / JSON)
        #[arg(long)]
        new: PathBuf,
        /// backward, forward or full (default from config)
        #[arg(short, long)]
        mode: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write the JSON report to this file as well
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output as TOML
        #[arg(long)]
        toml: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize a new config file
    Init {
        #[arg(short, long, default_value = "avro-compat.toml")]
        output: String,
    },
    /// Validate configuration
    Validate,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_REJECTED);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Check {
            old,
            new,
            mode,
            format,
            output,
        } => {
            let cfg = CompatConfig::load_from(cli.config.as_deref())
                .context("failed to load configuration")?;
            let mode = mode.unwrap_or_else(|| cfg.output.default_mode.to_string());

            let (report, comparison) = match compare_inputs(
                &mode,
                SchemaInput::File(&old),
                SchemaInput::File(&new),
                &cfg,
            ) {
                Ok(comparison) => (comparison.report.clone(), Some(comparison)),
                Err(err) => match CompatibilityReport::from_error(&err) {
                    Some(report) => (report, None),
                    None => return Err(err.into()),
                },
            };

            let rendered = cfg.render_json(&report)?;
            if let Some(path) = &output {
                std::fs::write(path, &rendered)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
            }

            match format {
                Format::Json => println!("{}", rendered),
                Format::Text => print_text_report(&report, comparison.as_ref()),
            }

            Ok(if report.compatible {
                0
            } else if report.is_rejection() {
                EXIT_REJECTED
            } else {
                EXIT_INCOMPATIBLE
            })
        }

        Commands::Config { command } => run_config(command, cli.config.as_deref()),
    }
}

fn print_text_report(report: &CompatibilityReport, comparison: Option<&Comparison>) {
    if let Some(c) = comparison {
        println!("🔍 Checking {} compatibility", c.mode);
        println!("   {}: {}", c.old.label, c.old.fingerprint);
        println!("   {}: {}", c.new.label, c.new.fingerprint);
        println!();
    }

    if report.compatible {
        println!("✅ Schemas are compatible");
        return;
    }

    if report.is_rejection() {
        println!("❌ Input rejected");
    } else {
        println!("❌ {} incompatibilities found", report.errors.len());
    }
    for issue in &report.errors {
        println!("   └─ [{}] {}", issue.issue_type, issue.path);
        println!(
            "      writer: {}, reader: {} - {}",
            issue.writer_type, issue.reader_type, issue.description
        );
    }
}

fn run_config(command: ConfigCommands, config_path: Option<&str>) -> anyhow::Result<i32> {
    match command {
        ConfigCommands::Show { toml, json } => {
            let cfg = CompatConfig::load_from(config_path)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Avro Compatibility Configuration\n");
                println!("Limits:");
                println!("  Max schema bytes: {}", cfg.limits.max_schema_bytes);
                println!("  Max depth: {}", cfg.limits.max_depth);

                println!("\nValidation:");
                println!("  Strict Avro: {}", cfg.validation.strict_avro);
                println!("  Reject duplicate names: {}", cfg.validation.reject_duplicate_names);

                println!("\nOutput:");
                let format = match cfg.output.format {
                    OutputFormat::Pretty => "pretty",
                    OutputFormat::Compact => "compact",
                };
                println!("  Format: {}", format);
                println!("  Default mode: {}", cfg.output.default_mode);
            }
            Ok(0)
        }

        ConfigCommands::Init { output } => {
            let cfg = CompatConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
            Ok(0)
        }

        ConfigCommands::Validate => match CompatConfig::load_from(config_path) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Max schema bytes: {}", cfg.limits.max_schema_bytes);
                println!("   Default mode: {}", cfg.output.default_mode);
                Ok(0)
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                Ok(EXIT_REJECTED)
            }
        },
    }
}
