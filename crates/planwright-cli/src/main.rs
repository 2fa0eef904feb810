//! Planwright CLI - compile requirement documents into development plans

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use planwright_core::compiler::{CompilerInput, TaskCompiler, execution_order};
use planwright_core::config::Config;
use planwright_core::domain::document::InputBundle;
use planwright_core::domain::task::{CompilerMode, TaskSet};
use planwright_core::export::{ExportFormat, export};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "planwright")]
#[command(author, version, about = "Compile requirement documents into development plans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an input bundle into a task set
    Generate {
        /// Input bundle (JSON with document, entities, relationships, schema)
        input: PathBuf,
        /// Schema text file, replaces the bundle's schema
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Output format (json, yaml or markdown)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep reference pointer lines as written
        #[arg(long)]
        no_expand: bool,
        /// Environment is already provisioned; emit setup tasks as skipped
        #[arg(long)]
        provisioned: bool,
        /// Fail instead of producing a reduced schema + CRUD plan
        #[arg(long)]
        no_fallback: bool,
    },

    /// Check that an input bundle compiles and report the plan shape
    Validate {
        /// Input bundle
        input: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show the config file path
    Path,
}

struct GenerateArgs {
    input: PathBuf,
    schema: Option<PathBuf>,
    format: ExportFormat,
    output: Option<PathBuf>,
    no_expand: bool,
    provisioned: bool,
    no_fallback: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet { "planwright=warn" } else { "planwright=info" };
    let filter = match level.parse() {
        Ok(directive) => tracing_subscriber::EnvFilter::from_default_env().add_directive(directive),
        Err(_) => tracing_subscriber::EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        report(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            input,
            schema,
            format,
            output,
            no_expand,
            provisioned,
            no_fallback,
        } => {
            let args = GenerateArgs {
                input,
                schema,
                format,
                output,
                no_expand,
                provisioned,
                no_fallback,
            };
            cmd_generate(args, cli.quiet).await
        }
        Commands::Validate { input } => cmd_validate(&input, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

/// Print an error, with the code, category and suggestion when it came from
/// the compiler
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<planwright_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}] ({}): {}", core.code(), core.category(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => {
            eprintln!("Error: {:#}", err);
        }
    }
}

async fn read_bundle(path: &Path) -> anyhow::Result<InputBundle> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let bundle = InputBundle::from_json(&text)?;
    debug!(
        path = %path.display(),
        entities = bundle.entities.len(),
        relationships = bundle.relationships.len(),
        "Input bundle loaded"
    );
    Ok(bundle)
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_generate(args: GenerateArgs, quiet: bool) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if args.no_expand {
        config.generation.expand_references = false;
    }
    if args.provisioned {
        config.generation.environment_provisioned = true;
    }

    let mut bundle = read_bundle(&args.input).await?;
    if let Some(path) = &args.schema {
        bundle.schema = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    }

    let compiler = TaskCompiler::new(config.to_options(chrono::Utc::now()));
    let input = CompilerInput::from(&bundle);
    let set = if args.no_fallback {
        compiler.compile(input)?
    } else {
        compiler.compile_with_fallback(input)?
    };
    if set.metadata.mode == CompilerMode::Fallback {
        eprintln!(
            "Warning (degraded output): template generation failed; the plan covers schema migrations and CRUD endpoints only."
        );
    }
    let rendered = export(&set, args.format)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &rendered)
                .await
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(path = %path.display(), format = %args.format, "Task set written");
            if !quiet {
                println!(
                    "Wrote {} tasks ({} mode) to {}",
                    set.summary.total_tasks,
                    set.metadata.mode.as_str(),
                    path.display()
                );
            }
        }
        None => {
            println!("{}", rendered);
        }
    }
    Ok(())
}

async fn cmd_validate(input: &Path, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let bundle = read_bundle(input).await?;
    let compiler = TaskCompiler::new(config.to_options(chrono::Utc::now()));
    let set = compiler.compile(CompilerInput::from(&bundle))?;
    let stages = execution_order(&set.tasks)?;

    if !quiet {
        print_shape(&set, stages.len());
    }
    Ok(())
}

fn print_shape(set: &TaskSet, stages: usize) {
    println!("Input is valid.");
    println!("  Tasks: {}", set.summary.total_tasks);
    println!("  Execution stages: {}", stages);
    println!("  Overall complexity: {}", set.summary.overall_complexity);
    for (tier, count) in &set.summary.by_tier {
        println!("  {}: {}", tier, count);
    }
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
