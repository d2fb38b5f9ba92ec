use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mt_bridge::{Config, EngineRegistry, TranslationOptions, Translator};
use serde::Serialize;
use tracing::info;

/// Translate text through the configured machine-translation engine
#[derive(Parser, Debug)]
#[command(name = "mt-bridge", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate one or more strings
    Translate {
        /// Source language code (e.g. EN)
        #[arg(long = "from")]
        source: String,

        /// Target language code (e.g. DE, EN-US)
        #[arg(long = "to")]
        target: String,

        /// Engine option as key=value (repeatable), e.g. formality=less
        #[arg(long = "option", value_parser = parse_option)]
        options: Vec<(String, String)>,

        /// Strings to translate, in order
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the active engine's language pairs
    Languages,

    /// Show API usage for the current billing period
    Usage,

    /// List registered engines
    Engines,

    /// Inspect or clear the caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Count live cache entries
    Count,
    /// Remove every cached translation and catalog
    Clear,
}

#[derive(Serialize)]
struct EngineEntry {
    id: &'static str,
    label: &'static str,
    active: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging on stderr; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mt_bridge=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    if let Command::Engines = args.command {
        let engines: Vec<EngineEntry> = EngineRegistry::get()
            .list_all()
            .iter()
            .map(|engine| EngineEntry {
                id: engine.id,
                label: engine.label,
                active: engine.id == config.engine,
            })
            .collect();
        return print_json(&engines);
    }

    let translator = Translator::from_config(&config)
        .with_context(|| format!("Failed to set up translation engine '{}'", config.engine))?;

    match args.command {
        Command::Translate {
            source,
            target,
            options,
            text,
        } => {
            let options: TranslationOptions = options.into_iter().collect();
            let result = translator.translate(&source, &target, text, options).await?;
            print_json(&result)?;
        }
        Command::Languages => print_json(&translator.languages().await)?,
        Command::Usage => print_json(&translator.usage().await)?,
        Command::Cache { action } => {
            let counts = match action {
                CacheAction::Count => translator.cache_counts()?,
                CacheAction::Clear => translator.clear_caches()?,
            };
            print_json(&counts)?;
        }
        Command::Engines => {}
    }

    info!("Provider metrics: {:?}", translator.metrics());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse a `key=value` engine option.
fn parse_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
