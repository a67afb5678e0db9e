//! tolk - translation CLI
//!
//! Runs the translation service in-process: submits one request, polls until
//! it reaches a terminal state, and prints the poll response as JSON.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tolk::backends::HuggingFaceBackend;
use tolk::{Config, LanguagePairCatalog, SubmitResponse, TaskView, TranslationService};

/// Tolk CLI
#[derive(Parser)]
#[command(name = "tolk")]
#[command(version = tolk::PKG_VERSION)]
#[command(about = "Asynchronous machine translation")]
struct Args {
    /// Config file (default: ~/.tolk/config.toml, then /etc/tolk/config.toml)
    #[arg(short, long, env = "TOLK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print version with build metadata
    Version,

    /// List displayable languages
    Languages,

    /// List supported language pairs and their models
    Pairs,

    /// Print the effective configuration as TOML
    #[command(name = "config")]
    ShowConfig,

    /// Translate text
    Translate {
        /// Text to translate (or omit to read from stdin)
        text: Option<String>,
        /// Source language code
        #[arg(short, long)]
        from: String,
        /// Target language code
        #[arg(short, long)]
        to: String,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Version => {
            println!("tolk {}", tolk::version_string());
        }

        Command::Languages => {
            let catalog = catalog_for(&config)?;
            for (code, name) in catalog.languages() {
                println!("{code}\t{name}");
            }
        }

        Command::Pairs => {
            let catalog = catalog_for(&config)?;
            if catalog.is_empty() {
                println!("no language pairs configured");
            }
            for (pair, model_id) in catalog.pairs() {
                println!("{pair}\t{model_id}");
            }
        }

        Command::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }

        Command::Translate {
            text,
            from,
            to,
            poll_ms,
        } => {
            let text = resolve_text(text)?;
            let backend =
                HuggingFaceBackend::from_config(&config.backend.huggingface, Config::hf_api_key())?;
            let service = TranslationService::builder()
                .config(&config)?
                .backend(Arc::new(backend))
                .build()?;

            let view = match service.submit(text, from, to)? {
                SubmitResponse::Processing { task_id } => loop {
                    match service.poll_response(Some(task_id.as_str())) {
                        TaskView::Processing => {
                            tokio::time::sleep(Duration::from_millis(poll_ms)).await
                        }
                        done => break done,
                    }
                },
                SubmitResponse::Completed { translation } => TaskView::Completed { translation },
            };
            service.shutdown().await;

            println!("{}", serde_json::to_string_pretty(&view)?);
            if matches!(view, TaskView::Error { .. }) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn catalog_for(config: &Config) -> tolk::Result<LanguagePairCatalog> {
    match config.catalog {
        Some(ref catalog) => LanguagePairCatalog::from_config(catalog),
        None => Ok(LanguagePairCatalog::with_embedded_seed()),
    }
}

/// Text from the argument, else from piped stdin.
fn resolve_text(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(text) = arg {
        return Ok(text);
    }
    if io::stdin().is_terminal() {
        return Err("translate: no input provided (pass text as argument or via stdin)".into());
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}
