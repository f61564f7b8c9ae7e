//! switchyard - command-line front end for the request gateway.
//!
//! Runs one operation against the configured providers and prints the
//! canonical result as JSON.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use switchyard::{
    BuildInfo, FileStore, GatewayConfig, RequestGateway, RequestOptions, Switchyard,
};

/// Resilient completion gateway
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version = switchyard::PKG_VERSION)]
#[command(about = "Route extraction, generation and answers across completion providers")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "SWITCHYARD_CONFIG")]
    config: Option<PathBuf>,

    /// Provider to try first.
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Only try one provider.
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Bypass cache reads.
    #[arg(long, global = true)]
    skip_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract tiered keywords from text
    Extract {
        /// Text to analyse (or omit to read from stdin)
        text: Option<String>,
        /// Cap the number of returned keywords
        #[arg(short = 'n', long)]
        max_items: Option<usize>,
    },

    /// Run a generation template
    Generate {
        /// Template name (summary, cover_letter, bullet_rewrite, or any task)
        operation: String,
        /// Template parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Text bound to the `text` parameter (or omit to read from stdin)
        text: Option<String>,
    },

    /// Answer a question against a context
    Answer {
        /// The question
        question: String,
        /// Context text (or omit to read from stdin)
        context: Option<String>,
    },

    /// List configured providers
    Providers,

    /// Show or change the persisted active provider
    Active {
        /// Provider id to make active
        provider: Option<String>,
    },

    /// Print build version with git metadata
    Version,
}

#[derive(Serialize)]
struct ProviderRow<'a> {
    id: &'a str,
    name: &'a str,
    kind: switchyard::ProviderKind,
    model: &'a str,
    priority: u32,
    active: bool,
    usable: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    if let Command::Version = args.command {
        let info = BuildInfo::current();
        eprintln!("switchyard {}", info.version_string());
        return print_json(&info);
    }

    let config = GatewayConfig::load(args.config.as_deref())?;
    let gateway = Switchyard::builder()
        .config(config)
        .store(std::sync::Arc::new(FileStore::new(FileStore::default_path())))
        .build()?;
    gateway.restore_active_provider().await;

    let mut options = RequestOptions::default()
        .skip_cache(args.skip_cache)
        .allow_fallback(!args.no_fallback);
    if let Some(provider) = args.provider {
        options = options.provider(provider);
    }

    match args.command {
        Command::Extract { text, max_items } => {
            let text = resolve_text(text, "extract")?;
            if let Some(max) = max_items {
                options = options.max_items(max);
            }
            let result = gateway.extract(&text, &options).await?;
            print_json(&result)?;
        }

        Command::Generate {
            operation,
            params,
            text,
        } => {
            let mut params: serde_json::Value = serde_json::from_str(&params)?;
            if let Ok(text) = resolve_text(text, "generate")
                && let Some(map) = params.as_object_mut()
            {
                map.insert("text".to_string(), serde_json::Value::String(text));
            }
            let result = gateway.generate_text(&operation, &params, &options).await?;
            print_json(&result)?;
        }

        Command::Answer { question, context } => {
            let context = resolve_text(context, "answer")?;
            let result = gateway.answer(&question, &context, &options).await?;
            print_json(&result)?;
        }

        Command::Providers => {
            let active = gateway.active_provider();
            let rows: Vec<_> = gateway
                .providers()
                .iter()
                .map(|p| ProviderRow {
                    id: &p.id,
                    name: &p.name,
                    kind: p.kind,
                    model: &p.model,
                    priority: p.priority,
                    active: p.id == active,
                    usable: !p.capabilities.requires_key || p.api_key.is_some(),
                })
                .collect();
            print_json(&rows)?;
        }

        Command::Active { provider } => {
            if let Some(id) = provider {
                gateway.set_active_provider(&id).await?;
            }
            println!("{}", gateway.active_provider());
        }

        Command::Version => unreachable!("handled above"),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_text = if io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Some(buf.trim().to_string()).filter(|s| !s.is_empty())
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
