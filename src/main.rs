//! RepoScout - ask questions about any GitHub repository
//!
//! An HTTP service (and interactive terminal chat) where an LLM agent
//! explores a repository through the GitHub API and answers questions
//! about it.
//!
//! Exit codes:
//!   0 - Clean shutdown
//!   1 - Startup or runtime error (bad arguments, config, bind failure)

mod agent;
mod chat;
mod cli;
mod config;
mod error;
mod github;
mod models;
mod server;
#[cfg(test)]
mod test_support;
mod tree;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use github::RepoRef;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("RepoScout v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Fatal: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .reposcout.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Credentials are read from OPENAI_KEY and GITHUB_API_KEY.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let result = match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(
            builder.with_env_filter(filter).finish(),
        ),
        Err(_) => tracing::subscriber::set_global_default(
            builder.with_max_level(args.log_level()).finish(),
        ),
    };
    result.context("Failed to set tracing subscriber")
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    if args.chat {
        let repo = args
            .repo
            .as_deref()
            .and_then(RepoRef::parse)
            .context("--chat needs --repo owner/name")?;

        println!("🤖 Initializing AI agent...");
        println!("   Model: {}", config.llm.model);
        println!("   API: {}", config.llm.api_base_url);

        let state = server::AppState::from_config(&config).context("Failed to initialize agent")?;
        return chat::ChatSession::new(state, repo, !args.quiet).run().await;
    }

    server::serve(&config).await
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
