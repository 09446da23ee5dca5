mod config;
mod config_cmd;
mod routes;
mod run_cmd;
mod youtube;

use clap::{Parser, Subcommand};
use config::{Config, ConfigPaths};
use restyle_core::provider::create_chat_provider;
use restyle_core::session::ProfileStore;
use restyle_core::studio::Studio;
use routes::{AppState, app_router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use youtube::YoutubeTranscripts;

#[derive(Parser)]
#[command(
    name = "restyle",
    version,
    about = "learn a video's speaking style and write new scripts in it"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (default: ~/.restyle/config.toml)
    #[arg(long, global = true, value_name = "path")]
    config: Option<PathBuf>,

    /// Address for the HTTP server
    #[arg(long, global = true, value_name = "addr")]
    bind: Option<String>,

    /// Model used for analysis and generation
    #[arg(long, global = true, value_name = "model")]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Inspect or modify the config file
    Config(config_cmd::ConfigArgs),
    /// Analyze one video and write a script in the terminal
    Run(run_cmd::RunArgs),
}

fn non_empty_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,restyle_core=debug,restyle_server=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = match cli.config {
        Some(path) => ConfigPaths::from_file(path),
        None => match ConfigPaths::from_home() {
            Ok(paths) => paths,
            Err(err) => {
                eprintln!("config paths error: {err}");
                std::process::exit(1);
            }
        },
    };

    let command = cli.command.unwrap_or(Command::Serve);
    if let Command::Config(args) = &command {
        if let Err(e) = config_cmd::run(args, &paths) {
            eprintln!("config failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    let mut config = match Config::load_or_create(&paths) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config load failed: {err}");
            std::process::exit(1);
        }
    };
    config.apply_env_overrides();
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(model) = cli.model {
        config.provider.model = model;
    }
    if let Err(e) = config.validate().and_then(|()| config.validate_credentials()) {
        eprintln!("config invalid: {e}");
        std::process::exit(1);
    }

    let studio = match build_studio(&config) {
        Ok(studio) => studio,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let result = match command {
        Command::Run(args) => run_once(args, studio).await,
        Command::Serve | Command::Config(_) => {
            let profiles = ProfileStore::with_capacity(config.server.max_sessions);
            serve(&config.server.bind, studio, profiles).await
        }
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn build_studio(config: &Config) -> Result<Studio, String> {
    let provider = create_chat_provider(
        config.provider.name.as_str(),
        non_empty_str(config.provider.base_url.as_str()),
        non_empty_str(config.provider.api_key.as_str()),
    )
    .map_err(|e| format!("provider init failed: {e}"))?;
    let transcripts =
        YoutubeTranscripts::new(Handle::current(), config.transcript.languages.clone())
            .map_err(|e| format!("transcript source init failed: {e}"))?;

    tracing::debug!(
        provider = provider.name(),
        model = %config.provider.model,
        "studio ready"
    );
    Ok(Studio::new(
        Arc::from(provider),
        Arc::new(transcripts),
        config.studio_settings(),
    ))
}

async fn serve(bind: &str, studio: Studio, profiles: ProfileStore) -> Result<(), String> {
    let app = app_router(AppState::new(studio, profiles));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("bind {bind} failed: {e}"))?;

    tracing::info!("restyle server listening on http://{bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// The caption source blocks on the runtime, so the whole workflow runs on
/// a blocking thread.
async fn run_once(args: run_cmd::RunArgs, studio: Studio) -> Result<(), String> {
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        run_cmd::run(&args, &studio, &mut stdin.lock(), &mut stdout.lock())
    })
    .await
    .map_err(|e| format!("run task failed: {e}"))?
    .map_err(|e| e.to_string())
}
