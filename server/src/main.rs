//! CLI entry point: run the HTTP server or train once from files.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;
use treeline_learning::{ClientLanguage, TrainConfig, Trainer, generate_client};
use treeline_processing::read_frame_from_path;
use treeline_server::state::{DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT};
use treeline_server::{AppConfig, build_router};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Gradient-boosted tree training service",
    long_about = "Fits a preprocessing pipeline and a gradient-boosted tree model on a tabular \
                  dataset and reports metrics, feature importances and model artifacts.\n\n\
                  EXAMPLES:\n  \
                  # Serve the HTTP endpoint\n  \
                  treeline serve --port 8000 --allowed-origin http://localhost:3000\n\n  \
                  # Train once from files\n  \
                  treeline train -i data.csv -c config.json -o result.json"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /train and GET /health
    Serve {
        /// Interface to bind
        #[arg(long, env = "TREELINE_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind
        #[arg(long, env = "TREELINE_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Allowed CORS origin (repeatable); any origin when omitted
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,

        /// Largest accepted upload in megabytes
        #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
        max_upload_mb: usize,
    },

    /// Train once and write the result JSON
    Train {
        /// CSV or Parquet dataset
        #[arg(short, long)]
        input: PathBuf,

        /// JSON training configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Where to write the result JSON; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also generate a client module in this language
        #[arg(long)]
        client: Option<String>,
    },
}

/// Initialize the tracing subscriber.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load .env before parsing so env-backed flags see it
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Serve {
            host,
            port,
            allowed_origins,
            max_upload_mb,
        } => {
            let config = AppConfig {
                host,
                port,
                allowed_origins,
                ..AppConfig::default()
            }
            .with_max_upload_mb(max_upload_mb);
            serve(config)
        }
        Command::Train {
            input,
            config,
            output,
            client,
        } => train_once(&input, &config, output.as_deref(), client.as_deref()),
    }
}

fn serve(config: AppConfig) -> Result<()> {
    let addr = config
        .socket_addr()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("Listening on http://{}", addr);
        axum::serve(listener, build_router(&config))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

fn train_once(
    input: &std::path::Path,
    config_path: &std::path::Path,
    output: Option<&std::path::Path>,
    client: Option<&str>,
) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }
    let language = client.map(str::parse::<ClientLanguage>).transpose()?;

    let config_text = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    let config = TrainConfig::from_json(&config_text)?;

    info!("Loading dataset from: {}", input.display());
    let df = read_frame_from_path(input)?;
    info!("Dataset loaded: {:?}", df.shape());

    let mut result = Trainer::new(config)?.train(&df)?;
    if let Some(language) = language {
        result.artifacts.client_module = Some(generate_client(language, &result)?);
    }

    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
