#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coach_harness::gateway::ollama::OllamaAdapter;
use coach_harness::{
    Dispatcher, OllamaConfig, ProviderGateway, TaskError, TaskParams, TaskRegistry, TaskRequest,
    TracingUsageSink,
};

#[derive(Parser)]
#[command(name = "coach", version, about = "Career-coaching task runner")]
struct Cli {
    /// Generation backend base URL (default: $OLLAMA_BASE_URL or http://ollama:11434)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model identifier (default: $OLLAMA_MODEL or qwen2.5:7b)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Backend timeout in seconds (default: $OLLAMA_TIMEOUT_SECONDS or 120)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered task names
    Tasks,
    /// Run a task and print its JSON result
    Run {
        /// Task name, e.g. resume_scoring
        #[arg(long)]
        task: String,

        /// Inline JSON object of task parameters
        #[arg(long, conflicts_with = "params_file")]
        params: Option<String>,

        /// Read task parameters from a JSON file
        #[arg(long)]
        params_file: Option<PathBuf>,
    },
    /// Send a raw prompt to the backend
    Ask {
        #[arg(long)]
        prompt: String,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coach_harness=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn backend_config(cli: &Cli) -> OllamaConfig {
    let mut config = OllamaConfig::from_env();
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn load_params(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> Result<TaskParams, Box<dyn std::error::Error>> {
    let raw = match (inline, file) {
        (Some(s), _) => s,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        (None, None) => return Ok(TaskParams::new()),
    };
    match serde_json::from_str::<serde_json::Value>(&raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err("params must be a JSON object".into()),
    }
}

fn build_dispatcher(
    config: OllamaConfig,
) -> Result<Dispatcher<ProviderGateway<TracingUsageSink>>, TaskError> {
    let adapter = OllamaAdapter::new(config)?;
    let gateway = ProviderGateway::new(adapter, Arc::new(TracingUsageSink));
    Ok(Dispatcher::new(gateway))
}

/// Print the error payload on stdout so callers always get JSON back.
fn report(err: &TaskError) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&err.to_body())?);
    Ok(ExitCode::FAILURE)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = backend_config(&cli);

    match cli.command {
        Commands::Tasks => {
            for name in TaskRegistry::default().names() {
                println!("{name}");
            }
        }
        Commands::Run {
            task,
            params,
            params_file,
        } => {
            let params = load_params(params, params_file)?;
            let req = match TaskRequest::new(&task, params) {
                Ok(req) => req,
                Err(err) => return report(&err),
            };
            let dispatcher = match build_dispatcher(config) {
                Ok(d) => d,
                Err(err) => return report(&err),
            };
            match dispatcher.run(&req).await {
                Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
                Err(err) => return report(&err),
            }
        }
        Commands::Ask { prompt } => {
            let dispatcher = match build_dispatcher(config) {
                Ok(d) => d,
                Err(err) => return report(&err),
            };
            match dispatcher.ask(&prompt).await {
                Ok(answer) => {
                    let body = serde_json::json!({ "answer": answer });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(err) => return report(&err),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
