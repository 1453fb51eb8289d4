use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ragpanel::{
    backend::{BackendApi, BackendClient, LearningLevel},
    config, logging,
    panel::Panel,
    session,
    state::{Phase, Section},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(
    name = "ragpanel",
    version,
    about = "Upload documents, ask RAG questions, and summarize text against the AI microservices backend"
)]
struct Cli {
    /// Backend base URL (overrides RAGPANEL_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Chunks retrieved per question (overrides RAGPANEL_TOP_K).
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    top_k: Option<u32>,
    /// Per-request timeout in seconds (overrides RAGPANEL_TIMEOUT_SECS).
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a PDF or TXT document for indexing.
    Upload { path: PathBuf },
    /// Ask a question answered from the indexed documents.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Summarize text given inline, read from --file, or piped on stdin.
    Summarize {
        /// Text to summarize; `-` or omitted reads stdin.
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Suggest a learning path for a topic.
    LearningPath {
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
        #[arg(long, default_value = "beginner")]
        level: LearningLevel,
    },
    /// Check that the backend is up.
    Health,
    /// Interactive session reading commands from stdin.
    Interactive,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    // `.env` may set RAGPANEL_LOG_FILE.
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = config::init_config(|config| {
        if let Some(api_url) = &cli.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(top_k) = cli.top_k {
            config.top_k = top_k;
        }
        if let Some(secs) = cli.timeout {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
    })
    .context("invalid configuration")?;

    let client = BackendClient::from_config(config)
        .with_context(|| format!("cannot use backend URL {}", config.api_url))?;
    let backend: Arc<dyn BackendApi> = Arc::new(client);

    match cli.command {
        Command::Health => {
            let health = backend
                .health()
                .await
                .with_context(|| format!("backend at {} did not respond", config.api_url))?;
            println!("{}: {}", health.status, health.message);
            Ok(ExitCode::SUCCESS)
        }
        Command::Interactive => {
            let (sender, receiver) = mpsc::unbounded_channel();
            let panel = Panel::new(backend, config.top_k).with_completions(sender);
            session::run(
                panel,
                receiver,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
            .context("interactive session failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Upload { path } => {
            let panel = Panel::new(backend, config.top_k);
            panel.select_file(&path).await?;
            let handle = panel.upload().await;
            finish(&panel, Section::Upload, handle).await
        }
        Command::Ask { question } => {
            let question = question.join(" ");
            if question.is_empty() {
                bail!("question must not be empty");
            }
            let panel = Panel::new(backend, config.top_k);
            panel.set_question(question).await;
            let handle = panel.ask().await;
            finish(&panel, Section::Qa, handle).await
        }
        Command::Summarize { text, file } => {
            let text = match (text, file) {
                (_, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (Some(text), None) if text != "-" => text,
                _ => {
                    let mut buffer = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buffer)
                        .await
                        .context("failed to read stdin")?;
                    buffer
                }
            };
            if text.is_empty() {
                bail!("nothing to summarize");
            }
            let panel = Panel::new(backend, config.top_k);
            panel.set_summary_text(text).await;
            let handle = panel.summarize().await;
            finish(&panel, Section::Summary, handle).await
        }
        Command::LearningPath { topic, level } => {
            let panel = Panel::new(backend, config.top_k);
            panel.set_learning_path(topic.join(" "), level).await;
            let handle = panel.learning_path().await;
            finish(&panel, Section::LearningPath, handle).await
        }
    }
}

/// Wait for the exchange, print the section result, and map its phase to an exit code.
async fn finish(
    panel: &Panel,
    section: Section,
    handle: Option<JoinHandle<bool>>,
) -> Result<ExitCode> {
    if let Some(handle) = handle {
        handle.await.context("request task failed")?;
    }
    print!("{}", panel.render_result(section).await);
    let phase = panel.snapshot().await.phase(section);
    Ok(if phase == Phase::Ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
