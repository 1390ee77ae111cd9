use clap::{Parser, Subcommand};
use domain::error::{DomainErrorKind, Error, InternalErrorKind};
use domain::{
    video, CandidateReport, InsightEngine, InsightKind, InsightResult, ProviderFactory,
    ProviderSet, ReportContext, ThreadComment,
};
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use service::{config::Config, logging::Logger};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "report_insights_rs")]
#[command(about = "Analyze bug report recordings and generate report insights")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Title, describe and transcribe a screen recording or screenshot
    AnalyzeVideo {
        /// Publicly reachable URL of the media
        #[arg(long)]
        url: String,

        /// MIME type of the media (e.g. video/webm, image/png)
        #[arg(long, default_value = "video/webm")]
        mime_type: String,
    },
    /// Generate a single insight
    Insight {
        /// One of severity, repro_steps, root_cause, tags, log_summary,
        /// stakeholder_summary, suggested_fix, duplicates, smart_reply, search_query
        kind: InsightKind,

        /// JSON file holding the report context
        #[arg(long)]
        report: Option<PathBuf>,

        /// JSON file holding the candidate reports for duplicate detection
        #[arg(long)]
        candidates: Option<PathBuf>,

        /// Comment to draft replies to
        #[arg(long)]
        comment: Option<String>,

        /// JSON file holding the prior discussion thread
        #[arg(long)]
        thread: Option<PathBuf>,

        /// Natural-language search to turn into filters
        #[arg(long)]
        query: Option<String>,
    },
    /// Generate every insight that needs nothing but the report
    RunAll {
        /// JSON file holding the report context
        #[arg(long)]
        report: PathBuf,
    },
    /// Check the configured provider's credentials
    Verify,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = Logger::init_logger(&cli.config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let factory = ProviderFactory::new(cli.config);
    match run(&factory, cli.command).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

async fn run(factory: &ProviderFactory, command: Command) -> Result<String, Error> {
    let providers = factory.resolve()?;
    info!("Using {} provider", providers.kind);

    let output = match command {
        Command::AnalyzeVideo { url, mime_type } => {
            let result = video::analyze(providers.video.as_ref(), &url, &mime_type).await?;
            to_json(&result)?
        }
        Command::Insight {
            kind,
            report,
            candidates,
            comment,
            thread,
            query,
        } => {
            let engine = engine(factory, &providers);
            let result = match kind {
                InsightKind::SearchQuery => {
                    let query = required(query, "--query", kind)?;
                    InsightResult::SearchQuery(engine.parse_search_query(&query).await?)
                }
                InsightKind::Duplicates => {
                    let ctx = read_report(report.as_deref()).await?;
                    let candidates: Vec<CandidateReport> = match candidates {
                        Some(path) => read_json(&path).await?,
                        None => Vec::new(),
                    };
                    InsightResult::Duplicates(engine.detect_duplicates(&ctx, &candidates).await?)
                }
                InsightKind::SmartReply => {
                    let ctx = read_report(report.as_deref()).await?;
                    let comment = required(comment, "--comment", kind)?;
                    let thread: Vec<ThreadComment> = match thread {
                        Some(path) => read_json(&path).await?,
                        None => Vec::new(),
                    };
                    InsightResult::SmartReply(engine.suggest_replies(&ctx, &comment, &thread).await?)
                }
                _ => {
                    let ctx = read_report(report.as_deref()).await?;
                    engine.generate(kind, &ctx).await?
                }
            };
            to_json(&result)?
        }
        Command::RunAll { report } => {
            let ctx = read_report(Some(&report)).await?;
            let engine = engine(factory, &providers);
            let results = engine.run_all(&ctx, &InsightKind::CONTEXT_ONLY).await;

            let total = results.len();
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed == total {
                if let Some((_, Err(e))) = results.into_iter().next() {
                    return Err(e);
                }
                return Err(Error::config("no insights were requested"));
            }
            if failed > 0 {
                warn!("{} of {} insights failed", failed, total);
            }

            let output: Vec<Value> = results
                .into_iter()
                .map(|(kind, result)| match result {
                    Ok(result) => json!(result),
                    Err(e) => json!({ "kind": kind, "error": e.to_string() }),
                })
                .collect();
            to_json(&output)?
        }
        Command::Verify => {
            let valid = providers.chat.verify_credentials().await?;
            if !valid {
                warn!("{} rejected the configured API key", providers.kind);
            }
            to_json(&json!({ "provider": providers.kind.to_string(), "valid": valid }))?
        }
    };
    Ok(output)
}

fn engine(factory: &ProviderFactory, providers: &ProviderSet) -> InsightEngine {
    let config = factory.config();
    InsightEngine::new(providers.chat.clone())
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
}

fn required(value: Option<String>, flag: &str, kind: InsightKind) -> Result<String, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::config(format!("{} requires {}", kind, flag)))
}

async fn read_report(path: Option<&Path>) -> Result<ReportContext, Error> {
    match path {
        Some(path) => read_json(path).await,
        None => Err(Error::config("--report is required")),
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    debug!("Reading {}", path.display());
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| input_error(path, e))?;
    serde_json::from_str(&raw).map_err(|e| input_error(path, e))
}

fn input_error(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> Error {
    warn!("Could not load {}: {}", path.display(), source);
    Error {
        source: Some(Box::new(source)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "could not serialize output".to_string(),
        )),
    })
}
