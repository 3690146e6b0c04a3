//! patent-ledger command-line client.
//!
//! # Architecture Overview
//!
//! ```text
//!   document ──▶ evaluator (/upload/) ──▶ EvaluationReport
//!                                              │ unique?
//!                                              ▼
//!                        storage (/upload_ipfs/ or Pinata) ──▶ cid
//!                                              │
//!                                              ▼
//!   env key ──▶ WalletSession ──▶ SubmissionController ──▶ LedgerClient
//!                                              │                 │
//!                                              │        ContractLedger (JSON-RPC)
//!                                              │        or InMemoryLedger (--offline)
//!                                              ▼
//!                                       status line on stdout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use patent_ledger::config::{load_or_default, AppConfig, StorageProvider};
use patent_ledger::evaluation::{
    BackendStorageUploader, ContentId, Decision, EvaluationBackend, EvaluationReport,
    EvaluationResult, HttpEvaluationBackend, PinataUploader, StorageUploader,
};
use patent_ledger::ledger::{
    ContractLedger, InMemoryLedger, LedgerBackend, LedgerClient, LocalKeyWallet, RpcClient,
    WalletProvider, WalletSession,
};
use patent_ledger::observability::{logging, metrics};
use patent_ledger::workflow::{
    EvaluationOrchestrator, SubmissionController, SubmissionStatus, SubmitOutcome,
};

#[derive(Parser)]
#[command(name = "patent-ledger")]
#[command(about = "Evaluate patent documents for novelty and record results on-chain", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults target a local devnet.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record to an in-process ledger instead of the configured RPC endpoint.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a document and print the report
    Evaluate { file: PathBuf },
    /// Pin a saved evaluation report (JSON) and print its CID
    Pin { report: PathBuf },
    /// Record an already pinned result on the ledger
    Submit {
        #[arg(long)]
        cid: String,
        #[arg(long)]
        score: f64,
        #[arg(long, default_value = "Unique")]
        decision: Decision,
    },
    /// Evaluate, pin and record a document
    Run { file: PathBuf },
    /// Check ledger RPC reachability and chain id
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        rpc_url = %config.ledger.rpc_url,
        chain_id = config.ledger.chain_id,
        evaluator = %config.evaluator.base_url,
        offline = cli.offline,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match execute(cli.command, cli.offline, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(
    command: Commands,
    offline: bool,
    config: &AppConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Evaluate { file } => {
            let orchestrator = orchestrator(config)?;
            let report = orchestrator.evaluate_file(&file).await?;
            print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Pin { report } => {
            let content = tokio::fs::read_to_string(&report).await?;
            let report: EvaluationReport = serde_json::from_str(&content)?;
            let cid = uploader(config)?.upload(&report).await?;
            println!("{}", cid);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Submit {
            cid,
            score,
            decision,
        } => {
            let mut controller = controller(config, offline).await?;
            let status = controller.connect().await;
            if !matches!(status, SubmissionStatus::Connected(_)) {
                println!("{}", controller.status_line());
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", controller.status_line());

            let result = EvaluationResult::new(ContentId::new(cid), score, decision);
            let outcome = controller.submit(&result).await;
            println!("{}", controller.status_line());
            Ok(exit_code(&outcome))
        }
        Commands::Run { file } => {
            let orchestrator = orchestrator(config)?;
            let mut controller = controller(config, offline).await?;
            let outcome = orchestrator.run_file(&file, &mut controller).await?;

            print_report(&outcome.report);
            match &outcome.result {
                None => {
                    println!("Document is not unique; nothing recorded.");
                    Ok(ExitCode::SUCCESS)
                }
                Some(result) => {
                    println!("CID: {}", result.content_id());
                    println!("{}", outcome.status_line);
                    Ok(exit_code(&SubmitOutcome::Finished(outcome.status)))
                }
            }
        }
        Commands::Health => {
            let rpc = RpcClient::new(config.ledger.clone())?;
            if rpc.is_healthy().await {
                let block = rpc.get_block_number().await?;
                println!(
                    "Ledger reachable: chain {} at block {}",
                    config.ledger.chain_id, block
                );
                Ok(ExitCode::SUCCESS)
            } else {
                println!("Ledger unreachable or on the wrong chain");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn exit_code(outcome: &SubmitOutcome) -> ExitCode {
    match outcome {
        SubmitOutcome::Finished(SubmissionStatus::Confirmed(_)) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn uploader(config: &AppConfig) -> Result<Arc<dyn StorageUploader>, Box<dyn std::error::Error>> {
    let uploader: Arc<dyn StorageUploader> = match config.storage.provider {
        StorageProvider::Backend => Arc::new(BackendStorageUploader::new(
            &config.evaluator.base_url,
            &config.storage,
        )?),
        StorageProvider::Pinata => Arc::new(PinataUploader::from_env(&config.storage)?),
    };
    Ok(uploader)
}

fn orchestrator(config: &AppConfig) -> Result<EvaluationOrchestrator, Box<dyn std::error::Error>> {
    let evaluator: Arc<dyn EvaluationBackend> =
        Arc::new(HttpEvaluationBackend::new(&config.evaluator)?);
    Ok(EvaluationOrchestrator::new(evaluator, uploader(config)?))
}

async fn controller(
    config: &AppConfig,
    offline: bool,
) -> Result<SubmissionController, Box<dyn std::error::Error>> {
    let provider = LocalKeyWallet::detect_from_env(config.ledger.chain_id)?
        .map(|wallet| Arc::new(wallet) as Arc<dyn WalletProvider>);

    let backend: Arc<dyn LedgerBackend> = if offline {
        tracing::warn!("Offline mode: results are recorded in memory only");
        Arc::new(InMemoryLedger::new())
    } else {
        let rpc = RpcClient::new(config.ledger.clone())?;
        if let Err(e) = rpc.verify_chain_id().await {
            tracing::warn!(error = %e, "Ledger chain check failed; submissions will likely fail");
        }
        Arc::new(ContractLedger::new(rpc)?)
    };

    Ok(SubmissionController::new(
        WalletSession::new(provider),
        LedgerClient::new(backend),
    ))
}

fn print_report(report: &EvaluationReport) {
    let decision = if report.is_unique {
        "Unique"
    } else {
        "Not Unique"
    };
    println!("Decision: {}", decision);
    println!("Similarity Score: {:.2}%", report.similarity_percent());
    if let Some(matched) = &report.matched_patent {
        println!("Closest match: {}", matched.filename);
    }
    println!("Judgment: {}", report.judgment());
}
