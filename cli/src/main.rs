use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod output;
pub mod ux_error;

use config::OracleConfig;
use core::{Outcome, RuleContext};
use oracle::OracleEngine;
use storage::{
    BlockCounter, CloudFPStore, CloudObjectStore, CloudSecretStore, FPStore, LocalFPStore, LocalObjectStore,
    LocalSecretStore, ObjectStore, SecretStore, SharedBlockCounter,
};

/// Runs one `Oracle::Evaluate` call against a pre-built context and prints
/// the signed `DissonanceReport` to stdout as JSON. Everything this binary
/// does beyond that — resolving the context from upstream state, scheduling
/// runs, presenting results in CI — stays outside this crate.
#[derive(Parser)]
#[command(name = "oracle", author, version, about = "Governance oracle evaluation engine")]
struct Args {
    /// Path to a JSON-encoded RuleContext, or "-" for stdin.
    #[arg(long, env = "ORACLE_CONTEXT")]
    context: PathBuf,

    #[arg(long, env = "ORACLE_ORG_ID")]
    org_id: String,

    #[arg(long, env = "ORACLE_REPO_ID")]
    repo_id: String,

    /// Evaluate without failing closed on an unavailable secret store, and
    /// without letting the result affect CI (exit code 1 instead of 2).
    #[arg(long)]
    dry_run: bool,

    /// Publish this run's findings as the repo's new calibration/drift
    /// baseline. Off by default: evaluating never mutates stored state
    /// unless explicitly asked to.
    #[arg(long)]
    persist_baseline: bool,

    /// Path to a TOML or YAML `OracleConfig` file. Falls back to
    /// environment variables, then defaults.
    #[arg(long, env = "ORACLE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = StorageBackend::Local)]
    storage: StorageBackend,

    /// Directory the local storage backend persists state under.
    #[arg(long, default_value = "./oracle-state")]
    state_dir: PathBuf,

    /// Key prefix / bucket name the cloud storage backend namespaces under.
    #[arg(long, default_value = "oracle")]
    cloud_namespace: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum StorageBackend {
    Local,
    Cloud,
}

struct Adapters {
    fp_store: Arc<dyn FPStore>,
    block_counter: Arc<dyn BlockCounter>,
    object_store: Arc<dyn ObjectStore>,
    secret_store: Arc<dyn SecretStore>,
}

fn build_adapters(args: &Args, retention: &config::RetentionConfig) -> Result<Adapters> {
    let block_counter: Arc<dyn BlockCounter> = Arc::new(SharedBlockCounter::new());
    match args.storage {
        StorageBackend::Local => {
            std::fs::create_dir_all(&args.state_dir)
                .with_context(|| format!("creating state dir {}", args.state_dir.display()))?;
            Ok(Adapters {
                fp_store: Arc::new(LocalFPStore::new_with_ttl(
                    args.state_dir.join("fp_events"),
                    retention.fp_event_ttl_days,
                )),
                block_counter,
                object_store: Arc::new(LocalObjectStore::new(args.state_dir.join("objects"))),
                secret_store: Arc::new(LocalSecretStore::new(args.state_dir.join("nonce.secrets"))),
            })
        }
        StorageBackend::Cloud => Ok(Adapters {
            fp_store: Arc::new(CloudFPStore::new_with_ttl(retention.fp_event_ttl_days)),
            block_counter,
            object_store: Arc::new(CloudObjectStore::new(args.cloud_namespace.clone())),
            secret_store: Arc::new(CloudSecretStore::new(args.cloud_namespace.clone())),
        }),
    }
}

fn load_oracle_config(args: &Args) -> Result<OracleConfig> {
    let file_config = match &args.config {
        Some(path) => Some(config::load_from_file(path).map_err(|e| {
            ux_error::config_file_invalid(&path.display().to_string(), &e.to_string())
        })?),
        None => None,
    };
    let merged = config::merge_configs(file_config, config::load_from_env());
    config::validate(&merged).map_err(|e| anyhow::anyhow!("invalid oracle configuration: {e}"))?;
    Ok(merged)
}

fn load_rule_context(path: &PathBuf) -> Result<RuleContext> {
    let raw = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| ux_error::context_file_unreadable("-", &e.to_string()))?
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| ux_error::context_file_unreadable(&path.display().to_string(), &e.to_string()))?
    };
    serde_json::from_str(&raw)
        .map_err(|e| ux_error::context_file_malformed(&path.display().to_string(), &e.to_string()).into())
}

fn init_logging(config: &config::ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let oracle_config = match load_oracle_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(3);
        }
    };
    init_logging(&oracle_config.observability);

    let ctx = match load_rule_context(&args.context) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(3);
        }
    };

    let adapters = match build_adapters(&args, &oracle_config.retention) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(3);
        }
    };

    let engine = OracleEngine::new(
        adapters.fp_store,
        adapters.block_counter,
        adapters.object_store,
        adapters.secret_store,
        oracle_config,
    )
    .context("registering built-in rules")?;

    let report = engine
        .evaluate(&ctx, &args.org_id, &args.repo_id, args.dry_run, args.persist_baseline)
        .await;

    output::report_summary(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    let exit_code = match (report.outcome, args.dry_run) {
        (Outcome::Allow, _) => 0,
        (Outcome::Warn, _) | (Outcome::Block, true) => 1,
        (Outcome::Block, false) => 2,
    };
    std::process::exit(exit_code);
}
