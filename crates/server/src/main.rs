//! Paramcat command line: search the Ceph parameter catalog and keep it in
//! step with a cluster.

use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use paramcat_core::{
    load_baseline_file, to_baseline_json, CatalogConfig, CatalogService, CephCliExecutor, Query,
    ReconcileContext, RefreshOutcome, SortField, SortOrder,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Clone)]
#[command(author, version, about = "Paramcat - Searchable Ceph configuration parameter catalog")]
struct Args {
    /// Baseline dataset to start from (default: the dataset shipped with the
    /// core crate, located at build time)
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,
    /// `ceph` binary to run
    #[arg(long, global = true)]
    ceph_bin: Option<PathBuf>,
    /// Cluster configuration file passed as `--conf`
    #[arg(long, global = true)]
    ceph_conf: Option<PathBuf>,
    /// Client user passed as `--id`
    #[arg(long, global = true)]
    ceph_user: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Query the catalog (default)
    Search(SearchArgs),
    /// Reconcile once with the cluster and print the report
    Refresh {
        /// Write the reconciled catalog here in baseline format
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Refresh periodically until interrupted
    Watch,
}

#[derive(ClapArgs, Clone, Default)]
struct SearchArgs {
    /// Only parameters used by this service
    #[arg(long)]
    service: Option<String>,
    /// Only parameters at this level (basic, advanced, dev)
    #[arg(long)]
    level: Option<String>,
    /// Only parameters of this value type
    #[arg(long = "type")]
    param_type: Option<String>,
    /// Exact name or glob pattern
    #[arg(long)]
    name: Option<String>,
    /// Case-insensitive substring across names, descriptions, tags, services
    #[arg(long)]
    full_text: Option<String>,
    /// Sort field: name, type, level, service
    #[arg(long, default_value = "name")]
    sort: String,
    /// Sort order: asc, desc
    #[arg(long, default_value = "asc")]
    order: String,
    /// Reconcile with the cluster before searching
    #[arg(long)]
    refresh: bool,
    /// Print matching names only, one per line
    #[arg(long)]
    names_only: bool,
}

impl SearchArgs {
    fn to_query(&self) -> Query {
        Query {
            service: self.service.clone(),
            level: self.level.clone(),
            param_type: self.param_type.clone(),
            name: self.name.clone(),
            full_text: self.full_text.clone(),
            sort: SortField::parse_or_default(&self.sort),
            order: SortOrder::parse_or_default(&self.order),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Environment first, then command-line overrides
fn resolve_config(args: &Args) -> CatalogConfig {
    let mut config = CatalogConfig::from_env();
    if let Some(path) = &args.baseline {
        config.baseline_path = path.clone();
    }
    if let Some(bin) = &args.ceph_bin {
        config.ceph.binary = bin.clone();
    }
    if let Some(conf) = &args.ceph_conf {
        config.ceph.conf = Some(conf.clone());
    }
    if let Some(user) = &args.ceph_user {
        config.ceph.user = Some(user.clone());
    }
    config
}

async fn refresh_once(service: &CatalogService, config: &CatalogConfig) -> anyhow::Result<()> {
    let ctx = ReconcileContext::new().with_timeout(config.reconcile_timeout());
    match service.reconcile(&ctx).await.context("Reconciliation failed")? {
        RefreshOutcome::Committed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        RefreshOutcome::AlreadyRunning => {
            tracing::warn!("Another refresh is already running");
        }
    }
    Ok(())
}

async fn run_search(
    service: &CatalogService,
    config: &CatalogConfig,
    search: &SearchArgs,
) -> anyhow::Result<()> {
    if search.refresh {
        if config.skip_refresh {
            tracing::warn!("Refresh disabled by configuration, searching the baseline");
        } else {
            let ctx = ReconcileContext::new().with_timeout(config.reconcile_timeout());
            if let Err(e) = service.reconcile(&ctx).await {
                tracing::warn!(error = %e, "Refresh failed, searching the last good catalog");
            }
        }
    }

    let results = service.search(&search.to_query());
    tracing::debug!(matches = results.len(), "Search complete");

    if search.names_only {
        for param in &results {
            println!("{}", param.name);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

async fn run_watch(service: &CatalogService, config: &CatalogConfig) -> anyhow::Result<()> {
    let Some(period) = config.refresh_interval() else {
        bail!("Periodic refresh is disabled (skip_refresh set or interval is 0)");
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Catch up right away instead of waiting a full period
    let ctx = ReconcileContext::new()
        .with_cancel(shutdown_rx.clone())
        .with_timeout(config.reconcile_timeout());
    if let Err(e) = service.reconcile(&ctx).await {
        tracing::warn!(error = %e, "Initial refresh failed, serving the baseline");
    }

    let handle = service.spawn_refresh_loop(period, config.reconcile_timeout(), shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    handle.await.context("Refresh loop panicked")?;

    tracing::info!(params = service.snapshot().len(), "Final catalog");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = resolve_config(&args);
    let catalog = load_baseline_file(&config.baseline_path)
        .await
        .with_context(|| format!("Failed to load baseline {}", config.baseline_path.display()))?;

    let executor = Arc::new(CephCliExecutor::new(config.ceph.clone()));
    let service = CatalogService::new(catalog, executor);

    match args.command.unwrap_or(CliCommand::Search(SearchArgs::default())) {
        CliCommand::Search(search) => run_search(&service, &config, &search).await,
        CliCommand::Refresh { output } => {
            if config.skip_refresh {
                bail!("Refresh disabled by configuration");
            }
            refresh_once(&service, &config).await?;
            if let Some(path) = output {
                let json = to_baseline_json(&service.snapshot())?;
                tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "Wrote catalog");
            }
            Ok(())
        }
        CliCommand::Watch => run_watch(&service, &config).await,
    }
}
