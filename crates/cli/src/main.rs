use clap::Parser;
use ferrous_forwarder_domain::{CliOverrides, Config};
use ferrous_forwarder_infrastructure::dns::server::DnsServerHandler;
use ferrous_forwarder_jobs::{CacheMaintenanceJob, JobRunner, QueryEventLoggerJob};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "ferrous-forwarder")]
#[command(version)]
#[command(about = "Ferrous Forwarder - caching DNS forwarder with upstream failover")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver, in priority order (repeatable): IP, IP:PORT, udp://IP:PORT or tcp://IP:PORT
    #[arg(short = 'u', long = "upstream", value_name = "ADDR")]
    upstreams: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        upstreams: cli.upstreams.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Ferrous Forwarder v{}", env!("CARGO_PKG_VERSION"));
    match cli.config.clone().or_else(Config::get_config_path) {
        Some(path) => info!(path = %path, "Configuration loaded"),
        None => info!("No configuration file found, using defaults"),
    }

    let dns_services = di::DnsServices::new(&config)?;
    let use_cases = di::UseCases::new(dns_services.cache.clone());

    let shutdown = CancellationToken::new();

    JobRunner::new()
        .with_cache_maintenance(
            CacheMaintenanceJob::new(dns_services.cache_maintenance.clone())
                .with_sweep_interval(config.cache.sweep_interval_secs),
        )
        .with_query_event_logger(QueryEventLoggerJob::new(
            dns_services.events,
            dns_services.query_metrics.clone(),
        ))
        .with_shutdown_token(shutdown.clone())
        .start()
        .await;

    let dns_handler = DnsServerHandler::new(dns_services.handler_use_case);
    let mut listeners =
        server::start_dns_server(&config.server, dns_handler, shutdown.clone()).await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        _ = listeners.join_next() => {
            error!("DNS listener exited unexpectedly");
        }
    }

    shutdown.cancel();
    while listeners.join_next().await.is_some() {}

    let stats = use_cases.get_cache_stats.execute();
    let metrics = &dns_services.query_metrics;
    info!(
        entries = stats.total_entries,
        hits = stats.hits,
        negative_hits = stats.negative_hits,
        misses = stats.misses,
        evictions = stats.evictions,
        hit_rate = stats.hit_rate,
        upstream_answers = metrics.upstream_answers(),
        upstream_failures = metrics.upstream_failures(),
        dedup_merges = metrics.dedup_merges(),
        avg_upstream_ms = metrics.avg_upstream_time_ms(),
        "Cache statistics at shutdown"
    );

    info!("Server shutdown complete");
    Ok(())
}
