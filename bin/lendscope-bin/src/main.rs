mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use lendscope_collector::Collector;
use lendscope_db::models::RawSnapshot;
use lendscope_db::{LendscopePool, init_pool, run_migrations};
use lendscope_processor::{AssetProcessor, MarketProcessor};
use lendscope_sync::{SubgraphSyncer, SyncConfig, SyncOptions, SyncService, TimeseriesReader};
use lendscope_types::{MarketRegistry, StablecoinRegistry};
use lendscope_upstream::{AavekitClient, AggregationSource, FallbackRpcClient, SubgraphClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let app_name = "lendscope";
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let pool = init_pool(app_name, &cli.database_url)?;
    run_migrations(&pool).await?;

    let registry = Arc::new(MarketRegistry::with_default_markets());
    let aggregation: Arc<dyn AggregationSource> = Arc::new(
        AavekitClient::new(&cli.aavekit_graphql_url)
            .context("Could not init the aggregation API client")?,
    );

    let config = SyncConfig::default();
    let collector = Collector::new(pool.clone(), aggregation.clone(), registry.clone())
        .with_request_delay(config.request_delay);

    let subgraph_syncer = match registry.subgraph_canonical_market() {
        Some(market) => {
            let subgraph_id = market
                .subgraph_id
                .as_deref()
                .context("Canonical-subgraph market has no subgraph id")?;
            let subgraph = SubgraphClient::new(&cli.subgraph_gateway_url, subgraph_id)
                .context("Could not init the subgraph client")?;
            let rpc = FallbackRpcClient::new(market.rpc_urls.clone())
                .context("Could not init the RPC client")?;
            Some(
                SubgraphSyncer::new(pool.clone(), subgraph, rpc, market.clone())
                    .with_aggregation(aggregation.clone())
                    .with_request_delay(config.request_delay),
            )
        }
        None => None,
    };

    match cli.command {
        Command::Run => {
            let service = SyncService::new(pool, collector, subgraph_syncer, config);
            let shutdown = CancellationToken::new();

            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received ctrl-c, shutting down");
                    signal_token.cancel();
                }
            });

            service.run_forever(shutdown).await;
        }
        Command::Sync => {
            let service = SyncService::new(pool, collector, subgraph_syncer, config);
            let summary = service.run_daily_sync().await?;
            tracing::info!(?summary, "Sync pass complete");
        }
        Command::Collect { days } => {
            let report = collector.collect_all_missing_data(days).await?;
            tracing::info!(
                collected = report.collected(),
                skipped = report.skipped(),
                failed = report.failed(),
                "Collection complete"
            );

            let coverage = pool
                .interact_with_context(
                    "summarize raw snapshot coverage".to_string(),
                    RawSnapshot::coverage_by_market,
                )
                .await?;
            for (market_key, first, last, count) in coverage {
                tracing::info!(
                    market = %market_key,
                    first = ?first,
                    last = ?last,
                    count,
                    "Raw snapshot coverage"
                );
            }
        }
        Command::Process => {
            let market_rows = MarketProcessor::new(pool.clone()).process_all_pending().await?;
            let asset_rows = AssetProcessor::new(pool).process_all_pending().await?;
            tracing::info!(market_rows, asset_rows, "Processing complete");
        }
        Command::Stablecoins => {
            let reader = TimeseriesReader::new(
                pool,
                registry.clone(),
                config.cache_ttl,
                config.stale_ttl,
            );
            let stablecoins = StablecoinRegistry::with_default_stablecoins();
            let rows = reader.stablecoin_overview(&stablecoins).await?;
            for row in rows {
                tracing::info!(
                    symbol = %row.symbol,
                    supplied_usd = row.total_supplied_usd,
                    borrowed_usd = row.total_borrowed_usd,
                    markets = row.markets.len(),
                    "Stablecoin totals"
                );
            }
        }
        Command::BackfillSubgraph {
            days,
            delete_old,
            compare,
        } => {
            let syncer = subgraph_syncer.context("No subgraph-canonical market configured")?;
            let options = SyncOptions {
                delete_old_data: delete_old,
                compare_with_aavekit: compare,
                show_progress: true,
                batch_size: config.batch_size,
            };
            let market_key = syncer.market_key().to_string();
            let synced = syncer
                .sync_market_timeseries(&market_key, days, &options)
                .await?;
            tracing::info!(synced, market = %market_key, "Subgraph backfill complete");
        }
    }

    Ok(())
}
