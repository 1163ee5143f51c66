use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Aggregation GraphQL endpoint
    #[arg(
        long,
        env = "AAVEKIT_GRAPHQL_URL",
        default_value = "https://api.aavekit.io/graphql"
    )]
    pub aavekit_graphql_url: String,

    /// Subgraph gateway base URL
    #[arg(
        long,
        env = "SUBGRAPH_GATEWAY_URL",
        default_value = "https://gateway.thegraph.com/api"
    )]
    pub subgraph_gateway_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduled sync service until interrupted
    Run,
    /// Execute one full sync pass and exit
    Sync,
    /// Collect missing raw snapshots for the trailing window
    Collect {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Process every pending raw snapshot into canonical records
    Process,
    /// Print cross-market stablecoin totals from the latest snapshots
    Stablecoins,
    /// Re-sync the subgraph-canonical market's history
    BackfillSubgraph {
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Purge the market's rows before syncing
        #[arg(long)]
        delete_old: bool,
        /// Log the delta against the aggregation API after syncing
        #[arg(long)]
        compare: bool,
    },
}
