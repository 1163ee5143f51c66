use serde::{Deserialize, Serialize};

use crate::DataSource;

/// Static configuration for one lending market.
///
/// Loaded once at process start and passed by reference; never mutated at
/// runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub market_key: String,
    pub display_name: String,
    pub chain_id: u64,
    pub pool_address: String,
    /// Subgraph deployment id, present only for markets whose source of
    /// record is the subgraph.
    pub subgraph_id: Option<String>,
    /// JSON-RPC endpoints ordered by reliability.
    pub rpc_urls: Vec<String>,
    pub data_source: DataSource,
}

impl MarketConfig {
    pub fn is_subgraph_canonical(&self) -> bool {
        matches!(self.data_source, DataSource::Subgraph)
    }
}

/// In-memory market registry, replacing the module-level singleton the
/// dashboard grew around. Construct once, share by reference.
#[derive(Debug, Clone)]
pub struct MarketRegistry {
    markets: Vec<MarketConfig>,
}

impl MarketRegistry {
    pub const fn new(markets: Vec<MarketConfig>) -> Self {
        Self { markets }
    }

    /// The markets the dashboard tracks in production.
    pub fn with_default_markets() -> Self {
        let markets = vec![
            MarketConfig {
                market_key: "ethereum-v3".to_string(),
                display_name: "Ethereum V3".to_string(),
                chain_id: 1,
                pool_address: "0x87870bca3f3fd6335c3f4ce8392d69350b4fa4e2".to_string(),
                subgraph_id: None,
                rpc_urls: vec![
                    "https://eth.llamarpc.com".to_string(),
                    "https://rpc.ankr.com/eth".to_string(),
                ],
                data_source: DataSource::Aavekit,
            },
            MarketConfig {
                market_key: "polygon-v3".to_string(),
                display_name: "Polygon V3".to_string(),
                chain_id: 137,
                pool_address: "0x794a61358d6845594f94dc1db02a252b5b4814ad".to_string(),
                subgraph_id: None,
                rpc_urls: vec![
                    "https://polygon-rpc.com".to_string(),
                    "https://rpc.ankr.com/polygon".to_string(),
                ],
                data_source: DataSource::Aavekit,
            },
            MarketConfig {
                market_key: "arbitrum-v3".to_string(),
                display_name: "Arbitrum V3".to_string(),
                chain_id: 42161,
                pool_address: "0x794a61358d6845594f94dc1db02a252b5b4814ad".to_string(),
                subgraph_id: None,
                rpc_urls: vec![
                    "https://arb1.arbitrum.io/rpc".to_string(),
                    "https://rpc.ankr.com/arbitrum".to_string(),
                ],
                data_source: DataSource::Aavekit,
            },
            MarketConfig {
                market_key: "avalanche-v3".to_string(),
                display_name: "Avalanche V3".to_string(),
                chain_id: 43114,
                pool_address: "0x794a61358d6845594f94dc1db02a252b5b4814ad".to_string(),
                subgraph_id: None,
                rpc_urls: vec![
                    "https://api.avax.network/ext/bc/C/rpc".to_string(),
                    "https://rpc.ankr.com/avalanche".to_string(),
                ],
                data_source: DataSource::Aavekit,
            },
            MarketConfig {
                market_key: "optimism-v3".to_string(),
                display_name: "Optimism V3".to_string(),
                chain_id: 10,
                pool_address: "0x794a61358d6845594f94dc1db02a252b5b4814ad".to_string(),
                subgraph_id: None,
                rpc_urls: vec![
                    "https://mainnet.optimism.io".to_string(),
                    "https://rpc.ankr.com/optimism".to_string(),
                ],
                data_source: DataSource::Aavekit,
            },
            // The one market whose source of record is the subgraph rather
            // than the aggregation API. Collectors skip it; the subgraph
            // syncer owns it.
            MarketConfig {
                market_key: "ethereum-v2".to_string(),
                display_name: "Ethereum V2".to_string(),
                chain_id: 1,
                pool_address: "0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9".to_string(),
                subgraph_id: Some("8wR23o1zkS4gpLqLNU4kG3JHYVucqGyopL5utGxP2q1N".to_string()),
                rpc_urls: vec![
                    "https://eth.llamarpc.com".to_string(),
                    "https://rpc.ankr.com/eth".to_string(),
                ],
                data_source: DataSource::Subgraph,
            },
        ];

        Self::new(markets)
    }

    pub fn all(&self) -> &[MarketConfig] {
        &self.markets
    }

    pub fn get(&self, market_key: &str) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.market_key == market_key)
    }

    /// Markets collected from the aggregation API.
    pub fn aggregation_markets(&self) -> impl Iterator<Item = &MarketConfig> {
        self.markets.iter().filter(|m| !m.is_subgraph_canonical())
    }

    /// The single market synced directly from the subgraph.
    pub fn subgraph_canonical_market(&self) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.is_subgraph_canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_exactly_one_subgraph_market() {
        let registry = MarketRegistry::with_default_markets();
        let canonical: Vec<_> = registry
            .all()
            .iter()
            .filter(|m| m.is_subgraph_canonical())
            .collect();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].market_key, "ethereum-v2");
        assert!(canonical[0].subgraph_id.is_some());
    }

    #[test]
    fn aggregation_markets_excludes_the_canonical_subgraph_market() {
        let registry = MarketRegistry::with_default_markets();
        assert!(
            registry
                .aggregation_markets()
                .all(|m| !m.is_subgraph_canonical())
        );
    }

    #[test]
    fn lookup_by_key() {
        let registry = MarketRegistry::with_default_markets();
        assert!(registry.get("polygon-v3").is_some());
        assert!(registry.get("dogechain-v9").is_none());
    }
}
