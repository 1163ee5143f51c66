use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One stablecoin tracked across markets, keyed by its reserve address on
/// each chain where it is listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StablecoinInfo {
    pub symbol: String,
    pub name: String,
    /// market_key -> lowercase reserve address.
    pub addresses: HashMap<String, String>,
}

impl StablecoinInfo {
    /// Lowercase address of this stablecoin in the given market, if listed.
    pub fn address_in(&self, market_key: &str) -> Option<&str> {
        self.addresses.get(market_key).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct StablecoinRegistry {
    stablecoins: Vec<StablecoinInfo>,
}

impl StablecoinRegistry {
    pub const fn new(stablecoins: Vec<StablecoinInfo>) -> Self {
        Self { stablecoins }
    }

    pub fn with_default_stablecoins() -> Self {
        let usdc = StablecoinInfo {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            addresses: HashMap::from([
                (
                    "ethereum-v3".to_string(),
                    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
                ),
                (
                    "ethereum-v2".to_string(),
                    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
                ),
                (
                    "polygon-v3".to_string(),
                    "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359".to_string(),
                ),
                (
                    "arbitrum-v3".to_string(),
                    "0xaf88d065e77c8cc2239327c5edb3a432268e5831".to_string(),
                ),
                (
                    "avalanche-v3".to_string(),
                    "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e".to_string(),
                ),
                (
                    "optimism-v3".to_string(),
                    "0x0b2c639c533813f4aa9d7837caf62653d097ff85".to_string(),
                ),
            ]),
        };

        let usdt = StablecoinInfo {
            symbol: "USDT".to_string(),
            name: "Tether USD".to_string(),
            addresses: HashMap::from([
                (
                    "ethereum-v3".to_string(),
                    "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
                ),
                (
                    "ethereum-v2".to_string(),
                    "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
                ),
                (
                    "polygon-v3".to_string(),
                    "0xc2132d05d31c914a87c6611c10748aeb04b58e8f".to_string(),
                ),
                (
                    "arbitrum-v3".to_string(),
                    "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9".to_string(),
                ),
                (
                    "avalanche-v3".to_string(),
                    "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7".to_string(),
                ),
                (
                    "optimism-v3".to_string(),
                    "0x94b008aa00579c1307b0ef2c499ad98a8ce58e58".to_string(),
                ),
            ]),
        };

        let dai = StablecoinInfo {
            symbol: "DAI".to_string(),
            name: "Dai Stablecoin".to_string(),
            addresses: HashMap::from([
                (
                    "ethereum-v3".to_string(),
                    "0x6b175474e89094c44da98b954eedeac495271d0f".to_string(),
                ),
                (
                    "ethereum-v2".to_string(),
                    "0x6b175474e89094c44da98b954eedeac495271d0f".to_string(),
                ),
                (
                    "polygon-v3".to_string(),
                    "0x8f3cf7ad23cd3cadbd9735aff958023239c6a063".to_string(),
                ),
                (
                    "arbitrum-v3".to_string(),
                    "0xda10009cbd5d07dd0cecc66161fc93d7c9000da1".to_string(),
                ),
                (
                    "optimism-v3".to_string(),
                    "0xda10009cbd5d07dd0cecc66161fc93d7c9000da1".to_string(),
                ),
            ]),
        };

        Self::new(vec![usdc, usdt, dai])
    }

    pub fn all(&self) -> &[StablecoinInfo] {
        &self.stablecoins
    }

    pub fn get(&self, symbol: &str) -> Option<&StablecoinInfo> {
        self.stablecoins
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lookups() {
        let registry = StablecoinRegistry::with_default_stablecoins();
        assert!(registry.get("usdc").is_some());
        assert!(registry.get("USDT").is_some());
        assert!(registry.get("FRAX").is_none());
    }

    #[test]
    fn addresses_are_lowercase() {
        let registry = StablecoinRegistry::with_default_stablecoins();
        for coin in registry.all() {
            for address in coin.addresses.values() {
                assert_eq!(address, &address.to_lowercase());
            }
        }
    }
}
