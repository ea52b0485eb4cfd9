//! Feed configuration.

/// Public Coinbase Exchange websocket endpoint.
pub const COINBASE_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

/// Connection parameters for one feed session. One product per session; the
/// exchange supports multi-product subscriptions but the pipeline processes a
/// single symbol end to end.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    pub product_id: String,
}

impl FeedConfig {
    /// Config for one product against the public endpoint.
    pub fn for_product(product_id: impl Into<String>) -> Self {
        FeedConfig {
            ws_url: COINBASE_WS_URL.to_string(),
            product_id: product_id.into(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig::for_product("BTC-USD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.product_id, "BTC-USD");
        assert!(config.ws_url.starts_with("wss://"));
    }
}
