use crate::error::{AppError, Result};

pub const EXPLORER_URL: &str = "https://explorer.skale.network";

/// Wallet the owner collection view is rendered for.
pub const OWNER_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

/// Artificial latency of the mock asset source, standing in for a network call.
pub const DEFAULT_FETCH_DELAY_MS: u64 = 1000;

/// Channel capacity for market action intents.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Auction length used when a listing dialog leaves the duration blank.
pub const DEFAULT_AUCTION_DAYS: u32 = 7;

/// Full rarity-score range; a filter equal to it imposes no restriction.
pub mod rarity_score_bounds {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Delay before the mock source yields its records (FETCH_DELAY_MS)
    pub fetch_delay_ms: u64,
    /// Block explorer used for owner/token links (EXPLORER_URL)
    pub explorer_url: String,
    /// Session wallet whose collection is editable (OWNER_ADDRESS)
    pub owner_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            fetch_delay_ms: std::env::var("FETCH_DELAY_MS")
                .unwrap_or_else(|_| DEFAULT_FETCH_DELAY_MS.to_string())
                .parse::<u64>()
                .unwrap_or(DEFAULT_FETCH_DELAY_MS),
            explorer_url: std::env::var("EXPLORER_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| EXPLORER_URL.to_string()),
            owner_address: std::env::var("OWNER_ADDRESS")
                .unwrap_or_else(|_| OWNER_ADDRESS.to_string()),
        })
    }

    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url, address)
    }

    pub fn explorer_token_url(&self, token_id: &str) -> String {
        format!("{}/token/{}", self.explorer_url, token_id.trim_start_matches('#'))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            api_port: 0,
            fetch_delay_ms: 0,
            explorer_url: EXPLORER_URL.to_string(),
            owner_address: OWNER_ADDRESS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_links_strip_token_hash() {
        let cfg = Config::for_tests();
        assert_eq!(
            cfg.explorer_token_url("#1003"),
            "https://explorer.skale.network/token/1003"
        );
        assert_eq!(
            cfg.explorer_address_url("0xabc"),
            "https://explorer.skale.network/address/0xabc"
        );
    }
}
