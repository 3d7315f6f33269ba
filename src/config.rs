use serde::Deserialize;
use std::env;
use std::net::IpAddr;

use crate::constants::{
    DEFAULT_RELAYER_POLL_ATTEMPTS, DEFAULT_RELAYER_POLL_INTERVAL_MS, RATE_LIMIT_MAX_REQUESTS,
    RATE_LIMIT_WINDOW_MS,
};
use crate::models::intent::parse_address;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Chain
    pub rpc_url: String,
    pub chain_id: u64,
    pub state_machine_address: String,

    // Submitter identity
    pub relayer_private_key: String,
    pub relayer_poll_attempts: usize,
    pub relayer_poll_interval_ms: u64,

    // Optional guard for /kick
    pub relayer_admin_key: Option<String>,

    // Rate Limiting
    pub rate_limit_window_ms: u64,
    pub rate_limit_max_requests: u32,
    /// Peers whose `X-Forwarded-For` is believed. Empty means the TCP peer
    /// is always the origin.
    pub rate_limit_trusted_proxies: Vec<IpAddr>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            rpc_url: env::var("RPC_URL")?,
            chain_id: env::var("CHAIN_ID")?.trim().parse()?,
            state_machine_address: env::var("STATE_MACHINE_ADDRESS")?,

            relayer_private_key: env::var("RELAYER_PRIVATE_KEY")?,
            relayer_poll_attempts: env::var("RELAYER_POLL_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RELAYER_POLL_ATTEMPTS),
            relayer_poll_interval_ms: env::var("RELAYER_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RELAYER_POLL_INTERVAL_MS),

            relayer_admin_key: env::var("RELAYER_ADMIN_KEY")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),

            rate_limit_window_ms: env::var("RATE_LIMIT_WINDOW_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RATE_LIMIT_WINDOW_MS),
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RATE_LIMIT_MAX_REQUESTS),
            rate_limit_trusted_proxies: parse_ip_list(
                &env::var("RATE_LIMIT_TRUSTED_PROXIES").unwrap_or_default(),
            )?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("RPC_URL is empty");
        }
        url::Url::parse(self.rpc_url.trim())
            .map_err(|e| anyhow::anyhow!("RPC_URL is not a valid URL: {}", e))?;
        if self.chain_id == 0 {
            anyhow::bail!("CHAIN_ID must be > 0");
        }
        if parse_address(&self.state_machine_address).is_err() {
            anyhow::bail!("STATE_MACHINE_ADDRESS is not a 20-byte hex address");
        }
        if self
            .relayer_private_key
            .trim()
            .parse::<ethers::signers::LocalWallet>()
            .is_err()
        {
            anyhow::bail!("RELAYER_PRIVATE_KEY is not a valid secp256k1 key");
        }

        if self.state_machine_address.starts_with("0x0000") {
            tracing::warn!("Using placeholder state machine address");
        }
        if self.relayer_admin_key.is_none() {
            if self.is_testnet() {
                tracing::warn!("RELAYER_ADMIN_KEY not set; /kick is open to any caller");
            } else {
                tracing::warn!("RELAYER_ADMIN_KEY not set; /kick is disabled");
            }
        }
        if self.rate_limit_window_ms == 0 || self.rate_limit_max_requests == 0 {
            tracing::warn!("Rate limit values should be > 0");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development" || self.environment == "testnet" || self.chain_id == 31337
    }
}

fn parse_ip_list(raw: &str) -> anyhow::Result<Vec<IpAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| anyhow::anyhow!("RATE_LIMIT_TRUSTED_PROXIES entry '{}': {}", s, e))
        })
        .collect()
}

#[cfg(test)]
impl Config {
    /// Local dev chain settings with the well-known key `0x..01`.
    pub fn sample() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            state_machine_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            relayer_private_key:
                "0x0000000000000000000000000000000000000000000000000000000000000001".to_string(),
            relayer_poll_attempts: DEFAULT_RELAYER_POLL_ATTEMPTS,
            relayer_poll_interval_ms: DEFAULT_RELAYER_POLL_INTERVAL_MS,
            relayer_admin_key: None,
            rate_limit_window_ms: RATE_LIMIT_WINDOW_MS,
            rate_limit_max_requests: RATE_LIMIT_MAX_REQUESTS,
            rate_limit_trusted_proxies: Vec::new(),
            cors_allowed_origins: "*".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_validates() {
        assert!(Config::sample().validate().is_ok());
    }

    #[test]
    fn rejects_bad_contract_address() {
        let mut config = Config::sample();
        config.state_machine_address = "0x1234".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_private_key() {
        let mut config = Config::sample();
        config.relayer_private_key = "not-a-key".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_rpc_url() {
        let mut config = Config::sample();
        config.rpc_url = "localhost 8545".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn trusted_proxy_list_parses_and_rejects_junk() {
        let parsed = parse_ip_list(" 10.0.0.1, ::1 ,").expect("valid list");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], "10.0.0.1".parse::<IpAddr>().expect("ip"));
        assert!(parse_ip_list("").expect("empty list").is_empty());
        assert!(parse_ip_list("10.0.0.1,proxy.local").is_err());
    }

    #[test]
    fn dev_chain_counts_as_testnet() {
        let mut config = Config::sample();
        config.environment = "production".to_string();
        assert!(config.is_testnet());
        config.chain_id = 1;
        assert!(!config.is_testnet());
    }
}
