use std::time::Duration;

use alloy::primitives::Address;

use lottery_core::{ControllerConfig, DEFAULT_CONTRACT_ADDRESS};

pub const ENV_PROXY_URL: &str = "LOTTERY_EIP1193_PROXY_URL";
pub const ENV_RUNTIME_PROFILE: &str = "LOTTERY_RUNTIME_PROFILE";
pub const ENV_CONTRACT_ADDRESS: &str = "LOTTERY_CONTRACT_ADDRESS";
pub const ENV_RPC_TIMEOUT_MS: &str = "LOTTERY_RPC_TIMEOUT_MS";
pub const ENV_RECEIPT_POLL_MS: &str = "LOTTERY_RECEIPT_POLL_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct LotteryAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// JSON-RPC endpoint of the bridge relaying to the browser wallet.
    pub eip1193_proxy_url: Option<String>,
    pub contract_address: Address,
    /// Per-request HTTP timeout. Confirmation waits are not bounded by it.
    pub rpc_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for LotteryAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            rpc_timeout_ms: 15_000,
            receipt_poll_interval_ms: 4_000,
        }
    }
}

impl LotteryAdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unparsable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_PROXY_URL).filter(|v| !v.trim().is_empty()) {
            config.eip1193_proxy_url = Some(url.trim().to_owned());
        }
        if let Some(profile) = lookup(ENV_RUNTIME_PROFILE) {
            match profile.trim().to_ascii_lowercase().as_str() {
                "production" | "prod" => config.runtime_profile = RuntimeProfile::Production,
                "development" | "dev" => config.runtime_profile = RuntimeProfile::Development,
                other => tracing::warn!(value = other, "unknown {ENV_RUNTIME_PROFILE}, ignoring"),
            }
        }
        if let Some(raw) = lookup(ENV_CONTRACT_ADDRESS) {
            match raw.trim().parse::<Address>() {
                Ok(address) => config.contract_address = address,
                Err(e) => tracing::warn!(error = %e, "invalid {ENV_CONTRACT_ADDRESS}, ignoring"),
            }
        }
        if let Some(ms) = parse_ms(&lookup, ENV_RPC_TIMEOUT_MS) {
            config.rpc_timeout_ms = ms;
        }
        if let Some(ms) = parse_ms(&lookup, ENV_RECEIPT_POLL_MS) {
            config.receipt_poll_interval_ms = ms;
        }
        config
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            contract_address: self.contract_address,
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            ..ControllerConfig::default()
        }
    }
}

fn parse_ms(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(ms),
        _ => {
            tracing::warn!(key, value = %raw, "expected a positive millisecond count, ignoring");
            None
        }
    }
}
