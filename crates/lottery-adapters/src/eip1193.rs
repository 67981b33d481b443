use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;
use serde_json::Value;

use lottery_core::{chain_id_hex, FeeQuote, PortError, ProviderPort, TxReceipt, TxRequest};

use crate::deterministic::{revert_data, SimError, SimulatedChain, SwitchPolicy};
use crate::LotteryAdapterConfig;

/// ethers' fallback when the node has no `eth_maxPriorityFeePerGas`.
const FALLBACK_PRIORITY_FEE: u128 = 1_000_000_000;

const CODE_USER_REJECTED: i64 = 4001;
const CODE_UNAUTHORIZED: i64 = 4100;
const CODE_DISCONNECTED: i64 = 4900;
const CODE_CHAIN_DISCONNECTED: i64 = 4901;
const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;
const CODE_EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<SimulatedChain>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(LotteryAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: LotteryAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.rpc_timeout_ms);
            match reqwest::blocking::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        tracing::warn!(error = %e, "proxy client unavailable, using deterministic wallet");
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        tracing::info!(mode = mode.name(), "eip1193 adapter ready");
        Self {
            mode,
            state: Arc::new(Mutex::new(SimulatedChain::new(config.contract_address))),
        }
    }

    /// Deterministic wallet regardless of environment.
    pub fn deterministic(config: LotteryAdapterConfig) -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(SimulatedChain::new(config.contract_address))),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode.name()
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Unavailable(reason.clone()));
        }
        Ok(())
    }

    fn sim(&self) -> Result<MutexGuard<'_, SimulatedChain>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.sim()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_set_chain_id(&self, chain_id: u64) -> Result<(), PortError> {
        self.sim()?.chain_id = chain_id;
        Ok(())
    }

    pub fn debug_reject_chain_switch(&self, reject: bool) -> Result<(), PortError> {
        self.sim()?.switch_policy = if reject {
            SwitchPolicy::Reject
        } else {
            SwitchPolicy::Accept
        };
        Ok(())
    }

    /// The next call of `method` (an EIP-1193 method name) is declined as if
    /// the user clicked "Reject".
    pub fn debug_reject_next(&self, method: &str) -> Result<(), PortError> {
        self.sim()?.reject_next.insert(method.to_owned());
        Ok(())
    }

    pub fn debug_set_fee(&self, fee: FeeQuote) -> Result<(), PortError> {
        self.sim()?.fee = fee;
        Ok(())
    }

    /// Number of receipt polls answered with "pending" before each
    /// transaction shows as mined.
    pub fn debug_set_mining_delay(&self, polls: u32) -> Result<(), PortError> {
        self.sim()?.mining_delay_polls = polls;
        Ok(())
    }

    pub fn debug_set_owner(&self, owner: Address) -> Result<(), PortError> {
        self.sim()?.lottery.owner = owner;
        Ok(())
    }

    pub fn debug_fund(&self, account: Address, wei: U256) -> Result<(), PortError> {
        self.sim()?.wallet_balances.insert(account, wei);
        Ok(())
    }

    pub fn debug_wallet_balance(&self, account: Address) -> Result<U256, PortError> {
        Ok(self
            .sim()?
            .wallet_balances
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    pub fn debug_players(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.sim()?.lottery.players.clone())
    }

    fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Unavailable(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented(
                    "eip1193 proxy runtime not enabled",
                ))
            }
        };

        tracing::debug!(method, "eip1193 proxy request");
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(map_rpc_error(method, err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    fn proxy_fee_data(&self) -> Result<FeeQuote, PortError> {
        let block = self.proxy_call("eth_getBlockByNumber", serde_json::json!(["latest", false]))?;
        let base_fee = block
            .get("baseFeePerGas")
            .ok_or_else(|| PortError::Validation("latest block has no baseFeePerGas".to_owned()))
            .and_then(parse_quantity)?;
        let priority = match self.proxy_call("eth_maxPriorityFeePerGas", serde_json::json!([])) {
            Ok(v) => parse_quantity(&v)?,
            Err(e) => {
                tracing::debug!(error = %e, "eth_maxPriorityFeePerGas unavailable, using 1 gwei");
                FALLBACK_PRIORITY_FEE
            }
        };
        Ok(FeeQuote {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority),
            max_priority_fee_per_gas: priority,
        })
    }
}

impl ProviderMode {
    fn name(&self) -> &'static str {
        match self {
            ProviderMode::Disabled(_) => "disabled",
            ProviderMode::Deterministic => "deterministic",
            ProviderMode::Proxy(_) => "proxy",
        }
    }
}

impl ProviderPort for Eip1193Adapter {
    fn available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_requestAccounts", serde_json::json!([]))?;
            let arr = result.as_array().ok_or_else(|| {
                PortError::Transport("eth_requestAccounts: array expected".to_owned())
            })?;
            let mut accounts = Vec::with_capacity(arr.len());
            for item in arr {
                let raw = item.as_str().ok_or_else(|| {
                    PortError::Transport("eth_requestAccounts: string expected".to_owned())
                })?;
                let parsed: Address = raw
                    .parse()
                    .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
                accounts.push(parsed);
            }
            return Ok(accounts);
        }

        self.sim()?.request_accounts().map_err(sim_error)
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_chainId", serde_json::json!([]))?;
            return json_chain_id_to_u64(&result);
        }

        Ok(self.sim()?.chain_id)
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            self.proxy_call(
                "wallet_switchEthereumChain",
                serde_json::json!([{ "chainId": chain_id_hex(chain_id) }]),
            )?;
            return Ok(());
        }

        self.sim()?.switch_chain(chain_id).map_err(sim_error)
    }

    fn fee_data(&self) -> Result<FeeQuote, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            return self.proxy_fee_data();
        }

        Ok(self.sim()?.fee)
    }

    fn call(&self, request: &TxRequest, block: Option<u64>) -> Result<Bytes, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let tag = block
                .map(|b| Value::String(format!("0x{b:x}")))
                .unwrap_or_else(|| Value::String("latest".to_owned()));
            let result = self.proxy_call("eth_call", serde_json::json!([tx_json(request), tag]))?;
            let raw = result
                .as_str()
                .ok_or_else(|| PortError::Transport("eth_call must return hex data".to_owned()))?;
            return raw
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid eth_call result: {e}")));
        }

        self.sim()?.call(request).map_err(sim_error)
    }

    fn send_transaction(&self, request: &TxRequest) -> Result<B256, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result =
                self.proxy_call("eth_sendTransaction", serde_json::json!([tx_json(request)]))?;
            let hash = result.as_str().ok_or_else(|| {
                PortError::Transport("eth_sendTransaction must return hash".to_owned())
            })?;
            return hash
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")));
        }

        self.sim()?.send_transaction(request).map_err(sim_error)
    }

    fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, PortError> {
        self.check_mode()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.to_string()]),
            )?;
            if result.is_null() {
                return Ok(None);
            }
            return parse_receipt(tx_hash, &result).map(Some);
        }

        Ok(self.sim()?.transaction_receipt(tx_hash))
    }
}

fn sim_error(err: SimError) -> PortError {
    match err {
        SimError::Rejected(msg) => PortError::UserRejected(msg),
        SimError::NoAccounts => PortError::Policy(
            "no provider accounts available; unlock/connect wallet".to_owned(),
        ),
        SimError::InsufficientFunds => {
            PortError::Transport("insufficient funds for gas * price + value".to_owned())
        }
        SimError::Revert(reason) => PortError::Revert {
            message: if reason.is_empty() {
                "execution reverted".to_owned()
            } else {
                format!("execution reverted: {reason}")
            },
            data: revert_data(&reason),
        },
    }
}

fn map_rpc_error(method: &str, err: &Value) -> PortError {
    let Ok(obj) = serde_json::from_value::<RpcErrorObject>(err.clone()) else {
        return PortError::Transport(format!("eip1193 proxy returned error: {err}"));
    };
    let revert_bytes = obj
        .data
        .as_ref()
        .and_then(|d| d.as_str().or_else(|| d.get("data").and_then(Value::as_str)))
        .and_then(|s| s.parse::<Bytes>().ok());

    match obj.code {
        CODE_USER_REJECTED => PortError::UserRejected(obj.message),
        CODE_UNRECOGNIZED_CHAIN => PortError::UnrecognizedChain(obj.message),
        CODE_DISCONNECTED | CODE_CHAIN_DISCONNECTED => PortError::Unavailable(obj.message),
        CODE_UNAUTHORIZED => PortError::Policy(obj.message),
        CODE_EXECUTION_REVERTED => PortError::Revert {
            message: obj.message,
            data: revert_bytes.unwrap_or_default(),
        },
        code => match revert_bytes {
            Some(data) if !data.is_empty() => PortError::Revert {
                message: obj.message,
                data,
            },
            _ => PortError::Transport(format!("{method} failed ({code}): {}", obj.message)),
        },
    }
}

fn tx_json(request: &TxRequest) -> Value {
    let mut tx = serde_json::json!({
        "from": request.from.to_string(),
        "to": request.to.to_string(),
        "value": format!("0x{:x}", request.value),
        "data": alloy::hex::encode_prefixed(&request.data),
    });
    if let Some(gas) = request.gas_limit {
        tx["gas"] = Value::String(format!("{gas:#x}"));
    }
    if let Some(fee) = request.max_fee_per_gas {
        tx["maxFeePerGas"] = Value::String(format!("{fee:#x}"));
    }
    if let Some(fee) = request.max_priority_fee_per_gas {
        tx["maxPriorityFeePerGas"] = Value::String(format!("{fee:#x}"));
    }
    tx
}

fn parse_receipt(tx_hash: B256, value: &Value) -> Result<TxReceipt, PortError> {
    let field = |name: &str| {
        value
            .get(name)
            .ok_or_else(|| PortError::Validation(format!("receipt missing {name}")))
            .and_then(parse_quantity)
    };
    let narrow = |name: &str| {
        field(name).and_then(|raw| {
            u64::try_from(raw)
                .map_err(|_| PortError::Validation(format!("receipt {name} out of range: {raw}")))
        })
    };
    let status = field("status")?;
    Ok(TxReceipt {
        tx_hash,
        block_number: narrow("blockNumber")?,
        success: status == 1,
        gas_used: narrow("gasUsed")?,
    })
}

fn parse_quantity(value: &Value) -> Result<u128, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n as u128);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    let digits = raw.trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| PortError::Validation(format!("invalid quantity {raw}: {e}")))
}

fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        u64::from_str_radix(raw.trim_start_matches("0x").trim_start_matches("0X"), 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}
