use std::fmt;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize, Serializer};

use crate::state_machine::TxStatus;

/// Sepolia.
pub const REQUIRED_CHAIN_ID: u64 = 11_155_111;
/// `REQUIRED_CHAIN_ID` in the form `wallet_switchEthereumChain` expects.
pub const REQUIRED_CHAIN_ID_HEX: &str = "0xaa36a7";

/// 0.01 ether in wei.
pub const TICKET_PRICE_WEI: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);
pub const BUY_GAS_LIMIT: u64 = 300_000;

pub const DEFAULT_CONTRACT_ADDRESS: Address =
    alloy::primitives::address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// A connected wallet account. Compares case-insensitively (it wraps the raw
/// 20 bytes) and renders lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Account(pub Address);

impl Account {
    pub fn address(&self) -> Address {
        self.0
    }

    /// `0x1234...abcd`, as shown next to "Connected:".
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }

    pub fn checksummed(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for Account {
    fn from(value: Address) -> Self {
        Self(value)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", alloy::hex::encode(self.0.as_slice()))
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Handle to the deployed lottery contract, scoped to the signer that was
/// connected when it was created. `id` is unique per establishment so a
/// stale binding can be told apart from a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    pub id: u64,
    pub contract: Address,
    pub signer: Account,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    BuyTicket,
    PickWinner,
}

/// Transaction or call parameters as handed to the wallet. `None` fields are
/// left for the wallet to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TxRequest {
    pub fn read(to: Address, data: Bytes) -> Self {
        Self {
            from: Address::ZERO,
            to,
            value: U256::ZERO,
            data,
            gas_limit: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHandle {
    pub kind: TxKind,
    pub tx_hash: B256,
    pub request: TxRequest,
    pub status: TxStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
    pub gas_used: u64,
}

/// Everything the contract exposes through its read methods. Replaced
/// wholesale on every refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotterySnapshot {
    pub balance_wei: U256,
    pub players: Vec<Account>,
    pub last_winner: Option<Account>,
}

impl LotterySnapshot {
    pub fn balance_ether(&self) -> String {
        format_ether(self.balance_wei)
    }

    pub fn last_winner_label(&self) -> String {
        self.last_winner
            .map(|w| w.checksummed())
            .unwrap_or_else(|| "none".to_owned())
    }

    pub fn tickets_of(&self, account: &Account) -> usize {
        self.players.iter().filter(|p| *p == account).count()
    }
}

/// A snapshot together with the ticket count derived from it. Both halves
/// are always produced by the same refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotView {
    pub snapshot: LotterySnapshot,
    pub my_tickets: usize,
}

impl SnapshotView {
    pub fn derive(snapshot: LotterySnapshot, account: Option<&Account>) -> Self {
        let my_tickets = account.map(|a| snapshot.tickets_of(a)).unwrap_or(0);
        Self {
            snapshot,
            my_tickets,
        }
    }

    /// Recompute the ticket count for a different account against the same
    /// players.
    pub fn rebind(self, account: Option<&Account>) -> Self {
        Self::derive(self.snapshot, account)
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub required_chain_id: u64,
    pub contract_address: Address,
    pub ticket_price_wei: U256,
    pub buy_gas_limit: u64,
    pub receipt_poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            required_chain_id: REQUIRED_CHAIN_ID,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            ticket_price_wei: TICKET_PRICE_WEI,
            buy_gas_limit: BUY_GAS_LIMIT,
            receipt_poll_interval: Duration::from_millis(4_000),
        }
    }
}

/// Wei to a decimal ether string with trailing zeros dropped, keeping at
/// least one fractional digit (`0.0`, `0.01`, `1.5`).
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(18u64));
    let whole = wei / unit;
    let frac = wei % unit;
    let frac = format!("{:0>18}", frac.to_string());
    let trimmed = frac.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}

pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}
