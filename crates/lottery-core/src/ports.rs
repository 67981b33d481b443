use alloy::primitives::{Address, Bytes, B256};
use thiserror::Error;

use crate::domain::{Account, FeeQuote, SnapshotView, TxReceipt, TxRequest};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("user rejected the request: {0}")]
    UserRejected(String),
    #[error("unrecognized chain: {0}")]
    UnrecognizedChain(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("execution reverted: {message}")]
    Revert { message: String, data: Bytes },
    #[error("policy error: {0}")]
    Policy(String),
}

/// The injected wallet capability. Every method may block until the wallet
/// or the node answers; none of them retry.
pub trait ProviderPort {
    /// False when no wallet is installed or the runtime forbids one.
    fn available(&self) -> bool;
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    fn chain_id(&self) -> Result<u64, PortError>;
    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError>;
    fn fee_data(&self) -> Result<FeeQuote, PortError>;
    /// `eth_call`, optionally pinned to a block.
    fn call(&self, request: &TxRequest, block: Option<u64>) -> Result<Bytes, PortError>;
    fn send_transaction(&self, request: &TxRequest) -> Result<B256, PortError>;
    /// `None` while the transaction is still pending.
    fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, PortError>;
}

/// Where the controller publishes what the user sees.
pub trait DisplayPort {
    fn set_busy(&self, busy: bool);
    fn set_status(&self, status: &str);
    fn set_account(&self, account: Option<&Account>);
    fn set_view(&self, view: Option<&SnapshotView>);
}
