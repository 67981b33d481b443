use thiserror::Error;

use crate::ports::PortError;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("no wallet available; install or enable a browser wallet")]
    WalletUnavailable,
    #[error("request rejected in wallet: {0}")]
    UserRejected(String),
    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("wallet not connected")]
    NotConnected,
    #[error("transaction not submitted: {0}")]
    Submit(String),
    #[error("transaction reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("another transaction is still in flight")]
    Busy,
    #[error("{0}")]
    IllegalTransition(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl LotteryError {
    /// Failures while requesting account access.
    pub fn from_session(err: PortError) -> Self {
        match err {
            PortError::Unavailable(_) => LotteryError::WalletUnavailable,
            PortError::UserRejected(msg) => LotteryError::UserRejected(msg),
            other => LotteryError::Rpc(other.to_string()),
        }
    }

    /// Failures of read-only calls and of the confirmation watch.
    pub fn from_read(err: PortError) -> Self {
        match err {
            PortError::Unavailable(_) => LotteryError::WalletUnavailable,
            other => LotteryError::Rpc(other.to_string()),
        }
    }

    /// Failures before a transaction reached the chain.
    pub fn from_submit(err: PortError) -> Self {
        match err {
            PortError::Unavailable(_) => LotteryError::WalletUnavailable,
            PortError::UserRejected(msg) => LotteryError::UserRejected(msg),
            PortError::Revert { message, data } => {
                let reason = crate::contract::decode_revert_reason(&data).unwrap_or(message);
                LotteryError::Submit(reason)
            }
            other => LotteryError::Submit(other.to_string()),
        }
    }

    /// Whether the same action can simply be tried again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LotteryError::WalletUnavailable
                | LotteryError::NotConnected
                | LotteryError::IllegalTransition(_)
                | LotteryError::Internal(_)
        )
    }
}
