use serde::{Deserialize, Serialize};

use crate::error::LotteryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Accepted by the wallet, not yet mined.
    Submitted,
    /// Mined without revert.
    Confirmed,
    /// Mined, rejected by the contract.
    Reverted,
    /// Accepted by the wallet, but the receipt watch broke before a receipt
    /// arrived. The outcome on chain is unknown.
    Unconfirmed,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxStatus::Submitted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAction {
    Mined,
    MinedReverted,
    WatchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: TxStatus,
    pub to: TxStatus,
    pub reason: &'static str,
}

pub fn tx_transition(
    from: TxStatus,
    action: TxAction,
) -> Result<(TxStatus, StateTransition), LotteryError> {
    let (to, reason) = match (from, action) {
        (TxStatus::Submitted, TxAction::Mined) => (TxStatus::Confirmed, "receipt_success"),
        (TxStatus::Submitted, TxAction::MinedReverted) => (TxStatus::Reverted, "receipt_reverted"),
        (TxStatus::Submitted, TxAction::WatchFailed) => {
            (TxStatus::Unconfirmed, "receipt_watch_failed")
        }
        _ => {
            return Err(LotteryError::IllegalTransition(format!(
                "illegal tx transition: {from:?} --{action:?}-->"
            )))
        }
    };
    tracing::debug!(?from, ?to, reason, "tx transition");
    Ok((to, StateTransition { from, to, reason }))
}
