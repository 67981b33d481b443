//! Submit-and-confirm watch shared by every mutating call.
//!
//! A handle enters as `Submitted` and leaves as `Confirmed`, `Reverted` or
//! `Unconfirmed`. Submissions the wallet refuses never get a handle. There is
//! no timeout and no resubmission: a transaction that is never mined keeps
//! the caller polling.

use std::time::Duration;

use crate::contract::decode_revert_reason;
use crate::domain::{TransactionHandle, TxReceipt};
use crate::error::LotteryError;
use crate::ports::{PortError, ProviderPort};
use crate::state_machine::{tx_transition, TxAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub handle: TransactionHandle,
    pub receipt: TxReceipt,
}

pub fn await_confirmation<P: ProviderPort>(
    provider: &P,
    mut handle: TransactionHandle,
    poll_interval: Duration,
) -> Result<Confirmation, LotteryError> {
    let receipt = loop {
        match provider.transaction_receipt(handle.tx_hash) {
            Ok(Some(receipt)) => break receipt,
            Ok(None) => {
                tracing::trace!(tx_hash = %handle.tx_hash, "receipt pending");
                std::thread::sleep(poll_interval);
            }
            Err(err) => {
                let (status, transition) = tx_transition(handle.status, TxAction::WatchFailed)?;
                handle.status = status;
                tracing::warn!(
                    tx_hash = %handle.tx_hash,
                    status = ?handle.status,
                    reason = transition.reason,
                    error = %err,
                    "receipt watch failed"
                );
                return Err(match LotteryError::from_read(err) {
                    LotteryError::Rpc(msg) => LotteryError::Rpc(format!(
                        "transaction {} unconfirmed: {msg}",
                        handle.tx_hash
                    )),
                    other => other,
                });
            }
        }
    };

    if receipt.success {
        let (status, _) = tx_transition(handle.status, TxAction::Mined)?;
        handle.status = status;
        tracing::info!(
            tx_hash = %handle.tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        return Ok(Confirmation { handle, receipt });
    }

    let (status, _) = tx_transition(handle.status, TxAction::MinedReverted)?;
    let reason = replay_revert_reason(provider, &handle, &receipt);
    tracing::warn!(tx_hash = %handle.tx_hash, ?status, ?reason, "transaction reverted");
    Err(LotteryError::Reverted { reason })
}

/// Receipts carry no revert data, so re-run the call against the block it
/// was mined in and decode whatever the node reports.
fn replay_revert_reason<P: ProviderPort>(
    provider: &P,
    handle: &TransactionHandle,
    receipt: &TxReceipt,
) -> Option<String> {
    match provider.call(&handle.request, Some(receipt.block_number)) {
        Err(PortError::Revert { message, data }) => decode_revert_reason(&data)
            .or_else(|| (!message.is_empty()).then_some(message)),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "revert replay failed");
            None
        }
    }
}
