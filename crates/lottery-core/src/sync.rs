use alloy::primitives::Address;

use crate::contract::LotteryContract;
use crate::domain::{Account, ContractBinding, LotterySnapshot, SnapshotView};
use crate::error::LotteryError;
use crate::ports::ProviderPort;

/// Read every piece of contract state and derive the caller's ticket count
/// from the same `players` sequence. Nothing is cached between calls.
pub fn refresh<P: ProviderPort>(
    provider: &P,
    binding: Option<&ContractBinding>,
    account: Option<&Account>,
) -> Result<SnapshotView, LotteryError> {
    let contract = LotteryContract::bind(provider, binding)?;
    let balance_wei = contract.read_balance()?;
    let (players, winner) = contract.read_state()?;

    let snapshot = LotterySnapshot {
        balance_wei,
        players: players.into_iter().map(Account::from).collect(),
        last_winner: winner_or_none(winner),
    };
    let view = SnapshotView::derive(snapshot, account);
    tracing::debug!(
        players = view.snapshot.players.len(),
        my_tickets = view.my_tickets,
        balance = %view.snapshot.balance_ether(),
        "lottery snapshot refreshed"
    );
    Ok(view)
}

pub fn winner_or_none(raw: Address) -> Option<Account> {
    (raw != Address::ZERO).then_some(Account(raw))
}
