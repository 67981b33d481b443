//! In-memory wallet, chain and lottery contract used when no real wallet is
//! wired in. Behaves like the deployed contract closely enough for demos
//! and tests: fixed price, owner-only draw, zero address until first draw.

use std::collections::{HashMap, HashSet};

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{Revert, SolCall, SolError, SolInterface};

use lottery_core::contract::ILottery::{self, ILotteryCalls};
use lottery_core::{FeeQuote, TxReceipt, TxRequest, REQUIRED_CHAIN_ID, TICKET_PRICE_WEI};

pub const DEFAULT_ACCOUNT: Address =
    alloy::primitives::address!("1000000000000000000000000000000000000001");

const DEFAULT_GAS: u64 = 100_000;
const ONE_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

pub const REVERT_WRONG_PRICE: &str = "Must send exactly 0.01 ETH";
pub const REVERT_NOT_OWNER: &str = "Only owner can pick winner";
pub const REVERT_NO_PLAYERS: &str = "No players in the lottery";

#[derive(Debug, Clone)]
pub(crate) struct SimulatedLottery {
    pub address: Address,
    pub owner: Address,
    pub balance: U256,
    pub players: Vec<Address>,
    pub last_winner: Address,
}

/// Net effect of a successful contract execution on wallet balances.
#[derive(Debug, Default)]
struct Payout {
    to: Option<(Address, U256)>,
}

impl SimulatedLottery {
    fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            balance: U256::ZERO,
            players: Vec::new(),
            last_winner: Address::ZERO,
        }
    }

    /// Run one call against the contract. `Err` carries the revert reason;
    /// an empty reason means a revert without data.
    fn execute(
        &mut self,
        from: Address,
        value: U256,
        data: &[u8],
        block: u64,
    ) -> Result<(Bytes, Payout), String> {
        let Ok(call) = ILotteryCalls::abi_decode(data, true) else {
            return Err(String::new());
        };
        match call {
            ILotteryCalls::buyTicket(_) => {
                if value != TICKET_PRICE_WEI {
                    return Err(REVERT_WRONG_PRICE.to_owned());
                }
                self.players.push(from);
                self.balance += value;
                Ok((Bytes::new(), Payout::default()))
            }
            ILotteryCalls::pickWinner(_) => {
                nonpayable(value)?;
                if from != self.owner {
                    return Err(REVERT_NOT_OWNER.to_owned());
                }
                if self.players.is_empty() {
                    return Err(REVERT_NO_PLAYERS.to_owned());
                }
                let mut seed = Vec::with_capacity(16);
                seed.extend_from_slice(&block.to_be_bytes());
                seed.extend_from_slice(&(self.players.len() as u64).to_be_bytes());
                let roll = U256::from_be_bytes(keccak256(seed).0);
                let index = (roll % U256::from(self.players.len())).to::<usize>();
                let winner = self.players[index];
                let prize = self.balance;
                self.players.clear();
                self.balance = U256::ZERO;
                self.last_winner = winner;
                Ok((
                    Bytes::new(),
                    Payout {
                        to: Some((winner, prize)),
                    },
                ))
            }
            ILotteryCalls::getBalance(_) => {
                nonpayable(value)?;
                let out = ILottery::getBalanceCall::abi_encode_returns(&(self.balance,));
                Ok((out.into(), Payout::default()))
            }
            ILotteryCalls::getPlayers(_) => {
                nonpayable(value)?;
                let out = ILottery::getPlayersCall::abi_encode_returns(&(self.players.clone(),));
                Ok((out.into(), Payout::default()))
            }
            ILotteryCalls::lastWinner(_) => {
                nonpayable(value)?;
                let out = ILottery::lastWinnerCall::abi_encode_returns(&(self.last_winner,));
                Ok((out.into(), Payout::default()))
            }
        }
    }
}

fn nonpayable(value: U256) -> Result<(), String> {
    if value.is_zero() {
        Ok(())
    } else {
        Err(String::new())
    }
}

#[derive(Debug, Clone)]
struct PendingReceipt {
    receipt: TxReceipt,
    polls_remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPolicy {
    Accept,
    Reject,
}

/// Outcome of a simulated submission, mirrored onto `PortError` by the
/// adapter.
#[derive(Debug)]
pub(crate) enum SimError {
    Rejected(String),
    InsufficientFunds,
    NoAccounts,
    Revert(String),
}

#[derive(Debug, Clone)]
pub(crate) struct SimulatedChain {
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    pub switch_policy: SwitchPolicy,
    pub fee: FeeQuote,
    pub block_number: u64,
    pub mining_delay_polls: u32,
    pub lottery: SimulatedLottery,
    pub wallet_balances: HashMap<Address, U256>,
    pub reject_next: HashSet<String>,
    receipts: HashMap<B256, PendingReceipt>,
    nonce: u64,
}

impl SimulatedChain {
    pub fn new(contract: Address) -> Self {
        let mut wallet_balances = HashMap::new();
        wallet_balances.insert(DEFAULT_ACCOUNT, ONE_ETHER);
        Self {
            accounts: vec![DEFAULT_ACCOUNT],
            chain_id: REQUIRED_CHAIN_ID,
            switch_policy: SwitchPolicy::Accept,
            fee: FeeQuote {
                max_fee_per_gas: 2_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
            },
            block_number: 1,
            mining_delay_polls: 0,
            lottery: SimulatedLottery::new(contract, DEFAULT_ACCOUNT),
            wallet_balances,
            reject_next: HashSet::new(),
            receipts: HashMap::new(),
            nonce: 0,
        }
    }

    /// Consume a scripted rejection for `method`, if one is armed.
    pub fn take_rejection(&mut self, method: &str) -> Result<(), SimError> {
        if self.reject_next.remove(method) {
            return Err(SimError::Rejected(format!(
                "User rejected the request ({method})"
            )));
        }
        Ok(())
    }

    pub fn request_accounts(&mut self) -> Result<Vec<Address>, SimError> {
        self.take_rejection("eth_requestAccounts")?;
        if self.accounts.is_empty() {
            return Err(SimError::NoAccounts);
        }
        Ok(self.accounts.clone())
    }

    pub fn switch_chain(&mut self, chain_id: u64) -> Result<(), SimError> {
        self.take_rejection("wallet_switchEthereumChain")?;
        match self.switch_policy {
            SwitchPolicy::Accept => {
                self.chain_id = chain_id;
                Ok(())
            }
            SwitchPolicy::Reject => Err(SimError::Rejected(
                "User rejected the network switch".to_owned(),
            )),
        }
    }

    /// Read-only execution. Nothing is mined and no state changes.
    pub fn call(&self, request: &TxRequest) -> Result<Bytes, SimError> {
        if request.to != self.lottery.address {
            return Ok(Bytes::new());
        }
        let mut scratch = self.lottery.clone();
        scratch
            .execute(request.from, request.value, &request.data, self.block_number)
            .map(|(out, _)| out)
            .map_err(SimError::Revert)
    }

    pub fn send_transaction(&mut self, request: &TxRequest) -> Result<B256, SimError> {
        self.take_rejection("eth_sendTransaction")?;

        let gas = request.gas_limit.unwrap_or(DEFAULT_GAS);
        let fee = request.max_fee_per_gas.unwrap_or(self.fee.max_fee_per_gas);
        let cost = request.value + U256::from(gas) * U256::from(fee);
        let funds = self
            .wallet_balances
            .get(&request.from)
            .copied()
            .unwrap_or(U256::ZERO);
        if funds < cost {
            return Err(SimError::InsufficientFunds);
        }

        self.nonce += 1;
        self.block_number += 1;
        let mut seed = Vec::new();
        seed.extend_from_slice(&self.nonce.to_be_bytes());
        seed.extend_from_slice(request.from.as_slice());
        seed.extend_from_slice(&request.data);
        let tx_hash = keccak256(seed);

        let success = if request.to == self.lottery.address {
            match self
                .lottery
                .execute(request.from, request.value, &request.data, self.block_number)
            {
                Ok((_, payout)) => {
                    self.debit(request.from, request.value);
                    if let Some((winner, prize)) = payout.to {
                        *self.wallet_balances.entry(winner).or_insert(U256::ZERO) += prize;
                    }
                    true
                }
                Err(reason) => {
                    tracing::debug!(%tx_hash, %reason, "simulated revert");
                    false
                }
            }
        } else {
            self.debit(request.from, request.value);
            *self.wallet_balances.entry(request.to).or_insert(U256::ZERO) += request.value;
            true
        };

        self.receipts.insert(
            tx_hash,
            PendingReceipt {
                receipt: TxReceipt {
                    tx_hash,
                    block_number: self.block_number,
                    success,
                    gas_used: if success { 50_000 } else { 30_000 },
                },
                polls_remaining: self.mining_delay_polls,
            },
        );
        Ok(tx_hash)
    }

    pub fn transaction_receipt(&mut self, tx_hash: B256) -> Option<TxReceipt> {
        let pending = self.receipts.get_mut(&tx_hash)?;
        if pending.polls_remaining > 0 {
            pending.polls_remaining -= 1;
            return None;
        }
        Some(pending.receipt)
    }

    fn debit(&mut self, from: Address, value: U256) {
        let entry = self.wallet_balances.entry(from).or_insert(U256::ZERO);
        *entry = entry.saturating_sub(value);
    }
}

/// Encode a reason the way `require(cond, reason)` does; empty means a bare
/// revert.
pub(crate) fn revert_data(reason: &str) -> Bytes {
    if reason.is_empty() {
        return Bytes::new();
    }
    Revert {
        reason: reason.to_owned(),
    }
    .abi_encode()
    .into()
}
