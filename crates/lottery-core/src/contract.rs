use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{Panic, Revert, SolCall, SolError};

use crate::domain::{ContractBinding, FeeQuote, TransactionHandle, TxKind, TxRequest};
use crate::error::LotteryError;
use crate::ports::ProviderPort;
use crate::state_machine::TxStatus;

alloy::sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ILottery {
        function buyTicket() external payable;
        function pickWinner() external;
        function getBalance() external view returns (uint256);
        function getPlayers() external view returns (address[] memory);
        function lastWinner() external view returns (address);
    }
}

/// Typed facade over the lottery contract for one bound session.
#[derive(Debug)]
pub struct LotteryContract<'a, P> {
    provider: &'a P,
    binding: &'a ContractBinding,
}

impl<'a, P: ProviderPort> LotteryContract<'a, P> {
    pub fn bind(
        provider: &'a P,
        binding: Option<&'a ContractBinding>,
    ) -> Result<Self, LotteryError> {
        let binding = binding.ok_or(LotteryError::NotConnected)?;
        Ok(Self { provider, binding })
    }

    /// Pay for one ticket. The gas limit is pinned so the wallet does not
    /// have to estimate, and the fee parameters are the ones just quoted.
    pub fn buy_ticket(
        &self,
        fee: FeeQuote,
        value: U256,
        gas_limit: u64,
    ) -> Result<TransactionHandle, LotteryError> {
        let request = TxRequest {
            from: self.binding.signer.address(),
            to: self.binding.contract,
            value,
            data: ILottery::buyTicketCall {}.abi_encode().into(),
            gas_limit: Some(gas_limit),
            max_fee_per_gas: Some(fee.max_fee_per_gas),
            max_priority_fee_per_gas: Some(fee.max_priority_fee_per_gas),
        };
        self.submit(TxKind::BuyTicket, request)
    }

    /// Ownership is enforced by the contract only; a non-owner gets a
    /// reverted transaction, not an error here.
    pub fn pick_winner(&self) -> Result<TransactionHandle, LotteryError> {
        let request = TxRequest {
            from: self.binding.signer.address(),
            to: self.binding.contract,
            value: U256::ZERO,
            data: ILottery::pickWinnerCall {}.abi_encode().into(),
            gas_limit: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };
        self.submit(TxKind::PickWinner, request)
    }

    pub fn read_balance(&self) -> Result<U256, LotteryError> {
        let out = self.read(ILottery::getBalanceCall {}.abi_encode())?;
        let decoded = ILottery::getBalanceCall::abi_decode_returns(&out, true)
            .map_err(|e| LotteryError::Rpc(format!("getBalance decode failed: {e}")))?;
        Ok(decoded._0)
    }

    /// Players in ticket order and the raw last winner (zero address when
    /// nobody has won yet).
    pub fn read_state(&self) -> Result<(Vec<Address>, Address), LotteryError> {
        let out = self.read(ILottery::getPlayersCall {}.abi_encode())?;
        let players = ILottery::getPlayersCall::abi_decode_returns(&out, true)
            .map_err(|e| LotteryError::Rpc(format!("getPlayers decode failed: {e}")))?
            ._0;

        let out = self.read(ILottery::lastWinnerCall {}.abi_encode())?;
        let winner = ILottery::lastWinnerCall::abi_decode_returns(&out, true)
            .map_err(|e| LotteryError::Rpc(format!("lastWinner decode failed: {e}")))?
            ._0;
        Ok((players, winner))
    }

    fn read(&self, calldata: Vec<u8>) -> Result<Bytes, LotteryError> {
        let mut request = TxRequest::read(self.binding.contract, calldata.into());
        request.from = self.binding.signer.address();
        self.provider
            .call(&request, None)
            .map_err(LotteryError::from_read)
    }

    fn submit(&self, kind: TxKind, request: TxRequest) -> Result<TransactionHandle, LotteryError> {
        let tx_hash = self
            .provider
            .send_transaction(&request)
            .map_err(LotteryError::from_submit)?;
        tracing::info!(?kind, %tx_hash, "transaction submitted");
        Ok(TransactionHandle {
            kind,
            tx_hash,
            request,
            status: TxStatus::Submitted,
        })
    }
}

/// Human readable reason from revert data: `Error(string)`, `Panic(uint256)`,
/// or the selector of a custom error.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Ok(revert) = Revert::abi_decode(data, true) {
        return Some(revert.reason);
    }
    if let Ok(panic) = Panic::abi_decode(data, true) {
        return Some(format!("panic code {}", panic.code));
    }
    let selector = &data[..data.len().min(4)];
    Some(format!("custom error 0x{}", alloy::hex::encode(selector)))
}
