use crate::domain::{Account, ContractBinding, ControllerConfig};
use crate::error::LotteryError;
use crate::network::ensure_chain;
use crate::ports::ProviderPort;

/// An authenticated account and the contract binding created for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Account,
    pub binding: ContractBinding,
}

/// Request account access, check the network and bind the contract to the
/// signer just obtained. `binding_id` must be fresh for every call; bindings
/// are never carried over from an earlier session.
pub fn establish<P: ProviderPort>(
    provider: &P,
    config: &ControllerConfig,
    binding_id: u64,
) -> Result<Session, LotteryError> {
    if !provider.available() {
        return Err(LotteryError::WalletUnavailable);
    }

    let accounts = provider
        .request_accounts()
        .map_err(LotteryError::from_session)?;
    let account = accounts
        .into_iter()
        .next()
        .map(Account::from)
        .ok_or_else(|| LotteryError::UserRejected("wallet returned no accounts".to_owned()))?;

    ensure_chain(provider, config.required_chain_id)?;

    let binding = ContractBinding {
        id: binding_id,
        contract: config.contract_address,
        signer: account,
        chain_id: config.required_chain_id,
    };
    tracing::info!(%account, binding = binding.id, "wallet session established");
    Ok(Session { account, binding })
}
