use crate::error::LotteryError;
use crate::ports::{PortError, ProviderPort};

/// Make sure the wallet is on `required`, asking it to switch once if not.
///
/// A rejected or failed switch is `WrongNetwork`; so is a switch the wallet
/// claims to have made while still reporting another chain. Never retries.
pub fn ensure_chain<P: ProviderPort>(provider: &P, required: u64) -> Result<(), LotteryError> {
    let actual = provider.chain_id().map_err(LotteryError::from_read)?;
    if actual == required {
        return Ok(());
    }

    tracing::info!(actual, required, "wallet on wrong chain, requesting switch");
    if let Err(err) = provider.switch_chain(required) {
        match err {
            PortError::Unavailable(_) => return Err(LotteryError::WalletUnavailable),
            other => {
                tracing::warn!(error = %other, "chain switch refused");
                return Err(LotteryError::WrongNetwork {
                    expected: required,
                    actual,
                });
            }
        }
    }

    let after = provider.chain_id().map_err(LotteryError::from_read)?;
    if after != required {
        return Err(LotteryError::WrongNetwork {
            expected: required,
            actual: after,
        });
    }
    Ok(())
}
