use crate::domain::FeeQuote;
use crate::error::LotteryError;
use crate::ports::ProviderPort;

/// Fresh EIP-1559 fee parameters. Called right before each submission and
/// never cached.
pub fn quote<P: ProviderPort>(provider: &P) -> Result<FeeQuote, LotteryError> {
    let fee = provider.fee_data().map_err(LotteryError::from_read)?;
    if fee.max_priority_fee_per_gas > fee.max_fee_per_gas {
        return Err(LotteryError::Rpc(format!(
            "inconsistent fee data: priority fee {} above max fee {}",
            fee.max_priority_fee_per_gas, fee.max_fee_per_gas
        )));
    }
    tracing::debug!(
        max_fee_per_gas = fee.max_fee_per_gas,
        max_priority_fee_per_gas = fee.max_priority_fee_per_gas,
        "fee quote"
    );
    Ok(fee)
}
