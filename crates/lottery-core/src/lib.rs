pub mod contract;
pub mod controller;
pub mod domain;
pub mod error;
pub mod fees;
pub mod flow;
pub mod network;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod sync;

pub use contract::{decode_revert_reason, ILottery, LotteryContract};
pub use controller::SessionController;
pub use domain::{
    chain_id_hex, format_ether, Account, ContractBinding, ControllerConfig, FeeQuote, LotterySnapshot,
    SnapshotView, TransactionHandle, TxKind, TxReceipt, TxRequest, BUY_GAS_LIMIT,
    DEFAULT_CONTRACT_ADDRESS, REQUIRED_CHAIN_ID, REQUIRED_CHAIN_ID_HEX, TICKET_PRICE_WEI,
};
pub use error::LotteryError;
pub use flow::{await_confirmation, Confirmation};
pub use network::ensure_chain;
pub use ports::{DisplayPort, PortError, ProviderPort};
pub use session::{establish, Session};
pub use state_machine::{tx_transition, StateTransition, TxAction, TxStatus};
