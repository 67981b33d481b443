pub mod config;
pub mod deterministic;
pub mod eip1193;

pub use config::{LotteryAdapterConfig, RuntimeProfile};
pub use deterministic::{
    SwitchPolicy, DEFAULT_ACCOUNT, REVERT_NO_PLAYERS, REVERT_NOT_OWNER, REVERT_WRONG_PRICE,
};
pub use eip1193::Eip1193Adapter;
