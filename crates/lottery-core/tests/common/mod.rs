#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, B256};

use lottery_core::{
    Account, ControllerConfig, DisplayPort, FeeQuote, PortError, ProviderPort, SessionController,
    SnapshotView, TxReceipt, TxRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBehaviour {
    Accept,
    Reject,
    /// Reports success but leaves the chain where it was.
    Ignore,
}

#[derive(Debug)]
pub struct ScriptState {
    pub available: bool,
    pub accounts: Result<Vec<Address>, String>,
    pub chain_id: u64,
    pub switch: SwitchBehaviour,
    pub switch_requests: Vec<u64>,
    pub fee: FeeQuote,
    pub fee_reads: usize,
    /// eth_call results keyed by 4-byte selector.
    pub calls: HashMap<[u8; 4], Result<Bytes, (String, Bytes)>>,
    pub sent: Vec<TxRequest>,
    pub send_error: Option<PortError>,
    /// Receipt poll answers, front first; `Err` is a transport failure.
    pub receipts: VecDeque<Result<Option<TxReceipt>, String>>,
}

#[derive(Debug)]
pub struct ScriptedProvider {
    pub state: Mutex<ScriptState>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                available: true,
                accounts: Ok(vec![account()]),
                chain_id: lottery_core::REQUIRED_CHAIN_ID,
                switch: SwitchBehaviour::Accept,
                switch_requests: Vec::new(),
                fee: FeeQuote {
                    max_fee_per_gas: 10,
                    max_priority_fee_per_gas: 1,
                },
                fee_reads: 0,
                calls: HashMap::new(),
                sent: Vec::new(),
                send_error: None,
                receipts: VecDeque::new(),
            }),
        }
    }
}

impl ScriptedProvider {
    pub fn with<R>(&self, f: impl FnOnce(&mut ScriptState) -> R) -> R {
        let mut g = self.state.lock().expect("script lock");
        f(&mut g)
    }
}

impl ProviderPort for ScriptedProvider {
    fn available(&self) -> bool {
        self.with(|s| s.available)
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.with(|s| s.accounts.clone().map_err(PortError::UserRejected))
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        Ok(self.with(|s| s.chain_id))
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.with(|s| {
            s.switch_requests.push(chain_id);
            match s.switch {
                SwitchBehaviour::Accept => {
                    s.chain_id = chain_id;
                    Ok(())
                }
                SwitchBehaviour::Reject => {
                    Err(PortError::UserRejected("user rejected switch".to_owned()))
                }
                SwitchBehaviour::Ignore => Ok(()),
            }
        })
    }

    fn fee_data(&self) -> Result<FeeQuote, PortError> {
        self.with(|s| {
            s.fee_reads += 1;
            Ok(s.fee)
        })
    }

    fn call(&self, request: &TxRequest, _block: Option<u64>) -> Result<Bytes, PortError> {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&request.data[..4]);
        self.with(|s| match s.calls.get(&selector) {
            Some(Ok(out)) => Ok(out.clone()),
            Some(Err((message, data))) => Err(PortError::Revert {
                message: message.clone(),
                data: data.clone(),
            }),
            None => Err(PortError::Transport("no scripted call".to_owned())),
        })
    }

    fn send_transaction(&self, request: &TxRequest) -> Result<B256, PortError> {
        self.with(|s| {
            if let Some(err) = s.send_error.take() {
                return Err(err);
            }
            s.sent.push(request.clone());
            Ok(B256::with_last_byte(s.sent.len() as u8))
        })
    }

    fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, PortError> {
        self.with(|s| match s.receipts.pop_front() {
            Some(Ok(Some(mut receipt))) => {
                receipt.tx_hash = tx_hash;
                Ok(Some(receipt))
            }
            Some(Ok(None)) => Ok(None),
            Some(Err(msg)) => Err(PortError::Transport(msg)),
            None => Err(PortError::Transport("no scripted receipt".to_owned())),
        })
    }
}

pub fn account() -> Address {
    "0xABC0000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn receipt(success: bool) -> TxReceipt {
    TxReceipt {
        tx_hash: B256::ZERO,
        block_number: 42,
        success,
        gas_used: 21_000,
    }
}

/// Keeps the busy toggles and status lines a controller publishes.
#[derive(Debug, Default)]
pub struct StatusLog {
    pub busy: Mutex<Vec<bool>>,
    pub statuses: Mutex<Vec<String>>,
}

impl StatusLog {
    pub fn busy_events(&self) -> Vec<bool> {
        self.busy.lock().expect("busy log").clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().expect("status log").last().cloned()
    }
}

impl DisplayPort for StatusLog {
    fn set_busy(&self, busy: bool) {
        self.busy.lock().expect("busy log").push(busy);
    }

    fn set_status(&self, status: &str) {
        self.statuses
            .lock()
            .expect("status log")
            .push(status.to_owned());
    }

    fn set_account(&self, _account: Option<&Account>) {}

    fn set_view(&self, _view: Option<&SnapshotView>) {}
}

pub type ScriptedController = SessionController<ScriptedProvider, StatusLog>;

pub fn scripted_controller() -> ScriptedController {
    let config = ControllerConfig {
        receipt_poll_interval: std::time::Duration::from_millis(1),
        ..ControllerConfig::default()
    };
    SessionController::new(ScriptedProvider::default(), StatusLog::default(), config)
}
