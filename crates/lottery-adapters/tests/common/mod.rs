#![allow(dead_code)]

use std::sync::Mutex;

use alloy::primitives::Address;

use lottery_adapters::{Eip1193Adapter, LotteryAdapterConfig};
use lottery_core::{Account, DisplayPort, SessionController, SnapshotView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Busy(bool),
    Status(String),
    Account(Option<Account>),
    View(Option<SnapshotView>),
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().expect("display lock").clone()
    }

    pub fn busy_events(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Busy(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().expect("display lock").clear();
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().expect("display lock").push(event);
    }
}

impl DisplayPort for RecordingDisplay {
    fn set_busy(&self, busy: bool) {
        self.push(DisplayEvent::Busy(busy));
    }

    fn set_status(&self, status: &str) {
        self.push(DisplayEvent::Status(status.to_owned()));
    }

    fn set_account(&self, account: Option<&Account>) {
        self.push(DisplayEvent::Account(account.copied()));
    }

    fn set_view(&self, view: Option<&SnapshotView>) {
        self.push(DisplayEvent::View(view.cloned()));
    }
}

pub type TestController = SessionController<Eip1193Adapter, RecordingDisplay>;

pub fn test_config() -> LotteryAdapterConfig {
    LotteryAdapterConfig {
        receipt_poll_interval_ms: 1,
        ..LotteryAdapterConfig::default()
    }
}

pub fn new_controller() -> TestController {
    let config = test_config();
    SessionController::new(
        Eip1193Adapter::deterministic(config.clone()),
        RecordingDisplay::default(),
        config.controller_config(),
    )
}

pub fn player_a() -> Address {
    "0xABC0000000000000000000000000000000000001"
        .parse()
        .expect("player a")
}

pub fn player_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("player b")
}
