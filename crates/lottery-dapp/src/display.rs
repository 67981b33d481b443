use std::sync::{Arc, Mutex};

use eframe::egui;
use lottery_core::{Account, DisplayPort, SnapshotView};

/// What the window renders. Written by controller threads, read by the
/// frame loop.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub busy: bool,
    pub status: String,
    pub account: Option<Account>,
    pub view: Option<SnapshotView>,
}

impl DisplayState {
    pub fn status_is_failure(&self) -> bool {
        self.status.contains("Failed")
    }
}

#[derive(Clone)]
pub struct SharedDisplay {
    state: Arc<Mutex<DisplayState>>,
    ctx: egui::Context,
}

impl SharedDisplay {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            state: Arc::new(Mutex::new(DisplayState::default())),
            ctx,
        }
    }

    pub fn snapshot(&self) -> DisplayState {
        self.state
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn update(&self, apply: impl FnOnce(&mut DisplayState)) {
        match self.state.lock() {
            Ok(mut g) => apply(&mut g),
            Err(e) => tracing::error!(error = %e, "display state poisoned"),
        }
        self.ctx.request_repaint();
    }
}

impl DisplayPort for SharedDisplay {
    fn set_busy(&self, busy: bool) {
        self.update(|s| s.busy = busy);
    }

    fn set_status(&self, status: &str) {
        self.update(|s| s.status = status.to_owned());
    }

    fn set_account(&self, account: Option<&Account>) {
        self.update(|s| s.account = account.copied());
    }

    fn set_view(&self, view: Option<&SnapshotView>) {
        self.update(|s| s.view = view.cloned());
    }
}
