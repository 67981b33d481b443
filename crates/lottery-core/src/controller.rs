use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::contract::LotteryContract;
use crate::domain::{ControllerConfig, SnapshotView};
use crate::error::LotteryError;
use crate::fees;
use crate::flow::{await_confirmation, Confirmation};
use crate::network::ensure_chain;
use crate::ports::{DisplayPort, ProviderPort};
use crate::session::{establish, Session};
use crate::sync;

pub const STATUS_CONNECTED: &str = "Wallet connected.";
pub const STATUS_DISCONNECTED: &str = "Wallet disconnected.";
pub const STATUS_CONNECT_FIRST: &str = "Connect wallet first!";
pub const STATUS_PREPARING: &str = "Preparing transaction...";
pub const STATUS_PICKING: &str = "Picking winner...";
pub const STATUS_MINING: &str = "Mining transaction... please wait...";
pub const STATUS_TICKET_BOUGHT: &str = "Ticket purchased successfully!";
pub const STATUS_WINNER_PICKED: &str = "Winner selected!";

#[derive(Debug, Default)]
struct ControllerState {
    session: Option<Session>,
    view: Option<SnapshotView>,
    status: String,
}

/// Runs the user-facing actions (connect, buy, pick winner, refresh) and is
/// the only place that touches the display.
///
/// Every action catches its own errors and turns them into a status line;
/// the error is still returned so callers can branch on it. Only one
/// mutating action may be in flight at a time, a second one is refused with
/// [`LotteryError::Busy`]. Refresh is never serialized against mutations.
pub struct SessionController<P, D>
where
    P: ProviderPort,
    D: DisplayPort,
{
    pub provider: P,
    pub display: D,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
    busy: AtomicBool,
    binding_seq: AtomicU64,
}

impl<P, D> SessionController<P, D>
where
    P: ProviderPort,
    D: DisplayPort,
{
    pub fn new(provider: P, display: D, config: ControllerConfig) -> Self {
        Self {
            provider,
            display,
            config,
            state: Mutex::new(ControllerState::default()),
            busy: AtomicBool::new(false),
            binding_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<Session> {
        self.lock_state().ok().and_then(|g| g.session.clone())
    }

    pub fn view(&self) -> Option<SnapshotView> {
        self.lock_state().ok().and_then(|g| g.view.clone())
    }

    pub fn my_tickets(&self) -> usize {
        self.view().map(|v| v.my_tickets).unwrap_or(0)
    }

    pub fn status(&self) -> String {
        self.lock_state()
            .map(|g| g.status.clone())
            .unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Establish a fresh session (new account, new binding) and load the
    /// lottery state for it. A failed attempt leaves any earlier session as
    /// it was.
    pub fn connect(&self) -> Result<Session, LotteryError> {
        let binding_id = self.binding_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let session = match establish(&self.provider, &self.config, binding_id) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, recoverable = err.is_recoverable(), "connect failed");
                self.set_status(&format!("Error connecting wallet: {err}"))?;
                return Err(err);
            }
        };

        let view = {
            let mut g = self.lock_state()?;
            g.session = Some(session.clone());
            g.view = g.view.take().map(|v| v.rebind(Some(&session.account)));
            g.view.clone()
        };
        self.display.set_account(Some(&session.account));
        self.display.set_view(view.as_ref());
        self.set_status(STATUS_CONNECTED)?;

        // A failed initial load is already reported on the status line.
        let _ = self.refresh();
        Ok(session)
    }

    pub fn disconnect(&self) -> Result<(), LotteryError> {
        {
            let mut g = self.lock_state()?;
            g.session = None;
            g.view = None;
        }
        self.display.set_account(None);
        self.display.set_view(None);
        self.set_status(STATUS_DISCONNECTED)
    }

    pub fn buy_ticket(&self) -> Result<Confirmation, LotteryError> {
        let session = self.require_session()?;
        let outcome = self.run_mutation(|| {
            self.set_status(STATUS_PREPARING)?;
            ensure_chain(&self.provider, self.config.required_chain_id)?;
            let fee = fees::quote(&self.provider)?;
            let contract = LotteryContract::bind(&self.provider, Some(&session.binding))?;
            let handle = contract.buy_ticket(
                fee,
                self.config.ticket_price_wei,
                self.config.buy_gas_limit,
            )?;
            self.set_status(STATUS_MINING)?;
            await_confirmation(&self.provider, handle, self.config.receipt_poll_interval)
        });
        self.finish_mutation(outcome, STATUS_TICKET_BOUGHT)
    }

    pub fn pick_winner(&self) -> Result<Confirmation, LotteryError> {
        let session = self.require_session()?;
        let outcome = self.run_mutation(|| {
            self.set_status(STATUS_PICKING)?;
            ensure_chain(&self.provider, self.config.required_chain_id)?;
            let contract = LotteryContract::bind(&self.provider, Some(&session.binding))?;
            let handle = contract.pick_winner()?;
            self.set_status(STATUS_MINING)?;
            await_confirmation(&self.provider, handle, self.config.receipt_poll_interval)
        });
        self.finish_mutation(outcome, STATUS_WINNER_PICKED)
    }

    /// Replace the cached view with a full re-read of the contract.
    pub fn refresh(&self) -> Result<SnapshotView, LotteryError> {
        self.reload(true)
    }

    /// `report` puts a read failure on the status line; otherwise it is only
    /// logged and the current status stays.
    fn reload(&self, report: bool) -> Result<SnapshotView, LotteryError> {
        let Some(session) = self.session() else {
            return Err(LotteryError::NotConnected);
        };

        let view = match sync::refresh(
            &self.provider,
            Some(&session.binding),
            Some(&session.account),
        ) {
            Ok(view) => view,
            Err(err) => {
                tracing::warn!(error = %err, report, "refresh failed");
                if report {
                    self.set_status(&format!("Failed to refresh lottery info: {err}"))?;
                }
                return Err(err);
            }
        };

        let stored = {
            let mut g = self.lock_state()?;
            // The session may have been replaced or dropped while reading.
            match g.session.as_ref().map(|s| s.account) {
                Some(account) => {
                    let view = view.clone().rebind(Some(&account));
                    g.view = Some(view.clone());
                    Some(view)
                }
                None => None,
            }
        };
        if let Some(ref stored) = stored {
            self.display.set_view(Some(stored));
        }
        Ok(stored.unwrap_or(view))
    }

    fn require_session(&self) -> Result<Session, LotteryError> {
        let session = self.lock_state()?.session.clone();
        match session {
            Some(session) => Ok(session),
            None => {
                self.set_status(STATUS_CONNECT_FIRST)?;
                Err(LotteryError::NotConnected)
            }
        }
    }

    fn run_mutation<T>(
        &self,
        action: impl FnOnce() -> Result<T, LotteryError>,
    ) -> Result<T, LotteryError> {
        let _busy = BusyGuard::acquire(&self.busy, &self.display)?;
        action()
    }

    fn finish_mutation(
        &self,
        outcome: Result<Confirmation, LotteryError>,
        success: &str,
    ) -> Result<Confirmation, LotteryError> {
        match outcome {
            Ok(confirmation) => {
                self.set_status(success)?;
                // Reload failures are logged only; the status keeps the outcome.
                let _ = self.reload(false);
                Ok(confirmation)
            }
            // The running action owns the status line.
            Err(LotteryError::Busy) => Err(LotteryError::Busy),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    recoverable = err.is_recoverable(),
                    "transaction failed"
                );
                self.set_status(&format!("Failed: {err}"))?;
                Err(err)
            }
        }
    }

    fn set_status(&self, status: &str) -> Result<(), LotteryError> {
        self.lock_state()?.status = status.to_owned();
        self.display.set_status(status);
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ControllerState>, LotteryError> {
        self.state
            .lock()
            .map_err(|e| LotteryError::Internal(format!("controller lock poisoned: {e}")))
    }
}

/// Holds the busy flag for one mutating action and clears it on every exit
/// path, including early returns and panics.
struct BusyGuard<'a, D: DisplayPort> {
    flag: &'a AtomicBool,
    display: &'a D,
}

impl<'a, D: DisplayPort> BusyGuard<'a, D> {
    fn acquire(flag: &'a AtomicBool, display: &'a D) -> Result<Self, LotteryError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LotteryError::Busy)?;
        display.set_busy(true);
        Ok(Self { flag, display })
    }
}

impl<D: DisplayPort> Drop for BusyGuard<'_, D> {
    fn drop(&mut self) {
        self.display.set_busy(false);
        self.flag.store(false, Ordering::SeqCst);
    }
}
