//! Main window and the worker threads behind its buttons

use std::sync::Arc;

use eframe::egui;
use lottery_adapters::{Eip1193Adapter, LotteryAdapterConfig};
use lottery_core::{format_ether, SessionController};

use crate::display::{DisplayState, SharedDisplay};

type Controller = SessionController<Eip1193Adapter, SharedDisplay>;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);
const FAILURE: egui::Color32 = egui::Color32::from_rgb(230, 80, 80);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Connect,
    Disconnect,
    BuyTicket,
    PickWinner,
    Refresh,
}

pub struct App {
    controller: Arc<Controller>,
    display: SharedDisplay,
    /// Wallet backend in use, shown in the footer
    mode: &'static str,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = LotteryAdapterConfig::from_env();
        let provider = Eip1193Adapter::with_config(config.clone());
        let mode = provider.mode_name();
        let display = SharedDisplay::new(cc.egui_ctx.clone());
        let controller = SessionController::new(provider, display.clone(), config.controller_config());
        tracing::info!(
            mode,
            contract = %config.contract_address,
            "lottery controller ready"
        );

        Self {
            controller: Arc::new(controller),
            display,
            mode,
        }
    }

    /// Run `action` off the frame loop. The controller reports progress and
    /// failures through the display, so the result only goes to the log.
    fn dispatch(&self, action: Action) {
        let controller = Arc::clone(&self.controller);
        std::thread::spawn(move || {
            let outcome = match action {
                Action::Connect => controller.connect().map(|_| ()),
                Action::Disconnect => controller.disconnect(),
                Action::BuyTicket => controller.buy_ticket().map(|_| ()),
                Action::PickWinner => controller.pick_winner().map(|_| ()),
                Action::Refresh => controller.refresh().map(|_| ()),
            };
            if let Err(e) = outcome {
                tracing::debug!(?action, error = %e, "action finished with error");
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        let state = self.display.snapshot();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("🎟 Sepolia Lottery")
                        .size(22.0)
                        .color(ACCENT),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_wallet(ui, &state);
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(format!("wallet: {}", self.mode)).weak().small());
                ui.separator();
                ui.label(
                    egui::RichText::new(format!(
                        "contract: {}",
                        self.controller.config().contract_address
                    ))
                    .monospace()
                    .weak()
                    .small(),
                );
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                self.render_actions(ui, &state);
                ui.add_space(10.0);
                render_status(ui, &state);
                ui.add_space(15.0);
                ui.separator();
                render_lottery_info(ui, &state);
                ui.add_space(20.0);
            });
        });
    }
}

impl App {
    fn render_wallet(&self, ui: &mut egui::Ui, state: &DisplayState) {
        match state.account {
            Some(account) => {
                if ui
                    .add_enabled(!state.busy, egui::Button::new("Disconnect"))
                    .clicked()
                {
                    self.dispatch(Action::Disconnect);
                }
                ui.label(
                    egui::RichText::new(format!("Connected: {}", account.short()))
                        .monospace()
                        .color(ACCENT),
                )
                .on_hover_text(account.checksummed());
            }
            None => {
                if ui
                    .add_enabled(!state.busy, egui::Button::new("Connect Wallet"))
                    .clicked()
                {
                    self.dispatch(Action::Connect);
                }
            }
        }
    }

    fn render_actions(&self, ui: &mut egui::Ui, state: &DisplayState) {
        let price = format_ether(self.controller.config().ticket_price_wei);
        ui.horizontal(|ui| {
            if state.busy {
                ui.spinner();
                ui.label("Waiting for the wallet...");
            } else {
                if ui
                    .button(
                        egui::RichText::new(format!("Buy Ticket ({price} ETH)"))
                            .size(16.0)
                            .strong(),
                    )
                    .clicked()
                {
                    self.dispatch(Action::BuyTicket);
                }
                if ui.button("Pick Winner").clicked() {
                    self.dispatch(Action::PickWinner);
                }
            }
            if ui
                .add_enabled(state.account.is_some(), egui::Button::new("🔄 Refresh"))
                .clicked()
            {
                self.dispatch(Action::Refresh);
            }
        });
    }
}

fn render_status(ui: &mut egui::Ui, state: &DisplayState) {
    if state.status.is_empty() {
        return;
    }
    let text = egui::RichText::new(&state.status);
    if state.status_is_failure() {
        ui.label(text.color(FAILURE));
    } else {
        ui.label(text);
    }
}

fn render_lottery_info(ui: &mut egui::Ui, state: &DisplayState) {
    ui.heading(egui::RichText::new("Lottery Info").size(16.0).strong());
    ui.add_space(6.0);

    let Some(view) = state.view.as_ref() else {
        ui.label(egui::RichText::new("Connect a wallet to load the lottery.").weak());
        return;
    };

    egui::Grid::new("lottery_info")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label(egui::RichText::new("Balance:").weak());
            ui.label(format!("{} ETH", view.snapshot.balance_ether()));
            ui.end_row();

            ui.label(egui::RichText::new("My tickets:").weak());
            ui.label(view.my_tickets.to_string());
            ui.end_row();

            ui.label(egui::RichText::new("Last winner:").weak());
            ui.label(egui::RichText::new(view.snapshot.last_winner_label()).monospace());
            ui.end_row();
        });

    ui.add_space(10.0);
    ui.label(
        egui::RichText::new(format!("Players ({})", view.snapshot.players.len())).strong(),
    );
    if view.snapshot.players.is_empty() {
        ui.label(egui::RichText::new("No tickets sold this round.").weak().small());
    }
    for (i, player) in view.snapshot.players.iter().enumerate() {
        ui.label(
            egui::RichText::new(format!("{}. {}", i + 1, player.checksummed()))
                .monospace()
                .size(12.0),
        );
    }
}
