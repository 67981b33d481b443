//! Sepolia lottery: buy tickets, watch the pot, draw a winner.

use eframe::egui;

mod app;
mod display;

fn main() -> eframe::Result<()> {
    // RUST_LOG narrows or widens this; INFO is always on
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Sepolia Lottery");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Sepolia Lottery")
            .with_inner_size([520.0, 640.0])
            .with_min_inner_size([420.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sepolia Lottery",
        native_options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc)))),
    )
}
