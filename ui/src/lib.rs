use crate::app::App;
use eframe::egui::ViewportBuilder;
use fisheye_backend::device::DeviceOpener;
use fisheye_backend::session::Session;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub mod app;
mod canvas;
pub mod error;
pub mod fatal;
pub mod variant;

pub use variant::Variant;

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the first camera and runs the window until it is closed.
///
/// Variants that need a camera to be useful show an error dialog and exit
/// when none can be opened.
pub fn run<O: DeviceOpener + 'static>(variant: Variant, mut session: Session<O>) -> Result<()> {
    let camera = match session.start() {
        Ok(index) => Some(index),
        Err(err) if variant.device_required => fatal::exit(variant.title, &err.to_string()),
        Err(err) => {
            warn!(%err, "starting without a camera");
            None
        }
    };

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(variant.title)
            .with_inner_size(variant.window_size)
            .with_min_inner_size(variant.min_size)
            .with_resizable(variant.resizable),
        ..Default::default()
    };

    eframe::run_native(
        variant.title,
        options,
        Box::new(move |cc| Box::new(App::new(cc, session, variant, camera))),
    )?;

    Ok(())
}
