use eframe::egui::{self, Context, ViewportBuilder, ViewportCommand};
use tracing::error;

struct Dialog {
    message: String,
}

impl eframe::App for Dialog {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("An error was encountered:");
            ui.monospace(&self.message);
            if ui.button("Ok").clicked() {
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        });
    }
}

/// Shows `message` until acknowledged, then exits with a failure status.
pub fn exit(title: &str, message: &str) -> ! {
    error!(reason = message, "cannot start");

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([420.0, 160.0]),
        ..Default::default()
    };
    let dialog = Dialog {
        message: message.to_owned(),
    };
    if let Err(err) = eframe::run_native(title, options, Box::new(|_cc| Box::new(dialog))) {
        error!(%err, "could not show the error dialog");
    }

    std::process::exit(1)
}
