use crate::canvas::Canvas;
use crate::error::Error;
use crate::variant::Variant;
use eframe::egui::{self, Context, Slider, Ui, ViewportCommand};
use eframe::Frame;
use fisheye_backend::device::DeviceOpener;
use fisheye_backend::schedule::FrameTimer;
use fisheye_backend::session::{Session, SessionState};
use std::time::Instant;
use tracing::{error, info, warn};

const NO_CAMERA: &str = "No available camera found";

fn camera_label(index: u32) -> String {
    format!("Camera in use: {index}")
}

pub struct App<O: DeviceOpener> {
    session: Session<O>,
    variant: Variant,
    timer: FrameTimer,
    canvas: Canvas,

    slider: f32,
    status: String,

    error: Option<Error>,
    error_open: bool,
}

impl<O: DeviceOpener> App<O> {
    pub fn new(
        cc: &eframe::CreationContext,
        session: Session<O>,
        variant: Variant,
        camera: Option<u32>,
    ) -> Self {
        let slider = session.distortion().map_or(0.0, |control| control.value());
        let status = camera.map_or_else(|| NO_CAMERA.to_owned(), camera_label);

        Self {
            timer: FrameTimer::new(session.config().tick_interval),
            canvas: Canvas::new(cc.egui_ctx.clone()),
            session,
            variant,
            slider,
            status,
            error: None,
            error_open: false,
        }
    }

    fn change_camera(&mut self) {
        self.status = match self.session.change_camera() {
            Ok(index) => camera_label(index),
            Err(err) => {
                warn!(%err, "camera change failed");
                NO_CAMERA.to_owned()
            }
        };
    }

    fn distortion_slider(&mut self, ui: &mut Ui) {
        let Some((range, step)) = self
            .session
            .distortion()
            .map(|control| (control.range(), control.step()))
        else {
            return;
        };

        let response = ui.add(
            Slider::new(&mut self.slider, range)
                .step_by(step as f64)
                .text("Distortion"),
        );
        if response.changed() {
            if let Some(stored) = self.session.set_distortion(self.slider) {
                self.slider = stored;
            }
        }
    }

    fn top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status);
            if self.variant.camera_button && ui.button("Change camera").clicked() {
                self.change_camera();
            }
        });
        self.distortion_slider(ui);
    }

    fn central_panel(&mut self, ui: &mut Ui) {
        if self.canvas.is_empty() {
            ui.centered_and_justified(|ui| ui.label("Waiting for frames"));
            return;
        }

        egui::ScrollArea::both().show(ui, |ui| self.canvas.show(ui));
    }

    /// Runs one session tick if the timer is due.
    fn tick(&mut self, ctx: &Context) -> crate::Result<()> {
        if self.session.state() == SessionState::Terminated {
            return Ok(());
        }
        let Some(result) = self.timer.fire(|| self.session.tick(&mut self.canvas)) else {
            return Ok(());
        };

        if self.session.state() == SessionState::Terminated {
            info!("session ended, closing window");
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }

        match result {
            Ok(_) => Ok(()),
            // already logged; a stopping session was closed above
            Err(fisheye_backend::Error::FrameReadFailure { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn show_err(&mut self, ctx: &Context) {
        egui::Window::new("Error").show(ctx, |ui| {
            ui.label("An error was encountered:");
            if let Some(err) = &self.error {
                ui.monospace(err.to_string());
            }
            ui.horizontal(|ui| {
                if ui.button("Ok").clicked() {
                    self.error_open = false
                }
            });
        });
    }

    fn app(&mut self, ctx: &Context, _frame: &mut Frame) -> crate::Result<()> {
        if self.error_open {
            self.show_err(ctx);
        }

        if let Some(key) = self.variant.quit_key {
            if ctx.input(|i| i.key_pressed(key)) {
                self.session.terminate()?;
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
        }

        egui::TopBottomPanel::top("top-row").show(ctx, |ui| self.top_bar(ui));

        let ticked = self.tick(ctx);

        egui::CentralPanel::default().show(ctx, |ui| self.central_panel(ui));

        ticked
    }
}

impl<O: DeviceOpener> eframe::App for App<O> {
    fn update(&mut self, ctx: &Context, frame: &mut Frame) {
        match self.app(ctx, frame) {
            Err(err) if !self.error_open => {
                error!(%err, "frame loop error");
                self.error_open = true;
                self.error = Some(err);
            }
            _ => {}
        }

        if self.session.state() != SessionState::Terminated {
            ctx.request_repaint_after(self.timer.remaining(Instant::now()));
        }
    }
}
