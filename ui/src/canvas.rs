use eframe::egui::{ColorImage, Context, TextureHandle, TextureOptions, Ui};
use fisheye_backend::frame::Frame;
use fisheye_backend::session::{Presenter, Surface};

/// Keeps one texture per surface and swaps its contents on every frame.
pub(crate) struct Canvas {
    ctx: Context,
    original: Option<TextureHandle>,
    corrected: Option<TextureHandle>,
}

impl Canvas {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            ctx,
            original: None,
            corrected: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.original.is_none() && self.corrected.is_none()
    }

    pub(crate) fn show(&self, ui: &mut Ui) {
        ui.horizontal_top(|ui| {
            for texture in [&self.original, &self.corrected].into_iter().flatten() {
                ui.image((texture.id(), texture.size_vec2()));
            }
        });
    }
}

impl Presenter for Canvas {
    fn present(&mut self, surface: Surface, frame: &Frame) {
        let size = frame.size();
        let image = ColorImage::from_rgb(
            [size.width as usize, size.height as usize],
            frame.as_raw(),
        );

        let (slot, name) = match surface {
            Surface::Original => (&mut self.original, "original-frame"),
            Surface::Corrected => (&mut self.corrected, "corrected-frame"),
        };
        match slot {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => *slot = Some(self.ctx.load_texture(name, image, TextureOptions::LINEAR)),
        }
    }
}
