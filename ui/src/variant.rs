use eframe::egui::Key;
use fisheye_backend::config::SessionConfig;

/// One of the shipped programs: a session preset plus how its window looks
/// and behaves.
#[derive(Debug, Clone)]
pub struct Variant {
    pub title: &'static str,
    pub session: SessionConfig,
    pub window_size: [f32; 2],
    pub min_size: [f32; 2],
    pub resizable: bool,
    /// Show the "Change camera" button.
    pub camera_button: bool,
    pub quit_key: Option<Key>,
    /// Refuse to start without a camera.
    pub device_required: bool,
}

impl Variant {
    /// Raw and corrected frames side by side, scrollable.
    pub fn preview() -> Self {
        Self {
            title: "Fisheye correction",
            session: SessionConfig::preview(),
            window_size: [1280.0, 800.0],
            min_size: [650.0, 400.0],
            resizable: true,
            camera_button: true,
            quit_key: None,
            device_required: false,
        }
    }

    pub fn virtual_camera() -> Self {
        Self {
            title: "Fisheye correction",
            session: SessionConfig::virtual_camera(),
            window_size: [1000.0, 500.0],
            min_size: [1000.0, 500.0],
            resizable: false,
            camera_button: true,
            quit_key: None,
            device_required: false,
        }
    }

    pub fn viewer() -> Self {
        Self {
            title: "WebCamera",
            session: SessionConfig::viewer(),
            window_size: [1280.0, 760.0],
            min_size: [320.0, 240.0],
            resizable: true,
            camera_button: false,
            quit_key: Some(Key::Q),
            device_required: true,
        }
    }
}
