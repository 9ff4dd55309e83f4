use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] fisheye_backend::Error),
    #[error(transparent)]
    Gui(#[from] eframe::Error),
}
