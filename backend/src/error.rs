use crate::frame::{CropRect, Size};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no camera could be opened ({searched} indices probed starting at {start})")]
    DeviceUnavailable { start: u32, searched: u32 },
    #[error("could not read a frame from camera {index}")]
    FrameReadFailure { index: u32 },
    #[error("could not start the virtual camera: {0}")]
    SinkInitFailure(String),
    #[error("frame is {actual} but {expected} is required")]
    FrameSizeMismatch { expected: Size, actual: Size },
    #[error("crop {crop:?} does not fit inside a {canvas} canvas")]
    CropOutOfBounds { crop: CropRect, canvas: Size },
    #[error("{len} bytes cannot hold a {size} three channel frame")]
    InvalidBuffer { len: usize, size: Size },
    #[error("camera matrix is not invertible")]
    SingularMatrix,
    #[error("session has been terminated")]
    Terminated,
    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCV(#[from] opencv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
