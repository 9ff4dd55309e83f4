use crate::device::{CaptureDevice, DeviceOpener};
use crate::frame::{ChannelOrder, Frame, Size};
use opencv::core::{Scalar, CV_8UC3};
use opencv::prelude::{
    Mat, MatTraitConst, MatTraitConstManual, MatTraitManual, VideoCaptureTrait,
    VideoCaptureTraitConst,
};
use opencv::videoio::{self, VideoCapture};
use tracing::{debug, warn};

pub mod undistort;

#[cfg(windows)]
const API: i32 = videoio::CAP_DSHOW;
#[cfg(not(windows))]
const API: i32 = videoio::CAP_ANY;

/// Opens webcams by index and asks them for `capture_size`.
pub struct OpenCvOpener {
    pub capture_size: Size,
}

impl OpenCvOpener {
    pub fn new(capture_size: Size) -> Self {
        Self { capture_size }
    }
}

impl DeviceOpener for OpenCvOpener {
    type Device = OpenCvCamera;

    fn open(&mut self, index: u32) -> crate::Result<Option<OpenCvCamera>> {
        let mut source = VideoCapture::new(index as i32, API)?;
        if !source.is_opened()? {
            return Ok(None);
        }

        let Size { width, height } = self.capture_size;
        let accepted = source.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?
            & source.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        if !accepted {
            warn!(index, size = %self.capture_size, "camera ignored the requested size");
        }

        Ok(Some(OpenCvCamera {
            source,
            frame: Mat::default(),
        }))
    }
}

pub struct OpenCvCamera {
    source: VideoCapture,
    frame: Mat,
}

impl CaptureDevice for OpenCvCamera {
    fn read_frame(&mut self) -> crate::Result<Option<Frame>> {
        if !self.source.read(&mut self.frame)? || self.frame.rows() <= 0 {
            return Ok(None);
        }

        mat_to_frame(&self.frame, ChannelOrder::Bgr).map(Some)
    }

    fn release(&mut self) -> crate::Result<()> {
        self.source.release()?;
        Ok(())
    }
}

/// Copies an 8-bit 3 channel `Mat` into a [`Frame`] holding `order`.
pub fn mat_to_frame(mat: &Mat, order: ChannelOrder) -> crate::Result<Frame> {
    let size = Size::new(mat.cols() as u32, mat.rows() as u32);
    let data = if mat.is_continuous() {
        mat.data_bytes()?.to_vec()
    } else {
        debug!("copying strided capture buffer");
        mat.try_clone()?.data_bytes()?.to_vec()
    };

    Frame::from_raw(size, order, data)
}

pub fn frame_to_mat(frame: &Frame) -> crate::Result<Mat> {
    let size = frame.size();
    let mut mat = Mat::new_rows_cols_with_default(
        size.height as i32,
        size.width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(frame.as_raw());
    Ok(mat)
}
