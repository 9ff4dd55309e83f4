use crate::camera::Intrinsics;
use crate::control::SliderConfig;
use crate::device::DeviceSearch;
use crate::error::Error;
use crate::frame::{ChannelOrder, CropRect, Margins, Size};
use crate::sink::SinkSpec;
use std::time::Duration;

/// Resolution requested from the camera and fed to the pipeline.
pub const WORKING_SIZE: Size = Size::new(1280, 720);
/// Brings the working resolution up to a 1920x1080 canvas.
pub const CANVAS_MARGINS: Margins = Margins::symmetric(180, 320);
pub const TICK_INTERVAL: Duration = Duration::from_millis(20);
/// Number of device indices a camera search covers.
pub const PROBE_RANGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailurePolicy {
    /// Keep the device and try again on the next tick.
    Skip,
    /// Release everything and end the session.
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionConfig {
    pub working_size: Size,
    pub margins: Margins,
    pub intrinsics: Intrinsics,
    pub slider: SliderConfig,
    /// Channel order of the corrected output.
    pub output_order: ChannelOrder,
    pub crop: Option<CropRect>,
    /// Downscaled size shown on screen; the sink always gets the full output.
    pub preview_size: Option<Size>,
    pub sink: Option<SinkSpec>,
}

impl CorrectionConfig {
    pub fn canvas_size(&self) -> Size {
        self.working_size.padded(self.margins)
    }

    /// Size of the frame handed to the sink.
    pub fn output_size(&self) -> Size {
        self.crop
            .map(|crop| crop.size())
            .unwrap_or_else(|| self.canvas_size())
    }

    pub fn validate(&self) -> crate::Result<()> {
        if let Some(crop) = self.crop {
            if !crop.fits(self.canvas_size()) {
                return Err(Error::CropOutOfBounds {
                    crop,
                    canvas: self.canvas_size(),
                });
            }
        }

        if let Some(sink) = self.sink {
            if sink.size() != self.output_size() {
                return Err(Error::FrameSizeMismatch {
                    expected: sink.size(),
                    actual: self.output_size(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub search: DeviceSearch,
    pub capture_size: Size,
    pub correction: Option<CorrectionConfig>,
    /// Also present the raw camera frame.
    pub show_original: bool,
    pub on_read_failure: ReadFailurePolicy,
    pub tick_interval: Duration,
}

impl SessionConfig {
    /// Raw frame next to the full 1920x1080 correction.
    pub fn preview() -> Self {
        Self {
            search: DeviceSearch::Cycle {
                start: 1,
                range: PROBE_RANGE,
            },
            capture_size: WORKING_SIZE,
            correction: Some(CorrectionConfig {
                working_size: WORKING_SIZE,
                margins: CANVAS_MARGINS,
                intrinsics: Intrinsics::webcam(),
                slider: SliderConfig {
                    min: -5.0,
                    max: 5.0,
                    step: 0.01,
                    default: -0.30,
                    offset: 0.0,
                },
                output_order: ChannelOrder::Rgb,
                crop: None,
                preview_size: None,
                sink: None,
            }),
            show_original: true,
            on_read_failure: ReadFailurePolicy::Skip,
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Correction cropped to 1920x780 and forwarded to a virtual camera,
    /// previewed at 960x400.
    pub fn virtual_camera() -> Self {
        Self {
            search: DeviceSearch::Cycle {
                start: 0,
                range: PROBE_RANGE,
            },
            capture_size: WORKING_SIZE,
            correction: Some(CorrectionConfig {
                working_size: WORKING_SIZE,
                margins: CANVAS_MARGINS,
                intrinsics: Intrinsics::webcam(),
                slider: SliderConfig {
                    min: -1.0,
                    max: 1.0,
                    step: 0.01,
                    default: -0.77,
                    offset: 0.48,
                },
                output_order: ChannelOrder::Rgb,
                crop: Some(CropRect::rows(150, 930, 1920)),
                preview_size: Some(Size::new(960, 400)),
                sink: Some(SinkSpec::new(1920, 780, 30)),
            }),
            show_original: false,
            on_read_failure: ReadFailurePolicy::Skip,
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Uncorrected frames from camera 1, stopping at the first failed read.
    pub fn viewer() -> Self {
        Self {
            search: DeviceSearch::Fixed(1),
            capture_size: WORKING_SIZE,
            correction: None,
            show_original: true,
            on_read_failure: ReadFailurePolicy::Stop,
            tick_interval: TICK_INTERVAL,
        }
    }
}
