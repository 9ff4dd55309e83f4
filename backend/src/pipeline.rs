use crate::camera::{FisheyeDistortion, Intrinsics};
use crate::config::CorrectionConfig;
use crate::frame::{ChannelOrder, Frame, Size};
#[cfg(not(feature = "opencv"))]
use crate::remap::TableUndistorter;
use crate::remap::Undistorter;
use tracing::debug;

const PADDING: [u8; 3] = [0, 0, 0];

/// Result of correcting one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Corrected {
    /// Cropped full resolution output, what a sink receives.
    pub output: Frame,
    /// Downscaled copy for the screen, when configured.
    pub preview: Option<Frame>,
}

impl Corrected {
    /// The frame to put on screen.
    pub fn display(&self) -> &Frame {
        self.preview.as_ref().unwrap_or(&self.output)
    }
}

pub struct Pipeline {
    config: CorrectionConfig,
    undistorter: Box<dyn Undistorter>,
}

#[cfg(feature = "opencv")]
fn default_undistorter(intrinsics: &Intrinsics) -> crate::Result<Box<dyn Undistorter>> {
    Ok(Box::new(crate::cv::undistort::CvUndistorter::new(intrinsics)?))
}

#[cfg(not(feature = "opencv"))]
fn default_undistorter(intrinsics: &Intrinsics) -> crate::Result<Box<dyn Undistorter>> {
    Ok(Box::new(TableUndistorter::new(intrinsics)))
}

impl Pipeline {
    /// Undistorts through OpenCV when built with the `opencv` feature and
    /// through [`TableUndistorter`] otherwise.
    pub fn new(config: CorrectionConfig) -> crate::Result<Self> {
        let undistorter = default_undistorter(&config.intrinsics)?;
        Self::with_undistorter(config, undistorter)
    }

    pub fn with_undistorter(
        config: CorrectionConfig,
        undistorter: Box<dyn Undistorter>,
    ) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            undistorter,
        })
    }

    pub fn output_size(&self) -> Size {
        self.config.output_size()
    }

    pub fn process(
        &mut self,
        raw: &Frame,
        distortion: FisheyeDistortion,
    ) -> crate::Result<Corrected> {
        let working = self.config.working_size;
        let fitted;
        let raw = if raw.size() == working {
            raw
        } else {
            debug!(actual = %raw.size(), %working, "fitting frame to working size");
            fitted = raw.resize(working);
            &fitted
        };

        let padded = raw.pad(self.config.margins, PADDING);
        let order = self.config.output_order;
        let crop = self.config.crop;
        let preview_size = self.config.preview_size;

        let mut output = self.undistorter.undistort(&padded, distortion)?.to_order(order);
        if let Some(crop) = crop {
            output = output.crop(crop)?;
        }
        let preview = preview_size.map(|size| output.resize(size));

        Ok(Corrected { output, preview })
    }
}

/// Converts a raw frame for display without correcting it.
pub fn passthrough(raw: &Frame) -> Frame {
    raw.clone().to_order(ChannelOrder::Rgb)
}
