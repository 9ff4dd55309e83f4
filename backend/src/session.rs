use crate::config::{ReadFailurePolicy, SessionConfig};
use crate::control::DistortionControl;
use crate::device::{probe, CaptureDevice, DeviceOpener, DeviceSearch};
use crate::error::Error;
use crate::frame::{Frame, Size};
use crate::pipeline::{passthrough, Pipeline};
use crate::sink::FrameSink;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No camera open; ticks do nothing.
    Idle,
    Running { index: u32 },
    Terminated,
}

/// Where a presented frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The camera frame as captured.
    Original,
    Corrected,
}

/// Display surface. Frames arrive in RGB order and replace whatever the
/// surface showed before.
pub trait Presenter {
    fn present(&mut self, surface: Surface, frame: &Frame);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to capture from.
    Idle,
    Presented { index: u32 },
}

/// Owns the open camera, the slider state, the pipeline and the optional sink.
///
/// Everything happens on the caller's thread: a slider change made between
/// two ticks is seen by the second one, never by a frame already being
/// processed.
pub struct Session<O: DeviceOpener> {
    opener: O,
    config: SessionConfig,
    device: Option<O::Device>,
    index: Option<u32>,
    control: Option<DistortionControl>,
    pipeline: Option<Pipeline>,
    sink: Option<Box<dyn FrameSink>>,
    frames: u64,
    terminated: bool,
}

impl<O: DeviceOpener> Session<O> {
    pub fn new(opener: O, config: SessionConfig) -> crate::Result<Self> {
        let (control, pipeline) = match &config.correction {
            Some(correction) => (
                Some(DistortionControl::new(correction.slider)),
                Some(Pipeline::new(correction.clone())?),
            ),
            None => (None, None),
        };

        Ok(Self {
            opener,
            config,
            device: None,
            index: None,
            control,
            pipeline,
            sink: None,
            frames: 0,
            terminated: false,
        })
    }

    /// Attaches the sink corrected frames are forwarded to. Its declared
    /// size has to equal the size the session produces.
    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> crate::Result<Self> {
        let produced = self.output_size();
        let spec = sink.spec();
        if spec.size() != produced {
            return Err(Error::FrameSizeMismatch {
                expected: spec.size(),
                actual: produced,
            });
        }

        info!(size = %spec.size(), fps = spec.fps, "sink attached");
        self.sink = Some(sink);
        Ok(self)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Size of the frames a sink would receive.
    pub fn output_size(&self) -> Size {
        self.pipeline
            .as_ref()
            .map_or(self.config.capture_size, Pipeline::output_size)
    }

    pub fn state(&self) -> SessionState {
        match (self.terminated, self.index) {
            (true, _) => SessionState::Terminated,
            (false, Some(index)) => SessionState::Running { index },
            (false, None) => SessionState::Idle,
        }
    }

    pub fn camera_index(&self) -> Option<u32> {
        self.index
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn distortion(&self) -> Option<&DistortionControl> {
        self.control.as_ref()
    }

    /// Updates the slider; takes effect on the next tick. Returns the
    /// stored value, or `None` when the session does no correction.
    pub fn set_distortion(&mut self, value: f32) -> Option<f32> {
        self.control.as_mut().map(|control| control.set(value))
    }

    /// Opens the first camera of the configured search, releasing the
    /// current one first.
    pub fn start(&mut self) -> crate::Result<u32> {
        if self.terminated {
            return Err(Error::Terminated);
        }
        self.release_device();
        self.open(self.config.search)
    }

    /// Releases the current camera and opens the next available one.
    pub fn change_camera(&mut self) -> crate::Result<u32> {
        let search = self.config.search.after(self.index);
        self.release_device();
        self.open(search)
    }

    fn open(&mut self, search: DeviceSearch) -> crate::Result<u32> {
        if self.terminated {
            return Err(Error::Terminated);
        }

        let (device, index) = probe(&mut self.opener, search)?;
        info!(index, "camera opened");
        self.device = Some(device);
        self.index = Some(index);
        Ok(index)
    }

    fn release_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            match device.release() {
                Ok(()) => info!(index = ?self.index, "camera released"),
                Err(err) => warn!(index = ?self.index, %err, "camera release failed"),
            }
        }
        self.index = None;
    }

    /// Captures, corrects and presents one frame.
    ///
    /// A failed read surfaces [`Error::FrameReadFailure`] and leaves the
    /// presenter untouched; with [`ReadFailurePolicy::Stop`] it also ends the
    /// session.
    pub fn tick(&mut self, presenter: &mut dyn Presenter) -> crate::Result<TickOutcome> {
        if self.terminated {
            return Err(Error::Terminated);
        }
        let (Some(device), Some(index)) = (self.device.as_mut(), self.index) else {
            return Ok(TickOutcome::Idle);
        };

        let distortion = self.control.as_ref().map(DistortionControl::coefficients);

        let frame = match device.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(self.read_failed(index)),
            Err(err) => {
                warn!(index, %err, "capture backend error");
                return Err(self.read_failed(index));
            }
        };
        self.frames += 1;

        if self.config.show_original {
            presenter.present(Surface::Original, &passthrough(&frame));
        }

        if let (Some(pipeline), Some(distortion)) = (self.pipeline.as_mut(), distortion) {
            let corrected = pipeline.process(&frame, distortion)?;

            if let Some(sink) = self.sink.as_mut() {
                sink.spec().check(&corrected.output)?;
                sink.send(&corrected.output)?;
            }

            presenter.present(Surface::Corrected, corrected.display());
        }

        Ok(TickOutcome::Presented { index })
    }

    fn read_failed(&mut self, index: u32) -> Error {
        warn!(index, "no frame from camera");
        if self.config.on_read_failure == ReadFailurePolicy::Stop {
            if let Err(err) = self.terminate() {
                warn!(%err, "shutdown after read failure was incomplete");
            }
        }
        Error::FrameReadFailure { index }
    }

    /// Releases the camera and closes the sink. Safe to call repeatedly.
    pub fn terminate(&mut self) -> crate::Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        self.release_device();

        if let Some(mut sink) = self.sink.take() {
            sink.close()?;
            info!("sink closed");
        }
        Ok(())
    }
}

impl<O: DeviceOpener> Drop for Session<O> {
    fn drop(&mut self) {
        if let Err(err) = self.terminate() {
            warn!(%err, "session teardown failed");
        }
    }
}
