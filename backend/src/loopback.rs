use crate::error::Error;
use crate::frame::{ChannelOrder, Frame};
use crate::sink::{FrameSink, SinkSpec};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use v4l::video::output::Parameters;
use v4l::video::Output;
use v4l::{Device, FourCC};

const LOOPBACK_DRIVER: &str = "v4l2 loopback";

fn init_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::SinkInitFailure(format!("{}: {err}", path.display()))
}

/// Writes packed RGB frames to a v4l2loopback output node.
pub struct LoopbackSink {
    spec: SinkSpec,
    path: PathBuf,
    writer: Option<File>,
    // kept open so the negotiated format stays in place
    _device: Device,
}

impl LoopbackSink {
    /// Uses the first loopback node on the system.
    pub fn open_first(spec: SinkSpec) -> crate::Result<Self> {
        let node = v4l::context::enum_devices()
            .into_iter()
            .find(|node| is_loopback(node.path()))
            .ok_or_else(|| {
                Error::SinkInitFailure(
                    "no v4l2loopback device found, is the v4l2loopback module loaded?".into(),
                )
            })?;

        Self::open(node.path(), spec)
    }

    pub fn open(path: impl AsRef<Path>, spec: SinkSpec) -> crate::Result<Self> {
        let path = path.as_ref();
        let device = Device::with_path(path).map_err(|err| init_error(path, err))?;

        let mut format = Output::format(&device).map_err(|err| init_error(path, err))?;
        format.width = spec.width;
        format.height = spec.height;
        format.fourcc = FourCC::new(b"RGB3");
        format.stride = spec.width * 3;
        format.size = spec.width * spec.height * 3;

        let actual =
            Output::set_format(&device, &format).map_err(|err| init_error(path, err))?;
        if actual.width != spec.width
            || actual.height != spec.height
            || actual.fourcc != format.fourcc
        {
            return Err(init_error(
                path,
                format!(
                    "device settled on {}x{} {} instead of {} RGB3",
                    actual.width,
                    actual.height,
                    actual.fourcc,
                    spec.size()
                ),
            ));
        }

        if let Err(err) = Output::set_params(&device, &Parameters::with_fps(spec.fps)) {
            debug!(%err, fps = spec.fps, "loopback device did not take a frame rate");
        }

        let writer = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|err| init_error(path, err))?;

        info!(
            path = %path.display(),
            size = %spec.size(),
            fps = spec.fps,
            "virtual camera started"
        );
        Ok(Self {
            spec,
            path: path.to_path_buf(),
            writer: Some(writer),
            _device: device,
        })
    }
}

fn is_loopback(path: &Path) -> bool {
    Device::with_path(path)
        .and_then(|device| device.query_caps())
        .map(|caps| caps.driver == LOOPBACK_DRIVER)
        .unwrap_or(false)
}

impl FrameSink for LoopbackSink {
    fn spec(&self) -> SinkSpec {
        self.spec
    }

    fn send(&mut self, frame: &Frame) -> crate::Result<()> {
        self.spec.check(frame)?;
        let writer = self.writer.as_mut().ok_or(Error::Terminated)?;

        if frame.order() == ChannelOrder::Rgb {
            writer.write_all(frame.as_raw())?;
        } else {
            writer.write_all(frame.clone().to_order(ChannelOrder::Rgb).as_raw())?;
        }
        Ok(())
    }

    fn close(&mut self) -> crate::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!(path = %self.path.display(), "virtual camera stopped");
        }
        Ok(())
    }
}
