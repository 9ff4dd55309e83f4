use crate::error::Error;
use crate::frame::{Frame, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl SinkSpec {
    pub const fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Rejects frames whose dimensions differ from the declared ones.
    pub fn check(&self, frame: &Frame) -> crate::Result<()> {
        if frame.size() != self.size() {
            return Err(Error::FrameSizeMismatch {
                expected: self.size(),
                actual: frame.size(),
            });
        }
        Ok(())
    }
}

pub trait FrameSink {
    fn spec(&self) -> SinkSpec;

    /// `frame` must match [`FrameSink::spec`] exactly.
    fn send(&mut self, frame: &Frame) -> crate::Result<()>;

    fn close(&mut self) -> crate::Result<()>;
}

/// Starts the platform virtual camera.
#[cfg(all(target_os = "linux", feature = "v4l2loopback"))]
pub fn open_virtual_camera(spec: SinkSpec) -> crate::Result<Box<dyn FrameSink>> {
    Ok(Box::new(crate::loopback::LoopbackSink::open_first(spec)?))
}

#[cfg(not(all(target_os = "linux", feature = "v4l2loopback")))]
pub fn open_virtual_camera(spec: SinkSpec) -> crate::Result<Box<dyn FrameSink>> {
    Err(Error::SinkInitFailure(format!(
        "no virtual camera backend in this build for a {} stream",
        spec.size()
    )))
}
