use crate::error::Error;
use crate::frame::Frame;
use tracing::{debug, warn};

/// An open capture device.
pub trait CaptureDevice {
    /// Next frame, or `None` when the device produced no data.
    fn read_frame(&mut self) -> crate::Result<Option<Frame>>;

    fn release(&mut self) -> crate::Result<()>;
}

/// Opens capture devices by index.
pub trait DeviceOpener {
    type Device: CaptureDevice;

    /// `Ok(None)` when nothing usable sits at `index`.
    fn open(&mut self, index: u32) -> crate::Result<Option<Self::Device>>;
}

/// Which indices to try when looking for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSearch {
    /// `start, start + 1, ...` wrapping modulo `range`, each index once.
    Cycle { start: u32, range: u32 },
    Fixed(u32),
}

impl DeviceSearch {
    pub fn candidates(&self) -> Box<dyn Iterator<Item = u32>> {
        match *self {
            DeviceSearch::Cycle { start, range } => {
                Box::new((0..range).map(move |i| (start % range + i) % range))
            }
            DeviceSearch::Fixed(index) => Box::new(std::iter::once(index)),
        }
    }

    /// Search to run when moving away from `current`; with no current
    /// camera a cycle restarts from index 0.
    pub fn after(&self, current: Option<u32>) -> DeviceSearch {
        match *self {
            DeviceSearch::Cycle { range, .. } => DeviceSearch::Cycle {
                start: current.map_or(0, |i| (i + 1) % range.max(1)),
                range,
            },
            fixed @ DeviceSearch::Fixed(_) => fixed,
        }
    }

    fn start(&self) -> u32 {
        match *self {
            DeviceSearch::Cycle { start, range } => start % range.max(1),
            DeviceSearch::Fixed(index) => index,
        }
    }

    fn len(&self) -> u32 {
        match *self {
            DeviceSearch::Cycle { range, .. } => range,
            DeviceSearch::Fixed(_) => 1,
        }
    }
}

/// Opens the first device `search` yields.
///
/// Releasing a previously open device is up to the caller. Backend errors
/// while opening count as "not available" and the probe moves on.
pub fn probe<O: DeviceOpener>(
    opener: &mut O,
    search: DeviceSearch,
) -> crate::Result<(O::Device, u32)> {
    for index in search.candidates() {
        match opener.open(index) {
            Ok(Some(device)) => return Ok((device, index)),
            Ok(None) => debug!(index, "no camera"),
            Err(err) => debug!(index, %err, "camera failed to open"),
        }
    }

    warn!(?search, "no camera available");
    Err(Error::DeviceUnavailable {
        start: search.start(),
        searched: search.len(),
    })
}
