use crate::device::{CaptureDevice, DeviceOpener};
use crate::error::Error;
use crate::frame::{ChannelOrder, Frame, Size};
use crate::session::{Presenter, Surface};
use crate::sink::{FrameSink, SinkSpec};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An open attempt, successful or not.
    Probed(u32),
    Opened(u32),
    Read(u32),
    Released(u32),
}

#[derive(Default)]
struct State {
    available: Vec<u32>,
    failing: Vec<u32>,
    events: Vec<Event>,
    script: VecDeque<Option<Frame>>,
    generate: Option<Size>,
    counter: u8,
}

/// Shared view on what the mock cameras did, also used to change their
/// behaviour mid-test.
#[derive(Clone, Default)]
pub struct MockLog(Rc<RefCell<State>>);

impl MockLog {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    /// Indices probed, in order.
    pub fn opened(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Probed(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Devices opened and not yet released.
    pub fn open_devices(&self) -> usize {
        self.events().iter().fold(0isize, |open, e| match e {
            Event::Opened(_) => open + 1,
            Event::Released(_) => open - 1,
            _ => open,
        }) as usize
    }

    pub fn set_available<const N: usize>(&self, devices: [u32; N]) {
        self.0.borrow_mut().available = devices.to_vec();
    }

    /// Every camera stops producing frames.
    pub fn end_stream(&self) {
        let mut state = self.0.borrow_mut();
        state.script.clear();
        state.generate = None;
    }

    fn next_frame(&self) -> Option<Frame> {
        let mut state = self.0.borrow_mut();
        if let Some(scripted) = state.script.pop_front() {
            return scripted;
        }

        let size = state.generate?;
        state.counter = state.counter.wrapping_add(1);
        let shade = state.counter;
        Some(Frame::from_fn(size, ChannelOrder::Bgr, |x, y| {
            [shade, (x % 256) as u8, (y % 256) as u8]
        }))
    }

    fn record(&self, event: Event) {
        self.0.borrow_mut().events.push(event);
    }
}

/// Opens a [`MockCamera`] at every available index. Cameras produce no
/// frames unless scripted or given a size to generate frames at.
pub struct MockOpener {
    log: MockLog,
}

impl MockOpener {
    pub fn with_devices<const N: usize>(devices: [u32; N]) -> Self {
        let log = MockLog::default();
        log.set_available(devices);
        Self { log }
    }

    pub fn failing_at<const N: usize>(self, indices: [u32; N]) -> Self {
        self.log.0.borrow_mut().failing = indices.to_vec();
        self
    }

    /// Generate distinct frames of `size` once the script runs out.
    pub fn frame_size(self, size: Size) -> Self {
        self.log.0.borrow_mut().generate = Some(size);
        self
    }

    /// Queue one read result; `None` is a failed read.
    pub fn push_frame(self, frame: Option<Frame>) -> Self {
        self.log.0.borrow_mut().script.push_back(frame);
        self
    }

    pub fn end_of_stream(self) -> Self {
        self.log.end_stream();
        self
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

impl DeviceOpener for MockOpener {
    type Device = MockCamera;

    fn open(&mut self, index: u32) -> crate::Result<Option<MockCamera>> {
        self.log.record(Event::Probed(index));
        let (failing, available) = {
            let state = self.log.0.borrow();
            (
                state.failing.contains(&index),
                state.available.contains(&index),
            )
        };

        if failing {
            return Err(Error::Io(std::io::Error::other("mock open failure")));
        }
        if !available {
            return Ok(None);
        }

        self.log.record(Event::Opened(index));
        Ok(Some(MockCamera {
            index,
            log: self.log.clone(),
        }))
    }
}

pub struct MockCamera {
    index: u32,
    log: MockLog,
}

impl CaptureDevice for MockCamera {
    fn read_frame(&mut self) -> crate::Result<Option<Frame>> {
        self.log.record(Event::Read(self.index));
        Ok(self.log.next_frame())
    }

    fn release(&mut self) -> crate::Result<()> {
        self.log.record(Event::Released(self.index));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub frames: Vec<(Surface, Frame)>,
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, surface: Surface, frame: &Frame) {
        self.frames.push((surface, frame.clone()));
    }
}

pub struct RecordingSink {
    spec: SinkSpec,
    sent: Rc<RefCell<Vec<Frame>>>,
    closed: Rc<Cell<u32>>,
}

impl RecordingSink {
    pub fn new(spec: SinkSpec) -> Self {
        Self {
            spec,
            sent: Rc::default(),
            closed: Rc::default(),
        }
    }

    pub fn sent(&self) -> Rc<RefCell<Vec<Frame>>> {
        self.sent.clone()
    }

    /// Number of `close` calls.
    pub fn closed(&self) -> Rc<Cell<u32>> {
        self.closed.clone()
    }
}

impl FrameSink for RecordingSink {
    fn spec(&self) -> SinkSpec {
        self.spec
    }

    fn send(&mut self, frame: &Frame) -> crate::Result<()> {
        self.spec.check(frame)?;
        self.sent.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> crate::Result<()> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }
}
