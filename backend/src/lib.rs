pub mod camera;
pub mod config;
pub mod control;
#[cfg(feature = "opencv")]
pub mod cv;
pub mod device;
pub mod error;
pub mod frame;
#[cfg(all(target_os = "linux", feature = "v4l2loopback"))]
pub mod loopback;
pub mod pipeline;
pub mod remap;
pub mod schedule;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Error;

pub type Result<T> = std::result::Result<T, crate::error::Error>;
