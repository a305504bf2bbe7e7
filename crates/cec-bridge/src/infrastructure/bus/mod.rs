//! Adapters implementing the [`CecService`](crate::application::ports::CecService) port.
//!
//! Only the simulated bus ships today.  It lets the whole bridge run on a
//! development machine: frames are typed on stdin and replies are logged.

pub mod simulated;

pub use simulated::{parse_frame, pump_frames, FrameParseError, SimulatedBus};
