//! # cec-bridge
//!
//! Daemon that sits on the HDMI-CEC bus as a playback device and forwards the
//! TV remote's key presses to a media center's event server.
//!
//! The crate has two layers:
//!
//! - **`application`** – Use cases (startup negotiation, per-notification
//!   handling) written against the ports in [`application::ports`].
//! - **`infrastructure`** – Configuration, the UDP event-server client and
//!   the simulated bus service.
//!
//! The `cec-bridge` binary wires the two together.

pub mod application;
pub mod infrastructure;
