//! Infrastructure layer for the bridge daemon.
//!
//! # What lives here? (for beginners)
//!
//! Everything that touches the outside world: files, sockets, stdin.  The
//! application layer only knows the traits in
//! [`ports`](crate::application::ports); the types in this module implement
//! them.
//!
//! - **`bus`** – A simulated CEC bus service fed from stdin.
//! - **`config`** – TOML configuration loading with built-in defaults.
//! - **`event_server`** – The UDP client that delivers button presses to the
//!   media center and keeps its session alive.

pub mod bus;
pub mod config;
pub mod event_server;
