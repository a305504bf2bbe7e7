//! Application layer use cases for the bridge daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure decision logic in `cec-core`) and the infrastructure (bus service,
//! UDP sockets, configuration files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain functions to fulfil a goal (e.g., "answer the TV
//!   when it selects our HDMI input").
//! - **Depend on abstractions** (the traits in [`ports`]) rather than concrete
//!   adapters, so a hardware bus can replace the simulated one without
//!   touching this code.
//! - **Contain no OS calls and no socket I/O of their own**.
//!
//! # Sub-modules
//!
//! - **`ports`** – The `CecService` and `RemoteEventSink` traits and their
//!   error types.
//!
//! - **`probe`** – Polls the TV's vendor id until a run of identical readings
//!   makes it trustworthy.
//!
//! - **`negotiate`** – The one-shot startup sequence that gives the bridge its
//!   addresses and vendor identity and announces it on the bus.
//!
//! - **`handle_notification`** – Runs once per bus notification after
//!   negotiation: decode, dispatch, execute.

pub mod handle_notification;
pub mod negotiate;
pub mod ports;
pub mod probe;
