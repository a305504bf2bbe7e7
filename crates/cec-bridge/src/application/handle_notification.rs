//! HandleNotificationUseCase: one bus notification in, replies and button
//! events out.
//!
//! The use case decodes the raw callback words, asks the pure dispatcher what
//! to do, and carries the resulting actions out one after the other.  Nothing
//! that goes wrong here is fatal: decode failures, rejected transmissions and
//! unreachable event servers are logged and the next action still runs.

use std::future::Future;
use std::sync::Arc;

use cec_core::{
    decode_notification, dispatch, AppEvent, BusCommand, BusMessage, DecodeError, DeviceIdentity,
    Outbound,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::{BusError, CecService, EventSinkError, RemoteEventSink};

pub struct HandleNotificationUseCase {
    identity: DeviceIdentity,
    bus: Arc<dyn CecService>,
    events: Arc<dyn RemoteEventSink>,
}

impl HandleNotificationUseCase {
    pub fn new(
        identity: DeviceIdentity,
        bus: Arc<dyn CecService>,
        events: Arc<dyn RemoteEventSink>,
    ) -> Self {
        Self { identity, bus, events }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Handles notifications from `notifications` until `shutdown` resolves or
    /// the channel closes.
    ///
    /// Notifications are handled strictly one at a time, in arrival order.
    pub async fn run_until<F>(&self, notifications: &mut mpsc::Receiver<[u32; 5]>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("notification loop stopping");
                    return;
                }
                words = notifications.recv() => match words {
                    Some(words) => self.handle_raw(words).await,
                    None => {
                        info!("bus notification channel closed");
                        return;
                    }
                },
            }
        }
    }

    /// Handles the five raw words delivered by the bus callback.
    pub async fn handle_raw(&self, words: [u32; 5]) {
        match decode_notification(words) {
            Ok(msg) => self.handle(&msg).await,
            Err(DecodeError::NotAMessage(reason)) => {
                debug!("ignoring notification reason 0x{reason:04x}");
            }
            Err(e) => warn!("dropping undecodable notification {words:08x?}: {e}"),
        }
    }

    /// Dispatches one decoded message and runs every resulting action in order.
    pub async fn handle(&self, msg: &BusMessage) {
        for action in dispatch(msg, &self.identity) {
            match action {
                Outbound::Bus(command) => {
                    if let Err(e) = self.send(&command).await {
                        warn!(?command, "bus reply failed: {e}");
                    }
                }
                Outbound::App(event) => {
                    if let Err(e) = self.notify(event).await {
                        warn!(?event, "event server unreachable: {e}");
                    }
                }
            }
        }
    }

    async fn send(&self, command: &BusCommand) -> Result<(), BusError> {
        match command {
            BusCommand::Message {
                destination,
                payload,
                is_reply,
            } => {
                self.bus
                    .send_message(*destination, payload.as_slice(), *is_reply)
                    .await
            }
            BusCommand::ActiveSource {
                physical_address,
                is_reply,
            } => self.bus.send_active_source(*physical_address, *is_reply).await,
            BusCommand::ImageViewOn {
                destination,
                is_reply,
            } => self.bus.send_image_view_on(*destination, *is_reply).await,
            BusCommand::MenuStatus {
                destination,
                state,
                is_reply,
            } => self.bus.send_menu_status(*destination, *state, *is_reply).await,
            BusCommand::SetOsdName(name) => self.bus.set_osd_name(name).await,
        }
    }

    async fn notify(&self, event: AppEvent) -> Result<(), EventSinkError> {
        match event {
            AppEvent::Button(button) => self.events.send_button(button).await,
            AppEvent::KeepAlive => self.events.send_keep_alive().await,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
