//! UDP client for the media center's event server.
//!
//! The event server is connectionless: every packet stands alone and is
//! identified by the client token in its header.  The server forgets clients
//! that stay silent for a minute, so a background task sends `PING` packets
//! between button presses.
//!
//! # Portability note
//!
//! This module uses only `tokio::net::UdpSocket`, which behaves the same on
//! every platform tokio supports.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cec_core::protocol::eventserver::{encode_packet, ButtonFlags, IconType, Packet};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ports::{EventSinkError, RemoteEventSink};

/// A connected event-server client.
pub struct EventServerClient {
    socket: UdpSocket,
    token: u32,
    device_map: String,
}

impl EventServerClient {
    /// Resolves `address` and connects a fresh UDP socket to it.
    ///
    /// Button presses are labelled with `device_map` so the media center picks
    /// the matching keymap.
    ///
    /// # Errors
    ///
    /// Returns [`EventSinkError::Io`] if the address cannot be resolved or the
    /// socket cannot be bound.
    pub async fn connect(address: &str, device_map: impl Into<String>) -> Result<Self, EventSinkError> {
        let remote = tokio::net::lookup_host(address).await?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("event server address {address} did not resolve"),
            )
        })?;
        let local: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;
        let token = token_from_uuid(Uuid::new_v4());
        info!(%remote, token, "event server client ready");

        Ok(Self {
            socket,
            token,
            device_map: device_map.into(),
        })
    }

    /// The client token stamped on every packet.
    pub fn token(&self) -> u32 {
        self.token
    }

    pub async fn send_ping(&self) -> Result<(), EventSinkError> {
        self.send(&Packet::Ping).await
    }

    async fn send(&self, packet: &Packet) -> Result<(), EventSinkError> {
        let bytes = encode_packet(packet, self.token)?;
        self.socket.send(&bytes).await?;
        debug!(packet_type = ?packet.packet_type(), len = bytes.len(), "event packet sent");
        Ok(())
    }
}

/// Derives the 32-bit client token from a random UUID.
fn token_from_uuid(id: Uuid) -> u32 {
    let (hi, lo) = id.as_u64_pair();
    let folded = hi ^ lo;
    (folded >> 32) as u32 ^ folded as u32
}

#[async_trait]
impl RemoteEventSink for EventServerClient {
    async fn send_button(&self, button: &str) -> Result<(), EventSinkError> {
        self.send(&Packet::named_button(
            button,
            &self.device_map,
            ButtonFlags::named_no_repeat(),
        ))
        .await
    }

    async fn send_keep_alive(&self) -> Result<(), EventSinkError> {
        self.send(&Packet::keep_alive()).await
    }

    async fn send_hello(&self, application_name: &str, icon: IconType) -> Result<(), EventSinkError> {
        self.send(&Packet::Helo {
            device_name: application_name.to_string(),
            icon,
        })
        .await
    }

    async fn send_bye(&self) -> Result<(), EventSinkError> {
        self.send(&Packet::Bye).await
    }
}

/// Spawns the task that pings the event server every `period`.
///
/// The first ping goes out one full period after spawning.  Abort the returned
/// handle to stop pinging.
pub fn spawn_ping_task(client: Arc<EventServerClient>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            if let Err(e) = client.send_ping().await {
                warn!("event server ping failed: {e}");
            }
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
