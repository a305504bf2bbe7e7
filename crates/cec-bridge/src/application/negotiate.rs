//! NegotiateIdentityUseCase: brings the bridge onto the bus at startup.
//!
//! Negotiation runs once, before any frame is dispatched.  Each stage blocks
//! until the bus service gives a usable answer:
//!
//! ```text
//! register opcodes ─► physical address ─► logical address ─► TV vendor probe
//!                                                                  │
//!         hello ◄── active source ◄── OSD name ◄── own vendor ◄────┘
//! ```
//!
//! Only a failing physical-address query is fatal.  A clear physical address,
//! an unregistered logical address and a failed vendor probe are retried
//! every `retry_interval`, forever: the TV may simply be switched off.

use std::sync::Arc;
use std::time::Duration;

use cec_core::protocol::eventserver::IconType;
use cec_core::protocol::opcodes::REGISTERED_OPCODES;
use cec_core::{CecOpcode, DeviceIdentity, LogicalAddress, PhysicalAddress, VendorId};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ports::{BusError, CecService, RemoteEventSink};
use crate::application::probe::{probe_tv_vendor_id, ProbeSettings};

/// Negotiation outcome that stops the bridge.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("failed to get physical address: {0}")]
    PhysicalAddress(#[source] BusError),
}

/// Timing and naming used during negotiation.
#[derive(Debug, Clone)]
pub struct NegotiationSettings {
    /// Wait between retries of a stage that has no usable answer yet.
    pub retry_interval: Duration,
    /// Pause after the physical address is known.
    pub settle_delay: Duration,
    pub probe: ProbeSettings,
    /// On-screen display name announced on the bus.
    pub osd_name: String,
    /// Name sent to the media center in the hello handshake.
    pub application_name: String,
}

impl Default for NegotiationSettings {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(60),
            settle_delay: Duration::from_secs(1),
            probe: ProbeSettings::default(),
            osd_name: "XBMC".to_string(),
            application_name: "rpi-cecd".to_string(),
        }
    }
}

/// Runs the startup negotiation against injected collaborators.
pub struct NegotiateIdentityUseCase {
    bus: Arc<dyn CecService>,
    events: Arc<dyn RemoteEventSink>,
    settings: NegotiationSettings,
}

impl NegotiateIdentityUseCase {
    pub fn new(
        bus: Arc<dyn CecService>,
        events: Arc<dyn RemoteEventSink>,
        settings: NegotiationSettings,
    ) -> Self {
        Self { bus, events, settings }
    }

    /// Negotiates this device's identity and announces it.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::PhysicalAddress`] if the bus service fails
    /// to answer the physical address query.
    pub async fn run(&self) -> Result<DeviceIdentity, NegotiationError> {
        self.register_interest().await;

        let physical_address = self.acquire_physical_address().await?;
        let logical_address = self.acquire_logical_address().await;
        let tv_vendor_id = self.discover_tv_vendor().await;

        let identity = DeviceIdentity::new(
            physical_address,
            logical_address,
            tv_vendor_id,
            self.settings.osd_name.clone(),
        );
        self.adopt_vendor(&identity).await;
        self.announce(&identity).await;

        Ok(identity)
    }

    async fn register_interest(&self) {
        for &opcode in REGISTERED_OPCODES {
            if let Err(e) = self.bus.register_opcode(opcode).await {
                warn!(?opcode, "could not register opcode: {e}");
            }
        }
    }

    async fn acquire_physical_address(&self) -> Result<PhysicalAddress, NegotiationError> {
        loop {
            let address = self
                .bus
                .physical_address()
                .await
                .map_err(NegotiationError::PhysicalAddress)?;
            if !address.is_clear() {
                info!(%address, "physical address acquired");
                tokio::time::sleep(self.settings.settle_delay).await;
                return Ok(address);
            }
            warn!(
                "CEC is currently disabled, retrying in {:?}; make sure the TV is on and connected",
                self.settings.retry_interval
            );
            tokio::time::sleep(self.settings.retry_interval).await;
        }
    }

    async fn acquire_logical_address(&self) -> LogicalAddress {
        loop {
            match self.bus.logical_address().await {
                Ok(address) if !address.is_unregistered() => {
                    info!(%address, "logical address acquired");
                    return address;
                }
                Ok(_) => warn!(
                    "no logical address, retrying in {:?}; make sure the TV is on and connected",
                    self.settings.retry_interval
                ),
                Err(e) => warn!("could not query logical address: {e}"),
            }
            if let Err(e) = self.bus.allocate_logical_address().await {
                warn!("logical address allocation failed: {e}");
            }
            tokio::time::sleep(self.settings.retry_interval).await;
        }
    }

    async fn discover_tv_vendor(&self) -> VendorId {
        loop {
            if let Some(vendor) = probe_tv_vendor_id(self.bus.as_ref(), &self.settings.probe).await {
                info!(%vendor, "TV vendor id discovered");
                return vendor;
            }
            warn!(
                "probing failed, retrying in {:?}; make sure the TV is on and connected",
                self.settings.retry_interval
            );
            tokio::time::sleep(self.settings.retry_interval).await;
        }
    }

    async fn adopt_vendor(&self, identity: &DeviceIdentity) {
        let vendor = identity.own_vendor_id();
        info!(%vendor, "setting own vendor id");
        if let Err(e) = self.bus.set_vendor_id(vendor).await {
            warn!("could not set vendor id: {e}");
        }

        if identity.announces_vendor() {
            let [hi, mid, lo] = vendor.to_be_bytes();
            let announcement = [CecOpcode::DeviceVendorId as u8, hi, mid, lo];
            if let Err(e) = self
                .bus
                .send_message(LogicalAddress::BROADCAST, &announcement, false)
                .await
            {
                warn!("could not broadcast vendor id: {e}");
            }
        }
    }

    async fn announce(&self, identity: &DeviceIdentity) {
        if let Err(e) = self.bus.set_osd_name(identity.osd_name()).await {
            warn!("could not set OSD name: {e}");
        }
        if let Err(e) = self
            .bus
            .send_active_source(identity.physical_address(), false)
            .await
        {
            warn!("could not announce active source: {e}");
        }
        if let Err(e) = self
            .events
            .send_hello(&self.settings.application_name, IconType::None)
            .await
        {
            warn!("could not greet the event server: {e}");
        }
        info!(
            physical = %identity.physical_address(),
            logical = %identity.logical_address(),
            "negotiation complete"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{EventSinkError, MockCecService};
    use async_trait::async_trait;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingSink {
        hellos: Mutex<Vec<(String, IconType)>>,
        should_fail: bool,
    }

    #[async_trait]
    impl RemoteEventSink for RecordingSink {
        async fn send_button(&self, _button: &str) -> Result<(), EventSinkError> {
            Ok(())
        }

        async fn send_keep_alive(&self) -> Result<(), EventSinkError> {
            Ok(())
        }

        async fn send_hello(&self, application_name: &str, icon: IconType) -> Result<(), EventSinkError> {
            if self.should_fail {
                return Err(EventSinkError::Io(std::io::Error::other("injected failure")));
            }
            self.hellos.lock().unwrap().push((application_name.to_string(), icon));
            Ok(())
        }

        async fn send_bye(&self) -> Result<(), EventSinkError> {
            Ok(())
        }
    }

    fn failure(operation: &'static str) -> BusError {
        BusError::Failed { operation, status: 1 }
    }

    /// Expectations for a bus where every stage succeeds on the first try.
    /// Vendor adoption is left to each test.
    fn cooperative_bus(tv_vendor: VendorId) -> MockCecService {
        let mut bus = MockCecService::new();
        bus.expect_register_opcode().returning(|_| Ok(()));
        bus.expect_physical_address().returning(|| Ok(PhysicalAddress(0x1000)));
        bus.expect_logical_address().returning(|| Ok(LogicalAddress::PlaybackDevice1));
        bus.expect_vendor_id().returning(move |_| Ok(tv_vendor));
        bus.expect_set_osd_name().returning(|_| Ok(()));
        bus.expect_send_active_source().returning(|_, _| Ok(()));
        bus
    }

    fn use_case(bus: MockCecService, sink: Arc<RecordingSink>) -> NegotiateIdentityUseCase {
        NegotiateIdentityUseCase::new(Arc::new(bus), sink, NegotiationSettings::default())
    }

    // ── Happy paths ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_lg_tv_negotiation_runs_stages_in_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut bus = MockCecService::new();
        bus.expect_register_opcode()
            .times(REGISTERED_OPCODES.len())
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        bus.expect_physical_address()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(PhysicalAddress(0x1000)));
        bus.expect_logical_address()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(LogicalAddress::PlaybackDevice1));
        bus.expect_vendor_id()
            .times(6)
            .in_sequence(&mut seq)
            .returning(|_| Ok(VendorId::LG));
        bus.expect_set_vendor_id()
            .withf(|vendor| *vendor == VendorId::LG)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        bus.expect_send_message()
            .withf(|destination, payload, is_reply| {
                *destination == LogicalAddress::BROADCAST
                    && payload.to_vec() == vec![0x87, 0x00, 0xE0, 0x91]
                    && !*is_reply
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        bus.expect_set_osd_name()
            .withf(|name| name.to_string() == "XBMC")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        bus.expect_send_active_source()
            .withf(|address, is_reply| *address == PhysicalAddress(0x1000) && !*is_reply)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let sink = Arc::new(RecordingSink::default());

        // Act
        let identity = use_case(bus, Arc::clone(&sink)).run().await.unwrap();

        // Assert
        assert_eq!(identity.own_vendor_id(), VendorId::LG);
        assert_eq!(identity.tv_vendor_id(), VendorId::LG);
        assert_eq!(identity.logical_address(), LogicalAddress::PlaybackDevice1);
        assert_eq!(
            *sink.hellos.lock().unwrap(),
            vec![("rpi-cecd".to_string(), IconType::None)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quirk_tv_adopts_canonical_lg_vendor() {
        let mut bus = cooperative_bus(VendorId::LG_QUIRK);
        bus.expect_set_vendor_id()
            .withf(|vendor| *vendor == VendorId::LG)
            .times(1)
            .returning(|_| Ok(()));
        bus.expect_send_message().times(1).returning(|_, _, _| Ok(()));

        let identity = use_case(bus, Arc::new(RecordingSink::default())).run().await.unwrap();

        assert_eq!(identity.own_vendor_id(), VendorId::LG);
        assert_eq!(identity.tv_vendor_id(), VendorId::LG_QUIRK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_tv_adopts_default_vendor_without_broadcast() {
        // Arrange
        let mut bus = cooperative_bus(VendorId(0x00903E));
        bus.expect_set_vendor_id()
            .withf(|vendor| *vendor == VendorId::BROADCOM)
            .times(1)
            .returning(|_| Ok(()));
        bus.expect_send_message().never();
        let sink = Arc::new(RecordingSink::default());

        // Act
        let identity = use_case(bus, Arc::clone(&sink)).run().await.unwrap();

        // Assert
        assert_eq!(identity.own_vendor_id(), VendorId::BROADCOM);
        assert_eq!(sink.hellos.lock().unwrap().len(), 1);
    }

    // ── Failures and retries ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_physical_address_query_failure_is_fatal() {
        let mut bus = MockCecService::new();
        bus.expect_register_opcode().returning(|_| Ok(()));
        bus.expect_physical_address()
            .times(1)
            .returning(|| Err(failure("physical_address")));
        bus.expect_logical_address().never();

        let result = use_case(bus, Arc::new(RecordingSink::default())).run().await;

        assert!(matches!(result, Err(NegotiationError::PhysicalAddress(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_physical_address_is_retried_every_interval() {
        // Arrange – clear twice, then assigned
        let queries = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&queries);
        let mut bus = MockCecService::new();
        bus.expect_register_opcode().returning(|_| Ok(()));
        bus.expect_physical_address().returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(PhysicalAddress::CLEAR)
            } else {
                Ok(PhysicalAddress(0x2000))
            }
        });
        bus.expect_logical_address().returning(|| Ok(LogicalAddress::PlaybackDevice2));
        bus.expect_vendor_id().returning(|_| Ok(VendorId(0x00903E)));
        bus.expect_set_vendor_id().returning(|_| Ok(()));
        bus.expect_set_osd_name().returning(|_| Ok(()));
        bus.expect_send_active_source().returning(|_, _| Ok(()));
        let started = tokio::time::Instant::now();

        // Act
        let identity = use_case(bus, Arc::new(RecordingSink::default())).run().await.unwrap();

        // Assert
        assert_eq!(queries.load(Ordering::SeqCst), 3);
        assert_eq!(identity.physical_address(), PhysicalAddress(0x2000));
        assert!(started.elapsed() >= Duration::from_secs(121));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_logical_address_triggers_allocation() {
        let queries = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&queries);
        let mut bus = MockCecService::new();
        bus.expect_register_opcode().returning(|_| Ok(()));
        bus.expect_physical_address().returning(|| Ok(PhysicalAddress(0x1000)));
        bus.expect_logical_address().returning(move || match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(LogicalAddress::Unregistered),
            1 => Err(failure("logical_address")),
            _ => Ok(LogicalAddress::PlaybackDevice1),
        });
        bus.expect_allocate_logical_address().times(2).returning(|| Ok(()));
        bus.expect_vendor_id().returning(|_| Ok(VendorId(0x00903E)));
        bus.expect_set_vendor_id().returning(|_| Ok(()));
        bus.expect_set_osd_name().returning(|_| Ok(()));
        bus.expect_send_active_source().returning(|_, _| Ok(()));

        let identity = use_case(bus, Arc::new(RecordingSink::default())).run().await.unwrap();

        assert_eq!(identity.logical_address(), LogicalAddress::PlaybackDevice1);
        assert_eq!(queries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_is_retried_after_interval() {
        // Arrange – the first probe run sees only alternating readings
        let readings = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&readings);
        let mut bus = MockCecService::new();
        bus.expect_register_opcode().returning(|_| Ok(()));
        bus.expect_physical_address().returning(|| Ok(PhysicalAddress(0x1000)));
        bus.expect_logical_address().returning(|| Ok(LogicalAddress::PlaybackDevice1));
        bus.expect_vendor_id().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 10 && n % 2 == 1 {
                Ok(VendorId(0x00903E))
            } else {
                Ok(VendorId::LG)
            }
        });
        bus.expect_set_vendor_id().returning(|_| Ok(()));
        bus.expect_send_message().returning(|_, _, _| Ok(()));
        bus.expect_set_osd_name().returning(|_| Ok(()));
        bus.expect_send_active_source().returning(|_, _| Ok(()));
        let settings = NegotiationSettings {
            probe: ProbeSettings { attempts: 10, ..ProbeSettings::default() },
            ..NegotiationSettings::default()
        };
        let started = tokio::time::Instant::now();

        // Act
        let use_case = NegotiateIdentityUseCase::new(
            Arc::new(bus),
            Arc::new(RecordingSink::default()),
            settings,
        );
        let identity = use_case.run().await.unwrap();

        // Assert – ten readings in the failed run, six in the second
        assert_eq!(identity.tv_vendor_id(), VendorId::LG);
        assert_eq!(readings.load(Ordering::SeqCst), 16);
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_collaborator_failures_after_discovery_are_not_fatal() {
        // Arrange
        let mut bus = MockCecService::new();
        bus.expect_register_opcode()
            .returning(|_| Err(BusError::Unavailable("closed".to_string())));
        bus.expect_physical_address().returning(|| Ok(PhysicalAddress(0x1000)));
        bus.expect_logical_address().returning(|| Ok(LogicalAddress::PlaybackDevice1));
        bus.expect_vendor_id().returning(|_| Ok(VendorId::LG));
        bus.expect_set_vendor_id().returning(|_| Err(failure("set_vendor_id")));
        bus.expect_send_message().returning(|_, _, _| Err(failure("send_message")));
        bus.expect_set_osd_name().returning(|_| Err(failure("set_osd_name")));
        bus.expect_send_active_source()
            .returning(|_, _| Err(failure("send_active_source")));
        let sink = Arc::new(RecordingSink { should_fail: true, ..RecordingSink::default() });

        // Act
        let result = use_case(bus, sink).run().await;

        // Assert
        assert!(result.is_ok());
    }
}
