//! ProbeTvVendor: polls the TV's vendor id until six readings agree.
//!
//! The probe is pure polling: it asks the bus service for the vendor the TV
//! last reported, feeds the answer into a [`ConsensusWindow`], and sleeps a
//! short interval between attempts.  Query errors back off longer and still
//! use up an attempt, so a probe always ends within its attempt budget.

use std::time::Duration;

use cec_core::{ConsensusWindow, LogicalAddress, Observation, VendorId};
use tracing::{debug, info, warn};

use crate::application::ports::CecService;

/// Tuning for one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Queries issued before giving up.
    pub attempts: u32,
    /// Pause after every query.
    pub interval: Duration,
    /// Extra pause after a failed query.
    pub error_backoff: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            attempts: 500,
            interval: Duration::from_millis(10),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Runs one probe.  Returns the agreed vendor, or `None` once the attempt
/// budget is spent.  Retrying a failed probe is up to the caller.
pub async fn probe_tv_vendor_id(bus: &dyn CecService, settings: &ProbeSettings) -> Option<VendorId> {
    info!("probing for TV vendor id");
    let mut window = ConsensusWindow::new();

    for attempt in 1..=settings.attempts {
        match bus.vendor_id(LogicalAddress::Tv).await {
            Ok(reading) => match window.observe(reading) {
                Observation::Consensus(vendor) => {
                    info!(attempt, %vendor, "TV vendor id agreed");
                    return Some(vendor);
                }
                Observation::Reset => debug!(attempt, %reading, "inconsistent vendor reading, window reset"),
                Observation::Ignored => debug!(attempt, %reading, "vendor reading out of range"),
                Observation::Accepted { count } => debug!(attempt, count, %reading, "vendor reading accepted"),
            },
            Err(e) => {
                warn!(attempt, "could not query TV vendor id: {e}");
                tokio::time::sleep(settings.error_backoff).await;
            }
        }
        tokio::time::sleep(settings.interval).await;
    }

    warn!(attempts = settings.attempts, "TV vendor probe failed");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BusError, MockCecService};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const SAMSUNG: VendorId = VendorId(0x0000F0);

    /// Mock whose vendor queries replay `readings`, then keep returning the last one.
    fn scripted(readings: Vec<Result<VendorId, ()>>) -> (MockCecService, Arc<Mutex<u32>>) {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let script = Mutex::new(readings.into_iter().collect::<VecDeque<_>>());
        let mut bus = MockCecService::new();
        bus.expect_vendor_id()
            .withf(|address| *address == LogicalAddress::Tv)
            .returning(move |_| {
                *counter.lock().unwrap() += 1;
                let mut script = script.lock().unwrap();
                let next = if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    *script.front().unwrap()
                };
                next.map_err(|()| BusError::Failed { operation: "vendor_id", status: 1 })
            });
        (bus, calls)
    }

    fn settings(attempts: u32) -> ProbeSettings {
        ProbeSettings { attempts, ..ProbeSettings::default() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_six_identical_readings_succeed_within_six_attempts() {
        // Arrange
        let (bus, calls) = scripted(vec![Ok(VendorId::LG)]);

        // Act
        let vendor = probe_tv_vendor_id(&bus, &settings(500)).await;

        // Assert
        assert_eq!(vendor, Some(VendorId::LG));
        assert_eq!(*calls.lock().unwrap(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alternating_readings_exhaust_budget() {
        let readings = (0..40)
            .map(|i| Ok(if i % 2 == 0 { VendorId::LG } else { SAMSUNG }))
            .collect();
        let (bus, calls) = scripted(readings);

        let vendor = probe_tv_vendor_id(&bus, &settings(30)).await;

        assert_eq!(vendor, None);
        assert_eq!(*calls.lock().unwrap(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_noise_after_five_readings_restarts_the_count() {
        // Arrange – five LG, one Samsung, then LG forever
        let mut readings = vec![Ok(VendorId::LG); 5];
        readings.push(Ok(SAMSUNG));
        readings.push(Ok(VendorId::LG));
        let (bus, calls) = scripted(readings);

        // Act
        let vendor = probe_tv_vendor_id(&bus, &settings(500)).await;

        // Assert – six fresh LG readings were needed after the reset
        assert_eq!(vendor, Some(VendorId::LG));
        assert_eq!(*calls.lock().unwrap(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_use_up_attempts() {
        let (bus, calls) = scripted(vec![Err(())]);
        let started = tokio::time::Instant::now();

        let vendor = probe_tv_vendor_id(&bus, &settings(3)).await;

        assert_eq!(vendor, None);
        assert_eq!(*calls.lock().unwrap(), 3);
        // Each failure backs off one second plus the regular interval.
        assert!(started.elapsed() >= Duration::from_millis(3 * 1010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_readings_neither_count_nor_reset() {
        let mut readings = vec![Ok(VendorId::LG); 3];
        readings.push(Ok(VendorId::UNKNOWN));
        readings.push(Ok(VendorId::LG));
        let (bus, calls) = scripted(readings);

        let vendor = probe_tv_vendor_id(&bus, &settings(500)).await;

        assert_eq!(vendor, Some(VendorId::LG));
        assert_eq!(*calls.lock().unwrap(), 7);
    }
}
