//! TOML configuration for the bridge daemon.
//!
//! The file is optional.  Every field has a default matching the behaviour of
//! a stock installation, so an absent file, an empty file, and a file that
//! sets only one field are all valid:
//!
//! ```toml
//! [bridge]
//! osd_name = "XBMC"
//! application_name = "rpi-cecd"
//! device_map = "R1"
//! log_level = "info"
//!
//! [event_server]
//! address = "127.0.0.1:9777"
//! ping_interval_secs = 45
//!
//! [negotiation]
//! retry_interval_secs = 60
//! settle_delay_secs = 1
//! probe_attempts = 500
//! probe_interval_ms = 10
//! probe_error_backoff_ms = 1000
//!
//! [simulation]
//! physical_address = "1.0.0.0"
//! logical_address = 4
//! tv_vendor_id = 0x00E091
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cec_core::{LogicalAddress, PhysicalAddress, VendorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::negotiate::NegotiationSettings;
use crate::application::probe::ProbeSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but holds a value the bridge cannot use.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub event_server: EventServerSection,
    #[serde(default)]
    pub negotiation: NegotiationSection,
    #[serde(default)]
    pub simulation: SimulationSection,
}

/// How the bridge presents itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeSection {
    /// Name the TV shows for this input.
    #[serde(default = "default_osd_name")]
    pub osd_name: String,
    /// Name sent to the media center in the hello handshake.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Virtual remote label the media center uses to pick a keymap.
    #[serde(default = "default_device_map")]
    pub device_map: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where the media center's event server listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventServerSection {
    /// `host:port` of the event server (UDP).
    #[serde(default = "default_event_server_address")]
    pub address: String,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

/// Startup negotiation timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegotiationSection {
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_probe_error_backoff_ms")]
    pub probe_error_backoff_ms: u64,
}

/// Answers given by the simulated bus service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSection {
    #[serde(default = "default_physical_address")]
    pub physical_address: PhysicalAddress,
    #[serde(default = "default_logical_address")]
    pub logical_address: u8,
    #[serde(default = "default_tv_vendor_id")]
    pub tv_vendor_id: VendorId,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_osd_name() -> String {
    "XBMC".to_string()
}
fn default_application_name() -> String {
    "rpi-cecd".to_string()
}
fn default_device_map() -> String {
    "R1".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_event_server_address() -> String {
    "127.0.0.1:9777".to_string()
}
fn default_ping_interval_secs() -> u64 {
    45
}
fn default_retry_interval_secs() -> u64 {
    60
}
fn default_settle_delay_secs() -> u64 {
    1
}
fn default_probe_attempts() -> u32 {
    500
}
fn default_probe_interval_ms() -> u64 {
    10
}
fn default_probe_error_backoff_ms() -> u64 {
    1000
}
fn default_physical_address() -> PhysicalAddress {
    PhysicalAddress(0x1000)
}
fn default_logical_address() -> u8 {
    LogicalAddress::PlaybackDevice1 as u8
}
fn default_tv_vendor_id() -> VendorId {
    VendorId::LG
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            osd_name: default_osd_name(),
            application_name: default_application_name(),
            device_map: default_device_map(),
            log_level: default_log_level(),
        }
    }
}

impl Default for EventServerSection {
    fn default() -> Self {
        Self {
            address: default_event_server_address(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl Default for NegotiationSection {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            probe_attempts: default_probe_attempts(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_error_backoff_ms: default_probe_error_backoff_ms(),
        }
    }
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            physical_address: default_physical_address(),
            logical_address: default_logical_address(),
            tv_vendor_id: default_tv_vendor_id(),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl BridgeConfig {
    /// Settings for the startup negotiation.
    pub fn negotiation_settings(&self) -> NegotiationSettings {
        let n = &self.negotiation;
        NegotiationSettings {
            retry_interval: Duration::from_secs(n.retry_interval_secs),
            settle_delay: Duration::from_secs(n.settle_delay_secs),
            probe: ProbeSettings {
                attempts: n.probe_attempts,
                interval: Duration::from_millis(n.probe_interval_ms),
                error_backoff: Duration::from_millis(n.probe_error_backoff_ms),
            },
            osd_name: self.bridge.osd_name.clone(),
            application_name: self.bridge.application_name.clone(),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.event_server.ping_interval_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.logical_address > 0x0F {
            return Err(ConfigError::Invalid(format!(
                "simulation.logical_address {} is not a 4-bit address",
                self.simulation.logical_address
            )));
        }
        if self.event_server.ping_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "event_server.ping_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl SimulationSection {
    pub fn logical_address(&self) -> LogicalAddress {
        LogicalAddress::from_nibble(self.logical_address)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses a configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] for out-of-range values.
pub fn parse_config(content: &str) -> Result<BridgeConfig, ConfigError> {
    let cfg: BridgeConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads the configuration at `path`, or the defaults when no path is given
/// or the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and the errors of [`parse_config`].
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BridgeConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_identity_matches_stock_installation() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.bridge.osd_name, "XBMC");
        assert_eq!(cfg.bridge.application_name, "rpi-cecd");
        assert_eq!(cfg.bridge.device_map, "R1");
    }

    #[test]
    fn test_default_event_server_is_local_port_9777() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.event_server.address, "127.0.0.1:9777");
        assert_eq!(cfg.ping_interval(), Duration::from_secs(45));
    }

    #[test]
    fn test_default_negotiation_settings() {
        // Arrange / Act
        let settings = BridgeConfig::default().negotiation_settings();

        // Assert
        assert_eq!(settings.retry_interval, Duration::from_secs(60));
        assert_eq!(settings.settle_delay, Duration::from_secs(1));
        assert_eq!(settings.probe, ProbeSettings::default());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg = parse_config("[bridge]\nosd_name = \"Kodi\"\n").unwrap();

        assert_eq!(cfg.bridge.osd_name, "Kodi");
        assert_eq!(cfg.bridge.device_map, "R1");
        assert_eq!(cfg.negotiation, NegotiationSection::default());
    }

    #[test]
    fn test_simulation_section_parses_dotted_address_and_hex_vendor() {
        let cfg = parse_config(
            "[simulation]\nphysical_address = \"2.1.0.0\"\nlogical_address = 8\ntv_vendor_id = 0x00903E\n",
        )
        .unwrap();

        assert_eq!(cfg.simulation.physical_address, PhysicalAddress(0x2100));
        assert_eq!(cfg.simulation.logical_address(), LogicalAddress::PlaybackDevice2);
        assert_eq!(cfg.simulation.tv_vendor_id, VendorId(0x00903E));
    }

    #[test]
    fn test_bad_physical_address_is_a_parse_error() {
        let result = parse_config("[simulation]\nphysical_address = \"1.0.0\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_logical_address_is_invalid() {
        let result = parse_config("[simulation]\nlogical_address = 16\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_ping_interval_is_invalid() {
        let result = parse_config("[event_server]\nping_interval_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = BridgeConfig::default();
        cfg.negotiation.probe_attempts = 20;
        cfg.simulation.physical_address = PhysicalAddress(0x3000);

        // Act
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = parse_config(&text).expect("parse");

        // Assert
        assert_eq!(cfg, restored);
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    #[test]
    fn test_load_without_path_yields_defaults() {
        assert_eq!(load_config(None).unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("cec-bridge-missing-{}.toml", uuid::Uuid::new_v4()));
        assert_eq!(load_config(Some(&path)).unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_load_reads_existing_file() {
        let path = std::env::temp_dir().join(format!("cec-bridge-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[event_server]\naddress = \"10.0.0.2:9777\"\n").unwrap();

        let cfg = load_config(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.unwrap().event_server.address, "10.0.0.2:9777");
    }
}
