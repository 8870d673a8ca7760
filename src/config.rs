//! Device configuration
//!
//! Everything the controller needs to know at boot: identity, allow-list,
//! broker, topics, OTA endpoints and timing constants.  The configuration is
//! static after boot; nothing in the runtime mutates it.
//!
//! [`DeviceConfig::default()`] reproduces the reference FarmLab deployment.
//! A JSON document with the same shape can override it
//! ([`DeviceConfig::from_json`]).

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::access::BadgeUid;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identity used as MQTT client id, command address and event tag.
    pub device_id: String,
    /// Canonical badge UIDs (`"93:9B:D7:AA"`) that open the door.
    pub allowed_uids: Vec<String>,
    pub wifi: WifiConfig,
    pub broker: BrokerConfig,
    pub topics: TopicConfig,
    pub ota: OtaConfig,
    pub timing: TimingConfig,
}

/// Wi-Fi station credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    /// Empty for open networks.
    pub password: String,
}

/// MQTT broker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means anonymous.
    pub username: String,
    pub password: String,
}

/// Bus topic names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Inbound commands (subscribed after every session connect).
    pub command: String,
    /// Outbound door events.  Shares the command topic in the reference deployment.
    pub event: String,
    /// Outbound heartbeats.
    pub heartbeat: String,
}

/// Firmware update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtaConfig {
    /// Manifest document (`{"version": .., "file": ..}`).
    pub manifest_url: String,
    /// Prefix joined with `manifest.file` to locate the image.
    pub base_url: String,
}

/// Timing constants, all in milliseconds unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    // --- Access ---
    /// Badge reader poll cadence.
    pub reader_poll_ms: u64,
    /// Same-UID suppression window.
    pub debounce_window_ms: u64,
    /// Relay unlock pulse length.
    pub pulse_duration_ms: u64,

    // --- Link backoff ---
    /// Link check interval with no failures.
    pub link_backoff_base_ms: u64,
    /// Added per failed attempt.
    pub link_backoff_step_ms: u64,
    /// Failed attempts counted towards the interval (caps the interval).
    pub link_backoff_cap: u8,
    /// Connect attempts before the manager gives up until restart.
    pub link_max_attempts: u8,

    // --- Session / telemetry / OTA ---
    /// Minimum gap between bus session attempts.
    pub session_retry_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub ota_poll_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "lock_01".into(),
            allowed_uids: vec![
                "93:9B:D7:AA".into(),
                "20:15:B8:4F".into(),
                "D3:C6:F6:99".into(),
            ],
            wifi: WifiConfig::default(),
            broker: BrokerConfig::default(),
            topics: TopicConfig::default(),
            ota: OtaConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "Tenda_2AAA80_Lab".into(),
            password: "87654321".into(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.102".into(),
            port: 1883,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            command: "farmlab/door".into(),
            event: "farmlab/door".into(),
            heartbeat: "farmlab/esp32/heartbeat".into(),
        }
    }
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            manifest_url: "http://adro.ddns.net/lokifyFirmware/manifest.json".into(),
            base_url: "http://adro.ddns.net/lokifyFirmware/".into(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            // Access
            reader_poll_ms: 200,
            debounce_window_ms: 1000,
            pulse_duration_ms: 100,

            // Link backoff: 1s + min(n, 10) * 2s, give up after 10 attempts
            link_backoff_base_ms: 1000,
            link_backoff_step_ms: 2000,
            link_backoff_cap: 10,
            link_max_attempts: 10,

            // Session / telemetry / OTA
            session_retry_ms: 500,
            heartbeat_interval_ms: 5000,
            ota_poll_interval_ms: 10_000,
        }
    }
}

impl DeviceConfig {
    /// Parse a JSON override document.  Missing fields keep their defaults.
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }
        if self.topics.command.is_empty()
            || self.topics.event.is_empty()
            || self.topics.heartbeat.is_empty()
        {
            return Err(ConfigError::EmptyTopic);
        }
        if self.broker.host.is_empty() || self.broker.port == 0 {
            return Err(ConfigError::InvalidBroker);
        }
        if self.ota.manifest_url.is_empty() || self.ota.base_url.is_empty() {
            return Err(ConfigError::InvalidOtaUrl);
        }
        if self
            .allowed_uids
            .iter()
            .any(|uid| BadgeUid::parse(uid).is_none())
        {
            return Err(ConfigError::MalformedUid);
        }
        self.timing.validate()
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            self.reader_poll_ms,
            self.pulse_duration_ms,
            self.link_backoff_base_ms,
            self.heartbeat_interval_ms,
            self.ota_poll_interval_ms,
        ];
        if intervals.contains(&0) {
            return Err(ConfigError::ZeroInterval);
        }
        if self.link_max_attempts == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

/// Errors from configuration parsing and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON document could not be decoded.
    Malformed,
    EmptyDeviceId,
    EmptyTopic,
    InvalidBroker,
    InvalidOtaUrl,
    /// An allow-list entry is not in canonical `AA:BB:..` form.
    MalformedUid,
    /// Allow-list exceeds the fixed capacity.
    AllowListFull,
    /// A timing constant that drives a cadence is zero.
    ZeroInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config document malformed"),
            Self::EmptyDeviceId => write!(f, "device_id must not be empty"),
            Self::EmptyTopic => write!(f, "topic names must not be empty"),
            Self::InvalidBroker => write!(f, "broker host/port invalid"),
            Self::InvalidOtaUrl => write!(f, "OTA URLs must not be empty"),
            Self::MalformedUid => write!(f, "allow-list UID not in canonical form"),
            Self::AllowListFull => write!(f, "allow-list exceeds capacity"),
            Self::ZeroInterval => write!(f, "timing value must be non-zero"),
        }
    }
}
