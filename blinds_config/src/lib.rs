#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the blinds controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `PersistedPosition` is the restorable state written between runs.
use serde::{Deserialize, Serialize};

/// Upper bound for the poll interval; anything slower makes the stop
/// point visibly late on short travels.
pub const MAX_POLL_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CoverCfg {
    /// Display name used in logs and status output.
    pub name: String,
}

/// Host identifiers of the two directional switches.
#[derive(Debug, Deserialize)]
pub struct Switches {
    pub up: String,
    pub down: String,
}

/// Full-range travel times in seconds.
#[derive(Debug, Deserialize)]
pub struct TravelCfg {
    pub up_s: f32,
    pub down_s: f32,
}

/// Full-range tilt times in seconds. Zero (or absent) disables tilt.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct TiltCfg {
    pub open_s: f32,
    pub closed_s: f32,
}

impl TiltCfg {
    /// Tilt needs both directions configured.
    pub fn is_supported(&self) -> bool {
        self.open_s > 0.0 && self.closed_s > 0.0
    }

    /// Exactly one side set; the builder disables tilt and warns.
    pub fn is_partial(&self) -> bool {
        (self.open_s > 0.0) != (self.closed_s > 0.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Poll tick period while the cover is moving.
    pub poll_interval_ms: u64,
    /// Send a final stop when travel ends at 0 or 100. Some motors cut
    /// out at their end stops and must not receive an extra command.
    pub send_stop_at_extremes: bool,
    /// Runner watchdog: abort after `max_run_factor` times the longest
    /// full travel time.
    pub max_run_factor: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            send_stop_at_extremes: true,
            max_run_factor: 3.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StateCfg {
    /// Where the last known position is kept between runs.
    pub file: Option<String>,
}

impl Default for StateCfg {
    fn default() -> Self {
        Self {
            file: Some("var/blinds_state.toml".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// GPIO wiring for the relay backend (`hardware` feature).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub up_relay: u8,
    pub down_relay: u8,
    /// Relay boards that energize on a low level.
    pub active_low: bool,
    /// Optional inputs wired to the wall buttons for manual-operation tracking.
    pub up_sense: Option<u8>,
    pub down_sense: Option<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            up_relay: 17,
            down_relay: 27,
            active_low: true,
            up_sense: None,
            down_sense: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedCfg {
    /// Polling period of the switch-sense watcher thread.
    pub poll_ms: u64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self { poll_ms: 20 }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cover: CoverCfg,
    pub switches: Switches,
    pub travel: TravelCfg,
    #[serde(default)]
    pub tilt: TiltCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub state: StateCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub feed: FeedCfg,
}

/// Last known estimate, restored on startup before any command.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PersistedPosition {
    pub position: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt_position: Option<u8>,
}

impl PersistedPosition {
    /// Clamp out-of-range values from hand-edited files.
    pub fn clamped(self) -> Self {
        Self {
            position: self.position.min(100),
            tilt_position: self.tilt_position.map(|t| t.min(100)),
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_state_toml(s: &str) -> Result<PersistedPosition, toml::de::Error> {
    toml::from_str::<PersistedPosition>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Switches
        if self.switches.up.trim().is_empty() {
            eyre::bail!("switches.up must not be empty");
        }
        if self.switches.down.trim().is_empty() {
            eyre::bail!("switches.down must not be empty");
        }
        if self.switches.up == self.switches.down {
            eyre::bail!("switches.up and switches.down must be different switches");
        }

        // Travel
        if !self.travel.up_s.is_finite() || self.travel.up_s <= 0.0 {
            eyre::bail!("travel.up_s must be > 0");
        }
        if !self.travel.down_s.is_finite() || self.travel.down_s <= 0.0 {
            eyre::bail!("travel.down_s must be > 0");
        }

        // Tilt: zero disables; partial is tolerated and disabled at build time
        if !self.tilt.open_s.is_finite() || self.tilt.open_s < 0.0 {
            eyre::bail!("tilt.open_s must be >= 0");
        }
        if !self.tilt.closed_s.is_finite() || self.tilt.closed_s < 0.0 {
            eyre::bail!("tilt.closed_s must be >= 0");
        }

        // Control
        if self.control.poll_interval_ms == 0 {
            eyre::bail!("control.poll_interval_ms must be >= 1");
        }
        if self.control.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            eyre::bail!("control.poll_interval_ms is unreasonably large (>5s)");
        }
        if !self.control.max_run_factor.is_finite() || self.control.max_run_factor < 1.0 {
            eyre::bail!("control.max_run_factor must be >= 1.0");
        }

        // Feed
        if self.feed.poll_ms == 0 {
            eyre::bail!("feed.poll_ms must be >= 1");
        }

        // Pins: only meaningful with the relay backend, but never the same line twice
        if self.pins.up_relay == self.pins.down_relay {
            eyre::bail!("pins.up_relay and pins.down_relay must differ");
        }
        if self.pins.up_sense.is_some() != self.pins.down_sense.is_some() {
            eyre::bail!("pins.up_sense and pins.down_sense must be set together");
        }

        Ok(())
    }
}
