//! `From` implementations bridging `blinds_config` types to `blinds_core` types.

use std::time::Duration;

use crate::config::{ControlCfg, TiltCfg, TravelCfg};

// ── TravelCfg ────────────────────────────────────────────────────────────────

impl From<&blinds_config::TravelCfg> for TravelCfg {
    fn from(c: &blinds_config::TravelCfg) -> Self {
        Self::from_secs(c.up_s, c.down_s)
    }
}

// ── TiltCfg ──────────────────────────────────────────────────────────────────

impl From<&blinds_config::TiltCfg> for TiltCfg {
    fn from(c: &blinds_config::TiltCfg) -> Self {
        Self::from_secs(c.open_s, c.closed_s)
    }
}

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&blinds_config::ControlCfg> for ControlCfg {
    fn from(c: &blinds_config::ControlCfg) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            send_stop_at_extremes: c.send_stop_at_extremes,
            max_run_factor: c.max_run_factor,
        }
    }
}
