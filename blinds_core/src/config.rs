//! Runtime configuration for the motion controller.
//!
//! Separate from the TOML-deserialized structs in `blinds_config`; see
//! `conversions` for the mapping.
use std::time::Duration;

/// Full-range lift travel times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelCfg {
    pub up: Duration,
    pub down: Duration,
}

impl TravelCfg {
    pub fn from_secs(up_s: f32, down_s: f32) -> Self {
        Self {
            up: crate::util::duration_from_secs_f32(up_s),
            down: crate::util::duration_from_secs_f32(down_s),
        }
    }
}

/// Full-range tilt times. Zero on either side disables tilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TiltCfg {
    pub open: Duration,
    pub closed: Duration,
}

impl TiltCfg {
    pub fn from_secs(open_s: f32, closed_s: f32) -> Self {
        Self {
            open: crate::util::duration_from_secs_f32(open_s),
            closed: crate::util::duration_from_secs_f32(closed_s),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.open.is_zero() && !self.closed.is_zero()
    }

    /// Exactly one side configured.
    pub fn is_partial(&self) -> bool {
        self.open.is_zero() != self.closed.is_zero()
    }
}

/// Poll loop and stop policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlCfg {
    /// Tick period while moving. Default: 100 ms.
    pub poll_interval: Duration,
    /// Send the final stop when travel ends at 0 or 100.
    pub send_stop_at_extremes: bool,
    /// Runner watchdog as a multiple of the longest full travel.
    pub max_run_factor: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            send_stop_at_extremes: true,
            max_run_factor: 3.0,
        }
    }
}
