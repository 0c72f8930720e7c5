//! Switch backends for the blinds controller.
//!
//! `SimulatedSwitches` keeps both outputs in memory and can echo every change
//! back as a `SwitchEvent`, the way a home-automation host reports the state of
//! a switch entity after it has been commanded. The `hardware` feature adds a
//! relay backend on Raspberry Pi GPIO.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod relay;

use blinds_traits::{Actuator, SwitchEvent, SwitchId, SwitchState};
use error::HwError;

type Echo = Box<dyn FnMut(SwitchEvent) + Send>;

/// In-memory switch pair with the same interlock rule as a relay board:
/// an output is never energized while the other one is on.
pub struct SimulatedSwitches {
    up: bool,
    down: bool,
    unavailable: Option<SwitchId>,
    echo: Option<Echo>,
}

impl Default for SimulatedSwitches {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSwitches {
    pub fn new() -> Self {
        Self {
            up: false,
            down: false,
            unavailable: None,
            echo: None,
        }
    }

    /// Report every actual state change through `f`.
    pub fn with_echo<F>(mut self, f: F) -> Self
    where
        F: FnMut(SwitchEvent) + Send + 'static,
    {
        self.echo = Some(Box::new(f));
        self
    }

    /// Make one switch refuse commands, as if the host lost it.
    pub fn set_unavailable(&mut self, switch: Option<SwitchId>) {
        self.unavailable = switch;
    }

    pub fn is_on(&self, switch: SwitchId) -> bool {
        match switch {
            SwitchId::Up => self.up,
            SwitchId::Down => self.down,
        }
    }

    fn slot(&mut self, switch: SwitchId) -> &mut bool {
        match switch {
            SwitchId::Up => &mut self.up,
            SwitchId::Down => &mut self.down,
        }
    }

    fn set(&mut self, switch: SwitchId, on: bool) -> error::Result<()> {
        if self.unavailable == Some(switch) {
            return Err(HwError::Unavailable(switch.as_str()));
        }
        if on && self.is_on(switch.opposite()) {
            return Err(HwError::Interlock(switch.opposite().as_str()));
        }
        let slot = self.slot(switch);
        if *slot == on {
            return Ok(());
        }
        *slot = on;
        tracing::debug!(%switch, on, "simulated switch changed");
        if let Some(echo) = self.echo.as_mut() {
            let state = if on { SwitchState::On } else { SwitchState::Off };
            echo(SwitchEvent::new(switch, state));
        }
        Ok(())
    }
}

impl Actuator for SimulatedSwitches {
    fn turn_on(&mut self, switch: SwitchId) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.set(switch, true)?)
    }

    fn turn_off(
        &mut self,
        switch: SwitchId,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.set(switch, false)?)
    }
}
