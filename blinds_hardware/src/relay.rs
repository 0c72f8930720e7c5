use blinds_traits::{Actuator, SwitchId, SwitchSense, SwitchState};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::{debug, warn};

use crate::error::{HwError, Result};

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Two relays on GPIO outputs, one per direction.
///
/// Both relays are released on construction and on drop.
pub struct RelaySwitches {
    up: OutputPin,
    down: OutputPin,
    active_low: bool,
}

impl RelaySwitches {
    pub fn new(up_pin: u8, down_pin: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let open = |pin: u8| -> Result<OutputPin> {
            let p = gpio.get(pin).map_err(gpio_err)?;
            // start released
            Ok(if active_low {
                p.into_output_high()
            } else {
                p.into_output_low()
            })
        };
        let up = open(up_pin)?;
        let down = open(down_pin)?;
        debug!(up_pin, down_pin, active_low, "relay outputs ready");
        Ok(Self {
            up,
            down,
            active_low,
        })
    }

    fn pin(&mut self, switch: SwitchId) -> &mut OutputPin {
        match switch {
            SwitchId::Up => &mut self.up,
            SwitchId::Down => &mut self.down,
        }
    }

    fn energized(&self, switch: SwitchId) -> bool {
        let pin = match switch {
            SwitchId::Up => &self.up,
            SwitchId::Down => &self.down,
        };
        pin.is_set_high() != self.active_low
    }

    fn drive(&mut self, switch: SwitchId, on: bool) {
        let high = on != self.active_low;
        let pin = self.pin(switch);
        if high {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }

    fn set(&mut self, switch: SwitchId, on: bool) -> Result<()> {
        if on && self.energized(switch.opposite()) {
            return Err(HwError::Interlock(switch.opposite().as_str()));
        }
        self.drive(switch, on);
        debug!(%switch, on, "relay driven");
        Ok(())
    }
}

impl Actuator for RelaySwitches {
    fn turn_on(&mut self, switch: SwitchId) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.set(switch, true)?)
    }

    fn turn_off(
        &mut self,
        switch: SwitchId,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.set(switch, false)?)
    }
}

impl Drop for RelaySwitches {
    fn drop(&mut self) {
        self.drive(SwitchId::Up, false);
        self.drive(SwitchId::Down, false);
    }
}

/// Wall-button inputs with pull-ups; a pressed button pulls the line low.
pub struct ButtonSense {
    up: InputPin,
    down: InputPin,
}

impl ButtonSense {
    pub fn new(up_pin: u8, down_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let up = gpio.get(up_pin).map_err(gpio_err)?.into_input_pullup();
        let down = gpio.get(down_pin).map_err(gpio_err)?.into_input_pullup();
        Ok(Self { up, down })
    }
}

impl SwitchSense for ButtonSense {
    fn read(
        &mut self,
        switch: SwitchId,
    ) -> std::result::Result<SwitchState, Box<dyn std::error::Error + Send + Sync>> {
        let pin = match switch {
            SwitchId::Up => &self.up,
            SwitchId::Down => &self.down,
        };
        if pin.is_low() {
            Ok(SwitchState::On)
        } else {
            Ok(SwitchState::Off)
        }
    }
}

/// Open relays and, when both sense pins are wired, the button inputs.
pub fn open(
    up_relay: u8,
    down_relay: u8,
    active_low: bool,
    sense: Option<(u8, u8)>,
) -> Result<(RelaySwitches, Option<ButtonSense>)> {
    let relays = RelaySwitches::new(up_relay, down_relay, active_low)?;
    let buttons = match sense {
        Some((up, down)) => Some(ButtonSense::new(up, down)?),
        None => {
            warn!("no sense pins configured; manual button presses are not tracked");
            None
        }
    };
    Ok((relays, buttons))
}
