pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One of the two directional outputs driving the cover motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchId {
    Up,
    Down,
}

impl SwitchId {
    /// The output driving the other direction.
    pub fn opposite(self) -> Self {
        match self {
            SwitchId::Up => SwitchId::Down,
            SwitchId::Down => SwitchId::Up,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwitchId::Up => "up",
            SwitchId::Down => "down",
        }
    }
}

impl core::fmt::Display for SwitchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a switch output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    On,
    #[default]
    Off,
    /// The host reports the switch entity as unreachable.
    Unavailable,
}

/// A state change of one of the two switches, as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEvent {
    pub switch: SwitchId,
    pub state: SwitchState,
}

impl SwitchEvent {
    pub fn new(switch: SwitchId, state: SwitchState) -> Self {
        Self { switch, state }
    }
}

/// Snapshot handed to the status layer on every tick and transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverState {
    pub position: u8,
    pub tilt_position: Option<u8>,
    pub is_opening: bool,
    pub is_closing: bool,
    pub is_closed: bool,
    pub available: bool,
}

/// Write side: the two momentary outputs. No feedback.
pub trait Actuator {
    fn turn_on(&mut self, switch: SwitchId) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn turn_off(&mut self, switch: SwitchId)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Read side: the level of a directional line, e.g. a wall button or the
/// relay contact itself. Used by the switch watcher thread.
pub trait SwitchSense {
    fn read(&mut self, switch: SwitchId)
    -> Result<SwitchState, Box<dyn std::error::Error + Send + Sync>>;
}

/// Status side: receives the estimated cover state.
pub trait StatePublisher {
    fn publish(&mut self, state: &CoverState);
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn turn_on(&mut self, switch: SwitchId) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).turn_on(switch)
    }

    fn turn_off(
        &mut self,
        switch: SwitchId,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).turn_off(switch)
    }
}

impl<T: SwitchSense + ?Sized> SwitchSense for Box<T> {
    fn read(
        &mut self,
        switch: SwitchId,
    ) -> Result<SwitchState, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(switch)
    }
}

impl<T: StatePublisher + ?Sized> StatePublisher for Box<T> {
    fn publish(&mut self, state: &CoverState) {
        (**self).publish(state)
    }
}
