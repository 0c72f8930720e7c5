//! Type-state builder for `Cover` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that the actuator, publisher and
//! travel times are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use blinds_traits::clock::{Clock, MonotonicClock};
use blinds_traits::{Actuator, StatePublisher};

use crate::config::{ControlCfg, TiltCfg, TravelCfg};
use crate::controller::MotionController;
use crate::error::{BuildError, Result};
use crate::estimator::{PositionEstimator, TravelRange};

/// Boxed actuator accepted by the dynamic builder.
pub type BoxedActuator = Box<dyn Actuator + Send>;
/// Boxed publisher accepted by the dynamic builder.
pub type BoxedPublisher = Box<dyn StatePublisher + Send>;

/// Dynamically dispatched controller produced by `ControllerBuilder`.
pub type Cover = MotionController<BoxedActuator, BoxedPublisher>;

impl Cover {
    /// Start building a cover controller.
    pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
        ControllerBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Cover`. All fields are validated on `build()`.
pub struct ControllerBuilder<A, P, T> {
    actuator: Option<BoxedActuator>,
    publisher: Option<BoxedPublisher>,
    travel: Option<TravelCfg>,
    tilt: Option<TiltCfg>,
    control: Option<ControlCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    initial_position: Option<u8>,
    name: Option<String>,
    _a: PhantomData<A>,
    _p: PhantomData<P>,
    _t: PhantomData<T>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            publisher: None,
            travel: None,
            tilt: None,
            control: None,
            clock: None,
            initial_position: None,
            name: None,
            _a: PhantomData,
            _p: PhantomData,
            _t: PhantomData,
        }
    }
}

/// Validate configuration and construct a `MotionController`.
///
/// Shared by `ControllerBuilder::try_build()` and `build_controller()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<A: Actuator, P: StatePublisher>(
    actuator: A,
    publisher: P,
    travel: TravelCfg,
    tilt: TiltCfg,
    control: ControlCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    initial_position: u8,
    name: String,
) -> Result<MotionController<A, P>> {
    // ── Validation ───────────────────────────────────────────────────────────
    let lift_range = TravelRange::new(travel.up, travel.down).map_err(eyre::Report::new)?;
    if control.poll_interval.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll_interval must be > 0",
        )));
    }
    if !control.max_run_factor.is_finite() || control.max_run_factor < 1.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_run_factor must be >= 1",
        )));
    }
    if initial_position > crate::estimator::OPEN {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "initial position must be 0..=100",
        )));
    }

    // ── Assemble ─────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    let lift = PositionEstimator::new(lift_range, clock.clone()).with_position(initial_position);
    let tilt = if tilt.is_enabled() {
        let range = TravelRange::new(tilt.open, tilt.closed).map_err(eyre::Report::new)?;
        Some(PositionEstimator::new(range, clock.clone()))
    } else {
        if tilt.is_partial() {
            tracing::warn!(
                open_ms = crate::util::as_millis_u64(tilt.open),
                closed_ms = crate::util::as_millis_u64(tilt.closed),
                "tilt needs both open and closed times; tilt disabled"
            );
        }
        None
    };

    tracing::debug!(
        cover = %name,
        up_ms = crate::util::as_millis_u64(travel.up),
        down_ms = crate::util::as_millis_u64(travel.down),
        tilt = tilt.is_some(),
        "controller built"
    );

    Ok(MotionController::from_parts(
        actuator, publisher, lift, tilt, clock, control, name,
    ))
}

impl<A, P, T> ControllerBuilder<A, P, T> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Cover> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let publisher = self
            .publisher
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPublisher))?;
        let travel = self
            .travel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTravel))?;

        validate_and_build(
            actuator,
            publisher,
            travel,
            self.tilt.unwrap_or_default(),
            self.control.unwrap_or_default(),
            self.clock,
            self.initial_position.unwrap_or(crate::estimator::CLOSED),
            self.name.unwrap_or_else(|| "cover".to_string()),
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<A, P, T> ControllerBuilder<A, P, T> {
    pub fn with_tilt(mut self, tilt: TiltCfg) -> Self {
        self.tilt = Some(tilt);
        self
    }
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Lift position before any restore. Default: 0 (closed).
    pub fn with_initial_position(mut self, position: u8) -> Self {
        self.initial_position = Some(position);
        self
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// Setters that advance type-state
impl<P, T> ControllerBuilder<Missing, P, T> {
    pub fn with_actuator(
        self,
        actuator: impl Actuator + Send + 'static,
    ) -> ControllerBuilder<Set, P, T> {
        ControllerBuilder {
            actuator: Some(Box::new(actuator)),
            publisher: self.publisher,
            travel: self.travel,
            tilt: self.tilt,
            control: self.control,
            clock: self.clock,
            initial_position: self.initial_position,
            name: self.name,
            _a: PhantomData,
            _p: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<A, T> ControllerBuilder<A, Missing, T> {
    pub fn with_publisher(
        self,
        publisher: impl StatePublisher + Send + 'static,
    ) -> ControllerBuilder<A, Set, T> {
        ControllerBuilder {
            actuator: self.actuator,
            publisher: Some(Box::new(publisher)),
            travel: self.travel,
            tilt: self.tilt,
            control: self.control,
            clock: self.clock,
            initial_position: self.initial_position,
            name: self.name,
            _a: PhantomData,
            _p: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<A, P> ControllerBuilder<A, P, Missing> {
    pub fn with_travel(self, travel: TravelCfg) -> ControllerBuilder<A, P, Set> {
        ControllerBuilder {
            actuator: self.actuator,
            publisher: self.publisher,
            travel: Some(travel),
            tilt: self.tilt,
            control: self.control,
            clock: self.clock,
            initial_position: self.initial_position,
            name: self.name,
            _a: PhantomData,
            _p: PhantomData,
            _t: PhantomData,
        }
    }
}

impl ControllerBuilder<Set, Set, Set> {
    /// Validate and build. Only available when actuator, publisher and travel are set.
    pub fn build(self) -> Result<Cover> {
        self.try_build()
    }
}

/// Build a statically dispatched controller from concrete ports.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_controller<A, P>(
    actuator: A,
    publisher: P,
    travel: TravelCfg,
    tilt: Option<TiltCfg>,
    control: Option<ControlCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<MotionController<A, P>>
where
    A: Actuator,
    P: StatePublisher,
{
    validate_and_build(
        actuator,
        publisher,
        travel,
        tilt.unwrap_or_default(),
        control.unwrap_or_default(),
        clock,
        crate::estimator::CLOSED,
        "cover".to_string(),
    )
}
