use thiserror::Error;

/// Why a run was cut short. Each maps to a stable CLI exit code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("shutdown requested")]
    Shutdown,
    #[error("max run time exceeded")]
    MaxRuntime,
    #[error("cover unavailable")]
    Unavailable,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoverError {
    #[error("actuator error: {0}")]
    Actuator(String),
    #[error("actuator fault: {0}")]
    ActuatorFault(String),
    #[error("switch unavailable: {0}")]
    SwitchUnavailable(String),
    #[error("cover has no tilt axis")]
    TiltUnsupported,
    #[error("position {0} out of range 0..=100")]
    InvalidPosition(u8),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("aborted: {0}")]
    Abort(AbortReason),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing state publisher")]
    MissingPublisher,
    #[error("missing travel times")]
    MissingTravel,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
