#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core blinds logic (hardware-agnostic).
//!
//! All hardware interaction goes through `blinds_traits::Actuator` (the two
//! switch outputs) and `blinds_traits::StatePublisher` (status side).
//!
//! ## Architecture
//!
//! - **Estimation**: time-based position per axis (`estimator` module)
//! - **Control**: command issue, polling and reconciliation (`controller` module)
//! - **Configuration**: runtime config structs (`config` module)
//! - **Driving**: poll loop with watchdog (`runner`) and switch watcher thread (`feed`)
//! - **Persistence**: last known position between runs (`persist` module)
//!
//! Positions are integer percent: 0 = closed, 100 = open.

pub mod atomic;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod estimator;
pub mod feed;
pub mod hw_error;
pub mod mocks;
pub mod persist;
pub mod runner;
pub mod status;
pub mod util;

pub use builder::{ControllerBuilder, Cover, Missing, Set, build_controller};
pub use config::{ControlCfg, TiltCfg, TravelCfg};
pub use controller::{CommandOutcome, MotionController, Phase, PollSubscription, ReconcileOutcome};
pub use error::{AbortReason, BuildError, CoverError, Result};
pub use estimator::{Direction, MotionState, PositionEstimator, TravelRange};
pub use status::TickStatus;
