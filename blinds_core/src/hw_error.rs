//! Maps `Box<dyn Error>` from the actuator port to typed `CoverError`.
//!
//! The traits in `blinds_traits` use `Box<dyn Error + Send + Sync>`; this
//! module recovers a typed error, with a feature-gated path that downcasts
//! `blinds_hardware::HwError` directly.

use crate::error::CoverError;

/// Map a trait-boundary error to a typed `CoverError`.
///
/// Known hardware error types are downcast first; anything else falls back
/// to a string heuristic.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> CoverError {
    #[cfg(feature = "hardware-errors")]
    {
        use blinds_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Unavailable(switch) => CoverError::SwitchUnavailable((*switch).to_string()),
                HwError::Io(io) => CoverError::Io(io.to_string()),
                other => CoverError::ActuatorFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("unavailable") {
        CoverError::SwitchUnavailable(s)
    } else {
        CoverError::Actuator(s)
    }
}
