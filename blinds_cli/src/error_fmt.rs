//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_MAX_RUN_MS;
use crate::cover::abort_reason_name;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use blinds_core::error::{AbortReason, BuildError, CoverError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No switch backend was provided to the controller.\nLikely causes: Relay outputs failed to initialize or were not wired into the builder.\nHow to fix: Ensure the switches are created successfully and passed via with_actuator(...).".to_string()
            }
            BuildError::MissingPublisher => {
                "What happened: No state publisher was provided to the controller.\nLikely causes: The builder was not fully configured.\nHow to fix: Pass a publisher via with_publisher(...).".to_string()
            }
            BuildError::MissingTravel => {
                "What happened: Travel times not set.\nLikely causes: The [travel] section was not mapped into the builder.\nHow to fix: Set travel.up_s and travel.down_s in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CoverError>() {
        return match ce {
            CoverError::Abort(AbortReason::Shutdown) => "What happened: Interrupted; the cover was stopped.\nLikely causes: Ctrl-C or a termination signal during travel.\nHow to fix: Nothing to fix. The estimated position was saved; run the command again to continue.".to_string(),
            CoverError::Abort(AbortReason::MaxRuntime) => "What happened: max run time was exceeded; the cover was stopped.\nLikely causes: Switch feedback kept the motor running, or travel times are far too short.\nHow to fix: Check travel.up_s/down_s against a stopwatch run, or raise control.max_run_factor.".to_string(),
            CoverError::Abort(AbortReason::Unavailable) => "What happened: The cover became unavailable during travel.\nLikely causes: A switch stopped reporting its state.\nHow to fix: Check the switch wiring or host; then recalibrate with set-known-position.".to_string(),
            CoverError::SwitchUnavailable(msg) => format!(
                "What happened: A switch is unavailable ({msg}).\nLikely causes: Relay board unpowered, wrong pins, or the host lost the switch entity.\nHow to fix: Check [pins] / [switches] in the config and the wiring, then retry."
            ),
            CoverError::ActuatorFault(msg) => format!(
                "What happened: The switch backend rejected a command ({msg}).\nLikely causes: Both outputs energized or a GPIO error.\nHow to fix: Run `blinds stop`, check the relay board, then retry."
            ),
            CoverError::TiltUnsupported => "What happened: This cover has no tilt axis.\nLikely causes: tilt.open_s / tilt.closed_s are zero or missing.\nHow to fix: Configure both tilt times to enable tilt commands.".to_string(),
            CoverError::InvalidPosition(p) => format!(
                "What happened: Position {p} is out of range.\nLikely causes: Typo in --position.\nHow to fix: Use a value from 0 (closed) to 100 (open)."
            ),
            CoverError::Io(msg) => format!(
                "What happened: File access failed ({msg}).\nLikely causes: Missing directory or no write permission for the state file.\nHow to fix: Check state.file in the config and its directory permissions."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open relay pins") {
        return "What happened: Failed to initialize the relay outputs.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path.\nHow to fix: Pass --config pointing at an existing TOML file. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("must") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Missing [switches]/[travel] sections or out-of-range values.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map AbortReason (if present) to stable exit codes; other errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use blinds_core::error::{AbortReason, CoverError};
    if let Some(CoverError::Abort(reason)) = err.downcast_ref::<CoverError>() {
        return match reason {
            AbortReason::Unavailable => 3,
            AbortReason::MaxRuntime => 4,
            AbortReason::Shutdown => 130,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use blinds_core::error::{AbortReason, CoverError};
    use serde_json::json;

    if let Some(CoverError::Abort(reason)) = err.downcast_ref::<CoverError>() {
        let msg = humanize(err);
        let reason_name = abort_reason_name(reason);
        let detail = match reason {
            AbortReason::MaxRuntime => LAST_MAX_RUN_MS.get().map(|ms| json!({ "max_run_ms": ms })),
            _ => None,
        };
        let obj = if let Some(d) = detail {
            json!({ "reason": reason_name, "details": d, "message": msg })
        } else {
            json!({ "reason": reason_name, "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
