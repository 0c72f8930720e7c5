//! Cover assembly and command execution: config mapping, switch backend,
//! restore, poll loop and persistence.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use blinds_core::error::{AbortReason, Result as CoreResult};
use blinds_core::feed::SwitchWatcher;
use blinds_core::runner::{RunParams, RunSummary, run_until_idle};
use blinds_core::{CommandOutcome, ControlCfg, Cover, Direction, TiltCfg, TravelCfg};
use blinds_traits::{Actuator, CoverState, StatePublisher, SwitchEvent};
use crossbeam_channel as xch;
use eyre::WrapErr;

use crate::cli::{Commands, LAST_MAX_RUN_MS};

pub fn abort_reason_name(r: &AbortReason) -> &'static str {
    match r {
        AbortReason::Shutdown => "Shutdown",
        AbortReason::MaxRuntime => "MaxRuntime",
        AbortReason::Unavailable => "Unavailable",
    }
}

fn outcome_name(o: CommandOutcome) -> &'static str {
    match o {
        CommandOutcome::Moving(Direction::Up) => "moving_up",
        CommandOutcome::Moving(Direction::Down) => "moving_down",
        CommandOutcome::AtTarget => "at_target",
        CommandOutcome::Busy => "busy",
    }
}

/// Publishes every state change to the log; the CLI prints the final state itself.
struct LogPublisher;

impl StatePublisher for LogPublisher {
    fn publish(&mut self, state: &CoverState) {
        tracing::debug!(
            position = state.position,
            tilt = ?state.tilt_position,
            opening = state.is_opening,
            closing = state.is_closing,
            available = state.available,
            "state"
        );
    }
}

/// Result of one CLI command.
pub struct Report {
    pub name: String,
    pub command: &'static str,
    pub backend: &'static str,
    pub outcome: Option<CommandOutcome>,
    pub summary: Option<RunSummary>,
    pub state: CoverState,
}

struct Backend {
    actuator: Box<dyn Actuator + Send>,
    name: &'static str,
    _watcher: Option<SwitchWatcher>,
}

/// Simulated outputs echo each change into the event channel, the way the
/// host reports a commanded switch back. `BLINDS_SIM_UNAVAILABLE=up|down`
/// makes one switch refuse commands.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_backend(_cfg: &blinds_config::Config, tx: xch::Sender<SwitchEvent>) -> CoreResult<Backend> {
    use blinds_hardware::SimulatedSwitches;
    use blinds_traits::SwitchId;

    let mut sim = SimulatedSwitches::new().with_echo(move |ev| {
        // receiver gone only after the run is over
        let _ = tx.send(ev);
    });
    match std::env::var("BLINDS_SIM_UNAVAILABLE").as_deref() {
        Ok("up") => sim.set_unavailable(Some(SwitchId::Up)),
        Ok("down") => sim.set_unavailable(Some(SwitchId::Down)),
        _ => {}
    }
    Ok(Backend {
        actuator: Box::new(sim),
        name: "simulated",
        _watcher: None,
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_backend(cfg: &blinds_config::Config, tx: xch::Sender<SwitchEvent>) -> CoreResult<Backend> {
    let pins = &cfg.pins;
    let sense = pins.up_sense.zip(pins.down_sense);
    let (relays, buttons) =
        blinds_hardware::relay::open(pins.up_relay, pins.down_relay, pins.active_low, sense)
            .map_err(|e| eyre::eyre!("open relay pins: {e}"))?;
    tracing::info!(
        up = pins.up_relay,
        down = pins.down_relay,
        active_low = pins.active_low,
        "relay outputs ready"
    );
    let watcher = buttons.map(|b| {
        SwitchWatcher::spawn(
            b,
            std::time::Duration::from_millis(cfg.feed.poll_ms),
            blinds_traits::clock::MonotonicClock::new(),
            tx,
        )
    });
    Ok(Backend {
        actuator: Box::new(relays),
        name: "relay",
        _watcher: watcher,
    })
}

fn state_path(cfg: &blinds_config::Config) -> Option<PathBuf> {
    cfg.state.file.as_deref().map(PathBuf::from)
}

pub fn run_command(
    cfg: &blinds_config::Config,
    cmd: Commands,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<Report> {
    let travel: TravelCfg = (&cfg.travel).into();
    let tilt: TiltCfg = (&cfg.tilt).into();
    let control: ControlCfg = (&cfg.control).into();
    let name = if cfg.cover.name.trim().is_empty() {
        "cover".to_string()
    } else {
        cfg.cover.name.clone()
    };

    let (tx, rx) = xch::unbounded::<SwitchEvent>();
    let backend = open_backend(cfg, tx)?;

    let mut cover = Cover::builder()
        .with_actuator(backend.actuator)
        .with_publisher(LogPublisher)
        .with_travel(travel)
        .with_tilt(tilt)
        .with_control(control)
        .with_name(name.clone())
        .build()?;

    let state_file = state_path(cfg);
    if let Some(path) = state_file.as_deref()
        && let Some(saved) = blinds_core::persist::load(path)?
    {
        cover.restore(saved);
    }

    tracing::info!(cover = %name, command = cmd.name(), backend = backend.name, "command start");
    let outcome = match cmd {
        Commands::Open => Some(cover.open()?),
        Commands::Close => Some(cover.close()?),
        Commands::SetPosition { position } => Some(cover.set_position(position)?),
        Commands::OpenTilt => Some(cover.open_tilt()?),
        Commands::CloseTilt => Some(cover.close_tilt()?),
        Commands::SetTilt { position } => Some(cover.set_tilt_position(position)?),
        Commands::Stop => {
            cover.stop()?;
            None
        }
        Commands::SetKnownPosition { position } => {
            cover.set_known_position(position)?;
            None
        }
        Commands::SetKnownTilt { position } => {
            cover.set_known_tilt_position(position)?;
            None
        }
        Commands::Status | Commands::SelfCheck => None,
    };

    let mut summary = None;
    if cover.is_polling() {
        let params = RunParams::from_cfg(&travel, &tilt, &control);
        let _ = LAST_MAX_RUN_MS.set(blinds_core::util::as_millis_u64(params.max_run));
        let run = run_until_idle(&mut cover, &rx, &shutdown, &params);
        // Keep whatever the estimate is, even after an abort.
        if let Err(e) = &run {
            save_state(state_file.as_ref(), &cover)
                .unwrap_or_else(|se| tracing::warn!(error = %se, "could not save state after abort"));
            tracing::error!(error = %e, "run aborted");
        }
        summary = Some(run?);
    }

    if !matches!(cmd, Commands::Status | Commands::SelfCheck) {
        save_state(state_file.as_ref(), &cover)?;
    }

    Ok(Report {
        name,
        command: cmd.name(),
        backend: backend.name,
        outcome,
        summary,
        state: cover.state(),
    })
}

fn save_state(path: Option<&PathBuf>, cover: &Cover) -> CoreResult<()> {
    match path {
        Some(p) => blinds_core::persist::save(p, &cover.snapshot()).wrap_err("persist position"),
        None => Ok(()),
    }
}

pub fn print_report(r: &Report, json: bool) {
    if json {
        let obj = serde_json::json!({
            "cover": r.name,
            "command": r.command,
            "backend": r.backend,
            "outcome": r.outcome.map(outcome_name),
            "position": r.state.position,
            "tilt_position": r.state.tilt_position,
            "is_opening": r.state.is_opening,
            "is_closing": r.state.is_closing,
            "is_closed": r.state.is_closed,
            "available": r.state.available,
            "ticks": r.summary.map(|s| s.ticks),
            "elapsed_ms": r.summary.map(|s| blinds_core::util::as_millis_u64(s.elapsed)),
        });
        println!("{obj}");
        return;
    }

    if r.command == "self-check" {
        println!("OK ({} backend, {})", r.backend, r.name);
        return;
    }
    let mut line = format!("{}: position {}", r.name, r.state.position);
    if let Some(t) = r.state.tilt_position {
        line.push_str(&format!(", tilt {t}"));
    }
    line.push_str(if r.state.is_closed { " (closed)" } else { " (open)" });
    if let Some(o) = r.outcome {
        line.push_str(&format!(" [{}]", outcome_name(o)));
    }
    if let Some(s) = r.summary {
        line.push_str(&format!(" in {:.1}s", s.elapsed.as_secs_f64()));
    }
    println!("{line}");
}
