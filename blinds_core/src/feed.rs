//! Background switch watcher.
//!
//! Spawns a thread that owns a `SwitchSense`, polls both lines at a fixed
//! period and sends only changes into the controller's event channel. A read
//! error is reported once as `SwitchState::Unavailable`.
//!
//! Each `SwitchWatcher` owns exactly one thread, shut down and joined on drop.
use crossbeam_channel as xch;
use blinds_traits::clock::Clock;
use blinds_traits::{SwitchEvent, SwitchId, SwitchSense, SwitchState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub struct SwitchWatcher {
    sent: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SwitchWatcher {
    pub fn spawn<S, C>(mut sense: S, period: Duration, clock: C, tx: xch::Sender<SwitchEvent>) -> Self
    where
        S: SwitchSense + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let sent = Arc::new(AtomicU64::new(0));
        let sent_clone = sent.clone();

        let join_handle = std::thread::spawn(move || {
            // outputs start released
            let mut last = [SwitchState::Off, SwitchState::Off];
            'poll: loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("switch watcher received shutdown signal");
                    break;
                }

                for (i, switch) in [SwitchId::Up, SwitchId::Down].into_iter().enumerate() {
                    let state = match sense.read(switch) {
                        Ok(s) => s,
                        Err(e) => {
                            if last[i] != SwitchState::Unavailable {
                                tracing::warn!(%switch, error = %e, "switch sense failed");
                            }
                            SwitchState::Unavailable
                        }
                    };
                    if state == last[i] {
                        continue;
                    }
                    last[i] = state;
                    // consumer gone; exit
                    if tx.send(SwitchEvent::new(switch, state)).is_err() {
                        tracing::debug!("switch watcher consumer disconnected, exiting thread");
                        break 'poll;
                    }
                    sent_clone.fetch_add(1, Ordering::Relaxed);
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("switch watcher thread exiting cleanly");
        });

        Self {
            sent,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Number of change events sent so far.
    pub fn events_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Drop for SwitchWatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("switch watcher joined"),
                Err(e) => tracing::warn!(?e, "switch watcher panicked during shutdown"),
            }
        }
    }
}
