//! Background workers for an open machine panel: a display tick and the
//! periodic server sync.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::mes::panel::{MachinePanel, PanelError, PanelView, SyncOutcome};
use crate::mes::status::StatusButton;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub tick_interval: Duration,
    pub sync_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Thread that runs `tick` every `interval` until stopped.
struct IntervalWorker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalWorker {
    fn spawn(
        name: &str,
        interval: Duration,
        mut tick: impl FnMut() + Send + 'static,
    ) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(format!("mouldtrack-{name}"))
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;
        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("Panel worker panicked");
        }
    }
}

/// Machine panel with its tick and sync workers. Dropping it stops and joins
/// both workers; no callback or request fires afterwards.
pub struct PanelRuntime {
    panel: Arc<Mutex<MachinePanel>>,
    workers: Vec<IntervalWorker>,
}

impl PanelRuntime {
    /// Start the workers. `on_tick` receives a fresh view every tick interval.
    pub fn start(
        panel: MachinePanel,
        options: RuntimeOptions,
        mut on_tick: impl FnMut(&PanelView) + Send + 'static,
    ) -> io::Result<Self> {
        let panel = Arc::new(Mutex::new(panel));
        let mut runtime = Self {
            panel: Arc::clone(&panel),
            workers: Vec::with_capacity(2),
        };

        let tick_panel = Arc::clone(&panel);
        runtime.workers.push(IntervalWorker::spawn(
            "panel-tick",
            options.tick_interval,
            move || {
                let view = lock(&tick_panel).view();
                on_tick(&view);
            },
        )?);

        let sync_panel = Arc::clone(&panel);
        runtime.workers.push(IntervalWorker::spawn(
            "panel-sync",
            options.sync_interval,
            move || {
                sync_once(&sync_panel);
            },
        )?);

        tracing::info!(
            "Machine panel started (tick={:?}, sync={:?})",
            options.tick_interval,
            options.sync_interval
        );
        Ok(runtime)
    }

    /// Switch status. The timer moves under the lock; the requests are sent
    /// after it is released so ticks keep flowing.
    pub fn select_status(&self, status_id: i64) -> Result<StatusButton, PanelError> {
        let (change, backend) = {
            let mut panel = lock(&self.panel);
            let change = panel.begin_status_change(status_id)?;
            (change, panel.backend())
        };
        change.persist(backend.as_ref());
        Ok(change.button)
    }

    pub fn view(&self) -> PanelView {
        lock(&self.panel).view()
    }

    /// Run a sync right away instead of waiting for the interval.
    pub fn sync_now(&self) -> SyncOutcome {
        sync_once(&self.panel)
    }

    pub fn shutdown(&mut self) {
        for mut worker in self.workers.drain(..) {
            worker.stop();
        }
    }
}

impl Drop for PanelRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sync_once(panel: &Mutex<MachinePanel>) -> SyncOutcome {
    let (operation_id, backend) = {
        let guard = lock(panel);
        match guard.pending_sync() {
            Some(operation_id) => (operation_id, guard.backend()),
            None => return SyncOutcome::Skipped,
        }
    };
    let result = backend.recalculate_operation(operation_id);
    lock(panel).record_sync(result)
}

fn lock(panel: &Mutex<MachinePanel>) -> MutexGuard<'_, MachinePanel> {
    panel.lock().unwrap_or_else(|err| err.into_inner())
}
