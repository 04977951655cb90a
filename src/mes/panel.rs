//! Machine panel controller: one open operation, its workstation and the
//! status buttons, with the elapsed-time tracker driving the display.

use std::sync::Arc;

use crate::api::ApiError;
use crate::mes::clock::Clock;
use crate::mes::format::format_hms;
use crate::mes::status::{StatusButton, status_buttons};
use crate::mes::tracker::{ElapsedTracker, TrackerSnapshot};
use crate::models::{
    MachineStatus, Operation, OperationLogEntry, Order, Task, Workstation, WorkstationStatusUpdate,
};

const BLANK: &str = "—";

/// Backend calls the panel makes. Implemented by [`crate::api::ApiClient`].
pub trait ProductionBackend: Send + Sync {
    fn update_workstation(
        &self,
        workstation_id: i64,
        update: &WorkstationStatusUpdate,
    ) -> Result<(), ApiError>;
    fn create_log(&self, entry: &OperationLogEntry) -> Result<(), ApiError>;
    fn recalculate_operation(&self, operation_id: i64) -> Result<(), ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Unknown machine status {0}")]
    UnknownStatus(i64),
}

/// Everything loaded for one operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelContext {
    pub operation: Operation,
    pub task: Option<Task>,
    pub order: Option<Order>,
    pub workstation: Option<Workstation>,
    pub statuses: Vec<MachineStatus>,
}

impl PanelContext {
    /// Link `operation_id` to its task, order and workstation. `None` when the
    /// operation is not among `operations`.
    pub fn resolve(
        operation_id: i64,
        operations: Vec<Operation>,
        tasks: Vec<Task>,
        orders: Vec<Order>,
        workstations: Vec<Workstation>,
        statuses: Vec<MachineStatus>,
    ) -> Option<Self> {
        let operation = operations.into_iter().find(|op| op.id == operation_id)?;
        let task = operation
            .task_id
            .and_then(|task_id| tasks.into_iter().find(|task| task.id == task_id));
        let order = task
            .as_ref()
            .and_then(|task| task.order_id)
            .and_then(|order_id| orders.into_iter().find(|order| order.id == order_id));
        let workstation = operation.workstation_id.and_then(|workstation_id| {
            workstations
                .into_iter()
                .find(|workstation| workstation.id == workstation_id)
        });
        Some(Self {
            operation,
            task,
            order,
            workstation,
            statuses,
        })
    }

    pub fn status_buttons(&self) -> Vec<StatusButton> {
        status_buttons(&self.statuses)
    }

    /// `"{order_number} | {team} | {product}"`, blanks shown as a dash.
    pub fn order_label(&self) -> String {
        match &self.order {
            Some(order) => format!(
                "{} | {} | {}",
                order.order_number.as_deref().unwrap_or(""),
                or_blank(order.team.as_deref()),
                or_blank(order.product_name.as_deref())
            ),
            None => BLANK.to_string(),
        }
    }

    pub fn info_rows(&self) -> Vec<InfoRow> {
        let order = self.order.as_ref();
        let task = self.task.as_ref();
        let operation_no = self
            .operation
            .operation_no
            .as_ref()
            .map(crate::listing::fields::value_text)
            .unwrap_or_default();
        vec![
            InfoRow::new("Order", self.order_label()),
            InfoRow::new("Product", or_blank(order.and_then(|o| o.product_name.as_deref()))),
            InfoRow::new("Team", or_blank(order.and_then(|o| o.team.as_deref()))),
            InfoRow::new("Detail no.", or_blank(task.and_then(|t| t.detail_number.as_deref()))),
            InfoRow::new("Detail", or_blank(task.and_then(|t| t.detail_name.as_deref()))),
            InfoRow::new("Operation no.", or_blank(Some(&operation_no))),
            InfoRow::new(
                "Workstation",
                or_blank(self.workstation.as_ref().map(|ws| ws.name.as_str())),
            ),
        ]
    }
}

fn or_blank(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => BLANK.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

impl InfoRow {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// Requests produced by a status change, sent after the local timer moved.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusChange {
    pub button: StatusButton,
    pub workstation_id: Option<i64>,
    pub update: Option<WorkstationStatusUpdate>,
    pub log: Option<OperationLogEntry>,
}

impl StatusChange {
    /// Send the workstation update and then the operation log. Failures are
    /// logged. The log entry is skipped only when the update never reached
    /// the server; an update rejected with an HTTP error is still logged.
    pub fn persist(&self, backend: &dyn ProductionBackend) {
        let (Some(workstation_id), Some(update)) = (self.workstation_id, &self.update) else {
            tracing::debug!("No workstation for status {}; nothing to persist", self.button.id);
            return;
        };
        if let Err(err) = backend.update_workstation(workstation_id, update) {
            tracing::warn!("Failed to update workstation {workstation_id} status: {err}");
            if matches!(err, ApiError::Transport(_)) {
                return;
            }
        }
        if let Some(entry) = &self.log
            && let Err(err) = backend.create_log(entry)
        {
            tracing::warn!(
                "Failed to log status {} for operation {}: {err}",
                entry.status_id,
                entry.operation_id
            );
        }
    }
}

/// What a periodic sync did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Timer not running; nothing sent.
    Skipped,
    Synced,
    Failed { consecutive: u32 },
}

/// Rendered panel state at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelView {
    pub info_rows: Vec<InfoRow>,
    pub active_status: Option<StatusButton>,
    pub snapshot: TrackerSnapshot,
}

impl PanelView {
    pub fn operation_clock(&self) -> String {
        format_hms(self.snapshot.operation_elapsed)
    }

    pub fn status_clock(&self) -> String {
        format_hms(self.snapshot.status_elapsed)
    }
}

pub struct MachinePanel {
    context: PanelContext,
    buttons: Vec<StatusButton>,
    tracker: ElapsedTracker,
    active_status_id: Option<i64>,
    user_id: Option<i64>,
    backend: Arc<dyn ProductionBackend>,
    clock: Arc<dyn Clock>,
    sync_failures: u32,
}

impl MachinePanel {
    /// Panel for a loaded context. The active status starts as the
    /// workstation's current one with the timer stopped.
    pub fn new(
        context: PanelContext,
        user_id: Option<i64>,
        backend: Arc<dyn ProductionBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = ElapsedTracker::from_minutes(
            context.operation.duration_total_min,
            context.operation.duration_shift_min,
        );
        let buttons = context.status_buttons();
        let active_status_id = context
            .workstation
            .as_ref()
            .and_then(|workstation| workstation.status_id);
        Self {
            context,
            buttons,
            tracker,
            active_status_id,
            user_id,
            backend,
            clock,
            sync_failures: 0,
        }
    }

    pub fn context(&self) -> &PanelContext {
        &self.context
    }

    pub fn buttons(&self) -> &[StatusButton] {
        &self.buttons
    }

    pub fn operation_id(&self) -> i64 {
        self.context.operation.id
    }

    pub fn backend(&self) -> Arc<dyn ProductionBackend> {
        Arc::clone(&self.backend)
    }

    pub fn active_status(&self) -> Option<&StatusButton> {
        let active = self.active_status_id?;
        self.buttons.iter().find(|button| button.id == active)
    }

    pub fn is_running(&self) -> bool {
        self.tracker.is_running()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.tracker.snapshot(self.clock.now())
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            info_rows: self.context.info_rows(),
            active_status: self.active_status().cloned(),
            snapshot: self.snapshot(),
        }
    }

    /// Move the local timer to `status_id` and build the requests that record
    /// the change. Nothing is sent.
    pub fn begin_status_change(&mut self, status_id: i64) -> Result<StatusChange, PanelError> {
        let button = self
            .buttons
            .iter()
            .find(|button| button.id == status_id)
            .cloned()
            .ok_or(PanelError::UnknownStatus(status_id))?;
        self.tracker.select_status(button.has_timer, self.clock.now());
        self.active_status_id = Some(button.id);
        tracing::info!(
            "Operation {} switched to status {} ({})",
            self.context.operation.id,
            button.id,
            button.label
        );

        let Some(workstation) = self.context.workstation.as_mut() else {
            return Ok(StatusChange {
                button,
                workstation_id: None,
                update: None,
                log: None,
            });
        };
        let update = WorkstationStatusUpdate {
            name: workstation.name.clone(),
            cost_center: workstation
                .cost_center
                .clone()
                .filter(|cost_center| !cost_center.is_empty()),
            status_id: button.id,
            current_task_id: if button.has_timer {
                self.context.operation.task_id
            } else {
                None
            },
            user_id: self.user_id,
        };
        workstation.status_id = Some(update.status_id);
        workstation.current_task_id = update.current_task_id;
        let log = OperationLogEntry {
            operation_id: self.context.operation.id,
            status_id: button.id,
            workstation_id: workstation.id,
            user_id: self.user_id,
            note: button.label.clone(),
        };
        Ok(StatusChange {
            button,
            workstation_id: Some(workstation.id),
            update: Some(update),
            log: Some(log),
        })
    }

    /// Switch status and persist it through the panel's backend.
    pub fn select_status(&mut self, status_id: i64) -> Result<StatusButton, PanelError> {
        let change = self.begin_status_change(status_id)?;
        change.persist(self.backend.as_ref());
        Ok(change.button)
    }

    /// Operation to recalculate on the next sync, if the timer is running.
    pub fn pending_sync(&self) -> Option<i64> {
        self.is_running().then_some(self.context.operation.id)
    }

    pub fn record_sync(&mut self, result: Result<(), ApiError>) -> SyncOutcome {
        match result {
            Ok(()) => {
                if self.sync_failures > 0 {
                    tracing::info!(
                        "Operation {} sync recovered after {} failure(s)",
                        self.context.operation.id,
                        self.sync_failures
                    );
                }
                self.sync_failures = 0;
                SyncOutcome::Synced
            }
            Err(err) => {
                self.sync_failures = self.sync_failures.saturating_add(1);
                tracing::warn!(
                    "Operation {} sync failed ({} in a row): {err}",
                    self.context.operation.id,
                    self.sync_failures
                );
                SyncOutcome::Failed {
                    consecutive: self.sync_failures,
                }
            }
        }
    }

    /// Ask the server to recalculate the operation totals while running.
    pub fn sync(&mut self) -> SyncOutcome {
        let Some(operation_id) = self.pending_sync() else {
            return SyncOutcome::Skipped;
        };
        let result = self.backend.recalculate_operation(operation_id);
        self.record_sync(result)
    }
}

#[cfg(test)]
pub(crate) mod test_backend {
    use super::*;
    use std::sync::Mutex;

    /// Backend that records calls and optionally fails them.
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub(crate) calls: Mutex<Vec<String>>,
        pub(crate) fail: Mutex<bool>,
        /// Fail with a transport error instead of an HTTP status.
        pub(crate) unreachable: Mutex<bool>,
    }

    impl RecordingBackend {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            if *self.unreachable.lock().unwrap() {
                Err(ApiError::Transport("connection refused".into()))
            } else if *self.fail.lock().unwrap() {
                Err(ApiError::Server("unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    impl ProductionBackend for RecordingBackend {
        fn update_workstation(
            &self,
            workstation_id: i64,
            update: &WorkstationStatusUpdate,
        ) -> Result<(), ApiError> {
            self.record(format!(
                "update {workstation_id} status={} task={:?}",
                update.status_id, update.current_task_id
            ))
        }

        fn create_log(&self, entry: &OperationLogEntry) -> Result<(), ApiError> {
            self.record(format!("log {} {}", entry.operation_id, entry.note))
        }

        fn recalculate_operation(&self, operation_id: i64) -> Result<(), ApiError> {
            self.record(format!("recalculate {operation_id}"))
        }
    }
}
