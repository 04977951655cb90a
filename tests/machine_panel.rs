use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mouldtrack::api::ApiError;
use mouldtrack::mes::{
    MachinePanel, ManualClock, PanelContext, PanelRuntime, ProductionBackend, RuntimeOptions,
    SyncOutcome,
};
use mouldtrack::models::{
    MachineStatus, Operation, OperationLogEntry, Order, Task, Workstation,
    WorkstationStatusUpdate,
};

const WORKING: i64 = 11;
const SETUP: i64 = 12;
const FINISHED: i64 = 15;

#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    recalculations: AtomicUsize,
}

impl FakeBackend {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProductionBackend for FakeBackend {
    fn update_workstation(
        &self,
        workstation_id: i64,
        update: &WorkstationStatusUpdate,
    ) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(format!(
            "put {workstation_id} status={} task={:?}",
            update.status_id, update.current_task_id
        ));
        Ok(())
    }

    fn create_log(&self, entry: &OperationLogEntry) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("log {} {}", entry.operation_id, entry.note));
        Ok(())
    }

    fn recalculate_operation(&self, _operation_id: i64) -> Result<(), ApiError> {
        self.recalculations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn status(id: i64, status_no: i64, name: &str) -> MachineStatus {
    MachineStatus {
        id,
        status_no: Some(status_no),
        name: name.to_string(),
        color: None,
    }
}

fn context() -> PanelContext {
    PanelContext::resolve(
        7,
        vec![Operation {
            id: 7,
            task_id: Some(3),
            workstation_id: Some(2),
            duration_total_min: Some(10.0),
            duration_shift_min: Some(2.0),
            ..Operation::default()
        }],
        vec![Task {
            id: 3,
            order_id: Some(9),
            detail_number: Some("D-14".into()),
            detail_name: Some("Insert".into()),
        }],
        vec![Order {
            id: 9,
            order_number: Some("ZP/9".into()),
            team: None,
            product_name: Some("Cap".into()),
        }],
        vec![Workstation {
            id: 2,
            name: "Press 2".into(),
            status_id: Some(FINISHED),
            ..Workstation::default()
        }],
        vec![
            status(FINISHED, 5, "Finished"),
            status(WORKING, 1, "Working"),
            status(SETUP, 2, "Setup"),
        ],
    )
    .expect("operation 7 resolves")
}

fn panel() -> (MachinePanel, Arc<ManualClock>, Arc<FakeBackend>) {
    let clock = Arc::new(ManualClock::new());
    let backend = Arc::new(FakeBackend::default());
    let panel = MachinePanel::new(context(), Some(4), backend.clone(), clock.clone());
    (panel, clock, backend)
}

#[test]
fn opens_idle_on_server_totals() {
    let (panel, clock, backend) = panel();
    clock.advance(Duration::from_secs(30));
    let view = panel.view();
    assert!(!view.snapshot.running);
    assert_eq!(view.operation_clock(), "00:10:00");
    assert_eq!(view.status_clock(), "00:02:00");
    assert_eq!(view.active_status.map(|button| button.id), Some(FINISHED));
    assert_eq!(view.info_rows[0].value, "ZP/9 | — | Cap");
    assert!(backend.calls().is_empty());
}

#[test]
fn no_timer_status_freezes_operation_time() {
    let (mut panel, clock, backend) = panel();
    panel.select_status(WORKING).unwrap();
    clock.advance(Duration::from_millis(5_000));
    assert_eq!(panel.snapshot().operation_elapsed, Duration::from_millis(605_000));

    panel.select_status(FINISHED).unwrap();
    let snapshot = panel.snapshot();
    assert_eq!(snapshot.operation_elapsed, Duration::from_millis(605_000));
    assert_eq!(snapshot.status_elapsed, Duration::ZERO);
    assert!(!snapshot.running);

    clock.advance(Duration::from_secs(60));
    let snapshot = panel.snapshot();
    assert_eq!(snapshot.operation_elapsed, Duration::from_millis(605_000));
    assert_eq!(snapshot.status_elapsed, Duration::from_secs(60));
    assert_eq!(
        backend.calls(),
        vec![
            "put 2 status=11 task=Some(3)",
            "log 7 Working",
            "put 2 status=15 task=None",
            "log 7 Finished",
        ]
    );
}

#[test]
fn instant_switches_add_no_time() {
    let (mut panel, _clock, _backend) = panel();
    panel.select_status(WORKING).unwrap();
    panel.select_status(SETUP).unwrap();
    let snapshot = panel.snapshot();
    assert!(snapshot.running);
    assert_eq!(snapshot.operation_elapsed, Duration::from_secs(600));
    assert_eq!(snapshot.status_elapsed, Duration::ZERO);
}

#[test]
fn sync_only_runs_while_timing() {
    let (mut panel, _clock, backend) = panel();
    assert_eq!(panel.sync(), SyncOutcome::Skipped);
    panel.select_status(WORKING).unwrap();
    assert_eq!(panel.sync(), SyncOutcome::Synced);
    assert_eq!(backend.recalculations.load(Ordering::SeqCst), 1);
}

#[test]
fn runtime_stops_ticking_after_drop() {
    let (panel, _clock, backend) = panel();
    let ticks = Arc::new(AtomicUsize::new(0));
    let tick_counter = Arc::clone(&ticks);
    let runtime = PanelRuntime::start(
        panel,
        RuntimeOptions {
            tick_interval: Duration::from_millis(5),
            sync_interval: Duration::from_millis(5),
        },
        move |_view| {
            tick_counter.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();
    runtime.select_status(WORKING).unwrap();
    thread::sleep(Duration::from_millis(100));
    drop(runtime);

    let ticks_at_drop = ticks.load(Ordering::SeqCst);
    let syncs_at_drop = backend.recalculations.load(Ordering::SeqCst);
    assert!(ticks_at_drop > 0);
    assert!(syncs_at_drop > 0);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(ticks.load(Ordering::SeqCst), ticks_at_drop);
    assert_eq!(backend.recalculations.load(Ordering::SeqCst), syncs_at_drop);
}
