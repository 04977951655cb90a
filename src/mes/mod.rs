//! MES machine panel: status buttons, the operation stopwatch and the
//! background workers that keep the display and the server in step.

pub mod clock;
pub mod format;
pub mod panel;
pub mod runtime;
pub mod status;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use format::format_hms;
pub use panel::{
    InfoRow, MachinePanel, PanelContext, PanelError, PanelView, ProductionBackend, StatusChange,
    SyncOutcome,
};
pub use runtime::{PanelRuntime, RuntimeOptions};
pub use status::{NO_TIMER_STATUS_NOS, StatusButton, status_buttons, status_has_timer};
pub use tracker::{ElapsedTracker, TimerState, TrackerSnapshot};
