//! Machine statuses as offered on the machine panel.

use crate::models::MachineStatus;

/// Status numbers that stop the operation timer: end of operation, end of
/// shift and order change.
pub const NO_TIMER_STATUS_NOS: [i64; 3] = [5, 6, 7];

/// Whether switching to a status with this number runs the operation timer.
pub fn status_has_timer(status_no: Option<i64>) -> bool {
    !status_no.is_some_and(|no| NO_TIMER_STATUS_NOS.contains(&no))
}

/// A selectable status on the panel.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusButton {
    pub id: i64,
    pub status_no: Option<i64>,
    pub label: String,
    pub color: String,
    pub has_timer: bool,
}

impl StatusButton {
    pub fn from_status(status: &MachineStatus) -> Self {
        Self {
            id: status.id,
            status_no: status.status_no,
            label: status.name.clone(),
            color: status
                .color
                .clone()
                .filter(|color| !color.trim().is_empty())
                .unwrap_or_else(|| "blue".to_string()),
            has_timer: status_has_timer(status.status_no),
        }
    }
}

/// Buttons for `statuses`, ordered by status number (missing numbers as 0).
pub fn status_buttons(statuses: &[MachineStatus]) -> Vec<StatusButton> {
    let mut buttons: Vec<StatusButton> = statuses.iter().map(StatusButton::from_status).collect();
    buttons.sort_by_key(|button| button.status_no.unwrap_or(0));
    buttons
}
