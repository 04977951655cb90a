//! Orderings used by the list views.
//!
//! Every preset sorts in place with a stable sort, so rows that compare equal
//! keep the order the server returned them in.

use std::cmp::Ordering;

use serde_json::Value;

use super::fields::{pick_first, record_id, sortable_time, truthy, value_number};

/// Keys consulted, in order, for a row's "last touched" timestamp.
pub const TIME_KEYS: [&str; 5] = ["changed", "updated", "created", "created_at", "timestamp"];
/// Keys consulted, in order, for a calendar entry's timestamp.
pub const CALENDAR_TIME_KEYS: [&str; 3] = ["start_date", "created", "updated"];
/// Keys consulted for a TPM ticket's status.
pub const TPM_STATUS_KEYS: [&str; 3] = ["status", "state", "status_code"];
/// Keys consulted for a TPM ticket's id.
pub const TPM_ID_KEYS: [&str; 3] = ["id", "pk", "tpm_id"];

/// Rank of a TPM status: open, in progress, closed, rejected, then unknown.
pub fn status_rank(status: Option<&Value>) -> u8 {
    match status.and_then(value_number) {
        Some(n) if n == 0.0 => 0,
        Some(n) if n == 1.0 => 1,
        Some(n) if n == 2.0 => 2,
        Some(n) if n == 3.0 => 3,
        _ => 99,
    }
}

/// How "open" a row is; lower ranks sort first.
#[derive(Clone, Copy, Debug)]
pub enum OpenRank {
    /// No open/closed distinction.
    None,
    /// TPM status codes via [`status_rank`].
    Status(&'static [&'static str]),
    /// Rows whose flag is truthy come first.
    FlagSet(&'static str),
    /// Rows whose flag is falsy come first.
    FlagUnset(&'static str),
}

impl OpenRank {
    fn rank(self, row: &Value) -> u8 {
        match self {
            Self::None => 0,
            Self::Status(keys) => status_rank(pick_first(row, keys)),
            Self::FlagSet(key) => u8::from(!truthy(row.get(key))),
            Self::FlagUnset(key) => u8::from(truthy(row.get(key))),
        }
    }
}

/// Open rows first, then newest timestamp, then highest id.
#[derive(Clone, Copy, Debug)]
pub struct ListOrdering {
    pub open: OpenRank,
    pub time_keys: &'static [&'static str],
    pub id_keys: &'static [&'static str],
}

impl ListOrdering {
    /// TPM tickets: status rank, newest change, highest id.
    pub const TPM: Self = Self {
        open: OpenRank::Status(&TPM_STATUS_KEYS),
        time_keys: &TIME_KEYS,
        id_keys: &TPM_ID_KEYS,
    };

    /// Calendar entries: active first, latest start date, highest id.
    pub const CALENDAR: Self = Self {
        open: OpenRank::FlagSet("is_active"),
        time_keys: &CALENDAR_TIME_KEYS,
        id_keys: &["id"],
    };

    /// Changeovers: highest id only; open/done splitting happens in the pager.
    pub const CHANGEOVERS: Self = Self {
        open: OpenRank::None,
        time_keys: &[],
        id_keys: &["id"],
    };

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        self.open
            .rank(a)
            .cmp(&self.open.rank(b))
            .then_with(|| sortable_time(b, self.time_keys).cmp(&sortable_time(a, self.time_keys)))
            .then_with(|| record_id(b, self.id_keys).cmp(&record_id(a, self.id_keys)))
    }

    pub fn sort(&self, rows: &mut [Value]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

/// Flag marking a changeover as carried out.
pub const CHANGEOVER_DONE_KEY: &str = "czy_wykonano";

/// Whether a changeover row has been carried out.
pub fn changeover_is_done(row: &Value) -> bool {
    truthy(row.get(CHANGEOVER_DONE_KEY))
}

/// Share of the maintenance interval a mould has used, in percent.
///
/// Returns -1 when the interval is missing or not positive.
pub fn maintenance_percent(mould: &Value) -> f64 {
    let from = mould
        .get("from_maint_cycles")
        .and_then(value_number)
        .unwrap_or(0.0);
    let to = mould
        .get("to_maint_cycles")
        .and_then(value_number)
        .unwrap_or(0.0);
    if to <= 0.0 || !to.is_finite() {
        return -1.0;
    }
    from / to * 100.0
}

/// Moulds most overdue for maintenance first.
pub fn sort_moulds_by_maintenance(moulds: &mut [Value]) {
    moulds.sort_by(|a, b| maintenance_percent(b).total_cmp(&maintenance_percent(a)));
}
