//! Typed records exchanged with the backend.
//!
//! List rows for moulds, changeovers, calendar and TPM stay as JSON values
//! because their shape varies; the records here are the ones the client
//! reads field by field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `POST /auth/token`.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response of `GET /auth/{username}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of `POST /auth/`.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// A production operation on a workstation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Operation {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub task_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub workstation_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub machine_id: Option<i64>,
    #[serde(default)]
    pub operation_no: Option<Value>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub description: Option<String>,
    /// Total time booked on the operation so far, in minutes.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub duration_total_min: Option<f64>,
    /// Time booked during the current shift, in minutes.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub duration_shift_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub sequence: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub order_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub detail_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub detail_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub team: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub product_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Workstation {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub cost_center: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub status_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub current_task_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub machine_group_id: Option<i64>,
}

/// A status a workstation can be switched to.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MachineStatus {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    /// Ordinal that also decides whether the status runs the operation timer.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub status_no: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MachineGroup {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
}

/// Body of `PUT /production/workstations/{id}` on a status change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkstationStatusUpdate {
    pub name: String,
    pub cost_center: Option<String>,
    pub status_id: i64,
    pub current_task_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Body of `POST /production/logs`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationLogEntry {
    pub operation_id: i64,
    pub status_id: i64,
    pub workstation_id: i64,
    pub user_id: Option<i64>,
    pub note: String,
}

/// Body of `POST /production/operations/reorder`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReorderOperations {
    pub operation_ids: Vec<i64>,
}

/// Field readers that accept what the backend sends in practice: numbers as
/// JSON numbers or numeric strings (Decimal columns), and text as strings or
/// numbers.
mod lenient {
    use serde::Deserialize;
    use serde::de::{Deserializer, Error};
    use serde_json::Value;

    use crate::listing::fields::{value_number, value_text};

    pub(super) fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        integer(&value).ok_or_else(|| D::Error::custom(format!("expected an integer id, got {value}")))
    }

    pub(super) fn opt_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Ok(integer(&Value::deserialize(deserializer)?))
    }

    pub(super) fn opt_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(scalar_number(&value).filter(|number| number.is_finite()))
    }

    pub(super) fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            value @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => {
                Some(value_text(&value))
            }
            _ => None,
        })
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(opt_text(deserializer)?.unwrap_or_default())
    }

    fn scalar_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(_) | Value::String(_) => value_number(value),
            _ => None,
        }
    }

    fn integer(value: &Value) -> Option<i64> {
        if let Some(number) = value.as_i64() {
            return Some(number);
        }
        scalar_number(value)
            .filter(|number| number.is_finite() && number.fract() == 0.0)
            .map(|number| number as i64)
    }
}

/// Deserialize every row that fits `T`, logging and skipping the rest.
pub fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>, what: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("Skipping malformed {what} row: {err}");
                None
            }
        })
        .collect()
}
