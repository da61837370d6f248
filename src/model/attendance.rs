use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// A geographic position as reported by the client, plus the optional
/// reverse-geocoded address. Coordinate ranges are checked at the API
/// boundary; the store keeps whatever it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// A check-in or check-out event: when it happened and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClockEvent {
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    // Policy hook: nothing derives these yet, records stay `present`.
    Late,
    Absent,
}

/// One attendance record per user per calendar day.
///
/// Lifecycle: created lazily on the first check-in of the day, mutated in
/// place by check-in and check-out, terminal once checked out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub check_in: Option<ClockEvent>,
    pub check_out: Option<ClockEvent>,
    /// Fractional hours between check-in and check-out; present iff both
    /// events are present.
    pub working_hours: Option<f64>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn new(user_id: &str, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date,
            check_in: None,
            check_out: None,
            working_hours: None,
            status: AttendanceStatus::Present,
        }
    }

    /// Structural invariants enforced at the store boundary, so malformed
    /// records never reach persistence regardless of which backend is in use.
    pub fn validate(&self) -> Result<(), Error> {
        if self.check_out.is_some() && self.check_in.is_none() {
            return Err(Error::Validation(
                "check-out requires a prior check-in".into(),
            ));
        }
        let complete = self.check_in.is_some() && self.check_out.is_some();
        if self.working_hours.is_some() != complete {
            return Err(Error::Validation(
                "working hours must be present exactly when both events are".into(),
            ));
        }
        Ok(())
    }
}

/// Hours between two timestamps, fractional, not clamped.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}
