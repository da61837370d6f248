//! The check-in/check-out state machine and the history query service.
//!
//! Per (user, day) the lifecycle is NoRecord -> CheckedIn -> CheckedOut,
//! and CheckedOut is terminal. All mutation goes through a single
//! read-modify-write against the store; the store's (user_id, date)
//! uniqueness constraint arbitrates concurrent creators, and a lost race
//! is re-read here and turned into the same error the loser would have
//! seen had it gone second.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::Error;
use crate::model::attendance::{AttendanceRecord, ClockEvent, GeoPoint, hours_between};
use crate::service::Clock;
use crate::store::AttendanceStore;

/// One retry after a lost race is enough: the re-read then observes the
/// winner's record and derives the user-visible error.
const CONFLICT_ATTEMPTS: u32 = 2;

pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records a check-in for today. Fails with [`Error::AlreadyCheckedIn`]
    /// if one exists; on success exactly one write is persisted.
    pub async fn check_in(
        &self,
        user_id: &str,
        location: GeoPoint,
    ) -> Result<AttendanceRecord, Error> {
        let now = self.clock.now();
        let day = now.date_naive();

        for attempt in 0..CONFLICT_ATTEMPTS {
            let existing = self.store.find_for_day(user_id, day).await?;
            if let Some(record) = &existing {
                if record.check_in.is_some() {
                    return Err(Error::AlreadyCheckedIn);
                }
            }

            let mut record = existing.unwrap_or_else(|| AttendanceRecord::new(user_id, day));
            record.check_in = Some(ClockEvent {
                time: now,
                location: location.clone(),
            });

            match self.store.upsert(record).await {
                Ok(saved) => {
                    debug!(user_id, %day, "check-in recorded");
                    return Ok(saved);
                }
                Err(Error::Conflict) => {
                    warn!(user_id, %day, attempt, "check-in lost a creation race, re-reading");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Conflict)
    }

    /// Records a check-out for today and derives the working hours.
    ///
    /// Fails with [`Error::NotCheckedIn`] when there is nothing to close,
    /// [`Error::AlreadyCheckedOut`] when the day is already terminal, and
    /// [`Error::NegativeDuration`] when `now` precedes the stored check-in
    /// (manipulated clock); no negative duration is ever persisted.
    pub async fn check_out(
        &self,
        user_id: &str,
        location: GeoPoint,
    ) -> Result<AttendanceRecord, Error> {
        let now = self.clock.now();
        let day = now.date_naive();

        for attempt in 0..CONFLICT_ATTEMPTS {
            let Some(mut record) = self.store.find_for_day(user_id, day).await? else {
                return Err(Error::NotCheckedIn);
            };
            let Some(check_in) = record.check_in.clone() else {
                return Err(Error::NotCheckedIn);
            };
            if record.check_out.is_some() {
                return Err(Error::AlreadyCheckedOut);
            }
            if now < check_in.time {
                return Err(Error::NegativeDuration);
            }

            record.working_hours = Some(hours_between(check_in.time, now));
            record.check_out = Some(ClockEvent {
                time: now,
                location: location.clone(),
            });

            match self.store.upsert(record).await {
                Ok(saved) => {
                    debug!(user_id, %day, hours = ?saved.working_hours, "check-out recorded");
                    return Ok(saved);
                }
                Err(Error::Conflict) => {
                    warn!(user_id, %day, attempt, "check-out lost a race, re-reading");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Conflict)
    }

    /// Attendance history, most recent day first. With both bounds this is
    /// an inclusive range query; with neither it is the full history.
    /// Read-only.
    pub async fn history(
        &self,
        user_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<AttendanceRecord>, Error> {
        match range {
            Some((start, end)) => self.store.find_range(user_id, start, end).await,
            None => self.store.find_for_user(user_id).await,
        }
    }
}
