pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Error;
use crate::model::attendance::AttendanceRecord;
use crate::model::user::{User, UserChanges};

/// Durable mapping from `(user_id, date)` to at most one attendance record.
///
/// Implementations must enforce the uniqueness invariant: an upsert that
/// would create a second record for the same key fails with
/// [`Error::Conflict`]. They must also reject structurally invalid records
/// (see [`AttendanceRecord::validate`]).
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// The record for this user on this day, if any. No side effects.
    async fn find_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Error>;

    /// Create or overwrite a record. Overwrites match on `id`; creates are
    /// subject to the `(user_id, date)` uniqueness constraint.
    async fn upsert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, Error>;

    /// Records for this user with `start <= date <= end`, most recent day
    /// first. Fails with [`Error::InvalidRange`] when `start > end`.
    async fn find_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, Error>;

    /// Every record for this user, most recent day first.
    async fn find_for_user(&self, user_id: &str) -> Result<Vec<AttendanceRecord>, Error>;
}

/// User account persistence. Email addresses are unique across users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    async fn list(&self) -> Result<Vec<User>, Error>;

    /// Fails with [`Error::EmailTaken`] when the email is already registered.
    async fn create(&self, user: User) -> Result<User, Error>;

    /// Applies the non-`None` fields of `changes`. Fails with
    /// [`Error::UserNotFound`] for unknown ids and [`Error::EmailTaken`]
    /// when the new email belongs to another user.
    async fn update(&self, id: &str, changes: UserChanges) -> Result<User, Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;
}
