//! MySQL backend. Queries are runtime-checked; the `(user_id, date)`
//! uniqueness lives in the schema (see `db::migrate`) so it survives
//! restarts and concurrent writers, with duplicate-key errors (SQLSTATE
//! 23000) translated into domain conflicts.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;

use crate::error::Error;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, ClockEvent, GeoPoint};
use crate::model::user::{User, UserChanges};
use crate::store::{AttendanceStore, UserStore};

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Flat row shape for the `attendance` table; the nested events are
/// reassembled on the way out so only this module knows the column layout.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: String,
    user_id: String,
    date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_in_latitude: Option<f64>,
    check_in_longitude: Option<f64>,
    check_in_address: Option<String>,
    check_out_time: Option<DateTime<Utc>>,
    check_out_latitude: Option<f64>,
    check_out_longitude: Option<f64>,
    check_out_address: Option<String>,
    working_hours: Option<f64>,
    status: AttendanceStatus,
}

fn event_from_columns(
    time: Option<DateTime<Utc>>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
) -> Option<ClockEvent> {
    time.map(|time| ClockEvent {
        time,
        location: GeoPoint {
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
            address,
        },
    })
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in: event_from_columns(
                row.check_in_time,
                row.check_in_latitude,
                row.check_in_longitude,
                row.check_in_address,
            ),
            check_out: event_from_columns(
                row.check_out_time,
                row.check_out_latitude,
                row.check_out_longitude,
                row.check_out_address,
            ),
            working_hours: row.working_hours,
            status: row.status,
        }
    }
}

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, \
     check_in_time, check_in_latitude, check_in_longitude, check_in_address, \
     check_out_time, check_out_latitude, check_out_longitude, check_out_address, \
     working_hours, status";

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Error> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
        );
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(day)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AttendanceRecord::from))
    }

    async fn upsert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, Error> {
        record.validate()?;

        let (check_in_time, check_in_lat, check_in_lng, check_in_addr) = match &record.check_in {
            Some(e) => (
                Some(e.time),
                Some(e.location.latitude),
                Some(e.location.longitude),
                e.location.address.clone(),
            ),
            None => (None, None, None, None),
        };
        let (check_out_time, check_out_lat, check_out_lng, check_out_addr) =
            match &record.check_out {
                Some(e) => (
                    Some(e.time),
                    Some(e.location.latitude),
                    Some(e.location.longitude),
                    e.location.address.clone(),
                ),
                None => (None, None, None, None),
            };

        // Overwrite-by-id first; a zero row count means this id has never
        // been persisted, so fall through to an insert that the unique key
        // on (user_id, date) arbitrates between concurrent creators.
        let updated = sqlx::query(
            r#"
            UPDATE attendance SET
                check_in_time = ?, check_in_latitude = ?, check_in_longitude = ?, check_in_address = ?,
                check_out_time = ?, check_out_latitude = ?, check_out_longitude = ?, check_out_address = ?,
                working_hours = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(check_in_time)
        .bind(check_in_lat)
        .bind(check_in_lng)
        .bind(&check_in_addr)
        .bind(check_out_time)
        .bind(check_out_lat)
        .bind(check_out_lng)
        .bind(&check_out_addr)
        .bind(record.working_hours)
        .bind(record.status)
        .bind(&record.id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO attendance
                    (id, user_id, date,
                     check_in_time, check_in_latitude, check_in_longitude, check_in_address,
                     check_out_time, check_out_latitude, check_out_longitude, check_out_address,
                     working_hours, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.id)
            .bind(&record.user_id)
            .bind(record.date)
            .bind(check_in_time)
            .bind(check_in_lat)
            .bind(check_in_lng)
            .bind(&check_in_addr)
            .bind(check_out_time)
            .bind(check_out_lat)
            .bind(check_out_lng)
            .bind(&check_out_addr)
            .bind(record.working_hours)
            .bind(record.status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Error::Conflict
                } else {
                    Error::Storage(e)
                }
            })?;
        }

        Ok(record)
    }

    async fn find_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, Error> {
        if start > end {
            return Err(Error::InvalidRange);
        }
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date DESC"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<AttendanceRecord>, Error> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? ORDER BY date DESC"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }
}

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn email_taken_by_other(&self, email: &str, id: &str) -> Result<bool, Error> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id <> ? LIMIT 1)",
        )
        .bind(email)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, position, department, is_active, created_at, updated_at";

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id");
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create(&self, user: User) -> Result<User, Error> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, role, position, department,
                 is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.position)
        .bind(&user.department)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                Error::EmailTaken
            } else {
                Error::Storage(e)
            }
        })?;
        Ok(user)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> Result<User, Error> {
        let mut user = self.find_by_id(id).await?.ok_or(Error::UserNotFound)?;

        if let Some(email) = &changes.email {
            if self.email_taken_by_other(email, id).await? {
                return Err(Error::EmailTaken);
            }
        }

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(position) = changes.position {
            user.position = position;
        }
        if let Some(department) = changes.department {
            user.department = department;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE users SET
                name = ?, email = ?, role = ?, position = ?, department = ?,
                is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.position)
        .bind(&user.department)
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound);
        }
        Ok(())
    }
}
