//! In-memory backend, used for demo mode and tests.
//!
//! A single mutex serializes every mutation, which trivially satisfies the
//! per-key serialization the attendance service relies on. Critical
//! sections never await, so a std mutex is enough.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::auth::password::hash_password;
use crate::error::Error;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::{User, UserChanges};
use crate::store::{AttendanceStore, UserStore};

#[derive(Default)]
pub struct MemoryAttendanceStore {
    by_key: Mutex<HashMap<(String, NaiveDate), AttendanceRecord>>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn find_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Error> {
        let map = self.by_key.lock().unwrap();
        Ok(map.get(&(user_id.to_string(), day)).cloned())
    }

    async fn upsert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, Error> {
        record.validate()?;

        let key = (record.user_id.clone(), record.date);
        let mut map = self.by_key.lock().unwrap();
        if let Some(existing) = map.get(&key) {
            // Same id means an in-place overwrite; a different id means a
            // second writer lost the race for this (user, day) slot.
            if existing.id != record.id {
                return Err(Error::Conflict);
            }
        } else if map.values().any(|r| r.id == record.id) {
            // The id already lives under another (user, day) key; a record's
            // day is immutable once assigned.
            return Err(Error::Validation("record date is immutable".into()));
        }
        map.insert(key, record.clone());
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
        let map = self.by_key.lock().unwrap();
        let mut records: Vec<AttendanceRecord> = map
            .values()
            .filter(|r| r.user_id == user_id && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<AttendanceRecord>, Error> {
        let map = self.by_key.lock().unwrap();
        let mut records: Vec<AttendanceRecord> = map
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    by_id: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo-mode store seeded with the same two accounts the mock data
    /// ships with: admin@company.com and user@company.com, both "admin123".
    pub fn with_demo_users() -> Self {
        let store = Self::new();
        let now = Utc::now();
        let admin = User::new(
            "Admin User",
            "admin@company.com",
            hash_password("admin123"),
            Role::Admin,
            "System Administrator",
            "IT",
            now,
        );
        let user = User::new(
            "Regular User",
            "user@company.com",
            hash_password("admin123"),
            Role::User,
            "Staff",
            "General Affairs",
            now,
        );
        {
            let mut map = store.by_id.lock().unwrap();
            map.insert(admin.id.clone(), admin);
            map.insert(user.id.clone(), user);
        }
        store
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        let map = self.by_id.lock().unwrap();
        Ok(map.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let map = self.by_id.lock().unwrap();
        Ok(map.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        let map = self.by_id.lock().unwrap();
        let mut users: Vec<User> = map.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn create(&self, user: User) -> Result<User, Error> {
        let mut map = self.by_id.lock().unwrap();
        if map.values().any(|u| u.email == user.email) {
            return Err(Error::EmailTaken);
        }
        map.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> Result<User, Error> {
        let mut map = self.by_id.lock().unwrap();

        if let Some(email) = &changes.email {
            if map.values().any(|u| u.email == *email && u.id != id) {
                return Err(Error::EmailTaken);
            }
        }

        let user = map.get_mut(id).ok_or(Error::UserNotFound)?;
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
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let mut map = self.by_id.lock().unwrap();
        map.remove(id).map(|_| ()).ok_or(Error::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{ClockEvent, GeoPoint};
    use chrono::{NaiveDate, TimeZone};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn checked_in(user: &str, date: &str) -> AttendanceRecord {
        let mut rec = AttendanceRecord::new(user, day(date));
        rec.check_in = Some(ClockEvent {
            time: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
            location: GeoPoint {
                latitude: 37.0,
                longitude: -122.0,
                address: None,
            },
        });
        rec
    }

    #[actix_web::test]
    async fn upsert_rejects_second_record_for_same_day() {
        let store = MemoryAttendanceStore::new();
        store.upsert(checked_in("alice", "2024-01-10")).await.unwrap();

        let err = store
            .upsert(checked_in("alice", "2024-01-10"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict));

        // A different user on the same day is unaffected.
        store.upsert(checked_in("bob", "2024-01-10")).await.unwrap();
    }

    #[actix_web::test]
    async fn upsert_overwrites_by_id() {
        let store = MemoryAttendanceStore::new();
        let rec = store.upsert(checked_in("alice", "2024-01-10")).await.unwrap();

        let mut updated = rec.clone();
        updated.status = crate::model::attendance::AttendanceStatus::Late;
        store.upsert(updated).await.unwrap();

        let found = store
            .find_for_day("alice", day("2024-01-10"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, rec.id);
        assert_eq!(found.status, crate::model::attendance::AttendanceStatus::Late);
    }

    #[actix_web::test]
    async fn upsert_rejects_id_reuse_across_days() {
        let store = MemoryAttendanceStore::new();
        let rec = store.upsert(checked_in("alice", "2024-01-10")).await.unwrap();

        // Same id surfacing under a different day must not create a second
        // entry sharing that id.
        let mut moved = rec.clone();
        moved.date = day("2024-01-11");
        let err = store.upsert(moved).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(
            store
                .find_for_day("alice", day("2024-01-11"))
                .await
                .unwrap()
                .is_none()
        );
        let original = store
            .find_for_day("alice", day("2024-01-10"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.id, rec.id);
    }

    #[actix_web::test]
    async fn upsert_validates_record_shape() {
        let store = MemoryAttendanceStore::new();
        let mut rec = AttendanceRecord::new("alice", day("2024-01-10"));
        rec.working_hours = Some(8.0); // no events at all
        let err = store.upsert(rec).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[actix_web::test]
    async fn find_range_is_descending_and_inclusive() {
        let store = MemoryAttendanceStore::new();
        for d in ["2024-01-08", "2024-01-10", "2024-01-09"] {
            store.upsert(checked_in("alice", d)).await.unwrap();
        }
        store.upsert(checked_in("bob", "2024-01-09")).await.unwrap();

        let records = store
            .find_range("alice", day("2024-01-08"), day("2024-01-09"))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day("2024-01-09"), day("2024-01-08")]);
        assert!(records.iter().all(|r| r.user_id == "alice"));
    }

    #[actix_web::test]
    async fn find_range_rejects_inverted_bounds() {
        let store = MemoryAttendanceStore::new();
        let err = store
            .find_range("alice", day("2024-01-10"), day("2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange));
    }

    #[actix_web::test]
    async fn user_store_enforces_unique_email() {
        let store = MemoryUserStore::new();
        let now = Utc::now();
        let a = User::new("A", "a@x.com", "h".into(), Role::User, "p", "d", now);
        let b = User::new("B", "a@x.com", "h".into(), Role::User, "p", "d", now);
        store.create(a).await.unwrap();
        assert!(matches!(store.create(b).await.unwrap_err(), Error::EmailTaken));
    }
}
