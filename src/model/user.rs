use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::role::Role;

/// A user account. The password hash never leaves the process: it is
/// skipped during serialization so responses cannot leak it.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub position: String,
    pub department: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: &str,
        email: &str,
        password_hash: String,
        role: Role,
        position: &str,
        department: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            position: position.to_string(),
            department: department.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied by the admin user endpoints. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}
