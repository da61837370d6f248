use crate::api::attendance::{HistoryQuery, LocationPayload};
use crate::api::user::{CreateUser, UpdateUser};
use crate::auth::handlers::{LoginRequest, LoginResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, ClockEvent, GeoPoint};
use crate::model::role::Role;
use crate::model::user::User;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Service

Geolocated daily check-in/check-out tracking with per-user history and
admin-managed accounts.

- One attendance record per user per calendar day
- Check-out requires a prior check-in; a checked-out day is final
- Working hours are derived from the two timestamps
- Runs against MySQL or a self-contained in-memory store (`STORE_BACKEND`)

Most endpoints require a **JWT Bearer** token from `POST /auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            LocationPayload,
            HistoryQuery,
            AttendanceRecord,
            AttendanceStatus,
            ClockEvent,
            GeoPoint,
            User,
            Role,
            CreateUser,
            UpdateUser
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and current-user APIs"),
        (name = "Attendance", description = "Daily check-in/check-out and history APIs"),
        (name = "Users", description = "Admin user management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
