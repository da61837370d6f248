use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::Error;
use crate::model::attendance::GeoPoint;
use crate::service::attendance::AttendanceService;

#[derive(Deserialize, ToSchema)]
pub struct LocationPayload {
    #[schema(example = 37.0, value_type = f64)]
    pub latitude: f64,
    #[schema(example = -122.0, value_type = f64)]
    pub longitude: f64,
    #[schema(example = "1 Main St", value_type = Option<String>)]
    pub address: Option<String>,
}

impl LocationPayload {
    /// Coordinate validation belongs here, not in the core: the state
    /// machine stores whatever location it is handed.
    fn into_geo_point(self) -> Result<GeoPoint, Error> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::Validation(
                "Latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::Validation(
                "Longitude must be between -180 and 180".into(),
            ));
        }
        if let Some(address) = &self.address {
            if address.len() > 500 {
                return Err(Error::Validation(
                    "Address cannot exceed 500 characters".into(),
                ));
            }
        }
        Ok(GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-01-31", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body = LocationPayload,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "success": true,
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "success": false,
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<LocationPayload>,
) -> actix_web::Result<impl Responder> {
    let location = payload.into_inner().into_geo_point()?;
    let record = service.check_in(&auth.user_id, location).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Checked in successfully",
        "data": record
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    request_body = LocationPayload,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "success": true,
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in, or already checked out", body = Object, example = json!({
            "success": false,
            "message": "Not checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<LocationPayload>,
) -> actix_web::Result<impl Responder> {
    let location = payload.into_inner().into_geo_point()?;
    let record = service.check_out(&auth.user_id, location).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Checked out successfully",
        "data": record
    })))
}

/// Attendance history for the current user
#[utoipa::path(
    get,
    path = "/api/attendance/my-attendance",
    params(
        ("start_date" = Option<String>, Query, description = "Inclusive range start (YYYY-MM-DD)"),
        ("end_date" = Option<String>, Query, description = "Inclusive range end (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Attendance records, most recent day first"),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => Some((start, end)),
        (None, None) => None,
        _ => {
            return Err(Error::Validation(
                "Provide both start_date and end_date, or neither".into(),
            )
            .into());
        }
    };

    let records = service.history(&auth.user_id, range).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": records
    })))
}
