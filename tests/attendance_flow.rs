//! End-to-end tests over the HTTP surface, running against the in-memory
//! backend with its seeded demo accounts.

use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{App, test};
use serde_json::{Value, json};

use absensi::config::{Config, StoreBackend};
use absensi::routes;
use absensi::service::SystemClock;
use absensi::service::attendance::AttendanceService;
use absensi::store::UserStore;
use absensi::store::memory::{MemoryAttendanceStore, MemoryUserStore};

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        access_token_ttl: 3600,
        store_backend: StoreBackend::Memory,
        database_url: None,
        rate_login_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
    }
}

macro_rules! spawn_app {
    () => {{
        let config = test_config();
        let service = Data::new(AttendanceService::new(
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(SystemClock),
        ));
        let user_store: Data<dyn UserStore> =
            Data::from(Arc::new(MemoryUserStore::with_demo_users()) as Arc<dyn UserStore>);
        let config_data = config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .app_data(service)
                .app_data(user_store)
                .configure(move |cfg| routes::configure(cfg, config_data.clone())),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let req = $req
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .to_request();
        test::call_service(&$app, req).await
    }};
}

macro_rules! login {
    ($app:expr, $email:expr, $password:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post()
                .uri("/auth/login")
                .set_json(json!({ "email": $email, "password": $password }))
        );
        assert!(resp.status().is_success(), "login failed for {}", $email);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        body["token"].as_str().expect("token in response").to_string()
    }};
}

#[actix_web::test]
async fn full_attendance_cycle() {
    let app = spawn_app!();
    let token = login!(app, "user@company.com", "admin123");
    let bearer = format!("Bearer {token}");

    // Check in.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0, "address": "HQ" }))
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["checkIn"]["location"]["latitude"], json!(37.0));
    assert!(body["data"]["checkOut"].is_null());

    // Second check-in the same day is rejected without mutation.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0 }))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Already checked in today"));

    // Check out.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0 }))
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let hours = body["data"]["workingHours"].as_f64().expect("working hours");
    assert!(hours >= 0.0);

    // The day is terminal now.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0 }))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Already checked out today"));

    // History shows exactly one record for today.
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-attendance")
            .insert_header(("Authorization", bearer))
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let records = body["data"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert!(records[0]["workingHours"].is_number());
}

#[actix_web::test]
async fn checkout_without_checkin_is_rejected() {
    let app = spawn_app!();
    let token = login!(app, "user@company.com", "admin123");

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0 }))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Not checked in today"));
}

#[actix_web::test]
async fn attendance_requires_token() {
    let app = spawn_app!();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .set_json(json!({ "latitude": 37.0, "longitude": -122.0 }))
    );
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn coordinates_are_validated_at_the_api_boundary() {
    let app = spawn_app!();
    let token = login!(app, "user@company.com", "admin123");

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "latitude": 91.0, "longitude": 0.0 }))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Latitude must be between -90 and 90"));
}

#[actix_web::test]
async fn history_range_must_be_complete_and_ordered() {
    let app = spawn_app!();
    let token = login!(app, "user@company.com", "admin123");
    let bearer = format!("Bearer {token}");

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-attendance?start_date=2024-01-01")
            .insert_header(("Authorization", bearer.clone()))
    );
    assert_eq!(resp.status(), 400);

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-attendance?start_date=2024-02-01&end_date=2024-01-01")
            .insert_header(("Authorization", bearer))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Start date must not be after end date"));
}

#[actix_web::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app!();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "admin@company.com", "password": "wrong" }))
    );
    assert_eq!(resp.status(), 401);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "nobody@company.com", "password": "admin123" }))
    );
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn user_management_is_admin_only() {
    let app = spawn_app!();
    let user_token = login!(app, "user@company.com", "admin123");

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/users")
            .insert_header(("Authorization", format!("Bearer {user_token}")))
    );
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn admin_manages_user_accounts() {
    let app = spawn_app!();
    let admin_token = login!(app, "admin@company.com", "admin123");
    let bearer = format!("Bearer {admin_token}");

    // Create.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({
                "name": "New Hire",
                "email": "hire@company.com",
                "password": "Secret12",
                "position": "Engineer",
                "department": "Engineering"
            }))
    );
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let new_id = body["data"]["id"].as_str().expect("new user id").to_string();
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("passwordHash").is_none());

    // Duplicate email is a conflict.
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/users")
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({
                "name": "Other",
                "email": "hire@company.com",
                "password": "Secret12",
                "position": "Engineer",
                "department": "Engineering"
            }))
    );
    assert_eq!(resp.status(), 409);

    // Deactivate, then the account cannot log in.
    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/users/{new_id}"))
            .insert_header(("Authorization", bearer.clone()))
            .set_json(json!({ "is_active": false }))
    );
    assert_eq!(resp.status(), 200);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "hire@company.com", "password": "Secret12" }))
    );
    assert_eq!(resp.status(), 401);

    // Delete.
    let resp = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{new_id}"))
            .insert_header(("Authorization", bearer.clone()))
    );
    assert_eq!(resp.status(), 200);

    let resp = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{new_id}"))
            .insert_header(("Authorization", bearer))
    );
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn admin_cannot_delete_own_account() {
    let app = spawn_app!();
    let admin_token = login!(app, "admin@company.com", "admin123");
    let bearer = format!("Bearer {admin_token}");

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", bearer.clone()))
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let my_id = body["user"]["id"].as_str().expect("own id").to_string();

    let resp = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{my_id}"))
            .insert_header(("Authorization", bearer))
    );
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], json!("Cannot delete your own account"));
}
