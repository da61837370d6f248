use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::generate_token;
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::error::Error;
use crate::store::UserStore;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "admin123", value_type = String)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: crate::model::user::User,
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in successfully", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials or deactivated account"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(body, store, config),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(Error::Validation("Please provide email and password".into()).into());
    }

    let user = match store.find_by_email(body.email.trim()).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            info!("Invalid credentials: account deactivated");
            return Ok(HttpResponse::Unauthorized().json(json!({
                "success": false,
                "message": "Invalid credentials"
            })));
        }
        None => {
            info!("Invalid credentials: user not found");
            return Ok(HttpResponse::Unauthorized().json(json!({
                "success": false,
                "message": "Invalid credentials"
            })));
        }
    };

    debug!(user_id = %user.id, "Verifying password");

    if verify_password(&body.password, &user.password_hash).is_err() {
        info!("Invalid credentials: password mismatch");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "success": false,
            "message": "Invalid credentials"
        })));
    }

    let token = generate_token(
        &user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(actix_web::error::ErrorInternalServerError)?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = crate::model::user::User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
) -> actix_web::Result<impl Responder> {
    let user = store
        .find_by_id(&auth.user_id)
        .await?
        .ok_or(Error::UserNotFound)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user
    })))
}
