use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::Error;
use crate::model::role::Role;
use crate::model::user::{User, UserChanges};
use crate::store::UserStore;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "John Doe", value_type = String)]
    pub name: String,
    #[schema(example = "john@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "Secret12", value_type = String)]
    pub password: String,
    pub role: Option<Role>,
    #[schema(example = "Engineer", value_type = String)]
    pub position: String,
    #[schema(example = "Engineering", value_type = String)]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All user accounts, passwords excluded"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = store.list().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": users
    })))
}

/// Create user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = Object, example = json!({
            "success": true,
            "message": "User created successfully"
        })),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    for (value, field) in [
        (&payload.name, "name"),
        (&payload.email, "email"),
        (&payload.position, "position"),
        (&payload.department, "department"),
    ] {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{field} is required")).into());
        }
    }
    if payload.password.len() < 6 {
        return Err(Error::Validation("Password must be at least 6 characters long".into()).into());
    }

    let user = User::new(
        payload.name.trim(),
        payload.email.trim(),
        hash_password(&payload.password),
        payload.role.unwrap_or(Role::User),
        payload.position.trim(),
        payload.department.trim(),
        Utc::now(),
    );

    let user = store.create(user).await?;
    info!(user_id = %user.id, "user created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User created successfully",
        "data": user
    })))
}

/// Update user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered by another user"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
    path: web::Path<String>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let payload = payload.into_inner();
    let changes = UserChanges {
        name: payload.name,
        email: payload.email.map(|e| e.trim().to_string()),
        role: payload.role,
        position: payload.position,
        department: payload.department,
        is_active: payload.is_active,
    };

    let user = store.update(&id, changes).await?;
    info!(user_id = %user.id, "user updated");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully",
        "data": user
    })))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 400, description = "Cannot delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    if id == auth.user_id {
        return Err(Error::Validation("Cannot delete your own account".into()).into());
    }

    store.delete(&id).await?;
    info!(user_id = %id, "user deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}
