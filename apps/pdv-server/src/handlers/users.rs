//! # User Management
//!
//! Reachable only by managers and admins (see the request guard). The rules
//! on who may assign which role live in `pdv_core::permissions`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pdv_core::permissions::{can_assign_role, can_manage_users, can_modify_user, Actor};
use pdv_core::validation::{
    normalize_phone, validate_email, validate_name, validate_password, validate_uuid,
};
use pdv_core::{Role, User};
use pdv_db::{NewUser, UserUpdate};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Partial update. A blank phone clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<User>>> {
    can_manage_users(Actor::from(&current.user), "listar")?;
    Ok(Json(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let actor = Actor::from(&current.user);
    can_manage_users(actor, "criar")?;
    can_assign_role(actor, req.role).map_err(|e| {
        warn!(user_id = %current.user.id, role = req.role.as_str(), "Role assignment denied");
        ApiError::from(e)
    })?;

    let name = validate_name("name", &req.name)?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let phone = match req.phone.as_deref() {
        Some(p) => normalize_phone(p)?,
        None => None,
    };

    let user = state
        .db
        .users()
        .insert(NewUser {
            name,
            email,
            phone,
            password_hash: hash_password(&req.password)?,
            role: req.role,
        })
        .await?;

    info!(
        user_id = %current.user.id,
        created_id = %user.id,
        role = user.role.as_str(),
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let actor = Actor::from(&current.user);
    validate_uuid("id", &id)?;

    let target = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    can_modify_user(actor, target.role)?;
    if let Some(role) = req.role {
        can_assign_role(actor, role)?;
    }
    if target.id == current.user.id && req.active == Some(false) {
        return Err(ApiError::validation(
            "Você não pode desativar a sua própria conta",
        ));
    }

    let update = UserUpdate {
        name: req.name.as_deref().map(|n| validate_name("name", n)).transpose()?,
        email: req.email.as_deref().map(validate_email).transpose()?,
        phone: req.phone.as_deref().map(normalize_phone).transpose()?,
        role: req.role,
        active: req.active,
    };

    let user = state.db.users().update(&id, update).await?;

    if !user.active {
        let ended = state.sessions.revoke_user(&user.id);
        state.carts.discard(&user.id);
        info!(user_id = %user.id, sessions = ended, "User deactivated; sessions ended");
    }

    info!(user_id = %current.user.id, target_id = %user.id, "User updated");
    Ok(Json(user))
}
