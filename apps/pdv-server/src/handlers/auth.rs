//! # Auth Handlers
//!
//! Sign-in, public sign-up, sign-out, session restore and profile upkeep.
//!
//! ## Sign-in Flow
//! ```text
//! POST /api/auth/login { email, password }
//!      │
//!      ├── unknown email ─────┐
//!      ├── wrong password ────┴──► 401 "Email ou senha incorretos"
//!      ├── inactive user ────────► 401 "Conta desativada..."
//!      ▼
//! SessionStore::create ──► JWT (jti = session id) ──► { token, user, ... }
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use pdv_core::inactivity::ActivityState;
use pdv_core::validation::{normalize_phone, validate_email, validate_name, validate_password};
use pdv_core::{Role, User};
use pdv_db::{NewUser, UserUpdate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Email ou senha incorretos";

// =============================================================================
// Requests / Responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Current user and where their session stands.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub activity: ActivityState,
    pub inactivity_timeout_minutes: i64,
    pub warning_minutes: i64,
    pub warnings_enabled: bool,
}

/// Own-profile update. A blank phone clears it.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let bad_credentials = || ApiError::unauthenticated(BAD_CREDENTIALS);

    let email = validate_email(&req.email).map_err(|_| bad_credentials())?;

    let Some((user, password_hash)) = state.db.users().find_credentials(&email).await? else {
        info!(email = %email, "Login failed: unknown email");
        return Err(bad_credentials());
    };

    if !verify_password(&req.password, &password_hash) {
        info!(user_id = %user.id, "Login failed: wrong password");
        return Err(bad_credentials());
    }

    if !user.active {
        warn!(user_id = %user.id, "Login refused: inactive user");
        return Err(ApiError::unauthenticated(
            "Conta desativada. Procure um administrador.",
        ));
    }

    let session_id = state.sessions.create(&user.id, Utc::now());
    let token = state.jwt.issue(&user.id, user.role, &session_id)?;

    info!(user_id = %user.id, role = user.role.as_str(), "User signed in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}

/// Public sign-up. Always creates a `user`.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
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
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> StatusCode {
    state.sessions.revoke(&current.session_id);
    info!(user_id = %current.user.id, "User signed out");
    StatusCode::NO_CONTENT
}

/// Session restore. Does not count as activity.
pub async fn session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Json<SessionResponse> {
    Json(session_response(&state, current.user, current.activity))
}

/// Explicit "keep me signed in" from the inactivity warning.
pub async fn extend(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Json<SessionResponse> {
    // The guard already touched the session
    Json(session_response(&state, current.user, current.activity))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<Json<User>> {
    let update = UserUpdate {
        name: req.name.as_deref().map(|n| validate_name("name", n)).transpose()?,
        email: req.email.as_deref().map(validate_email).transpose()?,
        phone: req.phone.as_deref().map(normalize_phone).transpose()?,
        ..Default::default()
    };

    let user = state.db.users().update(&current.user.id, update).await?;
    info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let stored = state.db.users().password_hash(&current.user.id).await?;
    if !verify_password(&req.current_password, &stored) {
        return Err(ApiError::validation("Senha atual incorreta"));
    }
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password)?;
    state
        .db
        .users()
        .set_password_hash(&current.user.id, &hash)
        .await?;

    info!(user_id = %current.user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

fn session_response(state: &AppState, user: User, activity: ActivityState) -> SessionResponse {
    let policy = state.sessions.policy();
    SessionResponse {
        user,
        activity,
        inactivity_timeout_minutes: policy.timeout.num_minutes(),
        warning_minutes: policy.warning.num_minutes(),
        warnings_enabled: policy.warnings_enabled,
    }
}
