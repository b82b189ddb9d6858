//! # Request Interception
//!
//! Every request passes through [`auth_guard`] before reaching a handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Request Interception                                 │
//! │                                                                         │
//! │  request                                                                │
//! │     │                                                                   │
//! │     ├── public path? ──────────────────────────────► handler            │
//! │     │   (/api/auth/login, /api/auth/register, /health)                  │
//! │     │                                                                   │
//! │     ├── Bearer token valid?        no ──► 401 + /login?redirectTo=path  │
//! │     ├── session alive?             no ──► 401 + /login?redirectTo=path  │
//! │     ├── user exists and active?    no ──► 401 + /login?redirectTo=path  │
//! │     ├── /api/users, /api/settings: role ≥ manager?                      │
//! │     │                              no ──► 403 + /dashboard              │
//! │     ▼                                                                   │
//! │  handler (with Extension<CurrentUser>)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use pdv_core::inactivity::ActivityState;
use pdv_core::permissions::has_permission;
use pdv_core::{Role, User};

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::session::SessionError;
use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &["/api/auth/login", "/api/auth/register", "/health"];

const MANAGER_PREFIXES: &[&str] = &["/api/users", "/api/settings"];

/// Polled by the frontend's inactivity banner; does not count as activity.
const SESSION_PROBE_PATH: &str = "/api/auth/session";

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
    pub activity: ActivityState,
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// `true` for `prefix` itself and anything below it.
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn requires_manager(path: &str) -> bool {
    MANAGER_PREFIXES.iter().any(|prefix| under(path, prefix))
}

fn login_redirect(path: &str) -> String {
    format!("/login?redirectTo={}", path)
}

/// Authenticates the request and enforces the manager-only areas.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();

    if is_public(&path) {
        return Ok(next.run(req).await);
    }

    let to_login = |err: ApiError| err.redirect(login_redirect(&path));

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| to_login(ApiError::unauthenticated("Faça login para continuar")))?;

    let claims = state.jwt.validate(token).map_err(to_login)?;

    let touch = !(req.method() == Method::GET && path == SESSION_PROBE_PATH);
    let (session, activity) = state
        .sessions
        .check(&claims.jti, Utc::now(), touch)
        .map_err(|e| match e {
            SessionError::Expired => {
                to_login(ApiError::unauthenticated("Sessão expirada por inatividade"))
            }
            SessionError::Unknown => {
                to_login(ApiError::unauthenticated("Sessão inválida. Faça login novamente."))
            }
        })?;

    if session.user_id != claims.sub {
        tracing::warn!(session_id = %claims.jti, "Token subject does not match session");
        return Err(to_login(ApiError::unauthenticated(
            "Sessão inválida. Faça login novamente.",
        )));
    }

    let user = match state.db.users().get_by_id(&claims.sub).await? {
        Some(user) if user.active => user,
        _ => {
            state.sessions.revoke(&claims.jti);
            return Err(to_login(ApiError::unauthenticated(
                "Usuário inativo ou não encontrado",
            )));
        }
    };

    if requires_manager(&path) && !has_permission(user.role, Role::Manager) {
        tracing::warn!(user_id = %user.id, path = %path, "Access denied to manager area");
        return Err(ApiError::forbidden(
            "Você precisa ser Administrador ou Gerente para acessar esta área.",
        )
        .redirect("/dashboard"));
    }

    req.extensions_mut().insert(CurrentUser {
        user,
        session_id: claims.jti,
        activity,
    });

    Ok(next.run(req).await)
}
