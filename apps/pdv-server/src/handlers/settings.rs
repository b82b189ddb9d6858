//! Security settings. Saving applies the new inactivity policy to every
//! open session immediately.

use axum::extract::State;
use axum::{Extension, Json};
use pdv_core::inactivity::InactivityPolicy;
use pdv_core::SecuritySettings;
use tracing::info;

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// The policy being enforced right now, which is the configured default
/// until someone saves settings.
pub async fn get_security(State(state): State<AppState>) -> Json<SecuritySettings> {
    Json(SecuritySettings::from(state.sessions.policy()))
}

pub async fn put_security(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(settings): Json<SecuritySettings>,
) -> ApiResult<Json<SecuritySettings>> {
    state.db.settings().save_security_settings(&settings).await?;
    state.sessions.set_policy(InactivityPolicy::from(settings));

    info!(
        user_id = %current.user.id,
        sessions = state.sessions.len(),
        "Inactivity policy applied"
    );
    Ok(Json(settings))
}
