//! # HTTP Handlers
//!
//! Thin orchestration: parse the request, check permissions with
//! `pdv_core::permissions`, call a repository, shape the response.
//!
//! ## Handler Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    HTTP Handlers                                        │
//! │                                                                         │
//! │  auth.rs       login, register, logout, session, extend, profile        │
//! │  dashboard.rs  stats, daily revenue, recent sales, low stock            │
//! │  pdv.rs        server-side cart and checkout                            │
//! │  products.rs   catalog CRUD, code lookup, categories                    │
//! │  sales.rs      history, stats, detail, cancel                           │
//! │  users.rs      user management (manager and above)                      │
//! │  settings.rs   security settings (manager and above)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod dashboard;
pub mod pdv;
pub mod products;
pub mod sales;
pub mod settings;
pub mod users;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// `?limit=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
