//! Dashboard figures.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use pdv_core::validation::{validate_limit, validate_revenue_days};
use pdv_core::{DailyRevenue, DashboardStats, RecentSale};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::handlers::products::{views, ProductView};
use crate::handlers::LimitQuery;
use crate::state::AppState;

/// Rows shown in the dashboard side lists.
const DASHBOARD_LIST_LIMIT: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.reports().dashboard_stats(Utc::now()).await?))
}

pub async fn daily_revenue(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<Vec<DailyRevenue>>> {
    let days = validate_revenue_days(query.days)?;
    Ok(Json(state.db.reports().daily_revenue(days, Utc::now()).await?))
}

pub async fn recent_sales(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<RecentSale>>> {
    let limit = validate_limit(query.limit, DASHBOARD_LIST_LIMIT)?;
    Ok(Json(state.db.sales().recent_completed(limit).await?))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let limit = validate_limit(query.limit, DASHBOARD_LIST_LIMIT)?;
    Ok(Json(views(state.db.products().low_stock(limit).await?)))
}
