//! Sales history, detail and cancellation.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use pdv_core::validation::{validate_limit, validate_uuid, DEFAULT_LIMIT};
use pdv_core::{Sale, SaleDetail, SaleSummary, SalesStats};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::LimitQuery;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Newest first.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<SaleSummary>>> {
    let limit = validate_limit(query.limit, DEFAULT_LIMIT)?;
    Ok(Json(state.db.sales().history(limit).await?))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<SalesStats>> {
    Ok(Json(state.db.reports().sales_stats().await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    validate_uuid("id", &id)?;
    state
        .db
        .sales()
        .get_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", &id))
}

/// Marks a sale cancelled and puts the deducted stock back.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    validate_uuid("id", &id)?;
    let sale = state.db.sales().cancel_sale(&id).await?;
    info!(
        user_id = %current.user.id,
        sale_id = %sale.id,
        sale_number = %sale.sale_number,
        "Sale cancelled"
    );
    Ok(Json(sale))
}
