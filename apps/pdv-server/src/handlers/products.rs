//! Catalog handlers. Mutations need manager or admin.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pdv_core::permissions::{can_manage_products, Actor};
use pdv_core::validation::validate_uuid;
use pdv_core::{Category, CoreError, NewProduct, Product, ProductUpdate};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Product as the frontend sees it: the row plus its `PRD###` code.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub internal_code: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        ProductView {
            internal_code: product.internal_code(),
            product,
        }
    }
}

pub(crate) fn views(products: Vec<Product>) -> Vec<ProductView> {
    products.into_iter().map(ProductView::from).collect()
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    Ok(Json(views(state.db.products().list_active().await?)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductView>> {
    validate_uuid("id", &id)?;
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

/// Barcode (8+ digits) or `PRD###` lookup for the PDV search box.
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ProductView>> {
    state
        .db
        .products()
        .find_by_code(&code)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| CoreError::ProductNotFound(code).into())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    authorize(&current, "criar")?;

    let product = ProductView::from(state.db.products().insert(req).await?);
    info!(
        user_id = %current.user.id,
        product_id = %product.product.id,
        code = ?product.internal_code,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> ApiResult<Json<ProductView>> {
    authorize(&current, "editar")?;
    validate_uuid("id", &id)?;

    let product = state.db.products().update(&id, req).await?;
    info!(user_id = %current.user.id, product_id = %product.id, "Product updated");
    Ok(Json(product.into()))
}

/// Soft delete: the product leaves the catalog, sales keep referring to it.
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authorize(&current, "excluir")?;
    validate_uuid("id", &id)?;

    state.db.products().deactivate(&id).await?;
    info!(user_id = %current.user.id, product_id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list_active().await?))
}

fn authorize(current: &CurrentUser, action: &str) -> ApiResult<()> {
    can_manage_products(Actor::from(&current.user), action).map_err(|e| {
        warn!(user_id = %current.user.id, action, "Product change denied");
        ApiError::from(e)
    })
}
