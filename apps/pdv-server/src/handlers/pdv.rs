//! # PDV Handlers
//!
//! The checkout screen: one server-side cart per user, then finalization.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Payment  │────►│ Finalized│       │
//! │  │  Cart    │     │          │     │  chosen  │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                  │             │
//! │                   add_item (id or scanned code)           │             │
//! │                   update_item / remove_item               │             │
//! │                   set_adjustments                         │             │
//! │                        │                                  ▼             │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pdv_core::cart::{Adjustment, Cart, CartTotals};
use pdv_core::validation::validate_quantity;
use pdv_core::{CoreError, CreatedSale, PaymentMethod, Product};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Requests / Responses
// =============================================================================

/// Cart contents with calculated totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
    pub totals: CartTotals,
}

impl TryFrom<&Cart> for CartResponse {
    type Error = CoreError;

    fn try_from(cart: &Cart) -> Result<Self, CoreError> {
        Ok(CartResponse {
            cart: cart.clone(),
            totals: cart.totals()?,
        })
    }
}

/// Add by product id (click) or by scanned/typed code.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    pub code: Option<String>,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Omitted adjustments are left as they are.
#[derive(Debug, Deserialize)]
pub struct AdjustmentsRequest {
    pub discount: Option<Adjustment>,
    pub addition: Option<Adjustment>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<CartResponse>> {
    let response = state
        .carts
        .with_cart(&current.user.id, |cart| CartResponse::try_from(cart))?;
    Ok(Json(response))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<CartResponse>> {
    debug!(user_id = %current.user.id, "Cart cleared");
    let response = state.carts.with_cart_mut(&current.user.id, |cart| {
        cart.clear();
        CartResponse::try_from(&*cart)
    })?;
    Ok(Json(response))
}

/// Adds a product at its current price. Out-of-stock products are refused.
pub async fn add_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    validate_quantity(req.quantity)?;
    let product = resolve_product(&state, &req).await?;

    let response = state.carts.with_cart_mut(&current.user.id, |cart| {
        cart.add_product(&product, req.quantity)?;
        CartResponse::try_from(&*cart)
    })?;

    debug!(
        user_id = %current.user.id,
        product_id = %product.id,
        quantity = req.quantity,
        "Added to cart"
    );
    Ok(Json(response))
}

/// Sets a line's quantity; zero or less removes the line.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    let response = state.carts.with_cart_mut(&current.user.id, |cart| {
        cart.update_quantity(&product_id, req.quantity)?;
        CartResponse::try_from(&*cart)
    })?;
    Ok(Json(response))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let response = state.carts.with_cart_mut(&current.user.id, |cart| {
        cart.remove_item(&product_id)?;
        CartResponse::try_from(&*cart)
    })?;
    Ok(Json(response))
}

pub async fn set_adjustments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AdjustmentsRequest>,
) -> ApiResult<Json<CartResponse>> {
    let response = state.carts.with_cart_mut(&current.user.id, |cart| {
        if let Some(discount) = req.discount {
            cart.set_discount(discount)?;
        }
        if let Some(addition) = req.addition {
            cart.set_addition(addition)?;
        }
        CartResponse::try_from(&*cart)
    })?;
    Ok(Json(response))
}

/// Finalizes the cart as a sale and empties it.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSale>)> {
    let user_id = current.user.id.as_str();

    let snapshot = state.carts.with_cart(user_id, Cart::clone);
    let new_sale = snapshot.checkout(user_id, req.payment_method, req.notes)?;

    let created = state.db.sales().create_sale(&new_sale).await?;

    if !state.carts.clear_if_unchanged(user_id, &snapshot) {
        debug!(user_id = %user_id, "Cart changed during checkout; kept");
    }

    info!(
        user_id = %user_id,
        sale_id = %created.id,
        sale_number = %created.sale_number,
        total_cents = created.total_cents,
        payment_method = req.payment_method.as_str(),
        "Sale finalized"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

async fn resolve_product(state: &AppState, req: &AddItemRequest) -> ApiResult<Product> {
    let products = state.db.products();

    let found = match (req.product_id.as_deref(), req.code.as_deref()) {
        (Some(id), _) => products.get_by_id(id).await?.filter(|p| p.active),
        (None, Some(code)) if !code.trim().is_empty() => products.find_by_code(code).await?,
        _ => {
            return Err(ApiError::validation(
                "Informe o produto ou o código de barras",
            ))
        }
    };

    let lookup = req
        .product_id
        .as_deref()
        .or(req.code.as_deref())
        .unwrap_or_default();
    found.ok_or_else(|| CoreError::ProductNotFound(lookup.to_string()).into())
}
