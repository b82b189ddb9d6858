//! # PDV Server
//!
//! HTTP JSON API for the PDV backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PDV API Server                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  CorsLayer ─► TraceLayer ─► auth_guard ─► Router                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/auth     │  │  /api/pdv      │  │  /api/products             ││
//! │  │ • login        │  │ • cart         │  │ • CRUD, lookup/{code}      ││
//! │  │ • register     │  │ • items        │  │  /api/categories           ││
//! │  │ • session      │  │ • adjustments  │  │                            ││
//! │  │ • extend       │  │ • checkout     │  │  /api/sales                ││
//! │  └────────────────┘  └────────────────┘  │ • history, stats, cancel   ││
//! │                                          └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │ /api/dashboard │  │ /api/users     │  manager and above             │
//! │  │                │  │ /api/settings  │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]: defaults, then `pdv.toml`, then `PDV_*`
//! environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth as auth_h, dashboard, pdv, products, sales, settings, users};

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full router with the request guard and tracing.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        // Auth
        .route("/api/auth/login", post(auth_h::login))
        .route("/api/auth/register", post(auth_h::register))
        .route("/api/auth/logout", post(auth_h::logout))
        .route("/api/auth/session", get(auth_h::session))
        .route("/api/auth/extend", post(auth_h::extend))
        .route("/api/auth/profile", put(auth_h::update_profile))
        .route("/api/auth/password", put(auth_h::change_password))
        // Dashboard
        .route("/api/dashboard", get(dashboard::stats))
        .route("/api/dashboard/daily-revenue", get(dashboard::daily_revenue))
        .route("/api/dashboard/recent-sales", get(dashboard::recent_sales))
        .route("/api/dashboard/low-stock", get(dashboard::low_stock))
        // PDV
        .route("/api/pdv/cart", get(pdv::get_cart).delete(pdv::clear_cart))
        .route("/api/pdv/cart/items", post(pdv::add_item))
        .route(
            "/api/pdv/cart/items/{product_id}",
            put(pdv::update_item).delete(pdv::remove_item),
        )
        .route("/api/pdv/cart/adjustments", put(pdv::set_adjustments))
        .route("/api/pdv/checkout", post(pdv::checkout))
        // Products
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/lookup/{code}", get(products::lookup))
        .route(
            "/api/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::deactivate),
        )
        .route("/api/categories", get(products::categories))
        // Sales
        .route("/api/sales", get(sales::history))
        .route("/api/sales/stats", get(sales::stats))
        .route("/api/sales/{id}", get(sales::detail))
        .route("/api/sales/{id}/cancel", post(sales::cancel))
        // Users
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", put(users::update))
        // Settings
        .route(
            "/api/settings/security",
            get(settings::get_security).put(settings::put_security),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_guard,
        ))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use pdv_core::{Role, SecuritySettings};
    use pdv_db::{Database, DbConfig, NewUser};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ServerConfig::default(), SecuritySettings::default());
        (build_router(state.clone()), state)
    }

    async fn add_user(state: &AppState, email: &str, password: &str, role: Role) {
        state
            .db
            .users()
            .insert(NewUser {
                name: "Operador Teste".into(),
                email: email.into(),
                phone: None,
                password_hash: auth::hash_password(password).unwrap(),
                role,
            })
            .await
            .unwrap();
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_missing_token_redirects_to_login() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/sales", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
        assert_eq!(body["redirectTo"], "/login?redirectTo=/api/sales");
    }

    #[tokio::test]
    async fn test_bad_credentials_share_one_message() {
        let (app, state) = test_app().await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;

        let (s1, wrong_password) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "caixa@pdv.local", "password": "errada1" })),
        )
        .await;
        let (s2, unknown_email) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ninguem@pdv.local", "password": "segredo123" })),
        )
        .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password["message"], unknown_email["message"]);
    }

    #[tokio::test]
    async fn test_user_role_is_kept_out_of_manager_areas() {
        let (app, state) = test_app().await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;
        let token = login(&app, "caixa@pdv.local", "segredo123").await;

        let (status, body) = send(&app, Method::GET, "/api/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["redirectTo"], "/dashboard");

        let (status, _) =
            send(&app, Method::GET, "/api/settings/security", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Regular areas stay open
        let (status, _) = send(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_creates_plain_user() {
        let (app, _) = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Maria Silva",
                "email": "Maria@Loja.com",
                "password": "segredo123",
                "phone": "(11) 98888-7777"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "user");
        assert_eq!(body["email"], "maria@loja.com");
        assert_eq!(body["phone"], "11988887777");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Outra", "email": "maria@loja.com", "password": "segredo123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Este email já está cadastrado");
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let (app, state) = test_app().await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;
        let token = login(&app, "caixa@pdv.local", "segredo123").await;

        let (status, body) = send(&app, Method::GET, "/api/auth/session", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activity"]["state"], "active");
        assert_eq!(body["inactivity_timeout_minutes"], 30);

        let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, "/api/auth/session", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_and_cancel_flow() {
        let (app, state) = test_app().await;
        add_user(&state, "gerente@pdv.local", "segredo123", Role::Manager).await;
        let token = login(&app, "gerente@pdv.local", "segredo123").await;

        let (status, product) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({
                "name": "Café Torrado 500g",
                "price_cents": 1000,
                "stock_quantity": 3,
                "min_stock": 1,
                "barcode": "7891000100103",
                "category": "Mercearia"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{product}");
        let product_id = product["id"].as_str().unwrap().to_string();

        // Scan by barcode, then raise the quantity past the stock
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/pdv/cart/items",
            Some(&token),
            Some(json!({ "code": "7891000100103" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, cart) = send(
            &app,
            Method::PUT,
            &format!("/api/pdv/cart/items/{product_id}"),
            Some(&token),
            Some(json!({ "quantity": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totals"]["subtotal"], 5000);

        let (status, cart) = send(
            &app,
            Method::PUT,
            "/api/pdv/cart/adjustments",
            Some(&token),
            Some(json!({ "discount": { "value": 200, "percent_bps": 0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totals"]["total"], 4800);

        let (status, sale) = send(
            &app,
            Method::POST,
            "/api/pdv/checkout",
            Some(&token),
            Some(json!({ "payment_method": "pix" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{sale}");
        assert_eq!(sale["total_cents"], 4800);
        assert!(sale["sale_number"].as_str().unwrap().starts_with("VND"));
        let sale_id = sale["id"].as_str().unwrap().to_string();

        // Stock clamped at zero, cart emptied
        let stock = state.db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 0);
        let (_, cart) = send(&app, Method::GET, "/api/pdv/cart", Some(&token), None).await;
        assert_eq!(cart["totals"]["item_count"], 0);

        // Out of stock now
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/pdv/cart/items",
            Some(&token),
            Some(json!({ "product_id": product_id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        // Cancel restores what was deducted
        let (status, cancelled) = send(
            &app,
            Method::POST,
            &format!("/api/sales/{sale_id}/cancel"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");
        let stock = state.db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 3);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sales/{sale_id}/cancel"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Venda já está cancelada");
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_is_refused() {
        let (app, state) = test_app().await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;
        let token = login(&app, "caixa@pdv.local", "segredo123").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/pdv/checkout",
            Some(&token),
            Some(json!({ "payment_method": "cash" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "CART_ERROR");
    }

    #[tokio::test]
    async fn test_product_json_carries_internal_code() {
        let (app, state) = test_app().await;
        add_user(&state, "gerente@pdv.local", "segredo123", Role::Manager).await;
        let token = login(&app, "gerente@pdv.local", "segredo123").await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Pão de Queijo", "price_cents": 1250, "stock_quantity": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        let code = created["internal_code"].as_str().unwrap().to_string();
        assert!(code.starts_with("PRD"));
        assert_eq!(code.len(), 6);
        assert_eq!(created["name"], "Pão de Queijo");

        let (status, list) = send(&app, Method::GET, "/api/products", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["internal_code"], code.as_str());

        let id = created["id"].as_str().unwrap();
        let (_, one) = send(&app, Method::GET, &format!("/api/products/{id}"), Some(&token), None)
            .await;
        assert_eq!(one["internal_code"], code.as_str());

        let (status, found) = send(
            &app,
            Method::GET,
            &format!("/api/products/lookup/{}", code.to_lowercase()),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], id);
        assert_eq!(found["internal_code"], code.as_str());
    }

    #[tokio::test]
    async fn test_out_of_range_amounts_are_bad_requests() {
        let (app, state) = test_app().await;
        add_user(&state, "gerente@pdv.local", "segredo123", Role::Manager).await;
        let token = login(&app, "gerente@pdv.local", "segredo123").await;

        for body in [
            json!({ "name": "Barra de Ouro", "price_cents": i64::MAX }),
            json!({ "name": "Arroz", "price_cents": 1000, "category": "A" }),
        ] {
            let (status, reply) =
                send(&app, Method::POST, "/api/products", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{reply}");
            assert_eq!(reply["code"], "VALIDATION_ERROR");
        }

        for adjustments in [
            json!({ "discount": { "value": 0, "percent_bps": 10_001 } }),
            json!({ "addition": { "value": i64::MAX, "percent_bps": 0 } }),
        ] {
            let (status, _) = send(
                &app,
                Method::PUT,
                "/api/pdv/cart/adjustments",
                Some(&token),
                Some(adjustments),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, cart) = send(&app, Method::GET, "/api/pdv/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totals"]["total"], 0);
    }

    #[tokio::test]
    async fn test_plain_user_cannot_create_products() {
        let (app, state) = test_app().await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;
        let token = login(&app, "caixa@pdv.local", "segredo123").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Pão", "price_cents": 75 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_manager_cannot_create_admin() {
        let (app, state) = test_app().await;
        add_user(&state, "gerente@pdv.local", "segredo123", Role::Manager).await;
        let token = login(&app, "gerente@pdv.local", "segredo123").await;

        let new_user = |role: &str| {
            json!({
                "name": "Novo Operador",
                "email": format!("{role}@pdv.local"),
                "password": "segredo123",
                "role": role
            })
        };

        let (status, _) =
            send(&app, Method::POST, "/api/users", Some(&token), Some(new_user("admin"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            send(&app, Method::POST, "/api/users", Some(&token), Some(new_user("manager"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "manager");
    }

    #[tokio::test]
    async fn test_deactivated_user_loses_session() {
        let (app, state) = test_app().await;
        add_user(&state, "admin@pdv.local", "segredo123", Role::Admin).await;
        add_user(&state, "caixa@pdv.local", "segredo123", Role::User).await;
        let admin = login(&app, "admin@pdv.local", "segredo123").await;
        let caixa = login(&app, "caixa@pdv.local", "segredo123").await;

        let target = state.db.users().get_by_email("caixa@pdv.local").await.unwrap().unwrap();
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/users/{}", target.id),
            Some(&admin),
            Some(json!({ "active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/api/pdv/cart", Some(&caixa), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_security_settings_update_policy() {
        let (app, state) = test_app().await;
        add_user(&state, "gerente@pdv.local", "segredo123", Role::Manager).await;
        let token = login(&app, "gerente@pdv.local", "segredo123").await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/settings/security",
            Some(&token),
            Some(json!({
                "inactivity_timeout_minutes": 10,
                "warning_minutes": 2,
                "warnings_enabled": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.sessions.policy().timeout.num_minutes(), 10);

        let (status, body) =
            send(&app, Method::GET, "/api/settings/security", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inactivity_timeout_minutes"], 10);
        assert_eq!(body["warnings_enabled"], false);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/settings/security",
            Some(&token),
            Some(json!({
                "inactivity_timeout_minutes": 10,
                "warning_minutes": 10,
                "warnings_enabled": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
