//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the PDV API                            │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │         │                                                               │
//! │         ├── ValidationError ──► 400 VALIDATION_ERROR                   │
//! │         ├── no/expired session ► 401 UNAUTHENTICATED (+ redirectTo)    │
//! │         ├── PermissionDenied ──► 403 FORBIDDEN                         │
//! │         ├── DbError::NotFound ─► 404 NOT_FOUND                         │
//! │         ├── UniqueViolation ───► 409 CONFLICT                          │
//! │         ├── CoreError (rules) ─► 422 BUSINESS_LOGIC / CART_ERROR       │
//! │         └── anything else ─────► 500, details only in the log          │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "message": "...", "redirectTo": null }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdv_core::{CoreError, ValidationError};
use pdv_db::DbError;
use serde::Serialize;
use ts_rs::TS;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "UNAUTHENTICATED",
///   "message": "Faça login para continuar",
///   "redirectTo": "/login?redirectTo=/api/sales"
/// }
/// ```
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Where the frontend should navigate, for auth failures
    pub redirect_to: Option<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing, invalid or expired session (401)
    Unauthenticated,

    /// Role too low for the operation (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Unique constraint hit (409)
    Conflict,

    /// Business rule refused the operation (422)
    BusinessLogic,

    /// Cart operation failed (422)
    CartError,

    /// Product has no stock for the cart (422)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic | ErrorCode::CartError | ErrorCode::InsufficientStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            redirect_to: None,
        }
    }

    /// Attaches a navigation target.
    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect_to = Some(to.into());
        self
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                let message = if field.ends_with("email") {
                    "Este email já está cadastrado".to_string()
                } else {
                    format!("{} '{}' already exists", field, value)
                };
                ApiError::new(ErrorCode::Conflict, message)
            }
            DbError::Core(core) => core.into(),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Referência inválida")
            }
            DbError::ConnectionFailed(e) | DbError::MigrationFailed(e) => {
                tracing::error!("Database unavailable: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Banco de dados indisponível")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) | DbError::Corrupt(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Erro interno do servidor")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Servidor ocupado, tente novamente")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, "Produto não encontrado.")
            }
            e @ CoreError::OutOfStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::EmptyCart
            | CoreError::NotInCart(_)
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }) => ApiError::new(ErrorCode::CartError, e.to_string()),
            e @ (CoreError::SaleAlreadyCancelled { .. } | CoreError::SaleSequenceExhausted { .. }) => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            e @ CoreError::PermissionDenied { .. } => ApiError::forbidden(e.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = CoreError::SaleAlreadyCancelled {
            sale_id: "s1".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "Venda já está cancelada");

        let err: ApiError = DbError::not_found("Product", "p1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("email", "a@b.co").into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = CoreError::denied("nope").into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: ApiError = DbError::Core(CoreError::Validation(ValidationError::NothingToUpdate)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Nenhum dado foi fornecido para atualização");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_serialization_shape() {
        let err = ApiError::unauthenticated("Faça login para continuar").redirect("/login?redirectTo=/api/sales");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UNAUTHENTICATED");
        assert_eq!(json["redirectTo"], "/login?redirectTo=/api/sales");
    }
}
