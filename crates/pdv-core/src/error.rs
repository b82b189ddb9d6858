//! Rule and input errors.
//!
//! Messages are what the cashier reads on screen, so rule failures carry
//! the Portuguese wording the frontend shows verbatim. `pdv-db` wraps these
//! in `DbError::Core`; `pdv-server` picks the HTTP status from the variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown id or code, or the product was deactivated.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Stock is zero, or lower than the cart asks for at checkout.
    #[error("{name} - SEM ESTOQUE!")]
    OutOfStock { name: String },

    #[error("Venda já está cancelada")]
    SaleAlreadyCancelled { sale_id: String },

    #[error("Adicione produtos ao carrinho primeiro!")]
    EmptyCart,

    #[error("Product {0} not in cart")]
    NotInCart(String),

    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Catches a scanner repeating a digit (1000 instead of 10).
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// All 9999 numbers for the day are taken.
    #[error("Sale number sequence exhausted for {date}")]
    SaleSequenceExhausted { date: String },

    #[error("❌ Acesso negado: {message}")]
    PermissionDenied { message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn denied(message: impl Into<String>) -> Self {
        CoreError::PermissionDenied {
            message: message.into(),
        }
    }
}

/// Rejected request input, reported before any rule or query runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// A computed amount left the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// `reason` is shown as-is, so some are already user-facing
    /// ("Email inválido").
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    #[error("Nenhum dado foi fornecido para atualização")]
    NothingToUpdate,
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn overflow(field: &str) -> Self {
        ValidationError::Overflow {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
