//! # Validation Module
//!
//! Input validation for the PDV backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend forms                                               │
//! │  └── Immediate feedback (empty, length)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (pdv-server)                                    │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_quantity >= 0)                                       │
//! │  ├── UNIQUE (email, sale_number)                                       │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that normalize their input return the cleaned value.

use crate::error::ValidationError;
use crate::money::BPS_SCALE;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum length of person, product and category names.
pub const MIN_NAME_LEN: usize = 2;

/// Highest unit or cost price accepted: R$ 1.000.000,00.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest flat discount or addition: R$ 10.000.000,00.
pub const MAX_ADJUSTMENT_CENTS: i64 = 1_000_000_000;

/// Percent adjustments stop at 100%.
pub const MAX_PERCENT_BPS: u32 = BPS_SCALE as u32;

/// Default and maximum page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Default and maximum window for the daily revenue chart.
pub const DEFAULT_REVENUE_DAYS: i64 = 7;
pub const MAX_REVENUE_DAYS: i64 = 90;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an email address and returns it trimmed and lowercased.
///
/// ```rust
/// use pdv_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Admin@PDV.com ").unwrap(), "admin@pdv.com");
/// assert!(validate_email("admin@").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::invalid("email", "Email inválido");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates a password (length only).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if len > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

/// Validates a person, product or category name and returns it trimmed.
///
/// ## Rules
/// - At least 2 characters after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();
    let len = name.chars().count();

    if len == 0 {
        return Err(ValidationError::required(field));
    }
    if len < MIN_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NAME_LEN,
        });
    }
    if len > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }
    Ok(name.to_string())
}

/// Validates an optional barcode. Blank means "no barcode".
///
/// ## Rules
/// - Digits only
/// - 8 to 14 digits (EAN-8 through GTIN-14)
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(code) = barcode.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid("barcode", "must contain only digits"));
    }
    if !(8..=14).contains(&code.len()) {
        return Err(ValidationError::OutOfRange {
            field: "barcode length".to_string(),
            min: 8,
            max: 14,
        });
    }
    Ok(Some(code.to_string()))
}

/// Validates an optional category name. Blank means "no category".
///
/// ```rust
/// use pdv_core::validation::validate_category;
///
/// assert_eq!(validate_category(Some(" Bebidas ")).unwrap().as_deref(), Some("Bebidas"));
/// assert_eq!(validate_category(Some("  ")).unwrap(), None);
/// assert!(validate_category(Some("B")).is_err());
/// ```
pub fn validate_category(category: Option<&str>) -> ValidationResult<Option<String>> {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) => validate_name("category", name).map(Some),
        None => Ok(None),
    }
}

/// Trims an optional free-text field; blank becomes `None`.
pub fn normalize_optional(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Phone Numbers
// =============================================================================

/// Strips a phone number to its digits. Blank means "no phone".
///
/// ## Rules
/// - 10 or 11 digits (DDD + number)
///
/// ```rust
/// use pdv_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("(11) 99999-9999").unwrap().as_deref(), Some("11999999999"));
/// assert_eq!(normalize_phone("  ").unwrap(), None);
/// ```
pub fn normalize_phone(phone: &str) -> ValidationResult<Option<String>> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        if phone.trim().is_empty() {
            return Ok(None);
        }
        return Err(ValidationError::invalid("phone", "must contain digits"));
    }
    if digits.len() > 11 {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: 11,
        });
    }
    if digits.len() < 10 {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: 10,
        });
    }
    Ok(Some(digits))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart or sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or stock figure that must not be negative.
///
/// ```rust
/// use pdv_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", 1099).is_ok());
/// assert!(validate_non_negative("price", 0).is_ok());
/// assert!(validate_non_negative("price", -100).is_err());
/// ```
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Checks a centavo amount against `0..=max`.
///
/// ```rust
/// use pdv_core::validation::{validate_amount, MAX_PRICE_CENTS};
///
/// assert!(validate_amount("price", 1099, MAX_PRICE_CENTS).is_ok());
/// assert!(validate_amount("price", -1, MAX_PRICE_CENTS).is_err());
/// assert!(validate_amount("price", i64::MAX, MAX_PRICE_CENTS).is_err());
/// ```
pub fn validate_amount(field: &str, cents: i64, max: i64) -> ValidationResult<()> {
    validate_non_negative(field, cents)?;
    if cents > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

/// Unit and cost prices.
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    validate_amount(field, cents, MAX_PRICE_CENTS)
}

/// A percentage in basis points, at most 100%.
pub fn validate_percent(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_PERCENT_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::from(MAX_PERCENT_BPS),
        });
    }
    Ok(())
}

/// Resolves a `?limit=` parameter: default when absent, 1..=100 otherwise.
pub fn validate_limit(limit: Option<i64>, default: i64) -> ValidationResult<i64> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_LIMIT,
        });
    }
    Ok(limit)
}

/// Resolves a `?days=` parameter for the revenue chart.
pub fn validate_revenue_days(days: Option<i64>) -> ValidationResult<i64> {
    let days = days.unwrap_or(DEFAULT_REVENUE_DAYS);
    if !(1..=MAX_REVENUE_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: MAX_REVENUE_DAYS,
        });
    }
    Ok(days)
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid(field, "must be a valid UUID"))?;

    Ok(())
}

/// What a PDV search box entry looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCode {
    /// 8 or more digits.
    Barcode(String),
    /// `PRD###`, case-insensitive, normalized to upper case.
    InternalCode(String),
}

/// Classifies a scanned or typed code. Returns `None` for free-text searches.
///
/// ```rust
/// use pdv_core::validation::{classify_code, ScanCode};
///
/// assert_eq!(classify_code("7891000100103"), Some(ScanCode::Barcode("7891000100103".into())));
/// assert_eq!(classify_code("prd042"), Some(ScanCode::InternalCode("PRD042".into())));
/// assert_eq!(classify_code("café"), None);
/// ```
pub fn classify_code(input: &str) -> Option<ScanCode> {
    let input = input.trim();

    if input.len() >= 8 && input.chars().all(|c| c.is_ascii_digit()) {
        return Some(ScanCode::Barcode(input.to_string()));
    }

    let upper = input.to_ascii_uppercase();
    if let Some(digits) = upper.strip_prefix("PRD") {
        if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()) {
            return Some(ScanCode::InternalCode(upper));
        }
    }

    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("plain").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@b..co").is_err());
        assert!(validate_email("a b@c.co").is_err());
        assert!(validate_email("a@b@c.co").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "  Ana ").unwrap(), "Ana");
        assert!(validate_name("name", "A").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
        // Counted in characters, not bytes
        assert!(validate_name("name", "Çé").is_ok());
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(None).unwrap(), None);
        assert_eq!(validate_barcode(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_barcode(Some("7891000100103")).unwrap().as_deref(),
            Some("7891000100103")
        );
        assert!(validate_barcode(Some("12345")).is_err());
        assert!(validate_barcode(Some("78910001A0103")).is_err());
    }

    #[test]
    fn test_phone() {
        assert_eq!(normalize_phone("").unwrap(), None);
        assert_eq!(
            normalize_phone("(11) 3333-4444").unwrap().as_deref(),
            Some("1133334444")
        );
        assert!(normalize_phone("123").is_err());
        assert!(normalize_phone("119999999999").is_err());
        assert!(normalize_phone("abc").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_price_and_percent_bounds() {
        assert!(validate_price("price", 0).is_ok());
        assert!(validate_price("price", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price("price", MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(matches!(
            validate_price("price", i64::MIN),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        assert!(validate_percent("discount", 0).is_ok());
        assert!(validate_percent("discount", 10_000).is_ok());
        assert!(validate_percent("discount", 10_001).is_err());
        assert!(validate_percent("discount", u32::MAX).is_err());
    }

    #[test]
    fn test_limits() {
        assert_eq!(validate_limit(None, 3).unwrap(), 3);
        assert_eq!(validate_limit(Some(100), 3).unwrap(), 100);
        assert!(validate_limit(Some(0), 3).is_err());
        assert!(validate_limit(Some(101), 3).is_err());

        assert_eq!(validate_revenue_days(None).unwrap(), 7);
        assert!(validate_revenue_days(Some(91)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_classify_code() {
        assert_eq!(classify_code("1234567"), None);
        assert_eq!(
            classify_code("12345678"),
            Some(ScanCode::Barcode("12345678".into()))
        );
        assert_eq!(
            classify_code("PRD001"),
            Some(ScanCode::InternalCode("PRD001".into()))
        );
        assert_eq!(classify_code("PRD0001"), None);
    }
}
