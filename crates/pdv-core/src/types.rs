//! Records and request payloads shared by the database and the API.
//!
//! Rows carry a UUID `id` for relations plus a human-facing key where the
//! cashier needs one: `PRD001`-style internal codes for products and
//! `VND202601310001` sale numbers. Stored amounts are plain `*_cents`
//! integers; accessors wrap them in [`Money`].
//!
//! Sale items copy the product name and unit price at checkout, so later
//! catalog edits never rewrite history. `stock_deducted` records how many
//! units a line actually took from stock, which is what cancellation puts
//! back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    normalize_optional, validate_barcode, validate_category, validate_name, validate_non_negative,
    validate_price, validate_quantity,
};

// =============================================================================
// Role
// =============================================================================

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    /// Position in the hierarchy; higher outranks lower.
    pub const fn level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::User => 1,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "user".into()],
            }),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    /// Finalized at the PDV; stock already deducted.
    Completed,
    /// Reversed; stock restored.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Dinheiro.
    Cash,
    /// Cartão on an external terminal.
    Card,
    /// Instant bank transfer.
    Pix,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// An operator of the system. The password hash never leaves pdv-db.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    pub description: Option<String>,

    /// Sale price in centavos.
    pub price_cents: i64,

    /// Cost in centavos (for margin reports).
    pub cost_price_cents: i64,

    /// Sellable units on hand. Never negative.
    pub stock_quantity: i64,

    /// Threshold at or below which the product is "low stock".
    pub min_stock: i64,

    /// Barcode (EAN-13 etc.).
    pub barcode: Option<String>,

    pub category_id: Option<String>,

    /// Joined from `categories`; `None` when uncategorized.
    pub category_name: Option<String>,

    /// Whether product is active (soft delete).
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Short `PRD###` code derived from the id.
    pub fn internal_code(&self) -> Option<String> {
        internal_code(&self.id)
    }

    /// `stock ≤ min_stock`.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Derives the `PRD###` code from an id.
///
/// The last six characters are read as base-36 (stopping at the first
/// non-alphanumeric character), reduced modulo 999 and offset by one, so
/// codes run `PRD001` to `PRD999`. An id whose tail has no base-36
/// digits has no code.
///
/// ```rust
/// use pdv_core::types::internal_code;
///
/// // "000001" in base 36 is 1 → 1 % 999 + 1 = 2
/// assert_eq!(
///     internal_code("aaaaaaaa-0000-0000-0000-000000000001").as_deref(),
///     Some("PRD002")
/// );
/// assert_eq!(internal_code("------"), None);
/// ```
pub fn internal_code(id: &str) -> Option<String> {
    let tail: String = id.chars().rev().take(6).collect::<Vec<_>>().into_iter().rev().collect();
    let digits: String = tail.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
    let value = u64::from_str_radix(&digits, 36).ok()?;
    Some(format!("PRD{:03}", value % 999 + 1))
}

/// Fields for creating a product. Prices in centavos.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_price_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Category name; looked up or created. Blank or "Sem categoria" means none.
    #[serde(default)]
    pub category: Option<String>,
}

/// Partial product update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub min_stock: Option<i64>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
}

impl NewProduct {
    /// Trims text fields and checks prices, stock, barcode and category.
    pub fn validated(self) -> Result<NewProduct, ValidationError> {
        let name = validate_name("name", &self.name)?;
        validate_price("price", self.price_cents)?;
        validate_price("cost_price", self.cost_price_cents)?;
        validate_non_negative("stock_quantity", self.stock_quantity)?;
        validate_non_negative("min_stock", self.min_stock)?;
        let barcode = validate_barcode(self.barcode.as_deref())?;
        let category = validate_category(self.category.as_deref())?;

        Ok(NewProduct {
            name,
            description: normalize_optional(self.description.as_deref()),
            barcode,
            category,
            ..self
        })
    }
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.cost_price_cents.is_none()
            && self.stock_quantity.is_none()
            && self.min_stock.is_none()
            && self.barcode.is_none()
            && self.category.is_none()
            && self.active.is_none()
    }

    /// Same checks as [`NewProduct::validated`] for the fields present.
    ///
    /// An empty string in `description`, `barcode` or `category` is kept
    /// and means "clear it".
    pub fn validated(self) -> Result<ProductUpdate, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NothingToUpdate);
        }
        let name = self
            .name
            .as_deref()
            .map(|n| validate_name("name", n))
            .transpose()?;
        for (field, value) in [("price", self.price_cents), ("cost_price", self.cost_price_cents)] {
            if let Some(v) = value {
                validate_price(field, v)?;
            }
        }
        for (field, value) in [
            ("stock_quantity", self.stock_quantity),
            ("min_stock", self.min_stock),
        ] {
            if let Some(v) = value {
                validate_non_negative(field, v)?;
            }
        }
        let barcode = match self.barcode.as_deref() {
            Some(code) => Some(validate_barcode(Some(code))?.unwrap_or_default()),
            None => None,
        };
        let category = match self.category.as_deref() {
            Some(c) => Some(validate_category(Some(c))?.unwrap_or_default()),
            None => None,
        };
        let clear_or_trim = |v: Option<String>| v.map(|s| s.trim().to_string());

        Ok(ProductUpdate {
            name,
            description: clear_or_trim(self.description),
            barcode,
            category,
            ..self
        })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized (or cancelled) sale header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// `VND{YYYYMMDD}{NNNN}`.
    pub sale_number: String,
    pub user_id: Option<String>,
    /// Sum of line totals.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub addition_cents: i64,
    /// `max(0, subtotal - discount + addition)`.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale history row joined with the operator's name.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleSummary {
    pub id: String,
    pub sale_number: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub addition_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Operator name, or "Sistema" when the user is gone.
    pub user_name: String,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// `unit_price × quantity`.
    pub total_price_cents: i64,
    /// Units actually taken from stock (quantity clamped at available stock).
    pub stock_deducted: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sale with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub user_name: String,
}

// =============================================================================
// Sale Creation
// =============================================================================

/// One line of a sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewSaleItem {
    /// `None` when price times quantity overflows.
    pub fn total(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul(self.quantity)
    }
}

/// Everything needed to persist a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub user_id: String,
    pub items: Vec<NewSaleItem>,
    pub discount_cents: i64,
    pub addition_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewSale {
    pub fn subtotal(&self) -> Result<Money, ValidationError> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total()?))
            .ok_or_else(|| ValidationError::overflow("subtotal"))
    }

    /// Subtotal minus discount plus addition, floored at zero.
    pub fn total(&self) -> Result<Money, ValidationError> {
        self.subtotal()?
            .checked_sub(Money::from_cents(self.discount_cents))
            .and_then(|m| m.checked_add(Money::from_cents(self.addition_cents)))
            .map(Money::clamp_non_negative)
            .ok_or_else(|| ValidationError::overflow("total"))
    }

    /// Checks the request before anything touches the database.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::required("items"));
        }
        for item in &self.items {
            validate_quantity(item.quantity)?;
            validate_price("unit_price", item.unit_price_cents)?;
        }
        validate_non_negative("discount", self.discount_cents)?;
        validate_non_negative("addition", self.addition_cents)?;
        self.total().map(|_| ())
    }
}

/// Result of a successful sale finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatedSale {
    pub id: String,
    pub sale_number: String,
    pub total_cents: i64,
}

// =============================================================================
// Security Settings
// =============================================================================

/// Inactivity settings editable by managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SecuritySettings {
    /// Minutes of inactivity before forced logout (5..=480).
    pub inactivity_timeout_minutes: i64,
    /// Minutes before logout at which the warning starts (1..=30).
    pub warning_minutes: i64,
    pub warnings_enabled: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_minutes: 30,
            warning_minutes: 5,
            warnings_enabled: true,
        }
    }
}

impl SecuritySettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(5..=480).contains(&self.inactivity_timeout_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "inactivity_timeout_minutes".to_string(),
                min: 5,
                max: 480,
            });
        }
        if !(1..=30).contains(&self.warning_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "warning_minutes".to_string(),
                min: 1,
                max: 30,
            });
        }
        if self.warning_minutes >= self.inactivity_timeout_minutes {
            return Err(ValidationError::invalid(
                "warning_minutes",
                "must be shorter than the inactivity timeout",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Dashboard header figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub sales_today_cents: i64,
    pub sales_month_cents: i64,
    /// Today vs yesterday, percent with one decimal. 0 when yesterday had no sales.
    pub sales_growth: f64,
    pub total_products: i64,
    pub low_stock_products: i64,
    pub average_ticket_cents: i64,
}

/// Revenue of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue_cents: i64,
}

/// A recent completed sale for the dashboard feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecentSale {
    pub id: String,
    pub sale_number: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Aggregates for the sales page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesStats {
    pub total_sales: i64,
    pub completed_sales: i64,
    pub cancelled_sales: i64,
    pub pending_sales: i64,
    pub total_revenue_cents: i64,
    pub cancelled_revenue_cents: i64,
    pub average_ticket_cents: i64,
    /// Units sold in completed sales.
    pub total_items: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_request(items: Vec<(i64, i64)>, discount: i64, addition: i64) -> NewSale {
        NewSale {
            user_id: "u1".into(),
            items: items
                .into_iter()
                .enumerate()
                .map(|(i, (price, qty))| NewSaleItem {
                    product_id: format!("p{i}"),
                    quantity: qty,
                    unit_price_cents: price,
                })
                .collect(),
            discount_cents: discount,
            addition_cents: addition,
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    #[test]
    fn test_role_levels() {
        assert!(Role::Admin.level() > Role::Manager.level());
        assert!(Role::Manager.level() > Role::User.level());
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Pix).unwrap(), "\"pix\"");
        assert_eq!(
            serde_json::to_string(&SaleStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_internal_code() {
        let code = |id: &str| internal_code(id).unwrap();
        // "000000" → 0 → PRD001
        assert_eq!(code("00000000-0000-0000-0000-000000000000"), "PRD001");
        // "00000z" = 35 → PRD036
        assert_eq!(code("x-00000z"), "PRD036");
        // Always three digits and within range
        let uuid_code = code("4f1c2d3e-9a8b-4c7d-8e6f-5a4b3c2d1e0f");
        assert_eq!(uuid_code.len(), 6);
        let n: u32 = uuid_code[3..].parse().unwrap();
        assert!((1..=999).contains(&n));
    }

    #[test]
    fn test_internal_code_stops_at_separator() {
        // Tail "ab-cde" → only "ab" parses
        let value = u64::from_str_radix("ab", 36).unwrap();
        assert_eq!(internal_code("xxab-cde"), Some(format!("PRD{:03}", value % 999 + 1)));
    }

    #[test]
    fn test_internal_code_needs_digits() {
        assert_eq!(internal_code("------"), None);
        assert_eq!(internal_code("abc-"), None);
        assert_eq!(internal_code(""), None);
    }

    #[test]
    fn test_new_sale_totals() {
        let sale = sale_request(vec![(1000, 2), (500, 1)], 200, 0);
        assert_eq!(sale.subtotal().unwrap().cents(), 2500);
        assert_eq!(sale.total().unwrap().cents(), 2300);

        // Discount above subtotal plus addition still floors at zero
        let sale = sale_request(vec![(1000, 1)], 5000, 100);
        assert_eq!(sale.total().unwrap(), Money::zero());
    }

    #[test]
    fn test_new_sale_overflow_is_an_error() {
        let sale = sale_request(vec![(i64::MAX / 2, 3)], 0, 0);
        assert!(matches!(sale.subtotal(), Err(ValidationError::Overflow { .. })));
        assert!(sale.validate().is_err());

        let sale = sale_request(vec![(i64::MAX, 1)], 0, 1);
        assert!(matches!(sale.total(), Err(ValidationError::Overflow { .. })));
    }

    #[test]
    fn test_new_sale_validation() {
        assert!(sale_request(vec![], 0, 0).validate().is_err());
        assert!(sale_request(vec![(100, 0)], 0, 0).validate().is_err());
        assert!(sale_request(vec![(100, 1)], -1, 0).validate().is_err());
        assert!(sale_request(vec![(100, 1)], 0, -1).validate().is_err());
        assert!(sale_request(vec![(100, 1)], 0, 0).validate().is_ok());
        assert!(sale_request(vec![(100, 1000)], 0, 0).validate().is_err());
        assert!(sale_request(vec![(i64::MAX, 1)], 0, 0).validate().is_err());
    }

    #[test]
    fn test_security_settings_validation() {
        assert!(SecuritySettings::default().validate().is_ok());

        let mut s = SecuritySettings::default();
        s.inactivity_timeout_minutes = 2;
        assert!(s.validate().is_err());

        let s = SecuritySettings {
            inactivity_timeout_minutes: 10,
            warning_minutes: 10,
            warnings_enabled: true,
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_product_update_is_empty() {
        assert!(ProductUpdate::default().is_empty());
        let update = ProductUpdate {
            min_stock: Some(3),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_new_product_validated() {
        let product = NewProduct {
            name: "  Café 500g ".into(),
            price_cents: 1890,
            barcode: Some(" 7891000100103 ".into()),
            category: Some("   ".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(product.name, "Café 500g");
        assert_eq!(product.barcode.as_deref(), Some("7891000100103"));
        assert_eq!(product.category, None);

        let negative = NewProduct {
            name: "Arroz".into(),
            price_cents: -1,
            ..Default::default()
        };
        assert!(negative.validated().is_err());

        let huge = NewProduct {
            name: "Arroz".into(),
            price_cents: i64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            huge.validated(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_category_name_needs_two_characters() {
        let one_char = NewProduct {
            name: "Arroz".into(),
            price_cents: 1000,
            category: Some(" B ".into()),
            ..Default::default()
        };
        assert!(matches!(
            one_char.validated(),
            Err(ValidationError::TooShort { .. })
        ));

        let named = NewProduct {
            name: "Arroz".into(),
            price_cents: 1000,
            category: Some(" Grãos ".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(named.category.as_deref(), Some("Grãos"));

        let update = ProductUpdate {
            category: Some("B".into()),
            ..Default::default()
        };
        assert!(update.validated().is_err());

        let clear = ProductUpdate {
            category: Some("  ".into()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(clear.category.as_deref(), Some(""));
    }

    #[test]
    fn test_product_update_validated() {
        assert!(matches!(
            ProductUpdate::default().validated(),
            Err(ValidationError::NothingToUpdate)
        ));

        let clear = ProductUpdate {
            barcode: Some(String::new()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(clear.barcode.as_deref(), Some(""));

        let bad = ProductUpdate {
            barcode: Some("12ab".into()),
            ..Default::default()
        };
        assert!(bad.validated().is_err());

        let pricey = ProductUpdate {
            cost_price_cents: Some(i64::MAX),
            ..Default::default()
        };
        assert!(pricey.validated().is_err());
    }
}
