//! # pdv-core
//!
//! The rules of the PDV (ponto de venda) backend, free of I/O: callers hand
//! in data and the current time, and get back values or a [`CoreError`].
//!
//! - [`money`]: centavo amounts, never floats
//! - [`cart`]: lines, discount and addition adjustments, totals
//! - [`types`]: users, products, sales and their request payloads
//! - [`permissions`]: the user < manager < admin ladder
//! - [`validation`]: email, phone, barcode, price and limit checks
//! - [`sale_number`]: daily `VNDyyyymmddNNNN` numbering
//! - [`inactivity`]: idle-session clock and warning window
//!
//! ## Example
//!
//! ```rust
//! use pdv_core::cart::{Adjustment, Cart};
//! use pdv_core::money::Money;
//!
//! let mut cart = Cart::new();
//! cart.add_item("p1", "Café", Money::from_cents(1000), 2).unwrap();
//! cart.add_item("p2", "Pão", Money::from_cents(500), 1).unwrap();
//! cart.set_discount(Adjustment::flat(Money::from_cents(200))).unwrap();
//!
//! let totals = cart.totals().unwrap();
//! assert_eq!(totals.subtotal.cents(), 2500);
//! assert_eq!(totals.total.cents(), 2300);
//! ```

pub mod cart;
pub mod error;
pub mod inactivity;
pub mod money;
pub mod permissions;
pub mod sale_number;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Distinct products one cart may hold.
pub const MAX_CART_ITEMS: usize = 100;

/// Upper bound on one line's quantity.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Shown for products without a category.
pub const NO_CATEGORY_LABEL: &str = "Sem categoria";

/// Operator name for sales whose user row is gone.
pub const SYSTEM_USER_LABEL: &str = "Sistema";
