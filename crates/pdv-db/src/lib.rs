//! # pdv-db
//!
//! SQLite storage for the PDV backend, built on sqlx.
//!
//! [`Database`] owns the pool and hands out one repository per table group:
//!
//! | accessor         | covers                                           |
//! |------------------|--------------------------------------------------|
//! | `users()`        | accounts, password hashes, roles                 |
//! | `categories()`   | product categories (get-or-create by name)       |
//! | `products()`     | catalog, barcode / `PRD###` lookup, stock        |
//! | `sales()`        | atomic checkout and cancellation, history        |
//! | `reports()`      | dashboard aggregates                             |
//! | `settings()`     | JSON key/value settings (security policy)        |
//!
//! Rule violations found mid-transaction (insufficient stock, sale already
//! cancelled) surface as [`DbError::Core`] carrying the `pdv_core` error.
//!
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("pdv.db")).await?;
//! let low = db.products().low_stock(5).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
pub use repository::user::{NewUser, UserRepository, UserUpdate};
