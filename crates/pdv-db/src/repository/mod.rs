//! # Repository Module
//!
//! Database repository implementations for the PDV backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(&new_sale)                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(&self, sale)     (one transaction)                    │
//! │  ├── cancel_sale(&self, id)       (one transaction)                    │
//! │  ├── get_detail(&self, id)                                             │
//! │  └── history(&self, limit)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Operators and credentials
//! - [`category::CategoryRepository`] - Categories, get-or-create by name
//! - [`product::ProductRepository`] - Catalog CRUD and low-stock queries
//! - [`sale::SaleRepository`] - Sale finalization, cancellation, history
//! - [`report::ReportRepository`] - Dashboard and sales aggregates
//! - [`settings::SettingsRepository`] - JSON key/value settings

pub mod category;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod user;
