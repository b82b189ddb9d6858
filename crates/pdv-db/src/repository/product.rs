//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Catalog listing with the category name joined in
//! - Lookup by barcode or `PRD###` internal code (PDV scanner)
//! - CRUD with soft delete
//! - Low-stock queries for the dashboard
//!
//! ## Scanner Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Scan Resolves                                  │
//! │                                                                         │
//! │  Cashier scans: "7891000100103"         Cashier types: "prd042"        │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  classify_code → Barcode              classify_code → InternalCode     │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  WHERE barcode = ?  (indexed)         internal_code(id) == "PRD042"    │
//! │                                       over active products             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The internal code is derived from the id, so it has no column and no
//! index. Catalogs are small enough for the scan.

use chrono::Utc;
use pdv_core::validation::{classify_code, ScanCode};
use pdv_core::{NewProduct, Product, ProductUpdate};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::category::CategoryRepository;

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.description,
        p.price_cents,
        p.cost_price_cents,
        p.stock_quantity,
        p.min_stock,
        p.barcode,
        p.category_id,
        c.name AS category_name,
        p.active,
        p.created_at,
        p.updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Scanner input
/// let product = repo.find_by_code("7891000100103").await?;
///
/// // Dashboard
/// let low = repo.low_stock(5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Active products, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.active = 1 ORDER BY p.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Active product with this barcode.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.barcode = ?1 AND p.active = 1 LIMIT 1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Active product whose derived `PRD###` code matches (case-insensitive).
    ///
    /// Codes can collide; the newest product wins.
    pub async fn find_by_internal_code(&self, code: &str) -> DbResult<Option<Product>> {
        let wanted = code.trim().to_ascii_uppercase();
        let product = self
            .list_active()
            .await?
            .into_iter()
            .find(|p| p.internal_code().as_deref() == Some(wanted.as_str()));

        Ok(product)
    }

    /// Resolves raw scanner input to a product.
    pub async fn find_by_code(&self, input: &str) -> DbResult<Option<Product>> {
        match classify_code(input) {
            Some(ScanCode::Barcode(code)) => self.find_by_barcode(&code).await,
            Some(ScanCode::InternalCode(code)) => self.find_by_internal_code(&code).await,
            None => Ok(None),
        }
    }

    /// Inserts a product, creating its category by name if needed.
    pub async fn insert(&self, new_product: NewProduct) -> DbResult<Product> {
        let new_product = new_product.validated()?;

        let category_id = match new_product.category.as_deref() {
            Some(name) => self.categories().get_or_create(name).await?,
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %new_product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, cost_price_cents,
                stock_quantity, min_stock, barcode, category_id, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price_cents)
        .bind(new_product.cost_price_cents)
        .bind(new_product.stock_quantity)
        .bind(new_product.min_stock)
        .bind(&new_product.barcode)
        .bind(&category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(id = %id, code = ?pdv_core::types::internal_code(&id), "Product created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Applies a partial update.
    ///
    /// Empty strings in `description`, `barcode` or `category` clear the
    /// column. An update with no fields fails with `NothingToUpdate`.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        let update = update.validated()?;

        let category_id = match update.category.as_deref() {
            Some(name) => Some(self.categories().get_or_create(name).await?),
            None => None,
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(name) = &update.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(description) = &update.description {
                set.push("description = ")
                    .push_bind_unseparated(non_empty(description));
            }
            if let Some(price) = update.price_cents {
                set.push("price_cents = ").push_bind_unseparated(price);
            }
            if let Some(cost) = update.cost_price_cents {
                set.push("cost_price_cents = ").push_bind_unseparated(cost);
            }
            if let Some(stock) = update.stock_quantity {
                set.push("stock_quantity = ").push_bind_unseparated(stock);
            }
            if let Some(min_stock) = update.min_stock {
                set.push("min_stock = ").push_bind_unseparated(min_stock);
            }
            if let Some(barcode) = &update.barcode {
                set.push("barcode = ").push_bind_unseparated(non_empty(barcode));
            }
            if let Some(category_id) = category_id {
                set.push("category_id = ").push_bind_unseparated(category_id);
            }
            if let Some(active) = update.active {
                set.push("active = ").push_bind_unseparated(active);
            }
            set.push("updated_at = ").push_bind_unseparated(Utc::now());
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, "Product updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft delete. Past sales keep referencing the row.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Active products with `stock ≤ min_stock`, lowest stock first.
    pub async fn low_stock(&self, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"{PRODUCT_SELECT}
            WHERE p.active = 1 AND p.stock_quantity <= p.min_stock
            ORDER BY p.stock_quantity ASC, p.name ASC
            LIMIT ?1"#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE active = 1 AND stock_quantity <= min_stock",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
