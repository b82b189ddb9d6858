//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. FINALIZE (one transaction)                                         │
//! │     └── create_sale() → Sale { status: Completed }                     │
//! │         ├── header row (takes the write lock)                          │
//! │         ├── VNDYYYYMMDDNNNN from the day's last number                 │
//! │         ├── sale_items rows, product names frozen                      │
//! │         └── stock = MAX(0, stock - qty), deducted amount recorded      │
//! │                                                                         │
//! │  2. (OPTIONAL) CANCEL (one transaction)                                │
//! │     └── cancel_sale() → Sale { status: Cancelled }                     │
//! │         └── stock += stock_deducted for every line                     │
//! │                                                                         │
//! │  Any error before commit rolls everything back.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use pdv_core::sale_number::{day_prefix, next_sale_number};
use pdv_core::{
    CoreError, CreatedSale, NewSale, RecentSale, Sale, SaleDetail, SaleItem, SaleStatus,
    SaleSummary, ValidationError, SYSTEM_USER_LABEL,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = r#"
    id, sale_number, user_id, subtotal_cents, discount_cents, addition_cents,
    total_cents, payment_method, status, notes, created_at, updated_at, cancelled_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Persists a sale and deducts stock, stamped with the current time.
    pub async fn create_sale(&self, sale: &NewSale) -> DbResult<CreatedSale> {
        self.create_sale_at(sale, Utc::now()).await
    }

    /// Persists a sale as of `now`.
    ///
    /// ## What This Does
    /// 1. Inserts the header (status `completed`) under a placeholder number
    /// 2. Reads the day's last sale number and assigns the next one
    /// 3. For each line: refuses deactivated products, freezes the product
    ///    name, deducts stock clamped at zero and records the deducted amount
    ///    on the line
    /// 4. Commits
    ///
    /// ## Errors
    /// * `Validation` - empty items, bad quantity or amounts, a total that
    ///   overflows, or a line for a deactivated product
    /// * `ProductNotFound` - a line references an unknown product
    /// * `SaleSequenceExhausted` - 9999 sales already issued today
    pub async fn create_sale_at(
        &self,
        sale: &NewSale,
        now: DateTime<Utc>,
    ) -> DbResult<CreatedSale> {
        sale.validate()?;

        let id = Uuid::new_v4().to_string();
        let subtotal = sale.subtotal()?;
        let total = sale.total()?;

        debug!(
            id = %id,
            items = sale.items.len(),
            total = %total,
            payment_method = sale.payment_method.as_str(),
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        // Writing first makes this the write transaction; the sequence read
        // below cannot race another sale.
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, user_id, subtotal_cents, discount_cents,
                addition_cents, total_cents, payment_method, status, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(format!("PENDING-{id}"))
        .bind(&sale.user_id)
        .bind(subtotal.cents())
        .bind(sale.discount_cents)
        .bind(sale.addition_cents)
        .bind(total.cents())
        .bind(sale.payment_method)
        .bind(SaleStatus::Completed)
        .bind(&sale.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let today = now.date_naive();
        let last_of_day = sqlx::query_scalar::<_, String>(
            r#"
            SELECT sale_number FROM sales
            WHERE sale_number LIKE ?1
            ORDER BY sale_number DESC
            LIMIT 1
            "#,
        )
        .bind(format!("{}%", day_prefix(today)))
        .fetch_optional(&mut *tx)
        .await?;

        let sale_number = next_sale_number(today, last_of_day.as_deref())?;

        sqlx::query("UPDATE sales SET sale_number = ?1 WHERE id = ?2")
            .bind(&sale_number)
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        for item in &sale.items {
            let (product_name, stock, active) = sqlx::query_as::<_, (String, i64, bool)>(
                "SELECT name, stock_quantity, active FROM products WHERE id = ?1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if !active {
                warn!(product_id = %item.product_id, "Sale line for inactive product");
                return Err(ValidationError::invalid(
                    "product",
                    format!("{product_name} está inativo"),
                )
                .into());
            }

            let line_total = item.total().ok_or_else(|| ValidationError::overflow("total"))?;
            let deducted = item.quantity.min(stock.max(0));
            if deducted < item.quantity {
                warn!(
                    product_id = %item.product_id,
                    requested = item.quantity,
                    available = stock,
                    "Stock insufficient, clamping at zero"
                );
            }

            sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = MAX(0, stock_quantity - ?1), updated_at = ?2
                WHERE id = ?3
                "#,
            )
            .bind(item.quantity)
            .bind(now)
            .bind(&item.product_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, quantity,
                    unit_price_cents, total_price_cents, stock_deducted, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(&item.product_id)
            .bind(&product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(line_total.cents())
            .bind(deducted)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %id, sale_number = %sale_number, total = %total, "Sale completed");

        Ok(CreatedSale {
            id,
            sale_number,
            total_cents: total.cents(),
        })
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Cancels a completed or pending sale and puts the deducted stock back.
    ///
    /// ## Errors
    /// * `NotFound` - no such sale
    /// * `SaleAlreadyCancelled` - "Venda já está cancelada"
    pub async fn cancel_sale(&self, id: &str) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE sales
            SET status = ?1, cancelled_at = ?2, updated_at = ?2
            WHERE id = ?3 AND status IN (?4, ?5)
            "#,
        )
        .bind(SaleStatus::Cancelled)
        .bind(now)
        .bind(id)
        .bind(SaleStatus::Completed)
        .bind(SaleStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            let status = sqlx::query_scalar::<_, SaleStatus>("SELECT status FROM sales WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match status {
                Some(SaleStatus::Cancelled) => CoreError::SaleAlreadyCancelled {
                    sale_id: id.to_string(),
                }
                .into(),
                _ => DbError::not_found("Sale", id),
            });
        }

        let lines = sqlx::query_as::<_, (String, i64)>(
            "SELECT product_id, stock_deducted FROM sale_items WHERE sale_id = ?1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, deducted) in &lines {
            if *deducted == 0 {
                continue;
            }
            sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity + ?1, updated_at = ?2
                WHERE id = ?3
                "#,
            )
            .bind(deducted)
            .bind(now)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %id, lines = lines.len(), "Sale cancelled, stock restored");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Line items in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, product_id, product_name, quantity,
                unit_price_cents, total_price_cents, stock_deducted, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sale header, lines and operator name.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.get_items(id).await?;

        let user_name = match &sale.user_id {
            Some(user_id) => {
                sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        }
        .unwrap_or_else(|| SYSTEM_USER_LABEL.to_string());

        Ok(Some(SaleDetail {
            sale,
            items,
            user_name,
        }))
    }

    /// Newest sales of any status, with the operator's name.
    pub async fn history(&self, limit: i64) -> DbResult<Vec<SaleSummary>> {
        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id, s.sale_number, s.subtotal_cents, s.discount_cents,
                s.addition_cents, s.total_cents, s.payment_method, s.status,
                s.notes, s.created_at,
                COALESCE(u.name, ?1) AS user_name
            FROM sales s
            LEFT JOIN users u ON u.id = s.user_id
            ORDER BY s.created_at DESC, s.sale_number DESC
            LIMIT ?2
            "#,
        )
        .bind(SYSTEM_USER_LABEL)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Loaded sales history");
        Ok(sales)
    }

    /// Newest completed sales for the dashboard feed.
    pub async fn recent_completed(&self, limit: i64) -> DbResult<Vec<RecentSale>> {
        let sales = sqlx::query_as::<_, RecentSale>(
            r#"
            SELECT id, sale_number, total_cents, payment_method, created_at
            FROM sales
            WHERE status = ?1
            ORDER BY created_at DESC, sale_number DESC
            LIMIT ?2
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
