//! # Report Repository
//!
//! Read-only aggregates for the dashboard and the sales page.
//!
//! Day boundaries are UTC midnights. Only `completed` sales count as
//! revenue; cancelled revenue is reported separately.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use pdv_core::{DailyRevenue, DashboardStats, SaleStatus, SalesStats};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Dashboard header figures as of `now`.
    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> DbResult<DashboardStats> {
        let today = now.date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        let yesterday = today.pred_opt().unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);

        let sales_today = self.revenue_between(today, tomorrow).await?;
        let sales_yesterday = self.revenue_between(yesterday, today).await?;
        let sales_month = self.revenue_between(month_start, tomorrow).await?;

        let products = ProductRepository::new(self.pool.clone());
        let total_products = products.count_active().await?;
        let low_stock_products = products.count_low_stock().await?;

        let (count, revenue) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales WHERE status = ?1",
        )
        .bind(SaleStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        let stats = DashboardStats {
            sales_today_cents: sales_today,
            sales_month_cents: sales_month,
            sales_growth: growth_percent(sales_today, sales_yesterday),
            total_products,
            low_stock_products,
            average_ticket_cents: average(revenue, count),
        };

        debug!(?stats, "Computed dashboard stats");
        Ok(stats)
    }

    /// Completed revenue per day for the last `days` days ending today,
    /// oldest first. Days without sales are present with zero.
    pub async fn daily_revenue(&self, days: i64, now: DateTime<Utc>) -> DbResult<Vec<DailyRevenue>> {
        let today = now.date_naive();
        let span = days.max(1);
        let first_day = (1..span).fold(today, |d, _| d.pred_opt().unwrap_or(d));

        let rows = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            SELECT total_cents, created_at
            FROM sales
            WHERE status = ?1 AND created_at >= ?2
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(start_of_day(first_day))
        .fetch_all(&self.pool)
        .await?;

        let mut buckets: BTreeMap<NaiveDate, i64> = first_day
            .iter_days()
            .take_while(|d| *d <= today)
            .map(|d| (d, 0))
            .collect();

        for (total_cents, created_at) in rows {
            if let Some(bucket) = buckets.get_mut(&created_at.date_naive()) {
                *bucket += total_cents;
            }
        }

        Ok(buckets
            .into_iter()
            .map(|(date, revenue_cents)| DailyRevenue { date, revenue_cents })
            .collect())
    }

    /// Counts and totals over every sale.
    pub async fn sales_stats(&self) -> DbResult<SalesStats> {
        let (total, completed, cancelled, pending, revenue, cancelled_revenue) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?3 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?1 THEN total_cents ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?2 THEN total_cents ELSE 0 END), 0)
                FROM sales
                "#,
            )
            .bind(SaleStatus::Completed)
            .bind(SaleStatus::Cancelled)
            .bind(SaleStatus::Pending)
            .fetch_one(&self.pool)
            .await?;

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(si.quantity), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.status = ?1
            "#,
        )
        .bind(SaleStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesStats {
            total_sales: total,
            completed_sales: completed,
            cancelled_sales: cancelled,
            pending_sales: pending,
            total_revenue_cents: revenue,
            cancelled_revenue_cents: cancelled_revenue,
            average_ticket_cents: average(revenue, completed),
            total_items,
        })
    }

    /// Completed revenue with `from ≤ created_at < until` (days, UTC).
    async fn revenue_between(&self, from: NaiveDate, until: NaiveDate) -> DbResult<i64> {
        let revenue = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE status = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(start_of_day(from))
        .bind(start_of_day(until))
        .fetch_one(&self.pool)
        .await?;

        Ok(revenue)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Rounded integer mean; 0 for no samples.
fn average(sum: i64, count: i64) -> i64 {
    if count <= 0 {
        return 0;
    }
    (sum + count / 2) / count
}

/// Percent change with one decimal. 0 when there is no baseline.
fn growth_percent(current: i64, previous: i64) -> f64 {
    if previous <= 0 {
        return 0.0;
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{make_product, make_user, test_db};
    use chrono::TimeZone;
    use pdv_core::{NewSale, NewSaleItem, PaymentMethod, Role};

    fn one_line(user_id: &str, product_id: &str, quantity: i64, price: i64) -> NewSale {
        NewSale {
            user_id: user_id.into(),
            items: vec![NewSaleItem {
                product_id: product_id.into(),
                quantity,
                unit_price_cents: price,
            }],
            discount_cents: 0,
            addition_cents: 0,
            payment_method: PaymentMethod::Pix,
            notes: None,
        }
    }

    #[test]
    fn test_growth_and_average() {
        assert_eq!(growth_percent(1500, 1000), 50.0);
        assert_eq!(growth_percent(1000, 3000), -66.7);
        assert_eq!(growth_percent(1000, 0), 0.0);
        assert_eq!(average(1000, 3), 333);
        assert_eq!(average(1001, 2), 501);
        assert_eq!(average(0, 0), 0);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let db = test_db().await;
        let user = make_user(&db, "caixa@pdv.com", Role::User).await;
        let product = make_product(&db, "Biscoito", 1000, 50).await;
        make_product(&db, "Gelo", 500, 1).await;

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 17, 15, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2026, 9, 30, 15, 0, 0).unwrap();

        let sales = db.sales();
        sales.create_sale_at(&one_line(&user.id, &product.id, 3, 1000), now).await.unwrap();
        sales.create_sale_at(&one_line(&user.id, &product.id, 2, 1000), yesterday).await.unwrap();
        sales.create_sale_at(&one_line(&user.id, &product.id, 1, 1000), last_month).await.unwrap();
        let cancelled = sales
            .create_sale_at(&one_line(&user.id, &product.id, 5, 1000), now)
            .await
            .unwrap();
        sales.cancel_sale(&cancelled.id).await.unwrap();

        let stats = db.reports().dashboard_stats(now).await.unwrap();
        assert_eq!(stats.sales_today_cents, 3000);
        assert_eq!(stats.sales_month_cents, 5000);
        assert_eq!(stats.sales_growth, 50.0);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.low_stock_products, 1);
        assert_eq!(stats.average_ticket_cents, 2000);
    }

    #[tokio::test]
    async fn test_daily_revenue_is_zero_filled() {
        let db = test_db().await;
        let user = make_user(&db, "caixa@pdv.com", Role::User).await;
        let product = make_product(&db, "Picolé", 400, 50).await;

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap();
        let two_days_ago = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let too_old = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();

        let sales = db.sales();
        sales.create_sale_at(&one_line(&user.id, &product.id, 1, 400), now).await.unwrap();
        sales.create_sale_at(&one_line(&user.id, &product.id, 2, 400), two_days_ago).await.unwrap();
        sales.create_sale_at(&one_line(&user.id, &product.id, 9, 400), too_old).await.unwrap();

        let days = db.reports().daily_revenue(3, now).await.unwrap();
        let revenue: Vec<_> = days.iter().map(|d| d.revenue_cents).collect();
        assert_eq!(revenue, vec![800, 0, 400]);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }

    #[tokio::test]
    async fn test_sales_stats() {
        let db = test_db().await;
        let user = make_user(&db, "caixa@pdv.com", Role::User).await;
        let product = make_product(&db, "Suco", 600, 50).await;

        let sales = db.sales();
        sales.create_sale(&one_line(&user.id, &product.id, 2, 600)).await.unwrap();
        sales.create_sale(&one_line(&user.id, &product.id, 1, 600)).await.unwrap();
        let cancelled = sales.create_sale(&one_line(&user.id, &product.id, 4, 600)).await.unwrap();
        sales.cancel_sale(&cancelled.id).await.unwrap();

        let stats = db.reports().sales_stats().await.unwrap();
        assert_eq!(stats.total_sales, 3);
        assert_eq!(stats.completed_sales, 2);
        assert_eq!(stats.cancelled_sales, 1);
        assert_eq!(stats.pending_sales, 0);
        assert_eq!(stats.total_revenue_cents, 1800);
        assert_eq!(stats.cancelled_revenue_cents, 2400);
        assert_eq!(stats.average_ticket_cents, 900);
        assert_eq!(stats.total_items, 3);
    }
}
