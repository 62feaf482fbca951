//! # Statistics Repository
//!
//! Read-only aggregations for dashboards and report generation.
//!
//! ## Business Rules Baked Into The Queries
//! - Cancelled sales and cancelled orders never count towards revenue,
//!   rankings or averages.
//! - Payments count in the period they were received, regardless of when
//!   their sale was created (a February payment on a January credit sale is
//!   February cash flow).
//! - Sales bucket by their creation instant; orders bucket by `ordered_on`,
//!   the business date on the paperwork.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use shopkit_core::period::DateRange;
use shopkit_core::OrderStatus;

/// How [`StatsRepository::top_products`] ranks the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopProductRanking {
    /// Most units sold first.
    Quantity,
    /// Highest revenue first.
    Revenue,
}

/// One row of a top-product ranking.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    /// Snapshot name from the sale lines (latest wins on renames).
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue_cents: i64,
}

/// Revenue of one calendar month. Always emitted for all twelve months.
#[derive(Debug, Clone, Copy, Serialize, TS)]
#[ts(export)]
pub struct MonthlyRevenue {
    /// Month number, 1 = January.
    pub month: u32,
    pub revenue_cents: i64,
}

/// Order count for one lifecycle status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Purchase order statistics for one business.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct OrderStats {
    /// Counts per status (statuses with no orders are omitted).
    pub by_status: Vec<StatusCount>,
    /// Non-cancelled orders.
    pub order_count: i64,
    /// Total value of non-cancelled orders.
    pub total_cents: i64,
    /// Average order value in cents, 0 when there are no orders.
    pub average_cents: i64,
}

/// The metrics a report row carries, computed for one period.
#[derive(Debug, Clone, Copy, Default, Serialize, TS)]
#[ts(export)]
pub struct PeriodSummary {
    /// Total of non-cancelled sales created in the period.
    pub revenue_cents: i64,
    /// Count of those sales.
    pub sale_count: i64,
    /// Payments received in the period, regardless of sale date.
    pub payments_cents: i64,
    /// Orders whose `ordered_on` falls in the period.
    pub order_count: i64,
}

/// Repository for read-only statistics.
///
/// ## Usage
/// ```rust,ignore
/// let stats = StatsRepository::new(pool);
///
/// let top = stats
///     .top_products("biz-1", None, TopProductRanking::Quantity, 10)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Ranks products by units sold or by revenue.
    ///
    /// ## Arguments
    /// * `range` - Restrict to sales created in this period; `None` = all time
    /// * `rank_by` - Ranking criterion
    /// * `limit` - Maximum rows returned
    pub async fn top_products(
        &self,
        business_id: &str,
        range: Option<&DateRange>,
        rank_by: TopProductRanking,
        limit: u32,
    ) -> DbResult<Vec<TopProduct>> {
        let mut sql = String::from(
            "SELECT si.product_id, \
                    MAX(si.product_name) AS product_name, \
                    SUM(si.quantity) AS total_quantity, \
                    SUM(si.line_total_cents) AS total_revenue_cents \
             FROM sale_items si \
             JOIN sales s ON s.id = si.sale_id \
             WHERE s.business_id = ? AND s.status != 'cancelled'",
        );
        if range.is_some() {
            sql.push_str(" AND s.created_at >= ? AND s.created_at < ?");
        }
        sql.push_str(" GROUP BY si.product_id");
        sql.push_str(match rank_by {
            TopProductRanking::Quantity => " ORDER BY total_quantity DESC, si.product_id",
            TopProductRanking::Revenue => " ORDER BY total_revenue_cents DESC, si.product_id",
        });
        sql.push_str(" LIMIT ?");

        let mut query = sqlx::query_as::<_, TopProduct>(&sql).bind(business_id);
        if let Some(range) = range {
            query = query
                .bind(range.start_instant())
                .bind(range.end_exclusive_instant());
        }

        let rows = query.bind(limit).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Revenue per calendar month of one year, twelve slots, zero-filled.
    pub async fn monthly_revenue(
        &self,
        business_id: &str,
        year: i32,
    ) -> DbResult<Vec<MonthlyRevenue>> {
        let start = year_start(year)?;
        let end = year_start(year + 1)?;

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT CAST(strftime('%m', created_at) AS INTEGER) AS month,
                   SUM(total_cents) AS revenue_cents
            FROM sales
            WHERE business_id = ? AND status != 'cancelled'
              AND created_at >= ? AND created_at < ?
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut months: Vec<MonthlyRevenue> = (1..=12)
            .map(|month| MonthlyRevenue {
                month,
                revenue_cents: 0,
            })
            .collect();

        for (month, revenue_cents) in rows {
            if (1..=12).contains(&month) {
                months[(month - 1) as usize].revenue_cents = revenue_cents;
            }
        }

        Ok(months)
    }

    /// Purchase order statistics: counts per status plus value totals.
    pub async fn order_stats(&self, business_id: &str) -> DbResult<OrderStats> {
        let by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM orders
            WHERE business_id = ?
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        let (order_count, total_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM orders
            WHERE business_id = ? AND status != 'cancelled'
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        let average_cents = if order_count > 0 {
            total_cents / order_count
        } else {
            0
        };

        Ok(OrderStats {
            by_status,
            order_count,
            total_cents,
            average_cents,
        })
    }

    /// Computes the report metrics for one period.
    pub async fn period_summary(
        &self,
        business_id: &str,
        range: &DateRange,
    ) -> DbResult<PeriodSummary> {
        let start = range.start_instant();
        let end = range.end_exclusive_instant();

        let (revenue_cents, sale_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE business_id = ? AND status != 'cancelled'
              AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let payments_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.amount_cents), 0)
            FROM payments p
            JOIN sales s ON s.id = p.sale_id
            WHERE s.business_id = ? AND p.created_at >= ? AND p.created_at < ?
            "#,
        )
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let order_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM orders
            WHERE business_id = ? AND ordered_on >= ? AND ordered_on <= ?
            "#,
        )
        .bind(business_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodSummary {
            revenue_cents,
            sale_count,
            payments_cents,
            order_count,
        })
    }
}

fn year_start(year: i32) -> DbResult<chrono::DateTime<chrono::Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| DbError::Internal(format!("invalid report year: {year}")))
}

// =============================================================================
// Unit Tests
// =============================================================================
