//! # Report Repository
//!
//! Database operations for generated report rows.
//!
//! One row exists per (business, report_type, period_start); regenerating a
//! period updates the metrics in place and leaves the row's identity and
//! workflow status untouched. That keeps report IDs stable for anything that
//! bookmarked them, and keeps a finalized report finalized across reruns.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopkit_core::{Report, ReportStatus, ReportType};

/// Repository for report database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ReportRepository::new(pool);
///
/// let report = repo.get_period("biz-1", ReportType::Monthly, start).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Gets a report by ID, scoped to one business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, business_id, report_type, status, period_start, period_end,
                   revenue_cents, sale_count, payments_cents, order_count,
                   generated_at, created_at
            FROM reports
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    /// Lists reports of a business, most recent period first.
    pub async fn list_for_business(&self, business_id: &str) -> DbResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, business_id, report_type, status, period_start, period_end,
                   revenue_cents, sale_count, payments_cents, order_count,
                   generated_at, created_at
            FROM reports
            WHERE business_id = ?
            ORDER BY period_start DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }

    /// Gets the report covering one period, if it was ever generated.
    pub async fn get_period(
        &self,
        business_id: &str,
        report_type: ReportType,
        period_start: NaiveDate,
    ) -> DbResult<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, business_id, report_type, status, period_start, period_end,
                   revenue_cents, sale_count, payments_cents, order_count,
                   generated_at, created_at
            FROM reports
            WHERE business_id = ? AND report_type = ? AND period_start = ?
            "#,
        )
        .bind(business_id)
        .bind(report_type)
        .bind(period_start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    /// Inserts a report, or refreshes the metrics of the existing row for
    /// the same (business, report_type, period_start).
    ///
    /// On conflict the stored `id`, `status` and `created_at` are kept;
    /// only the period end, the metrics and `generated_at` move.
    ///
    /// ## Returns
    /// The stored row (with the original ID when the period already existed).
    pub async fn upsert(&self, report: &Report) -> DbResult<Report> {
        debug!(
            business_id = %report.business_id,
            report_type = ?report.report_type,
            period_start = %report.period_start,
            "Upserting report"
        );

        sqlx::query(
            r#"
            INSERT INTO reports (id, business_id, report_type, status, period_start,
                                 period_end, revenue_cents, sale_count, payments_cents,
                                 order_count, generated_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (business_id, report_type, period_start) DO UPDATE SET
                period_end = excluded.period_end,
                revenue_cents = excluded.revenue_cents,
                sale_count = excluded.sale_count,
                payments_cents = excluded.payments_cents,
                order_count = excluded.order_count,
                generated_at = excluded.generated_at
            "#,
        )
        .bind(&report.id)
        .bind(&report.business_id)
        .bind(report.report_type)
        .bind(report.status)
        .bind(report.period_start)
        .bind(report.period_end)
        .bind(report.revenue_cents)
        .bind(report.sale_count)
        .bind(report.payments_cents)
        .bind(report.order_count)
        .bind(report.generated_at)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        self.get_period(&report.business_id, report.report_type, report.period_start)
            .await?
            .ok_or_else(|| DbError::Internal(format!("report row missing after upsert: {}", report.id)))
    }

    /// Moves a report's workflow status, guarded on the expected current one.
    ///
    /// ## Returns
    /// * `Ok(true)` - status moved
    /// * `Ok(false)` - the stored status no longer matches `from`
    pub async fn set_status(
        &self,
        business_id: &str,
        report_id: &str,
        from: ReportStatus,
        to: ReportStatus,
    ) -> DbResult<bool> {
        debug!(report_id = %report_id, from = %from, to = %to, "Moving report status");

        let result = sqlx::query(
            "UPDATE reports SET status = ? WHERE id = ? AND business_id = ? AND status = ?",
        )
        .bind(to)
        .bind(report_id)
        .bind(business_id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper to generate a new report ID.
pub fn generate_report_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Utc;

    fn report_row(id: &str, revenue_cents: i64, sale_count: i64) -> Report {
        let now = Utc::now();
        Report {
            id: id.to_string(),
            business_id: "biz-1".to_string(),
            report_type: ReportType::Monthly,
            status: ReportStatus::Draft,
            period_start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            revenue_cents,
            sale_count,
            payments_cents: revenue_cents,
            order_count: 0,
            generated_at: now,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_row_identity_and_status() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        let repo = db.reports();

        let first = repo.upsert(&report_row("rep-1", 10_000, 3)).await.unwrap();
        assert_eq!(first.id, "rep-1");
        assert_eq!(first.revenue_cents, 10_000);

        // Finalize, then regenerate with fresh metrics and a different ID.
        assert!(repo
            .set_status("biz-1", "rep-1", ReportStatus::Draft, ReportStatus::Finalized)
            .await
            .unwrap());

        let second = repo.upsert(&report_row("rep-2", 12_500, 4)).await.unwrap();
        assert_eq!(second.id, "rep-1");
        assert_eq!(second.status, ReportStatus::Finalized);
        assert_eq!(second.revenue_cents, 12_500);
        assert_eq!(second.sale_count, 4);

        // Still exactly one row for the period.
        assert_eq!(repo.list_for_business("biz-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_status_guard_rejects_stale_transition() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        let repo = db.reports();

        repo.upsert(&report_row("rep-1", 0, 0)).await.unwrap();

        assert!(repo
            .set_status("biz-1", "rep-1", ReportStatus::Draft, ReportStatus::Finalized)
            .await
            .unwrap());
        // Already finalized: the draft-based move no longer applies.
        assert!(!repo
            .set_status("biz-1", "rep-1", ReportStatus::Draft, ReportStatus::Finalized)
            .await
            .unwrap());
    }
}
