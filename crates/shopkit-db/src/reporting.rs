//! # Reporting Engine
//!
//! Generates period reports from the statistics repository and moves them
//! through their workflow (draft → finalized → archived).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Report Generation                                 │
//! │                                                                         │
//! │  validate_report(draft)          (pure, shopkit-core)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve period: explicit range (custom) or derived from the            │
//! │  reference date (daily/weekly/monthly/quarterly/yearly)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stats.period_summary(business, range)     (read-only)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reports.upsert(row)    ← regeneration refreshes figures in place;      │
//! │                           id, status and created_at are kept            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduled sweep calls [`generate_for_business`] directly, once per
//! active business; the on-demand path adds the permission check on top.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::pool::Database;
use crate::repository::report;
use shopkit_core::period::{self, DateRange};
use shopkit_core::validation::{self, ReportDraft};
use shopkit_core::{
    Actor, CoreError, FieldError, Permission, Report, ReportStatus, ReportType, ValidationError,
};

// =============================================================================
// Generation
// =============================================================================

/// Generates (or regenerates) a report from a raw draft.
///
/// ## Returns
/// The stored report row; for an already-covered period this is the
/// existing row with refreshed figures.
pub async fn generate_report(db: &Database, actor: &Actor, draft: ReportDraft) -> EngineResult<Report> {
    actor.require(Permission::GenerateReports)?;

    let request = validation::validate_report(draft)?;

    let range = match request.range {
        Some(range) => range,
        None => derive_or_reject(request.report_type, Utc::now().date_naive())?,
    };

    generate(db, &request.business_id, request.report_type, range).await
}

/// Generates one report for a business without an actor, for the scheduled
/// sweep. The period is derived from the reference date.
pub async fn generate_for_business(
    db: &Database,
    business_id: &str,
    report_type: ReportType,
    reference: NaiveDate,
) -> EngineResult<Report> {
    let range = derive_or_reject(report_type, reference)?;
    generate(db, business_id, report_type, range).await
}

/// Derives a non-custom period, rejecting the `custom` type which must
/// carry explicit dates.
fn derive_or_reject(report_type: ReportType, reference: NaiveDate) -> EngineResult<DateRange> {
    period::derive_range(report_type, reference).ok_or_else(|| {
        ValidationError::invalid(vec![
            FieldError::required("period_start"),
            FieldError::required("period_end"),
        ])
        .into()
    })
}

async fn generate(
    db: &Database,
    business_id: &str,
    report_type: ReportType,
    range: DateRange,
) -> EngineResult<Report> {
    if db.businesses().get_by_id(business_id).await?.is_none() {
        return Err(CoreError::not_found("Business", business_id).into());
    }

    debug!(
        business_id = %business_id,
        report_type = %report_type,
        period_start = %range.start,
        period_end = %range.end,
        "Generating report"
    );

    let summary = db.stats().period_summary(business_id, &range).await?;

    let now = Utc::now();
    let row = Report {
        id: report::generate_report_id(),
        business_id: business_id.to_string(),
        report_type,
        status: ReportStatus::Draft,
        period_start: range.start,
        period_end: range.end,
        revenue_cents: summary.revenue_cents,
        sale_count: summary.sale_count,
        payments_cents: summary.payments_cents,
        order_count: summary.order_count,
        generated_at: now,
        created_at: now,
    };
    let stored = db.reports().upsert(&row).await?;

    info!(
        report_id = %stored.id,
        business_id = %business_id,
        revenue_cents = stored.revenue_cents,
        "Report generated"
    );

    Ok(stored)
}

// =============================================================================
// Workflow
// =============================================================================

/// Signs a draft report off. Figures keep refreshing on regeneration; the
/// status does not move back.
pub async fn finalize_report(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    report_id: &str,
) -> EngineResult<Report> {
    advance(db, actor, business_id, report_id, ReportStatus::Finalized).await
}

/// Retires a finalized report from dashboards. Terminal.
pub async fn archive_report(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    report_id: &str,
) -> EngineResult<Report> {
    advance(db, actor, business_id, report_id, ReportStatus::Archived).await
}

/// Applies one workflow transition under the report lifecycle.
async fn advance(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    report_id: &str,
    to: ReportStatus,
) -> EngineResult<Report> {
    actor.require(Permission::GenerateReports)?;

    let current = db
        .reports()
        .get_by_id(business_id, report_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Report", report_id))?;

    let next = current.status.transition(to)?;

    // The guarded update re-checks the stored status, so a concurrent move
    // between our read and write surfaces as a rejected transition.
    if !db
        .reports()
        .set_status(business_id, report_id, current.status, next)
        .await?
    {
        return Err(CoreError::bad_transition("Report", current.status, next).into());
    }

    info!(report_id = %report_id, from = %current.status, to = %next, "Report status moved");

    Ok(Report {
        status: next,
        ..current
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testutil;
    use chrono::NaiveTime;
    use shopkit_core::{OrderStatus, Role, SaleStatus};

    fn admin() -> Actor {
        Actor::new("usr-1", "biz-1", Role::Admin)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_draft(business_id: &str, reference: &str) -> ReportDraft {
        ReportDraft {
            business_id: Some(business_id.to_string()),
            report_type: Some("daily".to_string()),
            reference_date: Some(reference.to_string()),
            ..ReportDraft::default()
        }
    }

    async fn seed_day_of_sales(db: &Database, date: NaiveDate) {
        testutil::seed_business(db, "biz-1").await;
        testutil::seed_product(db, "biz-1", "prd-1", 100, 0, 100).await;

        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).and_utc();
        for (n, total) in [(1, 100), (2, 200), (3, 300)] {
            testutil::insert_sale_rows(
                db,
                "biz-1",
                &format!("sal-{n}"),
                SaleStatus::Paid,
                noon,
                &[("prd-1", 1, total)],
            )
            .await;
            testutil::insert_payment_row(db, &format!("sal-{n}"), total, noon).await;
        }
    }

    #[tokio::test]
    async fn test_daily_report_sums_the_day() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;
        testutil::insert_order_row(&db, "biz-1", "ord-1", OrderStatus::Confirmed, 900, date).await;

        let report = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();

        assert_eq!(report.report_type, ReportType::Daily);
        assert_eq!(report.status, ReportStatus::Draft);
        assert_eq!(report.period_start, date);
        assert_eq!(report.period_end, date);
        assert_eq!(report.revenue_cents, 600);
        assert_eq!(report.sale_count, 3);
        assert_eq!(report.payments_cents, 600);
        assert_eq!(report.order_count, 1);
    }

    #[tokio::test]
    async fn test_cancelled_sales_stay_out_of_revenue() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;

        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).and_utc();
        testutil::insert_sale_rows(
            &db,
            "biz-1",
            "sal-cancelled",
            SaleStatus::Cancelled,
            noon,
            &[("prd-1", 1, 9_999)],
        )
        .await;

        let report = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();
        assert_eq!(report.revenue_cents, 600);
        assert_eq!(report.sale_count, 3);
    }

    #[tokio::test]
    async fn test_regeneration_refreshes_the_same_row() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;

        let first = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();
        assert_eq!(first.revenue_cents, 600);

        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).and_utc();
        testutil::insert_sale_rows(&db, "biz-1", "sal-4", SaleStatus::Paid, noon, &[("prd-1", 1, 400)])
            .await;

        let second = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.revenue_cents, 1_000);
        assert_eq!(second.created_at, first.created_at);

        assert_eq!(db.reports().list_for_business("biz-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finalized_report_keeps_status_on_regeneration() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;

        let report = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();
        let report = finalize_report(&db, &admin(), "biz-1", &report.id).await.unwrap();
        assert_eq!(report.status, ReportStatus::Finalized);

        let regenerated = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();
        assert_eq!(regenerated.id, report.id);
        assert_eq!(regenerated.status, ReportStatus::Finalized);
    }

    #[tokio::test]
    async fn test_workflow_rejects_skipping_finalize() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;

        let report = generate_report(&db, &admin(), daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap();

        let err = archive_report(&db, &admin(), "biz-1", &report.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition {
                entity: "Report",
                ..
            })
        ));

        let report = finalize_report(&db, &admin(), "biz-1", &report.id).await.unwrap();
        let report = archive_report(&db, &admin(), "biz-1", &report.id).await.unwrap();
        assert_eq!(report.status, ReportStatus::Archived);

        // Archived is terminal.
        let err = finalize_report(&db, &admin(), "biz-1", &report.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_custom_report_uses_explicit_range() {
        let db = testutil::test_db().await;
        seed_day_of_sales(&db, day(2024, 5, 10)).await;

        let draft = ReportDraft {
            business_id: Some("biz-1".to_string()),
            report_type: Some("custom".to_string()),
            period_start: Some("2024-05-01".to_string()),
            period_end: Some("2024-05-31".to_string()),
            ..ReportDraft::default()
        };
        let report = generate_report(&db, &admin(), draft).await.unwrap();
        assert_eq!(report.period_start, day(2024, 5, 1));
        assert_eq!(report.period_end, day(2024, 5, 31));
        assert_eq!(report.revenue_cents, 600);
    }

    #[tokio::test]
    async fn test_unknown_business_is_not_found() {
        let db = testutil::test_db().await;

        let err = generate_report(&db, &admin(), daily_draft("biz-missing", "2024-05-10"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::NotFound {
                entity: "Business",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_scheduled_path_needs_no_actor() {
        let db = testutil::test_db().await;
        let date = day(2024, 5, 10);
        seed_day_of_sales(&db, date).await;

        let report = generate_for_business(&db, "biz-1", ReportType::Monthly, date)
            .await
            .unwrap();
        assert_eq!(report.period_start, day(2024, 5, 1));
        assert_eq!(report.period_end, day(2024, 5, 31));
        assert_eq!(report.revenue_cents, 600);
    }

    #[tokio::test]
    async fn test_seller_can_view_but_not_generate() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        let seller = Actor::new("usr-2", "biz-1", Role::Seller);

        let err = generate_report(&db, &seller, daily_draft("biz-1", "2024-05-10"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));
    }
}
