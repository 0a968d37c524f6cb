//! Dashboard handler: the KPI/chart payload for the overview page
//!
//! Everything here is a thin adapter over the aggregation engine; no metric
//! is computed inline.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use finlytics_core::aggregate::{
    self, CategoryTotal, HealthRatios, PeriodTotals, PeriodUnit, TrendPoint,
};
use finlytics_core::models::{MonthlyBalance, TransactionKind, User};

/// Months of cash-flow history shown on the dashboard
const CASH_FLOW_MONTHS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Reference date (YYYY-MM-DD); defaults to today. The dashboard covers
    /// the calendar month containing it.
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct ReportPeriod {
    pub from: String,
    pub to: String,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub period: ReportPeriod,
    /// Income/expense/net for the reference month
    pub totals: PeriodTotals,
    /// Health ratios over the reference month's transactions
    pub health: HealthRatios,
    /// Opening balance set for the reference month, if any
    pub opening_balance: Option<MonthlyBalance>,
    /// Income vs expense per month, oldest first
    pub cash_flow: Vec<TrendPoint>,
    /// Expense breakdown for the reference month, descending by total
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// GET /api/dashboard - Aggregate view for the overview page
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let reference = parse_reference(params.reference.as_deref())?;
    let (from, to) = month_range(reference);

    let transactions = state.db.list_transactions(user.id)?;
    let month_txns: Vec<_> = transactions
        .iter()
        .filter(|t| t.date >= from && t.date <= to)
        .cloned()
        .collect();

    let totals = aggregate::period_totals(&transactions, from, to);
    let health = aggregate::health_ratios(&month_txns);
    let cash_flow =
        aggregate::trend_series(&transactions, CASH_FLOW_MONTHS, PeriodUnit::Month, reference);
    let expenses_by_category =
        aggregate::category_breakdown(&month_txns, TransactionKind::Expense, None);
    let opening_balance =
        state
            .db
            .resolve_monthly_balance(user.id, reference.month(), reference.year())?;

    Ok(Json(DashboardResponse {
        period: ReportPeriod {
            from: from.to_string(),
            to: to.to_string(),
        },
        totals,
        health,
        opening_balance,
        cash_flow,
        expenses_by_category,
    }))
}

/// Helper: parse an optional YYYY-MM-DD reference date, defaulting to today
pub(crate) fn parse_reference(reference: Option<&str>) -> Result<NaiveDate, AppError> {
    match reference {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::bad_request("Invalid reference date format (use YYYY-MM-DD)")),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Helper: calendar bounds of the month containing `reference`
pub(crate) fn month_range(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let from = NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1)
        .expect("valid first of month");
    let to = if reference.month() == 12 {
        NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(reference.year(), reference.month() + 1, 1)
    }
    .expect("valid first of next month")
    .pred_opt()
    .expect("valid last of month");

    (from, to)
}
