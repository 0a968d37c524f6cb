//! Analytics handlers: per-category evolution and month-over-month insights

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Months;
use serde::{Deserialize, Serialize};

use super::dashboard::{month_range, parse_reference};
use crate::{AppError, AppState};
use finlytics_core::aggregate::{self, PeriodUnit, TrendPoint, UNCATEGORIZED};
use finlytics_core::models::{Transaction, TransactionKind, User};

/// Maximum months of history an evolution query may request
const MAX_TREND_MONTHS: usize = 36;

#[derive(Debug, Deserialize)]
pub struct CategoryTrendQuery {
    /// Category name, or "uncategorized" for the sentinel bucket
    pub category: String,
    /// Months of history (default 6)
    pub months: Option<usize>,
    /// Reference date (YYYY-MM-DD); defaults to today
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryTrendResponse {
    pub category: String,
    pub series: Vec<TrendPoint>,
}

/// The expense bucket a transaction falls into, mirroring the engine's
/// breakdown rule (kind-mismatched categories count as uncategorized).
fn expense_bucket(tx: &Transaction) -> &str {
    match &tx.category {
        Some(cat) if cat.kind == tx.kind => cat.name.as_str(),
        _ => UNCATEGORIZED,
    }
}

/// GET /api/analytics/category-trend - Monthly expense evolution for one category
pub async fn category_trend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<CategoryTrendQuery>,
) -> Result<Json<CategoryTrendResponse>, AppError> {
    let reference = parse_reference(params.reference.as_deref())?;
    let months = params.months.unwrap_or(6).clamp(1, MAX_TREND_MONTHS);

    let transactions = state.db.list_transactions(user.id)?;
    let in_category: Vec<_> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense && expense_bucket(t) == params.category)
        .cloned()
        .collect();

    let series = aggregate::trend_series(&in_category, months, PeriodUnit::Month, reference);

    Ok(Json(CategoryTrendResponse {
        category: params.category,
        series,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    /// Reference date (YYYY-MM-DD); defaults to today
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Warning,
    Info,
    Success,
}

#[derive(Serialize)]
pub struct CategoryInsight {
    pub category: String,
    pub current: f64,
    pub previous: f64,
    pub change_pct: f64,
    pub trend: &'static str,
    pub severity: InsightSeverity,
    pub description: String,
    pub suggestion: &'static str,
}

/// GET /api/analytics/insights - Month-over-month change per expense category
pub async fn category_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<InsightsQuery>,
) -> Result<Json<Vec<CategoryInsight>>, AppError> {
    let reference = parse_reference(params.reference.as_deref())?;
    let (cur_from, cur_to) = month_range(reference);
    let (prev_from, prev_to) = month_range(reference - Months::new(1));

    let transactions = state.db.list_transactions(user.id)?;
    let window = |from, to| -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| t.date >= from && t.date <= to)
            .cloned()
            .collect()
    };
    let current =
        aggregate::category_breakdown(&window(cur_from, cur_to), TransactionKind::Expense, None);
    let previous =
        aggregate::category_breakdown(&window(prev_from, prev_to), TransactionKind::Expense, None);

    let mut insights = Vec::new();
    for bucket in &current {
        let prev_total = previous
            .iter()
            .find(|p| p.category == bucket.category)
            .map(|p| p.total)
            .unwrap_or(0.0);
        if let Some(insight) = build_insight(&bucket.category, bucket.total, prev_total) {
            insights.push(insight);
        }
    }
    // Categories that dropped to zero this month still produce an insight.
    for bucket in &previous {
        if current.iter().any(|c| c.category == bucket.category) {
            continue;
        }
        if let Some(insight) = build_insight(&bucket.category, 0.0, bucket.total) {
            insights.push(insight);
        }
    }

    insights.sort_by(|a, b| {
        b.change_pct
            .abs()
            .partial_cmp(&a.change_pct.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Json(insights))
}

fn build_insight(category: &str, current: f64, previous: f64) -> Option<CategoryInsight> {
    if current == 0.0 && previous == 0.0 {
        return None;
    }
    let change_pct = if previous > 0.0 {
        ((current - previous) / previous) * 100.0
    } else {
        100.0
    };
    let change_pct = (change_pct * 10.0).round() / 10.0;
    let trend = if change_pct >= 0.0 { "up" } else { "down" };

    let severity = if change_pct >= 15.0 {
        InsightSeverity::Warning
    } else if change_pct >= 5.0 {
        InsightSeverity::Info
    } else {
        InsightSeverity::Success
    };

    let description = if change_pct >= 0.0 {
        format!(
            "Seus gastos com {} aumentaram {:.1}% em relação ao mês anterior.",
            category, change_pct
        )
    } else {
        format!(
            "Seus gastos com {} diminuíram {:.1}% em relação ao mês anterior.",
            category,
            change_pct.abs()
        )
    };
    let suggestion = match severity {
        InsightSeverity::Warning => {
            "Considere revisar seus gastos nesta categoria e definir um limite mensal."
        }
        InsightSeverity::Info => "Acompanhe esta categoria nos próximos meses.",
        InsightSeverity::Success => "Variação normal, continue monitorando.",
    };

    Some(CategoryInsight {
        category: category.to_string(),
        current,
        previous,
        change_pct,
        trend,
        severity,
        description,
        suggestion,
    })
}
