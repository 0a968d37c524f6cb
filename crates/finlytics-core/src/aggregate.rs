//! Aggregation engine
//!
//! Pure functions computing derived views over an owner's in-memory
//! transaction list: period totals, trend series, category breakdowns, and
//! financial-health ratios. Every page-level consumer (dashboard, analytics,
//! chat) goes through this module so overlapping metrics are computed exactly
//! one way.
//!
//! No function here performs I/O, reads the clock, or mutates its input;
//! reference dates are parameters, so everything is unit-testable without a
//! store or identity provider. Malformed records coming back from the store
//! (non-finite or negative amounts, inconsistent categories) degrade to a
//! neutral contribution instead of failing the whole computation.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Transaction, TransactionKind};

/// Sentinel bucket for transactions with no category, or a category whose
/// kind does not match the transaction's kind.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Aggregation window unit for trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Month,
    Week,
}

impl PeriodUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
        }
    }
}

impl std::str::FromStr for PeriodUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" | "monthly" => Ok(Self::Month),
            "week" | "weekly" => Ok(Self::Week),
            _ => Err(format!("Unknown period unit: {}", s)),
        }
    }
}

/// Identifies one calendar period in a trend series. Enough to derive a
/// display label; formatting itself is a presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum PeriodKey {
    Month { year: i32, month: u32 },
    Week { year: i32, week: u32 },
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Week { year, week } => write!(f, "{:04}-W{:02}", year, week),
        }
    }
}

/// Income/expense/net sums over one period
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PeriodTotals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// One entry of a trend series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: PeriodKey,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// One category bucket of a breakdown, with its summed total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub transaction_count: i64,
}

/// Derived financial-health metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthRatios {
    pub savings_rate: f64,
    pub transaction_count: i64,
    pub average_expense: f64,
    pub average_income: f64,
}

/// Treat store-returned garbage (non-finite or negative magnitudes) as a
/// zero contribution. Amounts respecting the data model are untouched.
fn sanitize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount >= 0.0 {
        amount
    } else {
        0.0
    }
}

/// Sum income and expense over an inclusive calendar-date range.
///
/// Empty input or an empty range yields all zeros. Never panics for
/// malformed individual records.
pub fn period_totals(
    transactions: &[Transaction],
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> PeriodTotals {
    let mut income = 0.0;
    let mut expense = 0.0;

    for tx in transactions {
        if tx.date < period_start || tx.date > period_end {
            continue;
        }
        let amount = sanitize_amount(tx.amount);
        match tx.kind {
            TransactionKind::Income => income += amount,
            TransactionKind::Expense => expense += amount,
        }
    }

    PeriodTotals {
        income,
        expense,
        net: income - expense,
    }
}

/// Build a trend series of exactly `periods` entries, oldest first, ending
/// at the period containing `reference`.
///
/// Periods without transactions are zero-filled, never omitted, so the
/// output length is always `periods`.
pub fn trend_series(
    transactions: &[Transaction],
    periods: usize,
    unit: PeriodUnit,
    reference: NaiveDate,
) -> Vec<TrendPoint> {
    let mut series = Vec::with_capacity(periods);

    for back in (0..periods).rev() {
        let (key, start, end) = match unit {
            PeriodUnit::Month => month_bounds(reference, back as i32),
            PeriodUnit::Week => week_bounds(reference, back as i64),
        };
        let totals = period_totals(transactions, start, end);
        series.push(TrendPoint {
            period: key,
            income: totals.income,
            expense: totals.expense,
            net: totals.net,
        });
    }

    series
}

/// Calendar bounds of the month `back` months before the one containing
/// `reference`.
fn month_bounds(reference: NaiveDate, back: i32) -> (PeriodKey, NaiveDate, NaiveDate) {
    // Months since year 0, which makes stepping across year boundaries plain
    // integer arithmetic.
    let index = reference.year() * 12 + reference.month0() as i32 - back;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;

    let start = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first of month");
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid first of next month")
    .pred_opt()
    .expect("valid last of month");

    (PeriodKey::Month { year, month }, start, end)
}

/// Bounds of the ISO week (Monday..Sunday) `back` weeks before the one
/// containing `reference`.
fn week_bounds(reference: NaiveDate, back: i64) -> (PeriodKey, NaiveDate, NaiveDate) {
    let this_monday =
        reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
    let start = this_monday - Duration::weeks(back);
    let end = start + Duration::days(6);
    let iso = start.iso_week();

    (
        PeriodKey::Week {
            year: iso.year(),
            week: iso.week(),
        },
        start,
        end,
    )
}

/// Group transactions of one kind by category name, descending by total.
///
/// Transactions with no category, or whose category's own kind mismatches the
/// transaction's, land in the [`UNCATEGORIZED`] bucket rather than being
/// dropped. Equal totals preserve first-encountered input order (the sort is
/// stable). A finite `top_n` truncates the result; the remainder is not
/// folded into an "other" bucket.
pub fn category_breakdown(
    transactions: &[Transaction],
    kind: TransactionKind,
    top_n: Option<usize>,
) -> Vec<CategoryTotal> {
    let mut buckets: Vec<CategoryTotal> = Vec::new();

    for tx in transactions {
        if tx.kind != kind {
            continue;
        }
        let name = match &tx.category {
            Some(cat) if cat.kind == tx.kind => cat.name.as_str(),
            _ => UNCATEGORIZED,
        };
        match buckets.iter_mut().find(|b| b.category == name) {
            Some(bucket) => {
                bucket.total += sanitize_amount(tx.amount);
                bucket.transaction_count += 1;
            }
            None => buckets.push(CategoryTotal {
                category: name.to_string(),
                total: sanitize_amount(tx.amount),
                transaction_count: 1,
            }),
        }
    }

    // Vec::sort_by is stable, which is what keeps equal totals in
    // first-encountered order.
    buckets.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(n) = top_n {
        buckets.truncate(n);
    }

    buckets
}

/// Compute the health ratios in a single pass.
///
/// Never raises and never returns a non-finite value; every division is
/// guarded with a zero sentinel.
pub fn health_ratios(transactions: &[Transaction]) -> HealthRatios {
    let mut income = 0.0;
    let mut expense = 0.0;
    let mut income_count = 0i64;
    let mut expense_count = 0i64;

    for tx in transactions {
        let amount = sanitize_amount(tx.amount);
        match tx.kind {
            TransactionKind::Income => {
                income += amount;
                income_count += 1;
            }
            TransactionKind::Expense => {
                expense += amount;
                expense_count += 1;
            }
        }
    }

    let net = income - expense;
    let savings_rate = if income > 0.0 { net / income } else { 0.0 };
    let average_expense = if expense_count > 0 {
        expense / expense_count as f64
    } else {
        0.0
    };
    let average_income = if income_count > 0 {
        income / income_count as f64
    } else {
        0.0
    };

    HealthRatios {
        savings_rate,
        transaction_count: income_count + expense_count,
        average_expense,
        average_income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryInfo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(
        amount: f64,
        kind: TransactionKind,
        on: NaiveDate,
        category: Option<(&str, TransactionKind)>,
    ) -> Transaction {
        Transaction {
            id: 0,
            title: "t".to_string(),
            description: None,
            amount,
            kind,
            category_id: None,
            category: category.map(|(name, cat_kind)| CategoryInfo {
                name: name.to_string(),
                icon: "🛒".to_string(),
                kind: cat_kind,
            }),
            date: on,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn period_totals_worked_example() {
        // Worked example: groceries + salary in June 2024.
        let txns = vec![
            tx(
                150.50,
                TransactionKind::Expense,
                date(2024, 6, 28),
                Some(("Alimentação", TransactionKind::Expense)),
            ),
            tx(
                5000.00,
                TransactionKind::Income,
                date(2024, 6, 27),
                Some(("Salário", TransactionKind::Income)),
            ),
        ];

        let totals = period_totals(&txns, date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(totals.income, 5000.00);
        assert_eq!(totals.expense, 150.50);
        assert_eq!(totals.net, 4849.50);
    }

    #[test]
    fn period_totals_empty_input_is_zero() {
        let totals = period_totals(&[], date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(totals, PeriodTotals::default());
    }

    #[test]
    fn period_totals_excludes_out_of_range() {
        let txns = vec![
            tx(10.0, TransactionKind::Expense, date(2024, 5, 31), None),
            tx(20.0, TransactionKind::Expense, date(2024, 6, 1), None),
            tx(30.0, TransactionKind::Expense, date(2024, 6, 30), None),
            tx(40.0, TransactionKind::Expense, date(2024, 7, 1), None),
        ];
        let totals = period_totals(&txns, date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(totals.expense, 50.0);
    }

    #[test]
    fn period_totals_is_additive_over_partitions() {
        let txns = vec![
            tx(100.0, TransactionKind::Income, date(2024, 1, 15), None),
            tx(50.0, TransactionKind::Expense, date(2024, 2, 10), None),
            tx(75.0, TransactionKind::Income, date(2024, 3, 5), None),
            tx(25.0, TransactionKind::Expense, date(2024, 3, 31), None),
        ];

        let full = period_totals(&txns, date(2024, 1, 1), date(2024, 3, 31));
        let jan = period_totals(&txns, date(2024, 1, 1), date(2024, 1, 31));
        let feb = period_totals(&txns, date(2024, 2, 1), date(2024, 2, 29));
        let mar = period_totals(&txns, date(2024, 3, 1), date(2024, 3, 31));

        assert_eq!(full.income, jan.income + feb.income + mar.income);
        assert_eq!(full.expense, jan.expense + feb.expense + mar.expense);
        assert_eq!(full.net, jan.net + feb.net + mar.net);
    }

    #[test]
    fn period_totals_zeroes_garbled_amounts() {
        let txns = vec![
            tx(f64::NAN, TransactionKind::Income, date(2024, 6, 1), None),
            tx(f64::INFINITY, TransactionKind::Expense, date(2024, 6, 2), None),
            tx(-5.0, TransactionKind::Expense, date(2024, 6, 3), None),
            tx(10.0, TransactionKind::Income, date(2024, 6, 4), None),
        ];
        let totals = period_totals(&txns, date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(totals.income, 10.0);
        assert_eq!(totals.expense, 0.0);
        assert_eq!(totals.net, 10.0);
    }

    #[test]
    fn trend_series_has_exact_length_even_when_empty() {
        let series = trend_series(&[], 6, PeriodUnit::Month, date(2024, 6, 15));
        assert_eq!(series.len(), 6);
        assert!(series.iter().all(|p| p.income == 0.0 && p.expense == 0.0 && p.net == 0.0));

        // Oldest first, ending at the reference period.
        assert_eq!(series[0].period, PeriodKey::Month { year: 2024, month: 1 });
        assert_eq!(series[5].period, PeriodKey::Month { year: 2024, month: 6 });
    }

    #[test]
    fn trend_series_crosses_year_boundary() {
        let series = trend_series(&[], 3, PeriodUnit::Month, date(2024, 1, 10));
        assert_eq!(series[0].period, PeriodKey::Month { year: 2023, month: 11 });
        assert_eq!(series[1].period, PeriodKey::Month { year: 2023, month: 12 });
        assert_eq!(series[2].period, PeriodKey::Month { year: 2024, month: 1 });
    }

    #[test]
    fn trend_series_buckets_by_calendar_month() {
        let txns = vec![
            tx(100.0, TransactionKind::Income, date(2024, 4, 30), None),
            tx(40.0, TransactionKind::Expense, date(2024, 5, 1), None),
            tx(60.0, TransactionKind::Expense, date(2024, 5, 31), None),
            tx(200.0, TransactionKind::Income, date(2024, 6, 15), None),
        ];
        let series = trend_series(&txns, 3, PeriodUnit::Month, date(2024, 6, 15));

        assert_eq!(series[0].income, 100.0); // April
        assert_eq!(series[1].expense, 100.0); // May
        assert_eq!(series[2].income, 200.0); // June
        assert_eq!(series[2].net, 200.0);
    }

    #[test]
    fn trend_series_weekly_ends_at_reference_week() {
        // 2024-06-12 is a Wednesday; its ISO week is 2024-W24.
        let txns = vec![
            tx(30.0, TransactionKind::Expense, date(2024, 6, 10), None), // Monday same week
            tx(99.0, TransactionKind::Expense, date(2024, 6, 9), None),  // Sunday prior week
        ];
        let series = trend_series(&txns, 2, PeriodUnit::Week, date(2024, 6, 12));
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].period, PeriodKey::Week { year: 2024, week: 24 });
        assert_eq!(series[1].expense, 30.0);
        assert_eq!(series[0].expense, 99.0);
    }

    #[test]
    fn breakdown_groups_and_sorts_descending() {
        let txns = vec![
            tx(50.0, TransactionKind::Expense, date(2024, 6, 1), Some(("Transporte", TransactionKind::Expense))),
            tx(150.50, TransactionKind::Expense, date(2024, 6, 2), Some(("Alimentação", TransactionKind::Expense))),
            tx(30.0, TransactionKind::Expense, date(2024, 6, 3), Some(("Transporte", TransactionKind::Expense))),
            tx(5000.0, TransactionKind::Income, date(2024, 6, 4), Some(("Salário", TransactionKind::Income))),
        ];

        let breakdown = category_breakdown(&txns, TransactionKind::Expense, None);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Alimentação");
        assert_eq!(breakdown[0].total, 150.50);
        assert_eq!(breakdown[1].category, "Transporte");
        assert_eq!(breakdown[1].total, 80.0);
        assert_eq!(breakdown[1].transaction_count, 2);
    }

    #[test]
    fn breakdown_ties_preserve_first_seen_order() {
        let txns = vec![
            tx(100.0, TransactionKind::Expense, date(2024, 6, 1), Some(("Lazer", TransactionKind::Expense))),
            tx(100.0, TransactionKind::Expense, date(2024, 6, 2), Some(("Saúde", TransactionKind::Expense))),
        ];
        let breakdown = category_breakdown(&txns, TransactionKind::Expense, None);
        assert_eq!(breakdown[0].category, "Lazer");
        assert_eq!(breakdown[1].category, "Saúde");
    }

    #[test]
    fn breakdown_buckets_missing_and_mismatched_categories() {
        let txns = vec![
            // No category at all.
            tx(10.0, TransactionKind::Expense, date(2024, 6, 1), None),
            // Category kind disagrees with the transaction kind.
            tx(20.0, TransactionKind::Expense, date(2024, 6, 2), Some(("Salário", TransactionKind::Income))),
            tx(5.0, TransactionKind::Expense, date(2024, 6, 3), Some(("Lazer", TransactionKind::Expense))),
        ];
        let breakdown = category_breakdown(&txns, TransactionKind::Expense, None);
        assert_eq!(breakdown[0].category, UNCATEGORIZED);
        assert_eq!(breakdown[0].total, 30.0);
        assert_eq!(breakdown[0].transaction_count, 2);
    }

    #[test]
    fn breakdown_top_n_truncates_without_other_bucket() {
        let txns = vec![
            tx(300.0, TransactionKind::Expense, date(2024, 6, 1), Some(("Moradia", TransactionKind::Expense))),
            tx(200.0, TransactionKind::Expense, date(2024, 6, 2), Some(("Alimentação", TransactionKind::Expense))),
            tx(100.0, TransactionKind::Expense, date(2024, 6, 3), Some(("Lazer", TransactionKind::Expense))),
        ];
        let breakdown = category_breakdown(&txns, TransactionKind::Expense, Some(2));
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Moradia");
        assert_eq!(breakdown[1].category, "Alimentação");
    }

    #[test]
    fn health_ratios_empty_list_is_all_zero() {
        let ratios = health_ratios(&[]);
        assert_eq!(ratios.savings_rate, 0.0);
        assert_eq!(ratios.transaction_count, 0);
        assert_eq!(ratios.average_expense, 0.0);
        assert_eq!(ratios.average_income, 0.0);
    }

    #[test]
    fn health_ratios_never_non_finite() {
        // Expense-only list would divide by zero income without the guard.
        let expense_only = vec![
            tx(100.0, TransactionKind::Expense, date(2024, 6, 1), None),
            tx(f64::NAN, TransactionKind::Expense, date(2024, 6, 2), None),
        ];
        let ratios = health_ratios(&expense_only);
        assert!(ratios.savings_rate.is_finite());
        assert!(ratios.average_expense.is_finite());
        assert_eq!(ratios.savings_rate, 0.0);
        assert_eq!(ratios.average_expense, 50.0);
        assert_eq!(ratios.transaction_count, 2);

        let income_only = vec![tx(100.0, TransactionKind::Income, date(2024, 6, 1), None)];
        let ratios = health_ratios(&income_only);
        assert_eq!(ratios.savings_rate, 1.0);
        assert_eq!(ratios.average_expense, 0.0);
        assert_eq!(ratios.average_income, 100.0);
    }

    #[test]
    fn health_ratios_savings_rate() {
        let txns = vec![
            tx(1000.0, TransactionKind::Income, date(2024, 6, 1), None),
            tx(250.0, TransactionKind::Expense, date(2024, 6, 2), None),
        ];
        let ratios = health_ratios(&txns);
        assert_eq!(ratios.savings_rate, 0.75);
        assert_eq!(ratios.average_income, 1000.0);
        assert_eq!(ratios.average_expense, 250.0);
    }

    #[test]
    fn period_key_labels() {
        assert_eq!(PeriodKey::Month { year: 2024, month: 6 }.to_string(), "2024-06");
        assert_eq!(PeriodKey::Week { year: 2024, week: 3 }.to_string(), "2024-W03");
    }
}
