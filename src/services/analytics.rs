//! Analytics over a user's transactions.
//!
//! DESIGN
//! ======
//! Pure, single-pass reductions over a user's transactions. All sums are in
//! integer cents, so the amounts of a breakdown always add up to the total
//! for that kind. Percentages are derived last and are display-only. Sums
//! saturate at `i64::MAX` instead of overflowing.
//!
//! Transactions whose category id is not in the catalog are grouped under
//! their raw id, so they still count toward the total.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use time::Date;

use crate::catalog::{self, TransactionKind};
use crate::money;
use crate::services::transaction::{self, TransactionError, TransactionRow};

/// Trend windows offered by the dashboard, in months.
pub const TREND_PERIODS: [u32; 4] = [6, 12, 36, 60];
pub const DEFAULT_TREND_MONTHS: u32 = 6;
pub const DASHBOARD_RECENT_COUNT: usize = 5;

const MONTH_ABBREVIATIONS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
const UNKNOWN_CATEGORY_ICON: &str = "💰";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    #[serde(rename = "total_income", with = "money::as_amount")]
    pub total_income_cents: i64,
    #[serde(rename = "total_expenses", with = "money::as_amount")]
    pub total_expenses_cents: i64,
    #[serde(rename = "balance", with = "money::as_amount")]
    pub balance_cents: i64,
    pub transaction_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    /// Mean amount over both kinds, rounded to the nearest cent.
    #[serde(rename = "average_transaction", with = "money::as_amount")]
    pub average_transaction_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category_id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(rename = "amount", with = "money::as_amount")]
    pub amount_cents: i64,
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// e.g. `"Mar 2025"`.
    pub month: String,
    /// e.g. `"Mar"`.
    pub short_month: String,
    pub year: i32,
    pub month_number: u8,
    #[serde(rename = "income", with = "money::as_amount")]
    pub income_cents: i64,
    #[serde(rename = "expenses", with = "money::as_amount")]
    pub expenses_cents: i64,
    #[serde(rename = "balance", with = "money::as_amount")]
    pub balance_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub summary: Summary,
    pub expenses_by_category: Vec<CategoryStat>,
    pub income_by_category: Vec<CategoryStat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub expenses_by_category: Vec<CategoryStat>,
    pub trend: Vec<MonthlyPoint>,
    pub recent: Vec<TransactionRow>,
}

// =============================================================================
// REDUCTIONS
// =============================================================================

/// Totals, per-kind counts, and the average amount.
#[must_use]
pub fn summarize(txs: &[TransactionRow]) -> Summary {
    let mut summary = Summary { transaction_count: txs.len(), ..Summary::default() };
    for tx in txs {
        match tx.kind {
            TransactionKind::Income => {
                summary.total_income_cents = summary.total_income_cents.saturating_add(tx.amount_cents);
                summary.income_count += 1;
            }
            TransactionKind::Expense => {
                summary.total_expenses_cents = summary.total_expenses_cents.saturating_add(tx.amount_cents);
                summary.expense_count += 1;
            }
        }
    }
    summary.balance_cents = summary.total_income_cents.saturating_sub(summary.total_expenses_cents);
    summary.average_transaction_cents = average(
        i128::from(summary.total_income_cents) + i128::from(summary.total_expenses_cents),
        txs.len(),
    );
    summary
}

#[allow(clippy::cast_possible_truncation)]
fn average(total: i128, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = count as i128;
    ((total + count / 2) / count).clamp(0, i128::from(i64::MAX)) as i64
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 * 100.0 }
}

/// Per-category totals for one kind, largest first.
#[must_use]
pub fn category_breakdown(txs: &[TransactionRow], kind: TransactionKind) -> Vec<CategoryStat> {
    let mut totals: HashMap<&str, (i64, usize)> = HashMap::new();
    let mut kind_total = 0_i64;
    for tx in txs.iter().filter(|tx| tx.kind == kind) {
        let entry = totals.entry(tx.category.as_str()).or_default();
        entry.0 = entry.0.saturating_add(tx.amount_cents);
        entry.1 += 1;
        kind_total = kind_total.saturating_add(tx.amount_cents);
    }

    let mut stats: Vec<CategoryStat> = totals
        .into_iter()
        .map(|(id, (amount_cents, count))| {
            let (name, icon, color) = match catalog::find_category(id) {
                Some(c) => (c.name, c.icon, c.color),
                None => (id, UNKNOWN_CATEGORY_ICON, catalog::UNKNOWN_CATEGORY_COLOR),
            };
            CategoryStat {
                category_id: id.to_owned(),
                name: name.to_owned(),
                icon: icon.to_owned(),
                color: color.to_owned(),
                amount_cents,
                percentage: percentage(amount_cents, kind_total),
                transaction_count: count,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents).then_with(|| a.name.cmp(&b.name)));
    stats
}

fn month_index(date: Date) -> i32 {
    date.year() * 12 + i32::from(u8::from(date.month())) - 1
}

/// Income/expense totals for the `months` calendar months ending with
/// `today`'s month, oldest first. Months without activity are zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn monthly_trend(txs: &[TransactionRow], today: Date, months: u32) -> Vec<MonthlyPoint> {
    let current = month_index(today);
    let first = current - months as i32 + 1;

    let mut points: Vec<MonthlyPoint> = (first..=current)
        .map(|idx| {
            let year = idx.div_euclid(12);
            let month0 = idx.rem_euclid(12) as usize;
            let short = MONTH_ABBREVIATIONS[month0];
            MonthlyPoint {
                month: format!("{short} {year}"),
                short_month: short.to_owned(),
                year,
                month_number: month0 as u8 + 1,
                income_cents: 0,
                expenses_cents: 0,
                balance_cents: 0,
            }
        })
        .collect();

    for tx in txs {
        let idx = month_index(tx.date);
        if idx < first || idx > current {
            continue;
        }
        let point = &mut points[(idx - first) as usize];
        match tx.kind {
            TransactionKind::Income => point.income_cents = point.income_cents.saturating_add(tx.amount_cents),
            TransactionKind::Expense => point.expenses_cents = point.expenses_cents.saturating_add(tx.amount_cents),
        }
    }

    for point in &mut points {
        point.balance_cents = point.income_cents.saturating_sub(point.expenses_cents);
    }
    points
}

/// True when a trend has no activity at all (the chart shows an empty state).
#[must_use]
pub fn trend_is_empty(points: &[MonthlyPoint]) -> bool {
    points.iter().all(|p| p.income_cents == 0 && p.expenses_cents == 0)
}

/// The `n` most recent transactions by date, then creation time.
#[must_use]
pub fn recent(txs: &[TransactionRow], n: usize) -> Vec<TransactionRow> {
    let mut sorted: Vec<&TransactionRow> = txs.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
    sorted.into_iter().take(n).cloned().collect()
}

#[must_use]
pub fn report(txs: &[TransactionRow]) -> AnalyticsReport {
    AnalyticsReport {
        summary: summarize(txs),
        expenses_by_category: category_breakdown(txs, TransactionKind::Expense),
        income_by_category: category_breakdown(txs, TransactionKind::Income),
    }
}

#[must_use]
pub fn dashboard(txs: &[TransactionRow], today: Date) -> Dashboard {
    Dashboard {
        summary: summarize(txs),
        expenses_by_category: category_breakdown(txs, TransactionKind::Expense),
        trend: monthly_trend(txs, today, DEFAULT_TREND_MONTHS),
        recent: recent(txs, DASHBOARD_RECENT_COUNT),
    }
}

// =============================================================================
// LOADERS
// =============================================================================

/// Totals for a user straight from the database.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_user_stats(pool: &PgPool, user_id: uuid::Uuid) -> Result<Summary, TransactionError> {
    let txs = transaction::list_transactions(pool, user_id).await?;
    Ok(summarize(&txs))
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
