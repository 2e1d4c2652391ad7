//! Transaction service: income/expense CRUD scoped to the owner.
//!
//! DESIGN
//! ======
//! Every statement filters on `user_id`, so another user's transaction is
//! indistinguishable from a missing one. Amounts are validated and converted
//! to cents before they reach SQL. Each successful operation is recorded in
//! the activity log; each failure is recorded as a `system/error` entry and
//! then returned to the caller.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgExecutor, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::catalog::{self, TransactionKind};
use crate::money;
use crate::services::activity::{self, ActivityCategory, Actor, actions};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("amount must be a positive number")]
    InvalidAmount,
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("category {category} is not an {} category", .kind.as_str())]
    CategoryKindMismatch { category: String, kind: TransactionKind },
    #[error("no fields to update")]
    EmptyPatch,
    #[error("unknown type filter: {0}")]
    UnknownTypeFilter(String),
    #[error("transaction not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(rename = "amount", with = "money::as_amount")]
    pub amount_cents: i64,
    pub category: String,
    pub description: String,
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Request body for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: String,
    pub description: String,
    #[serde(deserialize_with = "calendar_date")]
    pub date: Date,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateInput {
    Day(Date),
    Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp, keeping its calendar day.
fn calendar_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match DateInput::deserialize(deserializer)? {
        DateInput::Day(date) => date,
        DateInput::Timestamp(at) => at.date(),
    })
}

/// Request body for a partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<Date>,
}

/// A transaction that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTransaction {
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub category: String,
    pub description: String,
    pub date: Date,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validate_fields(
    kind: TransactionKind,
    amount_cents: Option<i64>,
    category: &str,
    description: &str,
    date: Date,
) -> Result<ValidTransaction, TransactionError> {
    let amount_cents = amount_cents.ok_or(TransactionError::InvalidAmount)?;

    let description = description.trim();
    if description.is_empty() {
        return Err(TransactionError::EmptyDescription);
    }

    let category = category.trim();
    if catalog::find_category(category).is_none() {
        return Err(TransactionError::UnknownCategory(category.to_owned()));
    }
    if !catalog::category_matches_kind(category, kind) {
        return Err(TransactionError::CategoryKindMismatch { category: category.to_owned(), kind });
    }

    Ok(ValidTransaction {
        kind,
        amount_cents,
        category: category.to_owned(),
        description: description.to_owned(),
        date,
    })
}

impl NewTransaction {
    /// Validate amount, description, and category/kind agreement.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<ValidTransaction, TransactionError> {
        validate_fields(self.kind, money::to_cents(self.amount), &self.category, &self.description, self.date)
    }
}

impl TransactionPatch {
    /// Names of the fields present in this patch, in wire order.
    #[must_use]
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.kind.is_some() {
            fields.push("type");
        }
        if self.amount.is_some() {
            fields.push("amount");
        }
        if self.category.is_some() {
            fields.push("category");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.date.is_some() {
            fields.push("date");
        }
        fields
    }

    /// Merge this patch over `current` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPatch` when no field is present, otherwise the first
    /// validation failure of the merged transaction.
    pub fn apply(&self, current: &TransactionRow) -> Result<ValidTransaction, TransactionError> {
        if self.updated_fields().is_empty() {
            return Err(TransactionError::EmptyPatch);
        }
        let amount_cents = match self.amount {
            Some(amount) => money::to_cents(amount),
            None => Some(current.amount_cents),
        };
        validate_fields(
            self.kind.unwrap_or(current.kind),
            amount_cents,
            self.category.as_deref().unwrap_or(&current.category),
            self.description.as_deref().unwrap_or(&current.description),
            self.date.unwrap_or(current.date),
        )
    }
}

// =============================================================================
// FILTERING
// =============================================================================

/// In-memory filter used by the transaction list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    /// `income`, `expense`, or absent/`all` for both.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub search: Option<String>,
}

impl TransactionFilter {
    /// The requested kind; `None` for absent, blank, or `all`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTypeFilter` for any other value.
    pub fn kind(&self) -> Result<Option<TransactionKind>, TransactionError> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(raw) => TransactionKind::parse(raw)
                .map(Some)
                .ok_or_else(|| TransactionError::UnknownTypeFilter(raw.to_owned())),
        }
    }

    #[must_use]
    pub fn matches(&self, tx: &TransactionRow) -> bool {
        if let Ok(Some(kind)) = self.kind() {
            if tx.kind != kind {
                return false;
            }
        }

        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        let category_name = catalog::find_category(&tx.category).map(|c| c.name.to_lowercase());

        tx.description.to_lowercase().contains(&needle)
            || tx.category.to_lowercase().contains(&needle)
            || category_name.is_some_and(|name| name.contains(&needle))
    }

    #[must_use]
    pub fn apply(&self, rows: Vec<TransactionRow>) -> Vec<TransactionRow> {
        rows.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

type TxTuple = (Uuid, Uuid, String, i64, String, String, Date, OffsetDateTime);

const SELECT_COLUMNS: &str = "id, user_id, kind, amount_cents, category, description, date, created_at";

fn from_tuple(row: TxTuple) -> Result<TransactionRow, TransactionError> {
    let (id, user_id, kind, amount_cents, category, description, date, created_at) = row;
    let kind = TransactionKind::parse(&kind)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid transaction kind: {kind}").into()))?;
    Ok(TransactionRow { id, user_id, kind, amount_cents, category, description, date, created_at })
}

// =============================================================================
// QUERIES
// =============================================================================

/// Insert a validated transaction for `user_id` without activity logging.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn insert_transaction(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    tx: &ValidTransaction,
) -> Result<TransactionRow, TransactionError> {
    let row = sqlx::query_as::<_, TxTuple>(&format!(
        "INSERT INTO transactions (id, user_id, kind, amount_cents, category, description, date)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(tx.kind.as_str())
    .bind(tx.amount_cents)
    .bind(&tx.category)
    .bind(&tx.description)
    .bind(tx.date)
    .fetch_one(executor)
    .await?;

    from_tuple(row)
}

/// All of a user's transactions, newest date first, without activity logging.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_transactions(pool: &PgPool, user_id: Uuid) -> Result<Vec<TransactionRow>, TransactionError> {
    let rows = sqlx::query_as::<_, TxTuple>(&format!(
        "SELECT {SELECT_COLUMNS}
         FROM transactions
         WHERE user_id = $1
         ORDER BY date DESC, created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_tuple).collect()
}

/// Fetch one transaction owned by `user_id`.
///
/// # Errors
///
/// Returns `NotFound` if the transaction does not exist or belongs to
/// someone else.
pub async fn get_transaction(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<TransactionRow, TransactionError> {
    let row = sqlx::query_as::<_, TxTuple>(&format!(
        "SELECT {SELECT_COLUMNS} FROM transactions WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(TransactionError::NotFound(id))?;

    from_tuple(row)
}

/// Delete every transaction owned by `user_id`. Returns the number removed.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_all_transactions(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64, TransactionError> {
    let result = sqlx::query("DELETE FROM transactions WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// LOGGED OPERATIONS
// =============================================================================

async fn report_failure(pool: &PgPool, actor: &Actor, operation: &str, err: &TransactionError, id: Option<Uuid>) {
    let extra = id.map_or_else(|| json!({}), |id| json!({ "transaction_id": id }));
    activity::log_error(pool, actor, operation, err, extra).await;
}

/// Validate and create a transaction for the actor.
///
/// # Errors
///
/// Returns a validation or database error.
pub async fn add_transaction(
    pool: &PgPool,
    actor: &Actor,
    new: &NewTransaction,
) -> Result<TransactionRow, TransactionError> {
    let result = async {
        let valid = new.validate()?;
        insert_transaction(pool, actor.user_id, &valid).await
    }
    .await;

    match result {
        Ok(row) => {
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Transaction,
                actions::CREATE_TRANSACTION,
                json!({
                    "transaction_id": row.id,
                    "type": row.kind,
                    "amount": money::from_cents(row.amount_cents),
                    "category": row.category,
                    "description": row.description,
                }),
            )
            .await;
            Ok(row)
        }
        Err(e) => {
            report_failure(pool, actor, "add_transaction", &e, None).await;
            Err(e)
        }
    }
}

/// List the actor's transactions matching `filter`, newest first.
///
/// # Errors
///
/// Returns `UnknownTypeFilter` or a database error.
pub async fn get_user_transactions(
    pool: &PgPool,
    actor: &Actor,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionRow>, TransactionError> {
    let result = async {
        filter.kind()?;
        list_transactions(pool, actor.user_id).await
    }
    .await;

    match result {
        Ok(rows) => {
            let rows = filter.apply(rows);
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Transaction,
                actions::VIEW_TRANSACTIONS,
                json!({ "transaction_count": rows.len() }),
            )
            .await;
            Ok(rows)
        }
        Err(e) => {
            report_failure(pool, actor, "get_transactions", &e, None).await;
            Err(e)
        }
    }
}

/// Apply a partial update to one of the actor's transactions.
///
/// # Errors
///
/// Returns `NotFound`, `EmptyPatch`, a validation error, or a database error.
pub async fn update_transaction(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    patch: &TransactionPatch,
) -> Result<TransactionRow, TransactionError> {
    let result = async {
        let current = get_transaction(pool, actor.user_id, id).await?;
        let merged = patch.apply(&current)?;
        let row = sqlx::query_as::<_, TxTuple>(&format!(
            "UPDATE transactions
             SET kind = $3, amount_cents = $4, category = $5, description = $6, date = $7
             WHERE id = $1 AND user_id = $2
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(actor.user_id)
        .bind(merged.kind.as_str())
        .bind(merged.amount_cents)
        .bind(&merged.category)
        .bind(&merged.description)
        .bind(merged.date)
        .fetch_optional(pool)
        .await?
        .ok_or(TransactionError::NotFound(id))?;
        from_tuple(row)
    }
    .await;

    match result {
        Ok(row) => {
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Transaction,
                actions::UPDATE_TRANSACTION,
                json!({ "transaction_id": id, "updated_fields": patch.updated_fields() }),
            )
            .await;
            Ok(row)
        }
        Err(e) => {
            report_failure(pool, actor, "update_transaction", &e, Some(id)).await;
            Err(e)
        }
    }
}

/// Delete one of the actor's transactions.
///
/// # Errors
///
/// Returns `NotFound` if nothing was deleted, or a database error.
pub async fn delete_transaction(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), TransactionError> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(actor.user_id)
        .execute(pool)
        .await
        .map_err(TransactionError::from)
        .and_then(|r| if r.rows_affected() == 0 { Err(TransactionError::NotFound(id)) } else { Ok(()) });

    match result {
        Ok(()) => {
            activity::log_user_action(
                pool,
                actor,
                ActivityCategory::Transaction,
                actions::DELETE_TRANSACTION,
                json!({ "transaction_id": id }),
            )
            .await;
            Ok(())
        }
        Err(e) => {
            report_failure(pool, actor, "delete_transaction", &e, Some(id)).await;
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "transaction_test.rs"]
mod tests;
