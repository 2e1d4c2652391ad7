//! Data transfer: export, import, and wipe of a user's records.
//!
//! DESIGN
//! ======
//! Export produces one self-describing JSON document. Import accepts that
//! document back: each entry is validated on its own and malformed entries
//! are counted as skipped instead of failing the batch. The valid entries are
//! inserted in one database transaction, so a failed insert imports nothing.
//! Wiping removes transactions and notes together in one transaction but
//! keeps the activity trail.

use serde::Serialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use time::{Date, OffsetDateTime};

use crate::services::activity::{self, ActivityCategory, Actor, actions};
use crate::services::note::{self, NewNote, NoteError, NoteRow, ValidNote};
use crate::services::profile::{self, ProfileError, UserRecord};
use crate::services::transaction::{self, NewTransaction, TransactionError, TransactionRow, ValidTransaction};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("import document must contain a transactions array")]
    MissingTransactions,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Transactions(#[from] TransactionError),
    #[error(transparent)]
    Notes(#[from] NoteError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub user: UserRecord,
    pub transactions: Vec<TransactionRow>,
    pub notes: Vec<NoteRow>,
    #[serde(with = "time::serde::rfc3339")]
    pub export_date: OffsetDateTime,
    pub version: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub transactions: usize,
    pub notes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: RecordCounts,
    pub skipped: RecordCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub transactions_deleted: u64,
    pub notes_deleted: u64,
}

/// Validated records ready to insert, plus how many entries were rejected.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub transactions: Vec<ValidTransaction>,
    pub notes: Vec<ValidNote>,
    pub skipped: RecordCounts,
}

/// `pocketbook-data-YYYY-MM-DD.json`
#[must_use]
pub fn export_filename(date: Date) -> String {
    format!("pocketbook-data-{date}.json")
}

/// Validate every entry of an import document.
///
/// # Errors
///
/// Returns `MissingTransactions` when `transactions` is absent or not an array.
pub fn plan_import(doc: &Value) -> Result<ImportPlan, TransferError> {
    let transactions = doc
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or(TransferError::MissingTransactions)?;
    let notes = doc.get("notes").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);

    let mut plan = ImportPlan::default();
    for entry in transactions {
        match serde_json::from_value::<NewTransaction>(entry.clone()).ok().and_then(|t| t.validate().ok()) {
            Some(valid) => plan.transactions.push(valid),
            None => plan.skipped.transactions += 1,
        }
    }
    for entry in notes {
        match serde_json::from_value::<NewNote>(entry.clone()).ok().and_then(|n| n.validate().ok()) {
            Some(valid) => plan.notes.push(valid),
            None => plan.skipped.notes += 1,
        }
    }
    Ok(plan)
}

/// Gather everything the user owns into one document.
///
/// # Errors
///
/// Returns an error if any of the reads fail.
pub async fn export_user_data(pool: &PgPool, actor: &Actor) -> Result<ExportDocument, TransferError> {
    let user = profile::fetch_user(pool, actor.user_id).await?;
    let transactions = transaction::list_transactions(pool, actor.user_id).await?;
    let notes = note::list_notes(pool, actor.user_id).await?;

    activity::log_user_action(
        pool,
        actor,
        ActivityCategory::Settings,
        actions::DATA_EXPORT,
        json!({ "transaction_count": transactions.len(), "note_count": notes.len() }),
    )
    .await;

    Ok(ExportDocument {
        user,
        transactions,
        notes,
        export_date: OffsetDateTime::now_utc(),
        version: EXPORT_VERSION,
    })
}

/// Import a previously exported document for the actor.
///
/// # Errors
///
/// Returns `MissingTransactions` or a database error. On a database error
/// nothing is imported.
pub async fn import_user_data(pool: &PgPool, actor: &Actor, doc: &Value) -> Result<ImportSummary, TransferError> {
    let plan = plan_import(doc)?;

    let mut summary = ImportSummary { skipped: plan.skipped, ..ImportSummary::default() };
    let mut db_tx = pool.begin().await?;
    for tx in &plan.transactions {
        transaction::insert_transaction(db_tx.as_mut(), actor.user_id, tx).await?;
        summary.imported.transactions += 1;
    }
    for n in &plan.notes {
        note::insert_note(db_tx.as_mut(), actor.user_id, n).await?;
        summary.imported.notes += 1;
    }
    db_tx.commit().await?;

    activity::log_user_action(
        pool,
        actor,
        ActivityCategory::Settings,
        actions::DATA_IMPORT,
        json!({
            "transaction_count": summary.imported.transactions,
            "note_count": summary.imported.notes,
            "skipped": summary.skipped.transactions + summary.skipped.notes,
        }),
    )
    .await;

    Ok(summary)
}

/// Delete the actor's transactions and notes. Activity logs are kept.
///
/// # Errors
///
/// Returns a database error if either delete fails, in which case nothing
/// is deleted.
pub async fn delete_user_data(pool: &PgPool, actor: &Actor) -> Result<DeleteSummary, TransferError> {
    let mut db_tx = pool.begin().await?;
    let summary = DeleteSummary {
        transactions_deleted: transaction::delete_all_transactions(db_tx.as_mut(), actor.user_id).await?,
        notes_deleted: note::delete_all_notes(db_tx.as_mut(), actor.user_id).await?,
    };
    db_tx.commit().await?;

    activity::log_user_action(
        pool,
        actor,
        ActivityCategory::Settings,
        actions::DATA_DELETE,
        json!({
            "transactions_deleted": summary.transactions_deleted,
            "notes_deleted": summary.notes_deleted,
        }),
    )
    .await;

    Ok(summary)
}

#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;
