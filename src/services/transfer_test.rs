use super::*;
use time::macros::date;
use uuid::Uuid;

use crate::catalog::{NoteCategory, TransactionKind};

#[test]
fn export_filename_uses_iso_date() {
    assert_eq!(export_filename(date!(2025 - 03 - 07)), "pocketbook-data-2025-03-07.json");
}

#[test]
fn plan_import_requires_transactions_array() {
    assert!(matches!(plan_import(&json!({})), Err(TransferError::MissingTransactions)));
    assert!(matches!(
        plan_import(&json!({ "transactions": "nope" })),
        Err(TransferError::MissingTransactions)
    ));
}

#[test]
fn plan_import_accepts_empty_document() {
    let plan = plan_import(&json!({ "transactions": [] })).unwrap();
    assert!(plan.transactions.is_empty());
    assert!(plan.notes.is_empty());
    assert_eq!(plan.skipped, RecordCounts::default());
}

#[test]
fn plan_import_skips_invalid_entries() {
    let doc = json!({
        "transactions": [
            { "type": "expense", "amount": 12.5, "category": "1", "description": "Lunch", "date": "2025-03-01" },
            { "type": "expense", "amount": -1, "category": "1", "description": "Bad", "date": "2025-03-01" },
            { "type": "income", "amount": 10, "category": "1", "description": "Wrong kind", "date": "2025-03-01" },
            { "type": "expense", "amount": 3 },
            "garbage"
        ],
        "notes": [
            { "title": "Goal", "content": "Save", "category": "financial-goal", "tags": ["a"] },
            { "title": "", "content": "x" }
        ]
    });
    let plan = plan_import(&doc).unwrap();
    assert_eq!(plan.transactions.len(), 1);
    assert_eq!(plan.transactions[0].amount_cents, 1250);
    assert_eq!(plan.transactions[0].kind, TransactionKind::Expense);
    assert_eq!(plan.skipped.transactions, 4);
    assert_eq!(plan.notes.len(), 1);
    assert_eq!(plan.notes[0].category, NoteCategory::FinancialGoal);
    assert_eq!(plan.skipped.notes, 1);
}

#[test]
fn plan_import_accepts_timestamp_dates() {
    let doc = json!({
        "transactions": [
            { "type": "expense", "amount": 40, "category": "2", "description": "Fuel", "date": "2025-03-01T00:00:00.000Z" },
            { "type": "expense", "amount": 5, "category": "1", "description": "Tea", "date": "2025-03-02T18:30:00+02:00" }
        ]
    });
    let plan = plan_import(&doc).unwrap();
    assert_eq!(plan.skipped.transactions, 0);
    assert_eq!(plan.transactions[0].date, date!(2025 - 03 - 01));
    assert_eq!(plan.transactions[1].date, date!(2025 - 03 - 02));
}

#[test]
fn export_document_round_trips_through_import() {
    let user_id = Uuid::new_v4();
    let doc = ExportDocument {
        user: UserRecord {
            id: user_id,
            name: "Ada".into(),
            email: None,
            avatar_url: None,
            theme: "dark".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        },
        transactions: vec![TransactionRow {
            id: Uuid::new_v4(),
            user_id,
            kind: TransactionKind::Income,
            amount_cents: 250_000,
            category: "10".into(),
            description: "Salary".into(),
            date: date!(2025 - 02 - 28),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }],
        notes: vec![NoteRow {
            id: Uuid::new_v4(),
            user_id,
            title: "Plan".into(),
            content: "Budget".into(),
            category: NoteCategory::BudgetPlan,
            tags: vec!["rent".into()],
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }],
        export_date: OffsetDateTime::UNIX_EPOCH,
        version: EXPORT_VERSION,
    };

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["export_date"], "1970-01-01T00:00:00Z");

    let plan = plan_import(&value).unwrap();
    assert_eq!(plan.transactions.len(), 1);
    assert_eq!(plan.transactions[0].amount_cents, 250_000);
    assert_eq!(plan.notes.len(), 1);
    assert_eq!(plan.notes[0].tags, vec!["rent"]);
    assert_eq!(plan.skipped, RecordCounts::default());
}

// =============================================================================
// Live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn delete_user_data_keeps_activity_logs() {
    use crate::db::test_helpers::{integration_pool, seed_user};

    let pool = integration_pool().await;
    let actor = Actor::system(seed_user(&pool, "transfer-test").await);
    let doc = json!({
        "transactions": [
            { "type": "expense", "amount": 12.5, "category": "1", "description": "Lunch", "date": "2025-03-01" },
            { "type": "income", "amount": 900, "category": "10", "description": "Pay", "date": "2025-03-01T09:00:00.000Z" }
        ],
        "notes": [{ "title": "Goal", "content": "Save", "category": "financial-goal" }]
    });

    let imported = import_user_data(&pool, &actor, &doc).await.expect("import should succeed");
    assert_eq!(imported.imported, RecordCounts { transactions: 2, notes: 1 });

    let deleted = delete_user_data(&pool, &actor).await.expect("delete should succeed");
    assert_eq!(deleted, DeleteSummary { transactions_deleted: 2, notes_deleted: 1 });
    assert!(transaction::list_transactions(&pool, actor.user_id).await.unwrap().is_empty());
    assert!(note::list_notes(&pool, actor.user_id).await.unwrap().is_empty());

    let logs = activity::get_user_activity_logs(&pool, actor.user_id, 10, Some(ActivityCategory::Settings))
        .await
        .expect("activity query should succeed");
    let logged: Vec<&str> = logs.iter().map(|l| l.action.as_str()).collect();
    assert!(logged.contains(&actions::DATA_IMPORT));
    assert!(logged.contains(&actions::DATA_DELETE));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn failed_import_inserts_nothing() {
    use crate::db::test_helpers::{integration_pool, seed_user};

    let pool = integration_pool().await;
    let actor = Actor::system(seed_user(&pool, "transfer-test").await);
    // Postgres rejects NUL in TEXT, so the second insert fails after the first succeeds.
    let doc = json!({
        "transactions": [
            { "type": "expense", "amount": 3, "category": "1", "description": "Tea", "date": "2025-03-01" },
            { "type": "expense", "amount": 4, "category": "1", "description": "Bad\u{0}", "date": "2025-03-01" }
        ]
    });

    assert!(matches!(
        import_user_data(&pool, &actor, &doc).await,
        Err(TransferError::Transactions(TransactionError::Database(_)))
    ));
    assert!(transaction::list_transactions(&pool, actor.user_id).await.unwrap().is_empty());
}
