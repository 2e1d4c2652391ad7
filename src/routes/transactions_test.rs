use super::*;

#[test]
fn select_categories_defaults_to_all() {
    let all = select_categories(None).unwrap();
    assert_eq!(all.len(), catalog::EXPENSE_CATEGORIES.len() + catalog::INCOME_CATEGORIES.len());
    assert_eq!(select_categories(Some("all")).unwrap().len(), all.len());
}

#[test]
fn select_categories_by_kind() {
    let income = select_categories(Some("income")).unwrap();
    assert_eq!(income.len(), 6);
    assert!(income.iter().all(|c| c.kind == TransactionKind::Income));

    let expense = select_categories(Some(" Expense ")).unwrap();
    assert_eq!(expense.len(), 9);
}

#[test]
fn select_categories_rejects_unknown_kind() {
    assert_eq!(select_categories(Some("transfer")), Err(StatusCode::BAD_REQUEST));
}

#[test]
fn validation_errors_are_bad_request() {
    for err in [
        TransactionError::InvalidAmount,
        TransactionError::EmptyDescription,
        TransactionError::UnknownCategory("99".into()),
        TransactionError::CategoryKindMismatch { category: "1".into(), kind: TransactionKind::Income },
        TransactionError::EmptyPatch,
        TransactionError::UnknownTypeFilter("transfer".into()),
    ] {
        assert_eq!(transaction_error_to_status(&err), StatusCode::BAD_REQUEST, "{err}");
    }
}

#[test]
fn not_found_and_database_errors_map() {
    assert_eq!(transaction_error_to_status(&TransactionError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(
        transaction_error_to_status(&TransactionError::Database(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
