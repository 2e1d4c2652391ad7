use super::*;
use crate::services::note::NoteError;
use crate::services::profile::ProfileError;
use crate::services::transaction::TransactionError;
use uuid::Uuid;

#[test]
fn missing_transactions_is_bad_request() {
    assert_eq!(transfer_error_to_status(&TransferError::MissingTransactions), StatusCode::BAD_REQUEST);
}

#[test]
fn transaction_begin_failure_is_internal_error() {
    assert_eq!(
        transfer_error_to_status(&TransferError::Database(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn wrapped_errors_use_their_own_mapping() {
    assert_eq!(
        transfer_error_to_status(&TransferError::Profile(ProfileError::NotFound(Uuid::nil()))),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        transfer_error_to_status(&TransferError::Transactions(TransactionError::Database(sqlx::Error::PoolClosed))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        transfer_error_to_status(&TransferError::Notes(NoteError::Database(sqlx::Error::RowNotFound))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
