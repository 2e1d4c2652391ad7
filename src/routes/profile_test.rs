use super::*;
use crate::services::transaction::TransactionError;
use uuid::Uuid;

#[test]
fn validation_errors_are_bad_request() {
    for err in [
        ProfileError::EmptyName,
        ProfileError::NameTooLong,
        ProfileError::InvalidTheme("sepia".into()),
        ProfileError::EmptyPatch,
    ] {
        assert_eq!(profile_error_to_status(&err), StatusCode::BAD_REQUEST, "{err}");
    }
}

#[test]
fn missing_user_is_not_found() {
    assert_eq!(profile_error_to_status(&ProfileError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
}

#[test]
fn storage_errors_are_internal() {
    assert_eq!(
        profile_error_to_status(&ProfileError::Database(sqlx::Error::RowNotFound)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        profile_error_to_status(&ProfileError::Transactions(TransactionError::Database(sqlx::Error::PoolClosed))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
