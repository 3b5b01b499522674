use sitedesk_core::error::CoreError;

/// Error returned by repository operations that apply domain rules inside a
/// transaction (lifecycle moves, batch reservations).
///
/// A `Core` error means the transaction was rolled back without writing.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
