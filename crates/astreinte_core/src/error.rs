/// Failures of the storage behind a [`crate::repository::ScheduleRepository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot save an empty planning for {person}")]
    EmptyPlanning { person: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
