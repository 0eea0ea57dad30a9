use thiserror::Error;

/// Failures of the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("injected failure: {0}")]
    Injected(&'static str),
}

impl StoreError {
    pub fn service_not_found(id: &str) -> Self {
        StoreError::NotFound { kind: "service", id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<deadpool::managed::PoolError<libsql::Error>> for StoreError {
    fn from(err: deadpool::managed::PoolError<libsql::Error>) -> Self {
        match err {
            deadpool::managed::PoolError::Backend(e) => StoreError::Database(e),
            other => StoreError::Pool(other.to_string()),
        }
    }
}

/// Lifecycle failures surfaced to whoever drives the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind: "service", id } => SchedulerError::ServiceNotFound(id),
            other => SchedulerError::Store(other),
        }
    }
}
