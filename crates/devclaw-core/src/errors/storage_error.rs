/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error during {operation}: {message}")]
    Db { operation: String, message: String },

    #[error("full-text index unsupported by this SQLite build")]
    SchemaUnsupported,

    #[error("database corruption detected: {details}")]
    CorruptionDetected { details: String },
}

impl StorageError {
    /// Wrap a backend failure with the operation that triggered it.
    pub fn db(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Db {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}
