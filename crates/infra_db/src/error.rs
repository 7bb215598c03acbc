//! Database error types
//!
//! Repositories return `DatabaseError`; the port adapters translate it into
//! `PortError` with the `From` impl at the bottom of this module.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
///
/// This enum captures all possible database-related errors, including
/// connection issues, query failures, and constraint violations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Arguments
    ///
    /// * `entity` - The type of entity (e.g., "Detection", "Estimation")
    /// * `id` - The identifier that was not found
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Detection", "DET-123");
    /// assert!(error.to_string().contains("Detection"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        match self {
            DatabaseError::NotFound(_) => true,
            DatabaseError::SqlError(e) => matches!(e, sqlx::Error::RowNotFound),
            _ => false,
        }
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        match self {
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => true,
            DatabaseError::SqlError(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }

    /// Replaces a raw SQLx error with the specific variant for its error code
    pub fn classify(self) -> Self {
        match self {
            DatabaseError::SqlError(ref e) => DatabaseError::from(e),
            other => other,
        }
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// This function analyzes the SQLx error and maps it to the appropriate
/// DatabaseError variant based on the PostgreSQL error code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                // PostgreSQL error codes
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error.classify() {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "Record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message) => PortError::Conflict { message },
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::Timeout {
                operation: "acquire connection".to_string(),
                duration_ms: 0,
            },
            DatabaseError::SerializationError(message) => PortError::transformation(message),
            DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message) => PortError::validation(message),
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_port_not_found() {
        let port: PortError = DatabaseError::not_found("Detection", "DET-1").into();
        assert!(port.is_not_found());
    }

    #[test]
    fn test_row_not_found_is_classified() {
        let error = DatabaseError::SqlError(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
        assert!(PortError::from(error).is_not_found());
    }

    #[test]
    fn test_pool_errors_are_transient() {
        assert!(DatabaseError::PoolExhausted.is_connection_error());
        assert!(PortError::from(DatabaseError::PoolExhausted).is_transient());
        assert!(PortError::from(DatabaseError::ConnectionFailed("refused".into())).is_transient());
    }

    #[test]
    fn test_serialization_error_maps_to_transformation() {
        let port = PortError::from(DatabaseError::SerializationError("bad json".into()));
        assert!(matches!(port, PortError::Transformation { .. }));
    }

    #[test]
    fn test_constraint_errors_map_to_port_errors() {
        let duplicate = PortError::from(DatabaseError::DuplicateEntry("estimations_pkey".into()));
        assert!(matches!(duplicate, PortError::Conflict { .. }));

        let check = PortError::from(DatabaseError::ConstraintViolation("total_cost >= 0".into()));
        assert!(matches!(check, PortError::Validation { field: None, .. }));

        let other = PortError::from(DatabaseError::MigrationFailed("checksum".into()));
        assert!(matches!(other, PortError::Internal { source: Some(_), .. }));
        assert!(!other.is_transient());
    }
}
