//! Error types for spanjoin operations.
//!
//! Every engine operation is a pure function of its inputs: all errors are
//! detected eagerly, before any output table is constructed, so a failure
//! never leaves behind a partially populated result.

/// Result type alias for spanjoin operations.
pub type SpanJoinResult<T> = Result<T, SpanJoinError>;

/// Error type for join, grouping, and window operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpanJoinError {
    /// Malformed or ambiguous column / on specification.
    ///
    /// Raised for missing columns, cells or transform outputs that cannot be
    /// coerced to an interval, mismatched label lengths, and inconsistent
    /// aggregator output across groups.
    #[error("specification error: {message}")]
    Specification {
        message: String,
        /// Name of the column that caused the error, if applicable.
        column: Option<String>,
    },

    /// Invalid interval or window domain.
    ///
    /// Raised when an interval's start is after its stop, when bounds are not
    /// comparable, and when a window count does not fit the requested span.
    #[error("domain error: {message}")]
    Domain { message: String },

    /// Two output columns resolved to the same name with `makeunique` disabled.
    #[error("duplicate output column name '{name}'; pass makeunique to deduplicate")]
    NameCollision { name: String },
}

impl SpanJoinError {
    /// Create a specification error without column context.
    pub fn specification(message: impl Into<String>) -> Self {
        Self::Specification {
            message: message.into(),
            column: None,
        }
    }

    /// Create a specification error attributed to a column.
    pub fn specification_for(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Specification {
            message: message.into(),
            column: Some(column.into()),
        }
    }

    /// Create a specification error for a column that is absent from a table.
    pub fn missing_column(column: impl Into<String>, available: Vec<String>) -> Self {
        let column = column.into();
        Self::Specification {
            message: format!(
                "column '{}' not found; available columns: {:?}",
                column, available
            ),
            column: Some(column),
        }
    }

    /// Create a domain error.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create a name collision error.
    pub fn name_collision(name: impl Into<String>) -> Self {
        Self::NameCollision { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpanJoinError::missing_column("span", vec!["id".to_string()]);
        assert!(err.to_string().contains("'span'"));
        assert!(err.to_string().contains("id"));

        let err = SpanJoinError::name_collision("x");
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("makeunique"));
    }

    #[test]
    fn test_specification_column_context() {
        match SpanJoinError::specification_for("span", "bad cell") {
            SpanJoinError::Specification { column, .. } => {
                assert_eq!(column.as_deref(), Some("span"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
