use crate::Error;
use thiserror::Error;

/// Failures surfaced by the statement preparation protocol.
///
/// None of them is retried or suppressed: each one reaches the caller of
/// [`PrepareContext::prepare`](crate::PrepareContext::prepare) or of the
/// [`Coordinator`](crate::Coordinator) method that started the preparation.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// A capability was requested that the session configuration does not enable.
    /// Raised before any side effect.
    #[error("{0}")]
    Configuration(String),

    /// The driver rejected the command text or its parameters.
    #[error(
        "{message}{}",
        .sql.as_deref().map(|sql| format!(" [{}]", sql)).unwrap_or_default()
    )]
    StatementPreparation {
        message: &'static str,
        /// Effective command text, after inspection.
        sql: Option<String>,
        #[source]
        source: Error,
    },

    /// Internal invariant violated, the operation must be abandoned.
    #[error("{0}")]
    Assertion(String),

    /// The inspector failed while looking at the command text.
    #[error("the statement inspector failed")]
    Inspection(#[source] Error),

    /// The pending batch could not be flushed ahead of the new statement.
    #[error("could not execute the pending batch")]
    Batch(#[source] Error),

    /// The statement could not be tracked by the resource registry.
    #[error("could not register the statement")]
    Registry(#[source] Error),

    /// The logical connection was already closed.
    #[error("the logical connection is closed")]
    Closed,
}

impl PrepareError {
    pub(crate) fn preparation(message: &'static str, sql: Option<&str>, source: Error) -> Self {
        Self::StatementPreparation {
            message,
            sql: sql.map(ToOwned::to_owned),
            source,
        }
    }

    /// Effective command text carried by the error, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::StatementPreparation { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(..))
    }

    pub fn is_statement_preparation(&self) -> bool {
        matches!(self, Self::StatementPreparation { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(..))
    }
}

pub type PrepareResult<T> = std::result::Result<T, PrepareError>;
