use super::config::ConfigError;
use crate::core::models::table::TableError;
use thiserror::Error;

/// Violated mathematical preconditions of the search.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Cannot compute a confidence bound for an entry with zero samples")]
    ZeroSamples,

    #[error("Step number must be at least 1, got {step}")]
    NonPositiveStep { step: u64 },

    #[error("Step size for dimension '{dimension}' must be at least half a grid unit, got {value}")]
    ZeroStepSize { dimension: String, value: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Domain error: {source}")]
    Domain {
        #[from]
        source: DomainError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Experiment executor failed at step {step}: {message}")]
    Executor { step: u64, message: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<TableError> for EngineError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NonNumeric { .. } => EngineError::Data(e.to_string()),
            TableError::MissingColumn { .. }
            | TableError::DuplicateColumn { .. }
            | TableError::RowLength { .. } => EngineError::Schema(e.to_string()),
            TableError::RowOutOfRange { .. } => EngineError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_errors_map_onto_the_engine_taxonomy() {
        let missing: EngineError = TableError::MissingColumn {
            column: "seed".to_string(),
        }
        .into();
        assert!(matches!(missing, EngineError::Schema(msg) if msg.contains("seed")));

        let bad: EngineError = TableError::NonNumeric {
            row: 3,
            column: "peak".to_string(),
            value: "n/a".to_string(),
        }
        .into();
        assert!(matches!(bad, EngineError::Data(msg) if msg.contains("n/a")));
    }

    #[test]
    fn domain_errors_convert_with_from() {
        let e: EngineError = DomainError::NonPositiveStep { step: 0 }.into();
        assert!(matches!(
            e,
            EngineError::Domain {
                source: DomainError::NonPositiveStep { step: 0 }
            }
        ));
    }
}
