use thiserror::Error;

use crate::column_type::ColumnType;
use crate::constraint::Constraint;

/// Every failure the engine can report.
///
/// Errors abort only the statement that raised them; no table or row state
/// is changed by a failed statement. The caller (a REPL, a test) decides
/// whether to keep going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    #[error("database '{0}' already exists")]
    DatabaseExists(String),
    #[error("database '{0}' does not exist")]
    UnknownDatabase(String),
    #[error("no database selected, select one with 'DATABASE USE <name>'")]
    NoDatabaseSelected,

    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("table '{0}' does not exist")]
    UnknownTable(String),
    #[error("column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },
    #[error("column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },
    #[error("row has {got} values but table '{table}' has {expected} columns")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    #[error("value '{value}' violates the {constraint} constraint on column '{column}'")]
    ConstraintViolation {
        constraint: Constraint,
        column: String,
        value: String,
    },
    #[error("value '{value}' in column '{column}' is not a valid {expected}")]
    TypeValidation {
        value: String,
        column: String,
        expected: ColumnType,
    },
    #[error("column '{0}' carries a key constraint and cannot be updated")]
    ImmutableColumn(String),

    #[error("{0}")]
    Grammar(String),
    #[error("column '{0}' exists in both joined tables")]
    AmbiguousColumn(String),

    #[error("cannot drop table '{table}', a foreign key in table '{referencing}' points at it")]
    ReferencedByForeignKey { table: String, referencing: String },
    #[error("invalid foreign key: {0}")]
    InvalidForeignKey(String),

    #[error("i/o failure: {0}")]
    Io(String),
    #[error("corrupt data file: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Io(err.to_string())
    }
}
