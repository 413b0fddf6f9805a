use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Name error: {0}")]
    Name(String),

    #[error("Field error: {0}")]
    Field(String),

    #[error("Invalid tuple dimension for tuple {row}")]
    Dimension { row: usize },

    #[error("Operator error: {0}")]
    Operator(String),

    #[error("No table named {0} exists in the current database")]
    NotFound(String),

    #[error("Table already exists: {0}")]
    AlreadyExists(String),

    #[error("Empty field error: {0}")]
    EmptyField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Malformed table {table} at line {line}: {message}")]
    Malformed {
        table: String,
        line: usize,
        message: String,
    },

    #[error("No database selected (use `USE DATABASE <name>;`)")]
    NoDatabase,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
