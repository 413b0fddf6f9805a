pub mod cli;
pub mod error;
pub mod output;
pub mod session;
pub mod sql;
pub mod storage;
pub mod tui;

pub use error::{QueryError, Result};
pub use session::{split_statements, Session};
pub use sql::{execute_query, parse_statement, QueryOutput, Statement};
pub use storage::{Database, Record, TableStore};
