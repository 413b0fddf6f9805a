pub mod lexer;
pub mod ast;
pub mod where_clause;
pub mod predicate;
pub mod parser;
pub mod executor;

pub use lexer::{Lexer, Token, TokenKind};
pub use ast::*;
pub use parser::{parse_statement, Parser};
pub use predicate::{combine, compare_cells, FieldCheck};
pub use executor::{execute_query, Executor, QueryOutput, RowAction};
