use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// One parsed statement. Built once per submitted query and consumed by the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ListTables,
    CreateOrUseDatabase {
        name: String,
    },
    DropTable {
        name: String,
    },
    CreateTable {
        name: String,
        fields: Vec<String>,
    },
    Insert {
        name: String,
        fields: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Read {
        name: String,
        fields: Vec<String>,
        filter: Filter,
    },
    ReadOrdered {
        name: String,
        fields: Vec<String>,
        filter: Filter,
        order: OrderBy,
    },
    Update {
        name: String,
        assignments: Vec<Assignment>,
        filter: Filter,
    },
    Delete {
        name: String,
        filter: Filter,
    },
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::ListTables => "list_tables",
            Statement::CreateOrUseDatabase { .. } => "use_database",
            Statement::DropTable { .. } => "drop_table",
            Statement::CreateTable { .. } => "create_table",
            Statement::Insert { .. } => "insert",
            Statement::Read { .. } => "read",
            Statement::ReadOrdered { .. } => "read_ordered",
            Statement::Update { .. } => "update",
            Statement::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl FromStr for Comparator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::NotEq),
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            ">=" => Ok(Comparator::GtEq),
            "<=" => Ok(Comparator::LtEq),
            other => Err(QueryError::Operator(other.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::GtEq => ">=",
            Comparator::LtEq => "<=",
        };
        f.write_str(s)
    }
}

/// AND/OR token joining two where clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl FromStr for Connective {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            _ => Err(QueryError::Operator(s.to_string())),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => f.write_str("AND"),
            Connective::Or => f.write_str("OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub comparator: Comparator,
    pub literal: String,
}

impl WhereClause {
    pub fn new(column: impl Into<String>, comparator: Comparator, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            comparator,
            literal: literal.into(),
        }
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.comparator, self.literal)
    }
}

/// Atomic clauses and the connectives between them, both in textual order.
/// A well-formed filter has `operators.len() == where_clauses.len() - 1`; an empty
/// filter accepts every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub where_clauses: Vec<WhereClause>,
    pub operators: Vec<Connective>,
}

impl Filter {
    pub fn new(where_clauses: Vec<WhereClause>, operators: Vec<Connective>) -> Self {
        Self {
            where_clauses,
            operators,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.where_clauses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub new_value: String,
}

impl Assignment {
    pub fn new(column: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            new_value: new_value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}
