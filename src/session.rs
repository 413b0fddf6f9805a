use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{QueryError, Result};
use crate::sql::{Executor, Parser, QueryOutput, Statement};
use crate::storage::{Database, TableStore};

/// Front-end state: the directory holding database folders and the database statements
/// currently run against.
#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
    database: Option<Database>,
    store: TableStore,
}

impl Session {
    pub fn new(root: impl Into<PathBuf>, store: TableStore) -> Self {
        Self {
            root: root.into(),
            database: None,
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Selects `<root>/<name>`, creating the directory if it does not exist yet.
    pub fn use_database(&mut self, name: &str) -> Result<&Database> {
        let db = Database::create(&self.root, name)?;
        debug!(database = name, "selected database");
        Ok(&*self.database.insert(db))
    }

    /// Runs one `;`-terminated statement.
    pub fn execute(&mut self, sql: &str) -> Result<QueryOutput> {
        let stmt = Parser::new(sql)?.parse()?;

        if let Statement::CreateOrUseDatabase { name } = &stmt {
            self.use_database(name)?;
            return Ok(QueryOutput::DatabaseSelected(name.clone()));
        }

        let db = self.database.as_ref().ok_or(QueryError::NoDatabase)?;
        Executor::new(db, self.store).execute(&stmt)
    }

    /// Runs every statement of `text` in order, stopping at the first failure.
    pub fn execute_script(&mut self, text: &str) -> Result<Vec<QueryOutput>> {
        split_statements(text)
            .iter()
            .map(|stmt| self.execute(stmt))
            .collect()
    }
}

/// Splits a script into statements on `;` outside quotes and comments. Each statement
/// keeps its terminator; a trailing unterminated statement is returned as-is so that
/// parsing reports it. Statements with nothing but whitespace or comments are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_content = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                has_content = true;
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    current.push(c);
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                current.push('*');
                let mut prev = '\0';
                for c in chars.by_ref() {
                    current.push(c);
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' => {
                if has_content {
                    statements.push(current.trim().to_string());
                }
                current.clear();
                has_content = false;
            }
            c if !c.is_whitespace() => has_content = true,
            _ => {}
        }
    }

    if has_content {
        statements.push(current.trim().to_string());
    }
    statements
}
