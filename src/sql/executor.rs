use std::fmt;
use std::path::Path;

use tracing::debug;

use super::ast::*;
use super::parser::Parser;
use super::predicate::compare_cells;
use crate::error::{QueryError, Result};
use crate::storage::store::{projection, select};
use crate::storage::{Database, Record, TableStore};

/// The row-count outputs, named by what happened to the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Written,
    Updated,
    Deleted,
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowAction::Written => write!(f, "written"),
            RowAction::Updated => write!(f, "updated"),
            RowAction::Deleted => write!(f, "deleted"),
        }
    }
}

/// Result of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Tables(Vec<String>),
    Records(Vec<Record>),
    RowCount { count: usize, action: RowAction },
    Message(String),
    DatabaseSelected(String),
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::Tables(tables) => write!(f, "{}", tables.join("\n")),
            QueryOutput::Records(records) => {
                for (i, record) in records.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", record)?;
                }
                Ok(())
            }
            QueryOutput::RowCount { count, action } => write!(f, "{} records {}", count, action),
            QueryOutput::Message(message) => write!(f, "{}", message),
            QueryOutput::DatabaseSelected(name) => write!(f, "Using database: {}", name),
        }
    }
}

/// Runs parsed statements against one database.
pub struct Executor<'a> {
    db: &'a Database,
    store: TableStore,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a Database, store: TableStore) -> Self {
        Self { db, store }
    }

    pub fn execute(&self, stmt: &Statement) -> Result<QueryOutput> {
        debug!(database = self.db.name(), statement = stmt.kind(), "executing");

        match stmt {
            Statement::ListTables => self.store.get_tables(self.db).map(QueryOutput::Tables),
            Statement::CreateOrUseDatabase { name } => {
                // Databases are sibling directories of the open one. The executor stays
                // bound to `db`; switching is up to the session.
                let parent = self.db.root().parent().unwrap_or_else(|| Path::new("."));
                Database::create(parent, name)?;
                Ok(QueryOutput::Message(format!("Created database: {}", name)))
            }
            Statement::DropTable { name } => {
                self.store.delete_table(self.db, name)?;
                Ok(QueryOutput::Message(format!("Dropped Table: {}", name)))
            }
            Statement::CreateTable { name, fields } => {
                self.store.create_table(self.db, name, fields)?;
                Ok(QueryOutput::Message(format!("Created Table: {}", name)))
            }
            Statement::Insert { name, fields, rows } => {
                let count = self.store.insert_records(self.db, name, fields, rows)?;
                Ok(QueryOutput::RowCount {
                    count,
                    action: RowAction::Written,
                })
            }
            Statement::Read {
                name,
                fields,
                filter,
            } => self
                .store
                .read_table(self.db, name, fields, filter)
                .map(QueryOutput::Records),
            Statement::ReadOrdered {
                name,
                fields,
                filter,
                order,
            } => {
                let table = self.store.load(self.db, name)?;
                let columns = projection(&table.header, fields)?;
                if !columns.iter().any(|&(col, _)| col == order.column) {
                    return Err(QueryError::Field(format!(
                        "Invalid field in ORDER BY: {}",
                        order.column
                    )));
                }

                let mut records = select(&table, &columns, filter)?;
                sort_records(&mut records, order);
                Ok(QueryOutput::Records(records))
            }
            Statement::Update {
                name,
                assignments,
                filter,
            } => {
                let count = self.store.update_table(self.db, name, assignments, filter)?;
                Ok(QueryOutput::RowCount {
                    count,
                    action: RowAction::Updated,
                })
            }
            Statement::Delete { name, filter } => {
                let count = self.store.delete_records(self.db, name, filter)?;
                Ok(QueryOutput::RowCount {
                    count,
                    action: RowAction::Deleted,
                })
            }
        }
    }
}

/// Stable sort on one projected column.
fn sort_records(records: &mut [Record], order: &OrderBy) {
    records.sort_by(|a, b| {
        let ordering = compare_cells(
            a.get(&order.column).unwrap_or_default(),
            b.get(&order.column).unwrap_or_default(),
        );
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Parses and runs one statement against `db` with the default table format.
pub fn execute_query(db: &Database, sql: &str) -> Result<QueryOutput> {
    let stmt = Parser::new(sql)?.parse()?;
    Executor::new(db, TableStore::new()).execute(&stmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::create(dir.path(), "testdb").unwrap();

        execute_query(&db, "CREATE TABLE users (id, name, age);").unwrap();
        execute_query(
            &db,
            "INSERT INTO users (id, name, age) VALUES (1, Alice, 30), (2, Bob, 25), (3, Charlie, 35);",
        )
        .unwrap();

        (dir, db)
    }

    fn records(output: QueryOutput) -> Vec<Record> {
        match output {
            QueryOutput::Records(records) => records,
            other => panic!("expected records, got {:?}", other),
        }
    }

    fn column(records: &[Record], name: &str) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get(name).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_select_all() {
        let (_dir, db) = create_test_db();
        let result = records(execute_query(&db, "SELECT * FROM users;").unwrap());
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].columns().collect::<Vec<_>>(), vec!["id", "name", "age"]);
        assert_eq!(column(&result, "name"), vec!["Alice", "Bob", "Charlie"]);
    }

    #[test]
    fn test_select_columns() {
        let (_dir, db) = create_test_db();
        let result = records(execute_query(&db, "SELECT age, name FROM users;").unwrap());
        assert_eq!(result[0].columns().collect::<Vec<_>>(), vec!["age", "name"]);
    }

    #[test]
    fn test_select_where() {
        let (_dir, db) = create_test_db();
        let result = records(execute_query(&db, "SELECT name FROM users WHERE age > 28;").unwrap());
        assert_eq!(column(&result, "name"), vec!["Alice", "Charlie"]);
    }

    #[test]
    fn test_order_by() {
        let (_dir, db) = create_test_db();
        let result = records(execute_query(&db, "SELECT * FROM users ORDER BY age;").unwrap());
        assert_eq!(column(&result, "age"), vec!["25", "30", "35"]);

        let result = records(
            execute_query(&db, "SELECT name FROM users WHERE id != 2 ORDER BY name DESC;").unwrap(),
        );
        assert_eq!(column(&result, "name"), vec!["Charlie", "Alice"]);
    }

    #[test]
    fn test_order_by_unprojected_column() {
        let (_dir, db) = create_test_db();
        let err = execute_query(&db, "SELECT name FROM users ORDER BY age;").unwrap_err();
        assert!(matches!(err, QueryError::Field(_)));
    }

    #[test]
    fn test_row_counts() {
        let (_dir, db) = create_test_db();
        let output = execute_query(&db, "UPDATE TABLE users SET age = 31 WHERE id = 1;").unwrap();
        assert_eq!(output.to_string(), "1 records updated");

        let output = execute_query(&db, "DELETE FROM users WHERE age < 32;").unwrap();
        assert_eq!(output.to_string(), "2 records deleted");

        let output = execute_query(&db, "INSERT INTO users (id) VALUES (4) (5);").unwrap();
        assert_eq!(output.to_string(), "2 records written");
    }

    #[test]
    fn test_show_and_drop_tables() {
        let (_dir, db) = create_test_db();
        execute_query(&db, "CREATE TABLE accounts (id);").unwrap();
        assert_eq!(
            execute_query(&db, "SHOW TABLES;").unwrap(),
            QueryOutput::Tables(vec!["accounts".to_string(), "users".to_string()])
        );

        let output = execute_query(&db, "DROP TABLE accounts;").unwrap();
        assert_eq!(output.to_string(), "Dropped Table: accounts");
        assert!(matches!(
            execute_query(&db, "DROP TABLE accounts;"),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn test_table_not_found() {
        let (_dir, db) = create_test_db();
        let err = execute_query(&db, "SELECT * FROM missing;").unwrap_err();
        assert!(matches!(err, QueryError::NotFound(ref t) if t == "missing"));
    }

    #[test]
    fn test_use_database_creates_sibling_without_switching() {
        let (dir, db) = create_test_db();
        assert_eq!(
            execute_query(&db, "CREATE DATABASE archive;").unwrap(),
            QueryOutput::Message("Created database: archive".to_string())
        );
        assert!(dir.path().join("archive").is_dir());

        let tables = execute_query(&db, "SHOW TABLES;").unwrap();
        assert_eq!(tables, QueryOutput::Tables(vec!["users".to_string()]));
    }

    #[test]
    fn test_order_by_unknown_column_without_rows() {
        let (_dir, db) = create_test_db();
        execute_query(&db, "CREATE TABLE empty (a);").unwrap();

        for sql in [
            "SELECT * FROM empty ORDER BY zzz;",
            "SELECT * FROM users WHERE id = 99 ORDER BY zzz;",
            "SELECT * FROM users ORDER BY zzz;",
        ] {
            let err = execute_query(&db, sql).unwrap_err();
            assert!(
                matches!(err, QueryError::Field(ref m) if m.contains("zzz")),
                "expected field error for {}",
                sql
            );
        }
    }
}
