use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::csv::CsvFormat;
use super::database::{is_valid_name, Database, TABLE_EXTENSION};
use super::table::{Header, Record, Row, Table};
use crate::error::{QueryError, Result};
use crate::sql::ast::{Assignment, Filter};
use crate::sql::predicate::FieldCheck;

/// What a rewrite does with one row.
enum Rewrite {
    Keep,
    Replace(Row),
    Drop,
}

/// Flat-file table operations. Every call takes the database it works on; the store
/// itself only carries the file format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableStore {
    format: CsvFormat,
}

impl TableStore {
    pub fn new() -> Self {
        Self {
            format: CsvFormat::new(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.format = self.format.with_delimiter(delimiter);
        self
    }

    /// Writes a header-only table file.
    pub fn create_table(&self, db: &Database, name: &str, fields: &[String]) -> Result<()> {
        let header = Header::new(fields.to_vec())
            .map_err(|dup| QueryError::Field(format!("Duplicate column name: {}", dup)))?;
        for field in fields {
            self.format.check_value(field)?;
        }

        let path = db.table_path(name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => QueryError::AlreadyExists(name.to_string()),
                _ => QueryError::Io(e),
            })?;
        let mut writer = BufWriter::new(file);
        self.format.write_row(&mut writer, header.columns())?;
        writer.flush()?;

        debug!(table = name, columns = header.column_count(), "created table");
        Ok(())
    }

    /// Appends rows given in `fields` order, aligned to the stored header. Columns not
    /// named in `fields` are left empty.
    pub fn insert_records(
        &self,
        db: &Database,
        name: &str,
        fields: &[String],
        rows: &[Vec<String>],
    ) -> Result<usize> {
        if let Some(pos) = rows.iter().position(|row| row.len() != fields.len()) {
            return Err(QueryError::Dimension { row: pos + 1 });
        }

        let (table, ends_with_newline) = self.load_with_tail(db, name)?;

        let mut seen = HashSet::new();
        let indexes = fields
            .iter()
            .map(|field| {
                if !seen.insert(field.as_str()) {
                    return Err(QueryError::Field(format!("Duplicate field name: {}", field)));
                }
                table
                    .header
                    .column_index(field)
                    .ok_or_else(|| QueryError::Field(format!("Invalid field name: {}", field)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut built = Vec::with_capacity(rows.len());
        for values in rows {
            let mut row = Row::empty(&table.header);
            for (&idx, value) in indexes.iter().zip(values) {
                self.format.check_value(value)?;
                row.set(idx, value.as_str());
            }
            built.push(row);
        }

        if built.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new().append(true).open(db.table_path(name))?;
        let mut writer = BufWriter::new(file);
        if !ends_with_newline {
            writeln!(writer)?;
        }
        for row in &built {
            self.format.write_row(&mut writer, &row.values)?;
        }
        writer.flush()?;

        debug!(table = name, rows = built.len(), "inserted records");
        Ok(built.len())
    }

    /// Returns the rows passing `filter`, projected to `fields` (`*` selects every column).
    pub fn read_table(
        &self,
        db: &Database,
        name: &str,
        fields: &[String],
        filter: &Filter,
    ) -> Result<Vec<Record>> {
        let table = self.load(db, name)?;
        let columns = projection(&table.header, fields)?;
        let records = select(&table, &columns, filter)?;

        debug!(table = name, rows = records.len(), filtered = !filter.is_empty(), "read table");
        Ok(records)
    }

    /// Overwrites the assigned cells of every matching row and returns how many matched.
    pub fn update_table(
        &self,
        db: &Database,
        name: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<usize> {
        let table = self.load(db, name)?;

        let targets = assignments
            .iter()
            .map(|assignment| {
                self.format.check_value(&assignment.new_value)?;
                table
                    .header
                    .column_index(&assignment.column)
                    .map(|i| (i, assignment.new_value.as_str()))
                    .ok_or_else(|| {
                        QueryError::Field(format!("Invalid field in UPDATE: {}", assignment.column))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let predicate = filter.bind(&table.header, FieldCheck::Lenient)?;

        let mut updated = 0;
        self.rewrite(db, &table, |row| {
            if !predicate.matches(row)? {
                return Ok(Rewrite::Keep);
            }
            let mut row = row.clone();
            for &(idx, value) in &targets {
                row.set(idx, value);
            }
            updated += 1;
            Ok(Rewrite::Replace(row))
        })?;

        debug!(table = name, rows = updated, "updated records");
        Ok(updated)
    }

    /// Removes every matching row and returns how many were removed.
    pub fn delete_records(&self, db: &Database, name: &str, filter: &Filter) -> Result<usize> {
        let table = self.load(db, name)?;
        let predicate = filter.bind(&table.header, FieldCheck::Lenient)?;

        let mut deleted = 0;
        self.rewrite(db, &table, |row| {
            if predicate.matches(row)? {
                deleted += 1;
                Ok(Rewrite::Drop)
            } else {
                Ok(Rewrite::Keep)
            }
        })?;

        debug!(table = name, rows = deleted, "deleted records");
        Ok(deleted)
    }

    /// Names of the table files in the database, sorted.
    pub fn get_tables(&self, db: &Database) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for entry in fs::read_dir(db.root())? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_name(stem) {
                    tables.push(stem.to_string());
                }
            }
        }
        tables.sort();
        Ok(tables)
    }

    pub fn delete_table(&self, db: &Database, name: &str) -> Result<()> {
        fs::remove_file(db.table_path(name)).map_err(|e| not_found(e, name))?;
        debug!(table = name, "dropped table");
        Ok(())
    }

    /// Loads a whole table file.
    pub fn load(&self, db: &Database, name: &str) -> Result<Table> {
        self.load_with_tail(db, name).map(|(table, _)| table)
    }

    fn load_with_tail(&self, db: &Database, name: &str) -> Result<(Table, bool)> {
        let contents =
            fs::read_to_string(db.table_path(name)).map_err(|e| not_found(e, name))?;
        let table = self.format.read_from_reader(contents.as_bytes(), name)?;
        Ok((table, contents.ends_with('\n')))
    }

    /// Streams `table` into a scratch file, then renames it over the original. The
    /// original is untouched unless every row was written.
    fn rewrite<F>(&self, db: &Database, table: &Table, mut f: F) -> Result<()>
    where
        F: FnMut(&Row) -> Result<Rewrite>,
    {
        let scratch = db.scratch_path(&table.name);

        if let Err(e) = self.write_scratch(&scratch, table, &mut f) {
            let _ = fs::remove_file(&scratch);
            return Err(e);
        }

        fs::rename(&scratch, db.table_path(&table.name))?;
        Ok(())
    }

    fn write_scratch<F>(&self, scratch: &Path, table: &Table, f: &mut F) -> Result<()>
    where
        F: FnMut(&Row) -> Result<Rewrite>,
    {
        let mut writer = BufWriter::new(File::create(scratch)?);
        self.format.write_row(&mut writer, table.header.columns())?;
        for row in table.iter() {
            match f(row)? {
                Rewrite::Keep => self.format.write_row(&mut writer, &row.values)?,
                Rewrite::Replace(new_row) => self.format.write_row(&mut writer, &new_row.values)?,
                Rewrite::Drop => {}
            }
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

fn not_found(e: io::Error, name: &str) -> QueryError {
    match e.kind() {
        io::ErrorKind::NotFound => QueryError::NotFound(name.to_string()),
        _ => QueryError::Io(e),
    }
}

/// Resolves the selected field names to `(column, index)` pairs. `*` alone selects every
/// column in header order.
pub fn projection<'t>(header: &'t Header, fields: &'t [String]) -> Result<Vec<(&'t str, usize)>> {
    if fields.len() == 1 && fields[0] == "*" {
        return Ok(header
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| (col.as_str(), i))
            .collect());
    }

    fields
        .iter()
        .map(|field| {
            header
                .column_index(field)
                .map(|i| (field.as_str(), i))
                .ok_or_else(|| QueryError::Field(format!("Invalid field name: {}", field)))
        })
        .collect()
}

/// Rows of `table` passing `filter`, projected to `columns`.
pub fn select(table: &Table, columns: &[(&str, usize)], filter: &Filter) -> Result<Vec<Record>> {
    let predicate = filter.bind(&table.header, FieldCheck::Strict)?;

    let mut records = Vec::new();
    for row in table.iter() {
        if !predicate.matches(row)? {
            continue;
        }
        records.push(
            columns
                .iter()
                .map(|&(col, i)| (col, row.get(i).unwrap_or_default()))
                .collect(),
        );
    }
    Ok(records)
}
