use std::io::{BufRead, Write};

use super::table::{Header, Row, Table};
use crate::error::{QueryError, Result};

/// Line codec for table files: first line is the header, every other line one row.
///
/// Cells are written verbatim, so `parse_line(format_row(cells)) == cells` as long as no
/// cell contains the delimiter or a line break. Callers reject such values before writing.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    delimiter: char,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormat {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn read_from_reader<R: BufRead>(&self, reader: R, table_name: &str) -> Result<Table> {
        let mut lines = reader.lines().enumerate();

        let header_line = match lines.next() {
            Some((_, line)) => line?,
            None => return Err(malformed(table_name, 1, "missing header")),
        };
        let header = Header::new(self.parse_line(&header_line))
            .map_err(|dup| malformed(table_name, 1, &format!("duplicate column {}", dup)))?;

        let mut rows = Vec::new();
        for (line_num, line_result) in lines {
            let line = line_result?;
            // A blank line is only a row when the table has a single column.
            if line.is_empty() && header.column_count() != 1 {
                continue;
            }
            let values = self.parse_line(&line);
            if values.len() != header.column_count() {
                return Err(malformed(
                    table_name,
                    line_num + 1,
                    &format!(
                        "expected {} cells, found {}",
                        header.column_count(),
                        values.len()
                    ),
                ));
            }
            rows.push(Row::new(values));
        }

        Ok(Table::with_rows(table_name, header, rows))
    }

    pub fn parse_line(&self, line: &str) -> Vec<String> {
        line.split(self.delimiter).map(str::to_string).collect()
    }

    pub fn format_row<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(cell.as_ref());
        }
        line
    }

    pub fn write_row<W: Write, S: AsRef<str>>(&self, writer: &mut W, cells: &[S]) -> Result<()> {
        writeln!(writer, "{}", self.format_row(cells))?;
        Ok(())
    }

    /// Checks that `value` can be stored without changing the row's arity.
    pub fn check_value(&self, value: &str) -> Result<()> {
        if value.contains(self.delimiter) || value.contains('\n') || value.contains('\r') {
            return Err(QueryError::InvalidValue(format!(
                "{:?} contains the delimiter or a line break",
                value
            )));
        }
        Ok(())
    }
}

fn malformed(table: &str, line: usize, message: &str) -> QueryError {
    QueryError::Malformed {
        table: table.to_string(),
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_simple_table() {
        let data = "id,name,age\n1,Alice,30\n2,Bob,25\n";
        let table = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "test")
            .unwrap();

        assert_eq!(table.name, "test");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.header.column_count(), 3);
        assert_eq!(table.rows[1].values, vec!["2", "Bob", "25"]);
    }

    #[test]
    fn test_header_only() {
        let data = "a,b";
        let table = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "t")
            .unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.header.columns(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_cells_survive() {
        let data = "a,b\n1,\n,2\n";
        let table = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "t")
            .unwrap();
        assert_eq!(table.rows[0].values, vec!["1", ""]);
        assert_eq!(table.rows[1].values, vec!["", "2"]);
    }

    #[test]
    fn test_blank_line_in_single_column_table() {
        let data = "a\nx\n\ny\n";
        let table = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "t")
            .unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1].values, vec![""]);
    }

    #[test]
    fn test_arity_mismatch_is_malformed() {
        let data = "a,b\n1,2\n3\n";
        let err = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "t")
            .unwrap_err();
        assert!(matches!(err, QueryError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let data = "a,a\n";
        let err = CsvFormat::new()
            .read_from_reader(BufReader::new(Cursor::new(data)), "t")
            .unwrap_err();
        assert!(matches!(err, QueryError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let format = CsvFormat::new().with_delimiter(';');
        let table = format
            .read_from_reader(BufReader::new(Cursor::new("a;b;c\n1;2;3\n")), "t")
            .unwrap();
        assert_eq!(table.header.column_count(), 3);
        assert_eq!(format.format_row(&table.rows[0].values), "1;2;3");
    }

    #[test]
    fn test_check_value() {
        let format = CsvFormat::new();
        assert!(format.check_value("plain").is_ok());
        assert!(matches!(
            format.check_value("a,b"),
            Err(QueryError::InvalidValue(_))
        ));
        assert!(format.check_value("line\nbreak").is_err());
    }
}
