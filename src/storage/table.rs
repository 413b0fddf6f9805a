use std::collections::HashMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered, unique column names of a table file.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
}

impl Header {
    /// Builds a header, returning the first repeated name if the columns are not unique.
    pub fn new(columns: Vec<String>) -> Result<Self, String> {
        let mut column_index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if column_index.insert(name.clone(), i).is_some() {
                return Err(name.clone());
            }
        }
        Ok(Self {
            columns,
            column_index,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<String>,
}

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// A row as wide as `header` with every cell empty.
    pub fn empty(header: &Header) -> Self {
        Self {
            values: vec![String::new(); header.column_count()],
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(cell) = self.values.get_mut(index) {
            *cell = value.into();
        }
    }
}

/// A table file loaded fully into memory.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub header: Header,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn with_rows(name: impl Into<String>, header: Header, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

/// One projected result row: column/value pairs in projection order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (column, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", column, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Header {
        Header::new(cols.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_header_column_index() {
        let header = header(&["id", "name"]);
        assert_eq!(header.column_index("id"), Some(0));
        assert_eq!(header.column_index("name"), Some(1));
        assert_eq!(header.column_index("ID"), None);
        assert_eq!(header.column_count(), 2);
    }

    #[test]
    fn test_header_rejects_duplicates() {
        let err = Header::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert_eq!(err, "a");
    }

    #[test]
    fn test_empty_row_matches_header_width() {
        let header = header(&["a", "b", "c"]);
        let mut row = Row::empty(&header);
        row.set(1, "x");
        assert_eq!(row.values, vec!["", "x", ""]);
        assert_eq!(row.get(3), None);
    }

    #[test]
    fn test_record_keeps_projection_order() {
        let record: Record = vec![("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(record.get("a"), Some("1"));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"b":"2","a":"1"}"#);
    }
}
