//! Rendering of statement results for the non-interactive mode.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sql::QueryOutput;
use crate::storage::Record;

/// Renders one result. Only record sets depend on the format; every other output is its
/// display line.
pub fn render(output: &QueryOutput, format: OutputFormat) -> Result<String> {
    let QueryOutput::Records(records) = output else {
        return Ok(output.to_string());
    };

    Ok(match format {
        OutputFormat::Table => render_table(records),
        OutputFormat::Csv => render_csv(records),
        OutputFormat::Json => serde_json::to_string(records)?,
    })
}

/// Padded columns with a separator line and a row count footer.
pub fn render_table(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return "(0 rows)".to_string();
    };

    let columns: Vec<&str> = first.columns().collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let max_value_width = records
                .iter()
                .filter_map(|r| r.values().nth(i))
                .map(|v| v.chars().count())
                .max()
                .unwrap_or(0);
            col.chars().count().max(max_value_width)
        })
        .collect();

    let mut lines = Vec::with_capacity(records.len() + 3);
    lines.push(pad(columns.iter().copied(), &widths));
    lines.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for record in records {
        lines.push(pad(record.values(), &widths));
    }
    lines.push(format!("({} rows)", records.len()));
    lines.join("\n")
}

fn pad<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{:width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Header line then one line per record.
pub fn render_csv(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let mut lines = vec![first.columns().map(quote).collect::<Vec<_>>().join(",")];
    for record in records {
        lines.push(record.values().map(quote).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn quote(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::RowAction;

    fn sample() -> Vec<Record> {
        vec![
            [("id", "1"), ("name", "Alice")].into_iter().collect(),
            [("id", "22"), ("name", "Bo, Jr")].into_iter().collect(),
        ]
    }

    #[test]
    fn test_render_table() {
        let out = render_table(&sample());
        assert_eq!(
            out,
            "id | name\n---+-------\n1  | Alice\n22 | Bo, Jr\n(2 rows)"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_table(&[]), "(0 rows)");
        assert_eq!(render_csv(&[]), "");
        let out = render(&QueryOutput::Records(vec![]), OutputFormat::Json).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_render_csv_quotes() {
        assert_eq!(render_csv(&sample()), "id,name\n1,Alice\n22,\"Bo, Jr\"");
    }

    #[test]
    fn test_render_json_keeps_column_order() {
        let records: Vec<Record> = vec![[("z", "1"), ("a", "x\"y")].into_iter().collect()];
        let out = render(&QueryOutput::Records(records), OutputFormat::Json).unwrap();
        assert_eq!(out, r#"[{"z":"1","a":"x\"y"}]"#);
    }

    #[test]
    fn test_non_record_outputs() {
        let count = QueryOutput::RowCount {
            count: 3,
            action: RowAction::Deleted,
        };
        assert_eq!(render(&count, OutputFormat::Json).unwrap(), "3 records deleted");
        let tables = QueryOutput::Tables(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(render(&tables, OutputFormat::Table).unwrap(), "a\nb");
    }
}
