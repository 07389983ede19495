//! Header + rows export tables.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::ExportRecord;

/// Where the header row sits in an export payload.
///
/// Export endpoints disagree: most return `[header, row, row, ...]`, the work
/// session export returns `[[header], row, row, ...]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderLayout {
    /// The first element is the header row.
    #[default]
    Flat,
    /// The first element is an array whose first element is the header row.
    Nested,
}

/// An export table: a header row naming the columns and data rows aligned to it.
///
/// Every row has exactly as many cells as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
    columns: HashMap<String, usize>,
}

impl ExportTable {
    /// Build a table, checking every row against the header length.
    pub fn new(header: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(Error::data_format(format!(
                "row {} has {} cells, header has {}",
                index + 1,
                row.len(),
                header.len()
            )));
        }

        // A repeated column name resolves to its last position.
        let columns = header
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();

        Ok(Self {
            header,
            rows,
            columns,
        })
    }

    /// Parse an array-of-arrays export payload.
    pub fn from_value(value: Value, layout: HeaderLayout) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(Error::data_format("export payload is not an array"));
        };
        let mut items = items.into_iter();

        let first = items
            .next()
            .ok_or_else(|| Error::data_format("missing header row"))?;
        let header_value = match layout {
            HeaderLayout::Flat => first,
            HeaderLayout::Nested => match first {
                Value::Array(inner) => inner
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::data_format("missing header row"))?,
                _ => return Err(Error::data_format("header wrapper is not an array")),
            },
        };
        let header = parse_header(header_value)?;

        let rows = items
            .enumerate()
            .map(|(index, item)| match item {
                Value::Array(cells) => Ok(cells),
                _ => Err(Error::data_format(format!("row {} is not an array", index + 1))),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(header, rows)
    }

    /// Parse CSV text with a header line. Every cell becomes a JSON string.
    pub fn from_csv(text: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(Error::data_format("missing header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| Value::String(cell.to_string())).collect());
        }

        Self::new(header, rows)
    }

    /// Column names in order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Fail unless every named column is present.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(Error::data_format(format!("missing column `{missing}`"))),
            None => Ok(()),
        }
    }

    /// Iterate over the data rows.
    pub fn records(&self) -> impl Iterator<Item = ExportRecord<'_>> {
        self.rows.iter().map(move |row| ExportRecord::new(self, row))
    }

    /// Map every row to a `column name -> value` object.
    pub fn to_maps(&self) -> Vec<Map<String, Value>> {
        self.records().map(|record| record.to_map()).collect()
    }
}

fn parse_header(value: Value) -> Result<Vec<String>> {
    let Value::Array(cells) = value else {
        return Err(Error::data_format("header row is not an array"));
    };

    cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| match cell {
            Value::String(name) => Ok(name),
            other => Err(Error::data_format(format!(
                "header cell {index} is not a string: {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_layout() {
        let table = ExportTable::from_value(
            json!([["id", "name"], ["1", "a"], ["2", "b"]]),
            HeaderLayout::Flat,
        )
        .unwrap();

        assert_eq!(table.header(), ["id", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("name"), Some(1));
        assert_eq!(
            table.to_maps(),
            vec![
                json!({"id": "1", "name": "a"}).as_object().unwrap().clone(),
                json!({"id": "2", "name": "b"}).as_object().unwrap().clone(),
            ]
        );
    }

    #[test]
    fn test_nested_layout() {
        let table = ExportTable::from_value(
            json!([[["work_sessions.id", "work_sessions.hours"]], [10, 7.5], [11, 2]]),
            HeaderLayout::Nested,
        )
        .unwrap();

        assert_eq!(table.header(), ["work_sessions.id", "work_sessions.hours"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = ExportTable::from_value(json!([["id"]]), HeaderLayout::Flat).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.header(), ["id"]);
    }

    #[test]
    fn test_missing_header_fails() {
        let err = ExportTable::from_value(json!([]), HeaderLayout::Flat).unwrap_err();
        assert!(err.is_data_format());

        let err = ExportTable::from_value(json!([[]]), HeaderLayout::Nested).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_row_length_mismatch_fails() {
        let err = ExportTable::from_value(json!([["id", "name"], ["1"]]), HeaderLayout::Flat)
            .unwrap_err();
        assert!(err.is_data_format());
        assert!(err.to_string().contains("row 1 has 1 cells"));
    }

    #[test]
    fn test_non_array_shapes_fail() {
        assert!(ExportTable::from_value(json!({"id": 1}), HeaderLayout::Flat)
            .unwrap_err()
            .is_data_format());
        assert!(ExportTable::from_value(json!([["id"], {"id": 1}]), HeaderLayout::Flat)
            .unwrap_err()
            .is_data_format());
        assert!(ExportTable::from_value(json!([[1, "name"]]), HeaderLayout::Flat)
            .unwrap_err()
            .is_data_format());
        assert!(ExportTable::from_value(json!([["id"]]), HeaderLayout::Nested)
            .unwrap_err()
            .is_data_format());
    }

    #[test]
    fn test_duplicate_column_resolves_to_last() {
        let table =
            ExportTable::from_value(json!([["id", "id"], [1, 2]]), HeaderLayout::Flat).unwrap();
        assert_eq!(table.column("id"), Some(1));
    }

    #[test]
    fn test_require_columns() {
        let table = ExportTable::new(vec!["a".into(), "b".into()], vec![]).unwrap();
        assert!(table.require_columns(&["a", "b"]).is_ok());
        let err = table.require_columns(&["a", "c"]).unwrap_err();
        assert!(err.to_string().contains("`c`"));
    }

    #[test]
    fn test_from_csv() {
        let table = ExportTable::from_csv("id;name\n1;Acme Oy\n2;\"Beta; Ltd\"\n", b';').unwrap();

        assert_eq!(table.header(), ["id", "name"]);
        let names: Vec<String> = table.records().filter_map(|r| r.string("name")).collect();
        assert_eq!(names, vec!["Acme Oy", "Beta; Ltd"]);
    }

    #[test]
    fn test_from_csv_uneven_rows_fail() {
        let err = ExportTable::from_csv("id,name\n1\n", b',').unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::Csv(_)));
    }

    #[test]
    fn test_from_csv_empty_fails() {
        assert!(ExportTable::from_csv("", b',').unwrap_err().is_data_format());
    }
}
