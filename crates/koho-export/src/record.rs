//! One export row viewed through its table's header.

use serde_json::{Map, Value};

use crate::table::ExportTable;

/// A data row with typed column accessors.
///
/// Accessors return `None` both for absent columns and for `null` cells.
#[derive(Debug, Clone, Copy)]
pub struct ExportRecord<'a> {
    table: &'a ExportTable,
    row: &'a [Value],
}

impl<'a> ExportRecord<'a> {
    pub(crate) fn new(table: &'a ExportTable, row: &'a [Value]) -> Self {
        Self { table, row }
    }

    /// Raw cell, `None` if the column does not exist.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.column(column).and_then(|index| self.row.get(index))
    }

    fn present(&self, column: &str) -> Option<&'a Value> {
        self.get(column).filter(|value| !value.is_null())
    }

    /// Cell as text. Numbers and booleans are formatted.
    pub fn string(&self, column: &str) -> Option<String> {
        match self.present(column)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Cell as an unsigned integer; numeric strings are parsed.
    pub fn u64(&self, column: &str) -> Option<u64> {
        match self.present(column)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Cell as a float; numeric strings are parsed.
    pub fn f64(&self, column: &str) -> Option<f64> {
        match self.present(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Cell as a boolean. Accepts `true`/`false`, `1`/`0` and their string forms.
    pub fn bool(&self, column: &str) -> Option<bool> {
        match self.present(column)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim() {
                "true" | "t" | "1" => Some(true),
                "false" | "f" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Truthiness of a cell: absent, `null`, `false`, `0` and `""` are false.
    pub fn flag(&self, column: &str) -> bool {
        match self.present(column) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Cell normalised for key comparison, so `1` and `"1"` match.
    pub fn key(&self, column: &str) -> Option<String> {
        match self.present(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// All cells as a `column name -> value` object.
    pub fn to_map(&self) -> Map<String, Value> {
        self.table
            .header()
            .iter()
            .zip(self.row)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
