//! Two-table foreign-key join.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::record::ExportRecord;
use crate::table::ExportTable;

/// A primary row with the detail rows that reference it.
#[derive(Debug, Clone)]
pub struct JoinedRecord<'a> {
    pub record: ExportRecord<'a>,
    /// Matching detail rows in table order; empty when none match.
    pub details: Vec<ExportRecord<'a>>,
}

impl JoinedRecord<'_> {
    /// The primary row as an object with its details nested under `details_field`.
    ///
    /// `foreign_key` is left out of each nested detail object.
    pub fn to_map(&self, details_field: &str, foreign_key: &str) -> Map<String, Value> {
        let details = self
            .details
            .iter()
            .map(|detail| {
                let mut map = detail.to_map();
                map.remove(foreign_key);
                Value::Object(map)
            })
            .collect();

        let mut map = self.record.to_map();
        map.insert(details_field.to_string(), Value::Array(details));
        map
    }
}

/// Group rows by the normalised value of `column`. Rows without a value are skipped.
pub fn group_by<'a>(
    table: &'a ExportTable,
    column: &str,
) -> Result<HashMap<String, Vec<ExportRecord<'a>>>> {
    table.require_columns(&[column])?;

    let mut groups: HashMap<String, Vec<ExportRecord<'a>>> = HashMap::new();
    for record in table.records() {
        match record.key(column) {
            Some(key) => groups.entry(key).or_default().push(record),
            None => debug!(column, "Skipping detail row without key"),
        }
    }
    Ok(groups)
}

/// Attach to every primary row the detail rows whose `foreign_key` equals
/// the row's `primary_key`.
///
/// With `detail` set to `None` the join is skipped and every primary row
/// gets an empty detail list. Detail rows that match no primary row are
/// dropped.
pub fn join<'a>(
    primary: &'a ExportTable,
    primary_key: &str,
    detail: Option<&'a ExportTable>,
    foreign_key: &str,
) -> Result<Vec<JoinedRecord<'a>>> {
    let Some(detail) = detail else {
        return Ok(primary
            .records()
            .map(|record| JoinedRecord {
                record,
                details: Vec::new(),
            })
            .collect());
    };

    primary.require_columns(&[primary_key])?;
    let groups = group_by(detail, foreign_key)?;
    let mut matched = HashSet::new();

    let joined: Vec<JoinedRecord<'a>> = primary
        .records()
        .map(|record| {
            let details = match record.key(primary_key) {
                Some(key) => {
                    let details = groups.get(&key).cloned().unwrap_or_default();
                    matched.insert(key);
                    details
                }
                None => Vec::new(),
            };
            JoinedRecord { record, details }
        })
        .collect();

    let orphans: usize = groups
        .iter()
        .filter(|(key, _)| !matched.contains(*key))
        .map(|(_, rows)| rows.len())
        .sum();
    if orphans > 0 {
        debug!(
            orphans,
            foreign_key,
            "Dropping detail rows without a matching primary row"
        );
    }

    Ok(joined)
}
