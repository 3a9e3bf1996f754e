// src/table/mod.rs

pub mod arrow;

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::warn;

use crate::error::MalformedInput;
use crate::labels::LabelDictionary;
use crate::raw::Record;

pub use self::arrow::{pretty_table, to_record_batch};

/// Whether a row holds same-day increments or running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    New,
    Cumulative,
}

impl Dimension {
    /// Row order within a node, for every table.
    pub const ORDER: [Dimension; 2] = [Dimension::New, Dimension::Cumulative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::New => "new",
            Dimension::Cumulative => "cumulative",
        }
    }

    /// Field of an `areaTree` node holding this dimension's record.
    pub fn node_field(&self) -> &'static str {
        match self {
            Dimension::New => "today",
            Dimension::Cumulative => "total",
        }
    }

    /// Root field holding this dimension's nationwide record.
    pub fn national_field(&self) -> &'static str {
        match self {
            Dimension::New => "chinaAdd",
            Dimension::Cumulative => "chinaTotal",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    National,
    Provincial,
    City,
    International,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::National,
        TableKind::Provincial,
        TableKind::City,
        TableKind::International,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::National => "national",
            TableKind::Provincial => "provincial",
            TableKind::City => "city",
            TableKind::International => "international",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row identity: (nation | province | country, optional city, dimension).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionKey {
    pub region: String,
    pub city: Option<String>,
    pub dimension: Dimension,
}

impl RegionKey {
    pub fn new(region: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            region: region.into(),
            city: None,
            dimension,
        }
    }

    pub fn city(
        region: impl Into<String>,
        city: impl Into<String>,
        dimension: Dimension,
    ) -> Self {
        Self {
            region: region.into(),
            city: Some(city.into()),
            dimension,
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "({}, {}, {})", self.region, city, self.dimension),
            None => write!(f, "({}, {})", self.region, self.dimension),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub key: RegionKey,
    /// One cell per table column; `Null` where the source record lacks the field.
    pub cells: Vec<Value>,
}

/// A flattened view of one level of the feed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    kind: TableKind,
    key_columns: Vec<String>,
    dimension_labels: [String; 2],
    columns: Vec<String>,
    raw_columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Display names of the key columns, outermost first.
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Display names of the value columns. Unique, and never equal to a key
    /// column name.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Feed field names behind `columns()`, in the same order.
    pub fn raw_columns(&self) -> &[String] {
        &self.raw_columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimension_label(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::New => &self.dimension_labels[0],
            Dimension::Cumulative => &self.dimension_labels[1],
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn get(&self, key: &RegionKey) -> Option<&Row> {
        self.rows.iter().find(|row| &row.key == key)
    }

    /// Cell at (`key`, `column`), by display column name.
    pub fn value(&self, key: &RegionKey, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.get(key).and_then(|row| row.cells.get(idx))
    }

    /// Distinct outermost regions in row order.
    pub fn regions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|row| row.key.region.as_str())
            .filter(|region| seen.insert(*region))
            .collect()
    }

    /// Rows as flat JSON objects keyed by display column name, key columns included.
    pub fn records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut rec = serde_json::Map::new();
                let mut keys = self.key_columns.iter();
                if let Some(name) = keys.next() {
                    rec.insert(name.clone(), Value::from(row.key.region.clone()));
                }
                if let Some(city) = &row.key.city {
                    if let Some(name) = keys.next() {
                        rec.insert(name.clone(), Value::from(city.clone()));
                    }
                }
                if let Some(name) = keys.next() {
                    rec.insert(
                        name.clone(),
                        Value::from(self.dimension_label(row.key.dimension)),
                    );
                }
                for (name, cell) in self.columns.iter().zip(&row.cells) {
                    rec.insert(name.clone(), cell.clone());
                }
                rec
            })
            .collect()
    }
}

/// `label`, or `"<raw> (raw)"` when a key column or an earlier value column
/// already uses that name. Mapped fields come first, so they keep their label.
fn unique_column(taken: &mut HashSet<String>, label: &str, raw: &str) -> String {
    if taken.insert(label.to_string()) {
        return label.to_string();
    }
    let mut column = format!("{} (raw)", raw);
    let mut n = 2;
    while !taken.insert(column.clone()) {
        column = format!("{} (raw {})", raw, n);
        n += 1;
    }
    column
}

/// Accumulates keyed records, then settles the column set once in `finish`.
pub(crate) struct TableBuilder<'d> {
    kind: TableKind,
    labels: &'d LabelDictionary,
    seen: HashSet<RegionKey>,
    rows: Vec<(RegionKey, &'d Record)>,
}

impl<'d> TableBuilder<'d> {
    pub(crate) fn new(kind: TableKind, labels: &'d LabelDictionary) -> Self {
        Self {
            kind,
            labels,
            seen: HashSet::new(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: RegionKey, record: &'d Record) -> Result<(), MalformedInput> {
        if !self.seen.insert(key.clone()) {
            return Err(MalformedInput::DuplicateKey {
                table: self.kind,
                key: key.to_string(),
            });
        }
        self.rows.push((key, record));
        Ok(())
    }

    pub(crate) fn finish(self) -> Table {
        let present: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|(_, record)| record.keys().map(String::as_str))
            .collect();
        let raw_columns = self.labels.column_order(present);
        let key_columns = self.labels.key_columns(self.kind);
        let mut taken: HashSet<String> = key_columns.iter().cloned().collect();
        let columns = raw_columns
            .iter()
            .map(|raw| {
                let label = self.labels.translate(raw);
                let column = unique_column(&mut taken, label, raw);
                if column != label {
                    warn!(
                        table = %self.kind,
                        raw = %raw,
                        column = %column,
                        "column name taken; renamed"
                    );
                }
                column
            })
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|(key, record)| Row {
                key,
                cells: raw_columns
                    .iter()
                    .map(|raw| record.get(raw).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();

        Table {
            kind: self.kind,
            key_columns,
            dimension_labels: [
                self.labels.dimension(Dimension::New).to_string(),
                self.labels.dimension(Dimension::Cumulative).to_string(),
            ],
            columns,
            raw_columns,
            rows,
        }
    }
}
