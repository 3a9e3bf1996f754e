// src/reshape/traverse.rs

use tracing::{debug, warn};

use crate::error::{MalformedInput, Omission};
use crate::labels::LabelDictionary;
use crate::raw::Record;
use crate::table::{Dimension, RegionKey, Table, TableBuilder, TableKind};

/// Key components a visited node contributes, outermost first.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyPrefix<'r> {
    pub region: &'r str,
    pub city: Option<&'r str>,
}

impl<'r> KeyPrefix<'r> {
    fn key(&self, dimension: Dimension) -> RegionKey {
        RegionKey {
            region: self.region.to_string(),
            city: self.city.map(str::to_string),
            dimension,
        }
    }
}

/// A built table and the rows it had to leave out.
#[derive(Debug, Clone)]
pub struct Reshaped {
    pub table: Table,
    pub omissions: Vec<Omission>,
}

/// Flatten one level of a hierarchy: every visited node yields one row per
/// dimension, in `Dimension::ORDER`.
///
/// `nodes` carries the level's nodes with the key prefix each contributes;
/// `record_of` maps (node, dimension) to the record behind that row, or to
/// the name of the field that is missing. A missing record omits the row.
pub(crate) fn flatten<'r, N, I, F>(
    kind: TableKind,
    labels: &'r LabelDictionary,
    nodes: I,
    record_of: F,
) -> Result<Reshaped, MalformedInput>
where
    N: Copy,
    I: IntoIterator<Item = (KeyPrefix<'r>, N)>,
    F: Fn(N, Dimension) -> Result<&'r Record, &'static str>,
{
    let mut builder = TableBuilder::new(kind, labels);
    let mut omissions = Vec::new();

    for (prefix, node) in nodes {
        for dimension in Dimension::ORDER {
            match record_of(node, dimension) {
                Ok(record) => builder.push(prefix.key(dimension), record)?,
                Err(missing) => {
                    let omission = Omission {
                        table: kind,
                        region: prefix.region.to_string(),
                        city: prefix.city.map(str::to_string),
                        dimension,
                        missing,
                    };
                    warn!(table = %kind, %omission, "row omitted");
                    omissions.push(omission);
                }
            }
        }
    }

    let table = builder.finish();
    debug!(
        table = %kind,
        rows = table.len(),
        columns = table.columns().len(),
        omitted = omissions.len(),
        "flattened"
    );
    Ok(Reshaped { table, omissions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Leaf {
        name: &'static str,
        new: Option<Record>,
        cumulative: Option<Record>,
    }

    fn leaf(name: &'static str, new: Option<Value>, cumulative: Option<Value>) -> Leaf {
        Leaf {
            name,
            new: new.and_then(|v| v.as_object().cloned()),
            cumulative: cumulative.and_then(|v| v.as_object().cloned()),
        }
    }

    fn record_of(leaf: &Leaf, dimension: Dimension) -> Result<&Record, &'static str> {
        match dimension {
            Dimension::New => leaf.new.as_ref().ok_or("new"),
            Dimension::Cumulative => leaf.cumulative.as_ref().ok_or("cumulative"),
        }
    }

    #[test]
    fn emits_new_then_cumulative_per_node() {
        let leaves = vec![
            leaf("a", Some(json!({"confirm": 1})), Some(json!({"confirm": 10}))),
            leaf("b", Some(json!({"confirm": 2})), Some(json!({"confirm": 20}))),
        ];
        let nodes = leaves.iter().map(|l| {
            (
                KeyPrefix {
                    region: l.name,
                    city: None,
                },
                l,
            )
        });
        let out = flatten(
            TableKind::Provincial,
            LabelDictionary::english(),
            nodes,
            record_of,
        )
        .unwrap();

        let keys: Vec<String> = out.table.rows().iter().map(|r| r.key.to_string()).collect();
        assert_eq!(
            keys,
            vec!["(a, new)", "(a, cumulative)", "(b, new)", "(b, cumulative)"]
        );
        assert!(out.omissions.is_empty());
    }

    #[test]
    fn missing_record_omits_exactly_that_row() {
        let leaves = vec![leaf("a", Some(json!({"confirm": 1})), None)];
        let nodes = leaves.iter().map(|l| {
            (
                KeyPrefix {
                    region: "p",
                    city: Some(l.name),
                },
                l,
            )
        });
        let out = flatten(TableKind::City, LabelDictionary::english(), nodes, record_of).unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.omissions.len(), 1);
        let omission = &out.omissions[0];
        assert_eq!(omission.dimension, Dimension::Cumulative);
        assert_eq!(omission.city.as_deref(), Some("a"));
        assert_eq!(omission.missing, "cumulative");
    }
}
