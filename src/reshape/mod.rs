// src/reshape/mod.rs

pub mod news;
mod traverse;

pub use news::news;
pub use traverse::Reshaped;

use serde_json::Value;
use tracing::instrument;

use crate::error::MalformedInput;
use crate::labels::LabelDictionary;
use crate::raw::{as_record, AreaNode, RawTree, Record};
use crate::table::{Dimension, TableKind};
use traverse::{flatten, KeyPrefix};

/// Turns a `RawTree` into flat tables, labelling columns with one dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Reshaper<'a> {
    labels: &'a LabelDictionary,
}

fn node_record<'r>(node: AreaNode<'r>, dimension: Dimension) -> Result<&'r Record, &'static str> {
    let record = match dimension {
        Dimension::New => node.today(),
        Dimension::Cumulative => node.total(),
    };
    record.ok_or(dimension.node_field())
}

fn national_record(raw: &RawTree, dimension: Dimension) -> Result<&Record, &'static str> {
    let value = match dimension {
        Dimension::New => &raw.china_add,
        Dimension::Cumulative => &raw.china_total,
    };
    as_record(value).ok_or(dimension.national_field())
}

fn node_name<'r>(
    node: AreaNode<'r>,
    table: TableKind,
    path: impl FnOnce() -> String,
) -> Result<&'r str, MalformedInput> {
    match node.name() {
        Some(Value::String(name)) => Ok(name),
        Some(other) => Err(MalformedInput::invalid(
            table,
            format!("{}.name", path()),
            "a string",
            other,
        )),
        None => Err(MalformedInput::missing(table, format!("{}.name", path()))),
    }
}

/// `value` as a list of area nodes, each checked to be an object.
fn nodes<'r>(
    value: Option<&'r Value>,
    table: TableKind,
    path: &str,
) -> Result<Vec<AreaNode<'r>>, MalformedInput> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(MalformedInput::invalid(table, path, "an array", other)),
        None => return Err(MalformedInput::missing(table, path)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            AreaNode::from_value(item).ok_or_else(|| {
                MalformedInput::invalid(table, format!("{}[{}]", path, i), "an object", item)
            })
        })
        .collect()
}

/// `areaTree`, validated: present and non-empty.
fn area_tree(raw: &RawTree, table: TableKind) -> Result<Vec<AreaNode<'_>>, MalformedInput> {
    let tree = nodes(raw.area_tree.as_ref(), table, "areaTree")?;
    if tree.is_empty() {
        return Err(MalformedInput::missing(table, "areaTree[0]"));
    }
    Ok(tree)
}

/// Children of the China node (`areaTree[0].children`).
fn provinces(raw: &RawTree, table: TableKind) -> Result<Vec<AreaNode<'_>>, MalformedInput> {
    let china = area_tree(raw, table)?[0];
    nodes(china.children(), table, "areaTree[0].children")
}

impl<'a> Reshaper<'a> {
    pub fn new(labels: &'a LabelDictionary) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &'a LabelDictionary {
        self.labels
    }

    /// Nationwide table from `chinaAdd` / `chinaTotal`; both must be records.
    #[instrument(level = "debug", skip_all)]
    pub fn national(&self, raw: &RawTree) -> Result<Reshaped, MalformedInput> {
        for dimension in Dimension::ORDER {
            national_record(raw, dimension)
                .map_err(|missing| MalformedInput::missing(TableKind::National, missing))?;
        }
        let prefix = KeyPrefix {
            region: self.labels.nation(),
            city: None,
        };
        flatten(
            TableKind::National,
            self.labels,
            [(prefix, raw)],
            national_record,
        )
    }

    /// One row per dimension for each province under the China node.
    #[instrument(level = "debug", skip_all)]
    pub fn provincial(&self, raw: &RawTree) -> Result<Reshaped, MalformedInput> {
        let table = TableKind::Provincial;
        let nodes = provinces(raw, table)?
            .into_iter()
            .enumerate()
            .map(|(i, province)| {
                let region = node_name(province, table, || {
                    format!("areaTree[0].children[{}]", i)
                })?;
                Ok::<_, MalformedInput>((KeyPrefix { region, city: None }, province))
            })
            .collect::<Result<Vec<_>, _>>()?;
        flatten(table, self.labels, nodes, node_record)
    }

    /// One row per dimension for each city, keyed under its province.
    /// A province without `children` contributes no rows.
    #[instrument(level = "debug", skip_all)]
    pub fn city(&self, raw: &RawTree) -> Result<Reshaped, MalformedInput> {
        let table = TableKind::City;
        let mut rows = Vec::new();
        for (i, province) in provinces(raw, table)?.into_iter().enumerate() {
            let path = format!("areaTree[0].children[{}]", i);
            let region = node_name(province, table, || path.clone())?;
            let Some(children) = province.children() else {
                continue;
            };
            let cities = nodes(Some(children), table, &format!("{}.children", path))?;
            for (j, city) in cities.into_iter().enumerate() {
                let name = node_name(city, table, || format!("{}.children[{}]", path, j))?;
                rows.push((
                    KeyPrefix {
                        region,
                        city: Some(name),
                    },
                    city,
                ));
            }
        }
        flatten(table, self.labels, rows, node_record)
    }

    /// One row per dimension for every `areaTree` node after the China node.
    #[instrument(level = "debug", skip_all)]
    pub fn international(&self, raw: &RawTree) -> Result<Reshaped, MalformedInput> {
        let table = TableKind::International;
        // the China node must still be well-formed for the feed to be trusted
        provinces(raw, table)?;
        let nodes = area_tree(raw, table)?
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(i, country)| {
                let region = node_name(country, table, || format!("areaTree[{}]", i))?;
                Ok::<_, MalformedInput>((KeyPrefix { region, city: None }, country))
            })
            .collect::<Result<Vec<_>, _>>()?;
        flatten(table, self.labels, nodes, node_record)
    }

    /// `lastUpdateTime`, verbatim.
    pub fn update_time<'r>(&self, raw: &'r RawTree) -> Result<&'r str, MalformedInput> {
        match &raw.last_update_time {
            Some(Value::String(time)) => Ok(time),
            Some(other) => Err(MalformedInput::invalid(
                TableKind::National,
                "lastUpdateTime",
                "a string",
                other,
            )),
            None => Err(MalformedInput::missing(TableKind::National, "lastUpdateTime")),
        }
    }
}
