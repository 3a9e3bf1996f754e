// src/table/arrow.rs

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde_json::Value;
use std::sync::Arc;

use super::Table;

/// Pick an Arrow type for a column from its non-null cells.
///
/// - all integers within i64  → Int64
/// - other numbers            → Float64
/// - all booleans             → Boolean
/// - anything else / no cells → Utf8
pub fn infer_arrow_type<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut seen: Option<DataType> = None;
    for cell in cells {
        let ty = match cell {
            Value::Null => continue,
            Value::Bool(_) => DataType::Boolean,
            // u64 above i64::MAX has no Int64 form
            Value::Number(n) if n.as_i64().is_some() => DataType::Int64,
            Value::Number(_) => DataType::Float64,
            _ => return DataType::Utf8,
        };
        seen = Some(match (seen, ty) {
            (None, ty) => ty,
            (Some(prev), ty) if prev == ty => prev,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => return DataType::Utf8,
        });
    }
    seen.unwrap_or(DataType::Utf8)
}

fn build_column<'a, I>(ty: &DataType, cells: I) -> ArrayRef
where
    I: IntoIterator<Item = &'a Value>,
{
    match ty {
        DataType::Int64 => {
            let mut b = Int64Builder::new();
            for cell in cells {
                b.append_option(cell.as_i64());
            }
            Arc::new(b.finish())
        }
        DataType::Float64 => {
            let mut b = Float64Builder::new();
            for cell in cells {
                b.append_option(cell.as_f64());
            }
            Arc::new(b.finish())
        }
        DataType::Boolean => {
            let mut b = BooleanBuilder::new();
            for cell in cells {
                b.append_option(cell.as_bool());
            }
            Arc::new(b.finish())
        }
        _ => {
            let mut b = StringBuilder::new();
            for cell in cells {
                match cell {
                    Value::Null => b.append_null(),
                    Value::String(s) => b.append_value(s),
                    other => b.append_value(other.to_string()),
                }
            }
            Arc::new(b.finish())
        }
    }
}

/// Convert a table into a single Arrow batch: Utf8 key columns followed by
/// one typed, nullable column per value column.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch, ArrowError> {
    let mut fields = Vec::with_capacity(table.key_columns().len() + table.columns().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    let depth = table.key_columns().len();
    for (pos, name) in table.key_columns().iter().enumerate() {
        let mut b = StringBuilder::new();
        for row in table.rows() {
            if pos + 1 == depth {
                b.append_value(table.dimension_label(row.key.dimension));
            } else if pos == 0 {
                b.append_value(&row.key.region);
            } else {
                b.append_value(row.key.city.as_deref().unwrap_or_default());
            }
        }
        fields.push(Field::new(name, DataType::Utf8, false));
        arrays.push(Arc::new(b.finish()));
    }

    for (idx, name) in table.columns().iter().enumerate() {
        let cells = table.rows().iter().map(|row| &row.cells[idx]);
        let ty = infer_arrow_type(cells.clone());
        arrays.push(build_column(&ty, cells));
        fields.push(Field::new(name, ty, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

/// Render a table as an ASCII grid.
pub fn pretty_table(table: &Table) -> Result<String, ArrowError> {
    let batch = to_record_batch(table)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}
