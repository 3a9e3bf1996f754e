// src/report.rs

use arrow::error::ArrowError;
use serde_json::{json, Value};
use std::fmt::Write;

use crate::snapshot::Snapshot;
use crate::table::{pretty_table, TableKind};

/// Every table as a grid, then update time, article count and omissions.
pub fn render_text(snap: &Snapshot) -> Result<String, ArrowError> {
    let mut out = String::new();
    for kind in TableKind::ALL {
        let _ = writeln!(out, "=== {} ===", kind);
        let _ = writeln!(out, "{}", pretty_table(snap.table(kind))?);
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "Last update: {}", snap.update_time());
    let _ = writeln!(out, "Articles:    {}", snap.news().len());
    let _ = writeln!(out, "Omitted:     {}", snap.omission_count());
    for omission in snap.omissions() {
        let _ = writeln!(out, "  - {}", omission);
    }
    Ok(out)
}

/// One JSON document with a list of flat records per table.
pub fn render_json(snap: &Snapshot) -> Value {
    json!({
        "update_time": snap.update_time(),
        "national": snap.national().records(),
        "provincial": snap.provincial().records(),
        "city": snap.city().records(),
        "international": snap.international().records(),
        "news": snap.news(),
        "omissions": snap.omissions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::unwrap_envelope;
    use crate::labels::LabelDictionary;
    use crate::testing::FIXTURE;

    fn snap() -> Snapshot {
        let raw = unwrap_envelope(FIXTURE).unwrap();
        Snapshot::from_raw(&raw, LabelDictionary::english()).unwrap()
    }

    #[test]
    fn text_report_covers_all_tables() {
        let text = render_text(&snap()).unwrap();
        for kind in TableKind::ALL {
            assert!(text.contains(&format!("=== {} ===", kind)));
        }
        assert!(text.contains("Last update: 2020-02-05 09:52:25"));
        assert!(text.contains("Omitted:     1"));
        assert!(text.contains("地区待确认"));
    }

    #[test]
    fn json_report_has_one_record_per_row() {
        let snap = snap();
        let doc = render_json(&snap);
        assert_eq!(doc["city"].as_array().map(Vec::len), Some(snap.city().len()));
        assert_eq!(doc["national"][1]["dimension"], json!("cumulative"));
        assert_eq!(doc["national"][1]["confirmed"], json!(24363));
        assert_eq!(doc["omissions"][0]["missing"], json!("total"));
        assert_eq!(doc["news"].as_array().map(Vec::len), Some(2));
    }
}
