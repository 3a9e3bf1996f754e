// src/snapshot.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{MalformedInput, Omission, SnapshotError};
use crate::fetch::Fetcher;
use crate::labels::LabelDictionary;
use crate::raw::{RawTree, Record};
use crate::reshape::{news, Reshaped, Reshaper};
use crate::table::{Table, TableKind};

const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Every table built from one fetch. Immutable; the next fetch builds a new one.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    national: Table,
    provincial: Table,
    city: Table,
    international: Table,
    update_time: String,
    news: Vec<Record>,
    omissions: Vec<Omission>,
    skipped_articles: usize,
}

impl Snapshot {
    /// Reshape an already-parsed payload.
    #[instrument(level = "debug", skip_all)]
    pub fn from_raw(raw: &RawTree, labels: &LabelDictionary) -> Result<Self, MalformedInput> {
        let reshaper = Reshaper::new(labels);
        let mut omissions = Vec::new();
        let mut take = |built: Reshaped| {
            omissions.extend(built.omissions);
            built.table
        };

        let national = take(reshaper.national(raw)?);
        let provincial = take(reshaper.provincial(raw)?);
        let city = take(reshaper.city(raw)?);
        let international = take(reshaper.international(raw)?);
        let update_time = reshaper.update_time(raw)?.to_string();
        let (news, skipped_articles) = news(raw);

        Ok(Self {
            national,
            provincial,
            city,
            international,
            update_time,
            news,
            omissions,
            skipped_articles,
        })
    }

    pub fn national(&self) -> &Table {
        &self.national
    }

    pub fn provincial(&self) -> &Table {
        &self.provincial
    }

    pub fn city(&self) -> &Table {
        &self.city
    }

    pub fn international(&self) -> &Table {
        &self.international
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::National => &self.national,
            TableKind::Provincial => &self.provincial,
            TableKind::City => &self.city,
            TableKind::International => &self.international,
        }
    }

    /// `lastUpdateTime` exactly as the feed sent it.
    pub fn update_time(&self) -> &str {
        &self.update_time
    }

    /// Best-effort parse of `update_time()`; the feed does not state a zone.
    pub fn update_time_parsed(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.update_time.trim(), UPDATE_TIME_FORMAT).ok()
    }

    pub fn news(&self) -> &[Record] {
        &self.news
    }

    /// `articleList` entries dropped for not being objects.
    pub fn skipped_articles(&self) -> usize {
        self.skipped_articles
    }

    pub fn omissions(&self) -> &[Omission] {
        &self.omissions
    }

    pub fn omission_count(&self) -> usize {
        self.omissions.len()
    }
}

/// Fetch the feed and reshape it.
#[instrument(level = "info", skip_all, fields(endpoint = %config.fetch.endpoint))]
pub async fn snapshot(config: &Config) -> Result<Snapshot, SnapshotError> {
    let raw = Fetcher::new(&config.fetch)?.fetch_raw().await?;
    let snap = Snapshot::from_raw(&raw, config.labels.dictionary())?;
    info!(
        update_time = %snap.update_time(),
        provinces = snap.provincial().regions().len(),
        countries = snap.international().regions().len(),
        omitted = snap.omission_count(),
        "snapshot built"
    );
    Ok(snap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelSet;
    use crate::fetch::unwrap_envelope;
    use crate::table::{Dimension, RegionKey};
    use crate::testing::{init_test_logging, serve, FIXTURE};
    use serde_json::{json, Value};

    fn fixture_snapshot(labels: &LabelDictionary) -> Snapshot {
        let raw = unwrap_envelope(FIXTURE).unwrap();
        Snapshot::from_raw(&raw, labels).unwrap()
    }

    #[test]
    fn fixture_row_counts() {
        init_test_logging();
        let snap = fixture_snapshot(LabelDictionary::english());

        assert_eq!(snap.national().len(), 2);
        assert_eq!(snap.provincial().len(), 6);
        // 5 cities, 地区待确认 has no `total`
        assert_eq!(snap.city().len(), 9);
        assert_eq!(snap.international().len(), 6);
        assert_eq!(snap.omission_count(), 1);
        assert_eq!(snap.omissions()[0].city.as_deref(), Some("地区待确认"));
        assert_eq!(snap.news().len(), 2);
        assert_eq!(snap.skipped_articles(), 0);
    }

    #[test]
    fn every_table_orders_new_before_cumulative() {
        let snap = fixture_snapshot(LabelDictionary::english());
        for kind in TableKind::ALL {
            let table = snap.table(kind);
            let mut rows = table.rows().iter().peekable();
            while let Some(row) = rows.next() {
                if row.key.dimension == Dimension::New {
                    if let Some(next) = rows.peek() {
                        if next.key.region == row.key.region && next.key.city == row.key.city {
                            assert_eq!(next.key.dimension, Dimension::Cumulative);
                        }
                    }
                } else {
                    // a cumulative row never precedes the same node's new row
                    assert!(rows.peek().map_or(true, |next| {
                        next.key.region != row.key.region || next.key.city != row.key.city
                    }));
                }
            }
        }
    }

    #[test]
    fn international_keys_exclude_china() {
        let raw = unwrap_envelope(FIXTURE).unwrap();
        let snap = Snapshot::from_raw(&raw, LabelDictionary::english()).unwrap();
        assert_eq!(
            snap.international().regions().len(),
            raw.area_tree.as_ref().and_then(Value::as_array).unwrap().len() - 1
        );
        assert_eq!(snap.international().regions(), vec!["日本", "泰国", "新加坡"]);
    }

    #[test]
    fn chinese_labels_name_columns_and_dimensions() {
        let snap = fixture_snapshot(LabelDictionary::chinese());
        let national = snap.national();
        assert_eq!(national.key_columns(), &["国家", "累计/新增"]);
        assert_eq!(
            national.value(&RegionKey::new("全国", Dimension::Cumulative), "确诊"),
            Some(&json!(24363))
        );
        assert_eq!(national.dimension_label(Dimension::New), "新增");
    }

    #[test]
    fn serialized_output_is_stable() {
        let a = serde_json::to_string(&fixture_snapshot(LabelDictionary::english())).unwrap();
        let b = serde_json::to_string(&fixture_snapshot(LabelDictionary::english())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn update_time_is_kept_verbatim_and_parses() {
        let snap = fixture_snapshot(LabelDictionary::english());
        assert_eq!(snap.update_time(), "2020-02-05 09:52:25");
        let parsed = snap.update_time_parsed().unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "09:52");
    }

    #[tokio::test]
    async fn snapshot_fetches_and_reshapes() {
        init_test_logging();
        let endpoint = serve(vec![(200, FIXTURE.to_string())]).await;
        let mut config = Config::default();
        config.fetch.endpoint = endpoint;
        config.labels = LabelSet::English;

        let snap = snapshot(&config).await.unwrap();
        assert_eq!(
            snap.provincial()
                .value(&RegionKey::new("湖北", Dimension::New), "confirmed"),
            Some(&json!(2345))
        );
        assert_eq!(
            snap.city().value(
                &RegionKey::city("湖北", "武汉", Dimension::Cumulative),
                "dead"
            ),
            Some(&json!(362))
        );
    }

    #[tokio::test]
    async fn snapshot_without_area_tree_is_malformed() {
        let inner = json!({
            "lastUpdateTime": "2020-02-05 09:52:25",
            "chinaTotal": {"confirm": 1},
            "chinaAdd": {"confirm": 1}
        });
        let body = format!("7({})", json!({"ret": 0, "data": inner.to_string()}));
        let endpoint = serve(vec![(200, body)]).await;
        let mut config = Config::default();
        config.fetch.endpoint = endpoint;

        match snapshot(&config).await {
            Err(SnapshotError::Malformed(err)) => assert_eq!(
                err,
                MalformedInput::missing(TableKind::Provincial, "areaTree")
            ),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
