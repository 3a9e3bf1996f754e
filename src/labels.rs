// src/labels.rs

use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use crate::table::{Dimension, TableKind};

/// Fixed renaming table: raw feed identifiers → display labels, plus the
/// labels used for key columns and dimensions.
///
/// Field entries are ordered; that order is the column order of every table
/// built with this dictionary. Identifiers without an entry pass through
/// under their raw name and sort after the mapped ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDictionary {
    fields: Vec<(&'static str, &'static str)>,
    nation: &'static str,
    new: &'static str,
    cumulative: &'static str,
    nation_column: &'static str,
    province_column: &'static str,
    city_column: &'static str,
    country_column: &'static str,
    dimension_column: &'static str,
}

static ENGLISH: Lazy<LabelDictionary> = Lazy::new(|| LabelDictionary {
    fields: vec![
        ("confirm", "confirmed"),
        ("suspect", "suspected"),
        ("dead", "dead"),
        ("heal", "healed"),
        ("nowConfirm", "current_confirmed"),
        ("nowSevere", "current_severe"),
        ("importedCase", "imported"),
        ("noInfect", "asymptomatic"),
        ("date", "date"),
        ("isUpdated", "updated"),
        ("hubei", "hubei"),
        ("country", "nationwide"),
        ("notHubei", "outside_hubei"),
        ("deadRate", "death_rate"),
        ("healRate", "heal_rate"),
        ("hubeiDead", "hubei_dead"),
        ("hubeiConfirm", "hubei_confirmed"),
        ("countryDead", "nationwide_dead"),
        ("countryConfirm", "nationwide_confirmed"),
        ("hubeiRate", "hubei_rate"),
        ("notHubeiRate", "outside_hubei_rate"),
        ("countryRate", "nationwide_rate"),
        ("yesterday", "yesterday"),
        ("before", "day_before"),
        ("addRate", "increase_rate"),
        ("name", "name"),
    ],
    nation: "China",
    new: "new",
    cumulative: "cumulative",
    nation_column: "nation",
    province_column: "province",
    city_column: "city",
    country_column: "country",
    dimension_column: "dimension",
});

static CHINESE: Lazy<LabelDictionary> = Lazy::new(|| LabelDictionary {
    fields: vec![
        ("confirm", "确诊"),
        ("suspect", "疑似"),
        ("dead", "病亡"),
        ("heal", "治愈"),
        ("nowConfirm", "现有确诊"),
        ("nowSevere", "现有重症"),
        ("importedCase", "境外输入"),
        ("noInfect", "无症状感染"),
        ("date", "日期"),
        ("isUpdated", "数据已更新"),
        ("hubei", "湖北"),
        ("country", "全国"),
        ("notHubei", "非湖北"),
        ("deadRate", "病亡率"),
        ("healRate", "治愈率"),
        ("hubeiDead", "湖北病亡"),
        ("hubeiConfirm", "湖北确诊"),
        ("countryDead", "全国病亡"),
        ("countryConfirm", "全国确诊"),
        ("hubeiRate", "湖北比率"),
        ("notHubeiRate", "非湖北比率"),
        ("countryRate", "全国比率"),
        ("yesterday", "昨日"),
        ("before", "前日"),
        ("addRate", "增加率"),
        ("name", "名称"),
    ],
    nation: "全国",
    new: "新增",
    cumulative: "累计",
    nation_column: "国家",
    province_column: "省/直辖市/自治区",
    city_column: "行政区",
    country_column: "国家",
    dimension_column: "累计/新增",
});

impl LabelDictionary {
    pub fn english() -> &'static LabelDictionary {
        &ENGLISH
    }

    pub fn chinese() -> &'static LabelDictionary {
        &CHINESE
    }

    /// Display label for a raw field, or the raw name when unmapped.
    pub fn translate<'a>(&self, raw: &'a str) -> &'a str {
        self.fields
            .iter()
            .find(|(from, _)| *from == raw)
            .map(|(_, to)| *to)
            .unwrap_or(raw)
    }

    pub fn is_mapped(&self, raw: &str) -> bool {
        self.fields.iter().any(|(from, _)| *from == raw)
    }

    /// Order a set of raw field names for use as table columns:
    /// mapped fields in dictionary order, then unmapped ones lexicographically.
    pub fn column_order<'a, I>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: BTreeSet<&str> = raw.into_iter().collect();
        let mut out: Vec<String> = self
            .fields
            .iter()
            .filter(|(from, _)| present.contains(from))
            .map(|(from, _)| from.to_string())
            .collect();
        out.extend(
            present
                .into_iter()
                .filter(|name| !self.is_mapped(name))
                .map(str::to_string),
        );
        out
    }

    /// Region name used for the national table's single region.
    pub fn nation(&self) -> &'static str {
        self.nation
    }

    pub fn dimension(&self, dimension: Dimension) -> &'static str {
        match dimension {
            Dimension::New => self.new,
            Dimension::Cumulative => self.cumulative,
        }
    }

    /// Names of the key columns of a table, outermost first.
    pub fn key_columns(&self, kind: TableKind) -> Vec<String> {
        let mut names = match kind {
            TableKind::National => vec![self.nation_column],
            TableKind::Provincial => vec![self.province_column],
            TableKind::City => vec![self.province_column, self.city_column],
            TableKind::International => vec![self.country_column],
        };
        names.push(self.dimension_column);
        names.into_iter().map(str::to_string).collect()
    }
}
