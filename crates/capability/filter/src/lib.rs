//! 记录过滤：按资产白名单（及可选过滤规则）挑选本连接器负责发送的记录。

use domain::Record;
use std::collections::BTreeSet;

/// 过滤错误。
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unsupported filter rule: {0}")]
    UnsupportedRule(String),
}

/// 资产白名单。空白名单放行全部记录。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetAllowList {
    assets: BTreeSet<String>,
}

impl AssetAllowList {
    /// 解析逗号分隔的资产列表；条目去除首尾空白，空条目忽略。
    pub fn parse(asset_list: &str) -> Self {
        let assets = asset_list
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        Self { assets }
    }

    pub fn is_allow_all(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn allows(&self, asset_code: &str) -> bool {
        self.is_allow_all() || self.assets.contains(asset_code)
    }
}

/// 过滤规则（JQ 语法）。目前仅支持恒等规则 `.` / `.[]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRule {
    Identity,
}

impl FilterRule {
    pub fn parse(rule: &str) -> Result<Self, FilterError> {
        match rule.trim() {
            "." | ".[]" => Ok(FilterRule::Identity),
            other => Err(FilterError::UnsupportedRule(other.to_string())),
        }
    }

    fn keeps(&self, _record: &Record) -> bool {
        match self {
            FilterRule::Identity => true,
        }
    }
}

/// 按白名单挑选记录：保持输入顺序，不去重，不修改输入。
pub fn filter<'a>(records: &'a [Record], allow_list: &AssetAllowList) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| allow_list.allows(&record.asset_code))
        .collect()
}

/// 白名单 + 可选规则的组合过滤器。
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    allow_list: AssetAllowList,
    rule: Option<FilterRule>,
}

impl RecordFilter {
    /// 由配置构造：`apply_filter` 为 false 时忽略规则。
    pub fn from_settings(
        asset_list: &str,
        apply_filter: bool,
        filter_rule: &str,
    ) -> Result<Self, FilterError> {
        let rule = if apply_filter {
            Some(FilterRule::parse(filter_rule)?)
        } else {
            None
        };
        Ok(Self {
            allow_list: AssetAllowList::parse(asset_list),
            rule,
        })
    }

    pub fn allow_list(&self) -> &AssetAllowList {
        &self.allow_list
    }

    pub fn select<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut selected = filter(records, &self.allow_list);
        if let Some(rule) = &self.rule {
            selected.retain(|record| rule.keeps(record));
        }
        selected
    }
}
