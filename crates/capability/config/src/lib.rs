//! 连接器配置加载。
//!
//! 配置来源有两种，共用同一套解析与默认值：
//! - 环境变量：`ANYLOG_URL`、`ANYLOG_REST_FORMAT` ……（键名为配置项的大写蛇形）
//! - 宿主配置分类：`{"url": {"value": "..."}, "restFormat": {"value": "post"}, ...}`

use serde_json::Value;
use std::env;
use tracing::info;
pub use wire_contract::RestFormat;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 宿主发送的数据来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Readings,
    Statistics,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Readings => "readings",
            DataSource::Statistics => "statistics",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "readings" => Some(DataSource::Readings),
            "statistics" => Some(DataSource::Statistics),
            _ => None,
        }
    }
}

pub const KEY_URL: &str = "url";
pub const KEY_REST_FORMAT: &str = "restFormat";
pub const KEY_SOURCE: &str = "source";
pub const KEY_VERIFY_SSL: &str = "verifySSL";
pub const KEY_APPLY_FILTER: &str = "applyFilter";
pub const KEY_FILTER_RULE: &str = "filterRule";
pub const KEY_TOPIC_NAME: &str = "topicName";
pub const KEY_ASSET_LIST: &str = "assetList";
pub const KEY_DB_NAME: &str = "dbName";
pub const KEY_CONNECT_TIMEOUT_MS: &str = "connectTimeoutMs";
pub const KEY_REQUEST_TIMEOUT_MS: &str = "requestTimeoutMs";

/// 连接器运行配置（一次发送会话内只读）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// AnyLog REST 地址（IP:Port）。
    pub url: String,
    pub rest_format: RestFormat,
    pub source: DataSource,
    pub verify_ssl: bool,
    pub apply_filter: bool,
    /// JQ 过滤规则，仅在 `apply_filter` 为 true 时生效。
    pub filter_rule: String,
    /// 仅 post 方式使用。
    pub topic_name: String,
    /// 逗号分隔的资产白名单。
    pub asset_list: String,
    pub db_name: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl ConnectorConfig {
    /// 以默认值构造，仅需提供地址。
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rest_format: RestFormat::Post,
            source: DataSource::Readings,
            verify_ssl: false,
            apply_filter: false,
            filter_rule: ".[]".to_string(),
            topic_name: "fledge".to_string(),
            asset_list: String::new(),
            db_name: "fledge".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
        }
    }

    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(env_key(key)).ok())
    }

    /// 从宿主配置分类读取（`value` 优先于 `default`）。
    pub fn from_category(category: &Value) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| category.get(key).and_then(category_value))
    }

    /// 按配置项名（如 `restFormat`）查值构造配置。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = read_optional(&lookup, KEY_URL)
            .ok_or_else(|| ConfigError::Missing(KEY_URL.to_string()))?;
        let mut config = Self::new(url);

        if let Some(value) = read_optional(&lookup, KEY_REST_FORMAT) {
            config.rest_format = RestFormat::parse(&value)
                .ok_or_else(|| ConfigError::Invalid(KEY_REST_FORMAT.to_string(), value))?;
        }
        if let Some(value) = read_optional(&lookup, KEY_SOURCE) {
            config.source = DataSource::parse(&value)
                .ok_or_else(|| ConfigError::Invalid(KEY_SOURCE.to_string(), value))?;
        }
        config.verify_ssl = read_bool_with_default(&lookup, KEY_VERIFY_SSL, config.verify_ssl)?;
        config.apply_filter =
            read_bool_with_default(&lookup, KEY_APPLY_FILTER, config.apply_filter)?;
        if let Some(value) = read_optional(&lookup, KEY_FILTER_RULE) {
            config.filter_rule = value;
        }
        if let Some(value) = read_optional(&lookup, KEY_TOPIC_NAME) {
            config.topic_name = value;
        }
        // 空白名单是合法取值（放行全部），不回退默认值。
        if let Some(value) = lookup(KEY_ASSET_LIST) {
            config.asset_list = value;
        }
        if let Some(value) = read_optional(&lookup, KEY_DB_NAME) {
            config.db_name = value;
        }
        config.connect_timeout_ms =
            read_u64_with_default(&lookup, KEY_CONNECT_TIMEOUT_MS, config.connect_timeout_ms)?;
        config.request_timeout_ms =
            read_u64_with_default(&lookup, KEY_REQUEST_TIMEOUT_MS, config.request_timeout_ms)?;

        info!(
            target: "anylog.config",
            url = %config.url,
            rest_format = config.rest_format.as_str(),
            source = config.source.as_str(),
            db_name = %config.db_name,
            apply_filter = config.apply_filter,
            "config_loaded"
        );
        Ok(config)
    }
}

/// 配置项名 → 环境变量名：`restFormat` → `ANYLOG_REST_FORMAT`，`verifySSL` → `ANYLOG_VERIFY_SSL`。
pub fn env_key(key: &str) -> String {
    let mut name = String::from("ANYLOG_");
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            name.push('_');
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        name.push(ch.to_ascii_uppercase());
    }
    name
}

fn category_value(item: &Value) -> Option<String> {
    match item {
        Value::Object(fields) => fields
            .get("value")
            .or_else(|| fields.get("default"))
            .and_then(scalar_to_string),
        other => scalar_to_string(other),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn read_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    let value = match read_optional(lookup, key) {
        Some(value) => value,
        None => return Ok(default),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_u64_with_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let value = match read_optional(lookup, key) {
        Some(value) => value,
        None => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_maps_camel_case() {
        assert_eq!(env_key("url"), "ANYLOG_URL");
        assert_eq!(env_key("restFormat"), "ANYLOG_REST_FORMAT");
        assert_eq!(env_key("verifySSL"), "ANYLOG_VERIFY_SSL");
        assert_eq!(env_key("connectTimeoutMs"), "ANYLOG_CONNECT_TIMEOUT_MS");
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let lookup = |key: &str| match key {
            "url" => Some("10.0.0.1:32149".to_string()),
            "verifySSL" => Some("ON".to_string()),
            "applyFilter" => Some("0".to_string()),
            _ => None,
        };
        let config = ConnectorConfig::from_lookup(lookup).expect("config");
        assert!(config.verify_ssl);
        assert!(!config.apply_filter);
    }
}
