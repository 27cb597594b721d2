//! # 发送编排能力模块
//!
//! 宿主每次交付一批记录，`Session::send` 依次执行：
//!
//! ```text
//! Received ──▶ Filtered ──(空)──▶ Done(true, 0, 0)
//!                 │
//!                 └──▶ Transforming ──▶ Transmitting ──▶ Done(success | failed)
//! ```
//!
//! - post：整批一次请求，失败时 `count_sent` 为 0。
//! - put：逐条顺序请求，遇到首个失败即停止，后续记录不再尝试。
//! - 检查点取原始批次（过滤前）最后一条记录的 id。
//! - 取消等同于传输失败，报告已确认的记录数。
//!
//! 内部不重试，是否重发由宿主决定。

use anylog_config::ConnectorConfig;
use anylog_filter::{FilterError, RecordFilter};
use anylog_telemetry::{
    new_batch_id, record_batch_received, record_filtered_out, record_records_sent,
};
use anylog_transform::{record_from_json, to_bulk, to_streaming};
use anylog_transport::{HttpTransport, Transport, TransportConfig, TransportError};
use domain::{DeliveryReport, Record};
use serde_json::Value;
use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};
use wire_contract::RestFormat;

/// 会话创建错误。
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// 一个连接器实例的发送会话：配置 + 过滤器 + 复用的传输客户端。
pub struct Session {
    config: ConnectorConfig,
    filter: RecordFilter,
    transport: Arc<dyn Transport>,
}

impl Session {
    /// 按配置建立 HTTP 会话。
    pub fn connect(config: ConnectorConfig) -> Result<Self, DeliveryError> {
        let transport = HttpTransport::new(transport_config(&config))?;
        info!(
            target: "anylog.delivery",
            endpoint = %transport.endpoint(),
            rest_format = config.rest_format.as_str(),
            source = config.source.as_str(),
            verify_ssl = config.verify_ssl,
            "session_connected"
        );
        Self::with_transport(config, Arc::new(transport))
    }

    /// 使用外部提供的传输实现。
    pub fn with_transport(
        config: ConnectorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DeliveryError> {
        let filter = RecordFilter::from_settings(
            &config.asset_list,
            config.apply_filter,
            &config.filter_rule,
        )?;
        Ok(Self {
            config,
            filter,
            transport,
        })
    }

    /// 发送一批记录。
    pub async fn send(&self, batch: &[Record]) -> DeliveryReport {
        self.send_until(batch, pending::<()>()).await
    }

    /// 发送一批记录；`shutdown` 先完成时中止在途请求并报告失败。
    pub async fn send_until(
        &self,
        batch: &[Record],
        shutdown: impl Future<Output = ()>,
    ) -> DeliveryReport {
        let span = info_span!(
            "send",
            batch_id = %new_batch_id(),
            rest_format = self.config.rest_format.as_str()
        );
        self.deliver(batch, shutdown).instrument(span).await
    }

    /// 发送宿主 JSON 记录；任一记录缺少必需字段时整批不发送。
    pub async fn send_json(&self, batch: &[Value]) -> DeliveryReport {
        self.send_json_until(batch, pending::<()>()).await
    }

    pub async fn send_json_until(
        &self,
        batch: &[Value],
        shutdown: impl Future<Output = ()>,
    ) -> DeliveryReport {
        let mut records = Vec::with_capacity(batch.len());
        for (index, value) in batch.iter().enumerate() {
            match record_from_json(value) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(target: "anylog.delivery", index, error = %err, "malformed_record");
                    return DeliveryReport::failed(0, 0);
                }
            }
        }
        self.send_until(&records, shutdown).await
    }

    async fn deliver(
        &self,
        batch: &[Record],
        shutdown: impl Future<Output = ()>,
    ) -> DeliveryReport {
        record_batch_received(batch.len());
        let last_object_id = batch.last().map(|record| record.id).unwrap_or_default();
        let selected = self.filter.select(batch);
        record_filtered_out(batch.len() - selected.len());
        info!(
            target: "anylog.delivery",
            received = batch.len(),
            selected = selected.len(),
            "batch_filtered"
        );
        if selected.is_empty() {
            return DeliveryReport::nothing_to_send();
        }

        let mut count_sent = 0;
        let outcome = {
            let transmit = self.transmit(&selected, &mut count_sent);
            tokio::select! {
                result = transmit => result,
                _ = shutdown => Err(TransportError::Cancelled),
            }
        };
        record_records_sent(count_sent);

        match outcome {
            Ok(()) => {
                info!(
                    target: "anylog.delivery",
                    count_sent,
                    last_object_id,
                    "batch_delivered"
                );
                DeliveryReport::sent(last_object_id, count_sent)
            }
            Err(err) => {
                warn!(
                    target: "anylog.delivery",
                    count_sent,
                    last_object_id,
                    status = err.status().unwrap_or_default(),
                    error = %err,
                    "batch_delivery_failed"
                );
                DeliveryReport::failed(last_object_id, count_sent)
            }
        }
    }

    async fn transmit(
        &self,
        selected: &[&Record],
        count_sent: &mut usize,
    ) -> Result<(), TransportError> {
        let db_name = self.config.db_name.as_str();
        match self.config.rest_format {
            RestFormat::Post => {
                let block = selected
                    .iter()
                    .map(|record| to_bulk(record, db_name))
                    .collect::<Vec<_>>();
                self.transport
                    .post_bulk(&block, &self.config.topic_name)
                    .await?;
                *count_sent = block.len();
            }
            RestFormat::Put => {
                for record in selected {
                    let target = to_streaming(record, db_name);
                    if let Err(err) = self.transport.put_streaming(&target).await {
                        warn!(
                            target: "anylog.delivery",
                            record_id = record.id,
                            table = %target.headers.table,
                            "streaming_record_failed"
                        );
                        return Err(err);
                    }
                    *count_sent += 1;
                }
            }
        }
        Ok(())
    }
}

fn transport_config(config: &ConnectorConfig) -> TransportConfig {
    TransportConfig {
        url: config.url.clone(),
        verify_ssl: config.verify_ssl,
        connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        request_timeout: Duration::from_millis(config.request_timeout_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_config_follows_connector_config() {
        let mut config = ConnectorConfig::new("10.0.0.1:32149");
        config.verify_ssl = true;
        config.request_timeout_ms = 750;
        let transport = transport_config(&config);
        assert_eq!(transport.url, "10.0.0.1:32149");
        assert!(transport.verify_ssl);
        assert_eq!(transport.connect_timeout, Duration::from_secs(5));
        assert_eq!(transport.request_timeout, Duration::from_millis(750));
    }
}
