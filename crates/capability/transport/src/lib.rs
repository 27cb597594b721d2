//! # HTTP 传输能力模块
//!
//! 持有一次连接器会话内复用的 HTTP 客户端，按两种线上形态发起请求并对响应分类：
//!
//! | 状态 | 结果 |
//! |------|------|
//! | 400..=499 | `TransportError::Client` |
//! | 500..=599 | `TransportError::Server` |
//! | 其余 | 成功（返回响应体文本） |
//! | 超时 / 拒绝连接 / DNS | `TransportError::Connection` |
//!
//! TLS 校验开关在会话创建时绑定，会话内不可变更。

use anylog_telemetry::{
    record_request_client_error, record_request_latency_ms, record_request_server_error,
    record_request_success, record_request_transport_error,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wire_contract::headers;
use wire_contract::{BulkRecord, StreamingRecord};

/// 传输错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("client error: {status} {reason}")]
    Client { status: u16, reason: String },
    #[error("server error: {status} {reason}")]
    Server { status: u16, reason: String },
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("payload error: {0}")]
    Payload(String),
}

impl TransportError {
    /// 响应状态码（仅 4xx / 5xx 有）。
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Client { status, .. } | TransportError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// 传输接口：每次调用恰好一次网络往返。
#[async_trait]
pub trait Transport: Send + Sync {
    /// 整批记录一次 POST。
    async fn post_bulk(&self, body: &[BulkRecord], topic: &str) -> Result<String, TransportError>;
    /// 单条记录一次 PUT。
    async fn put_streaming(&self, record: &StreamingRecord) -> Result<String, TransportError>;
}

/// HTTP 传输配置。
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `IP:Port`，或带 `http://` / `https://` 前缀的完整地址。
    pub url: String,
    pub verify_ssl: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/// 基于 reqwest 的传输实现。
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint(&config.url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(
        &self,
        kind: &'static str,
        request: RequestBuilder,
    ) -> Result<String, TransportError> {
        let started = Instant::now();
        let result = match request.send().await {
            Ok(response) => {
                let status = response.status();
                let reason = status.canonical_reason().unwrap_or_default().to_string();
                match response.text().await {
                    Ok(body) => classify(status.as_u16(), &reason, body),
                    Err(err) => Err(TransportError::Connection(err.to_string())),
                }
            }
            Err(err) => Err(TransportError::Connection(err.to_string())),
        };
        record_request_latency_ms(started.elapsed().as_millis() as u64);

        match &result {
            Ok(_) => {
                record_request_success();
                debug!(
                    target: "anylog.transport",
                    request = kind,
                    endpoint = %self.endpoint,
                    "request_accepted"
                );
            }
            Err(err) => {
                match err {
                    TransportError::Client { .. } => record_request_client_error(),
                    TransportError::Server { .. } => record_request_server_error(),
                    _ => record_request_transport_error(),
                }
                warn!(
                    target: "anylog.transport",
                    request = kind,
                    endpoint = %self.endpoint,
                    status = err.status().unwrap_or_default(),
                    error = %err,
                    "request_failed"
                );
            }
        }
        result
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_bulk(&self, body: &[BulkRecord], topic: &str) -> Result<String, TransportError> {
        let payload =
            serde_json::to_string(body).map_err(|err| TransportError::Payload(err.to_string()))?;
        let request = self
            .client
            .request(Method::POST, &self.endpoint)
            .header(headers::COMMAND, headers::COMMAND_DATA)
            .header(headers::TOPIC, topic)
            .header(headers::USER_AGENT, headers::USER_AGENT_VALUE)
            .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_TEXT)
            .body(payload);
        self.execute("post_bulk", request).await
    }

    async fn put_streaming(&self, record: &StreamingRecord) -> Result<String, TransportError> {
        let payload = serde_json::to_string(&record.body)
            .map_err(|err| TransportError::Payload(err.to_string()))?;
        let request = self
            .client
            .request(Method::PUT, &self.endpoint)
            .header(headers::TYPE, headers::TYPE_JSON)
            .header(headers::DBMS, record.headers.dbms.as_str())
            .header(headers::TABLE, record.headers.table.as_str())
            .header(headers::MODE, headers::MODE_STREAMING)
            .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_TEXT)
            .body(payload);
        self.execute("put_streaming", request).await
    }
}

/// 请求地址：未带协议前缀时补 `http://`。
pub fn endpoint(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// 按状态码分类响应。
pub fn classify(status: u16, reason: &str, body: String) -> Result<String, TransportError> {
    match status {
        400..=499 => Err(TransportError::Client {
            status,
            reason: reason.to_string(),
        }),
        500..=599 => Err(TransportError::Server {
            status,
            reason: reason.to_string(),
        }),
        _ => Ok(body),
    }
}
