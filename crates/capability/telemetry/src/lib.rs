//! 追踪初始化、批次 ID 生成与发送计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub records_received: u64,
    pub records_filtered_out: u64,
    pub records_sent: u64,
    pub requests_success: u64,
    pub requests_client_error: u64,
    pub requests_server_error: u64,
    pub requests_transport_error: u64,
    pub arrays_encoded: u64,
    pub readings_passed_through: u64,
    pub request_latency_ms_total: u64,
    pub request_latency_ms_count: u64,
}

/// 基础指标（进程内计数，不导出）。
pub struct TelemetryMetrics {
    batches_received: AtomicU64,
    records_received: AtomicU64,
    records_filtered_out: AtomicU64,
    records_sent: AtomicU64,
    requests_success: AtomicU64,
    requests_client_error: AtomicU64,
    requests_server_error: AtomicU64,
    requests_transport_error: AtomicU64,
    arrays_encoded: AtomicU64,
    readings_passed_through: AtomicU64,
    request_latency_ms_total: AtomicU64,
    request_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            records_received: AtomicU64::new(0),
            records_filtered_out: AtomicU64::new(0),
            records_sent: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_client_error: AtomicU64::new(0),
            requests_server_error: AtomicU64::new(0),
            requests_transport_error: AtomicU64::new(0),
            arrays_encoded: AtomicU64::new(0),
            readings_passed_through: AtomicU64::new(0),
            request_latency_ms_total: AtomicU64::new(0),
            request_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            records_received: self.records_received.load(Ordering::Relaxed),
            records_filtered_out: self.records_filtered_out.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_client_error: self.requests_client_error.load(Ordering::Relaxed),
            requests_server_error: self.requests_server_error.load(Ordering::Relaxed),
            requests_transport_error: self.requests_transport_error.load(Ordering::Relaxed),
            arrays_encoded: self.arrays_encoded.load(Ordering::Relaxed),
            readings_passed_through: self.readings_passed_through.load(Ordering::Relaxed),
            request_latency_ms_total: self.request_latency_ms_total.load(Ordering::Relaxed),
            request_latency_ms_count: self.request_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 batch_id，用于关联一次 send 调用的全部日志。
pub fn new_batch_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录收到的批次及其记录数。
pub fn record_batch_received(records: usize) {
    let metrics = metrics();
    metrics.batches_received.fetch_add(1, Ordering::Relaxed);
    metrics
        .records_received
        .fetch_add(records as u64, Ordering::Relaxed);
}

/// 记录被白名单过滤掉的记录数。
pub fn record_filtered_out(records: usize) {
    metrics()
        .records_filtered_out
        .fetch_add(records as u64, Ordering::Relaxed);
}

/// 记录接收端确认的记录数。
pub fn record_records_sent(records: usize) {
    metrics()
        .records_sent
        .fetch_add(records as u64, Ordering::Relaxed);
}

/// 记录请求成功次数。
pub fn record_request_success() {
    metrics().requests_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录 4xx 响应次数。
pub fn record_request_client_error() {
    metrics()
        .requests_client_error
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录 5xx 响应次数。
pub fn record_request_server_error() {
    metrics()
        .requests_server_error
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录连接级失败次数（超时、拒绝连接、取消等）。
pub fn record_request_transport_error() {
    metrics()
        .requests_transport_error
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录数组编码次数。
pub fn record_array_encoded() {
    metrics().arrays_encoded.fetch_add(1, Ordering::Relaxed);
}

/// 记录原样透传的读数次数。
pub fn record_opaque_passthrough() {
    metrics()
        .readings_passed_through
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录请求往返耗时（毫秒）。
pub fn record_request_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .request_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .request_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
