//! AnyLog 北向连接器：读取一批宿主记录（文件或 stdin），发送后以 JSON 输出结果。
//!
//! 用法：`anylog-north <batch.json | ->`，连接配置来自 `ANYLOG_*` 环境变量。
//! 发送失败时以非零状态码退出，宿主据此决定是否重发同一批次。

use anylog_config::{ConfigError, ConnectorConfig};
use anylog_delivery::Session;
use anylog_telemetry::init_tracing;
use domain::DeliveryReport;
use serde_json::{Value, json};
use std::future::pending;
use tokio::io::AsyncReadExt;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 初始化结构化日志并从环境变量加载连接配置
    let config = startup()?;

    let source = std::env::args().nth(1).unwrap_or_else(|| "-".to_string());
    let batch = parse_batch(&read_batch(&source).await?)?;

    let session = Session::connect(config)?;
    // Ctrl-C 取消在途发送，按传输失败上报
    let report = session.send_json_until(&batch, shutdown_signal()).await;

    println!("{}", report_json(&report));
    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

/// 日志先于配置初始化，`config_loaded` 事件才能输出。
fn startup() -> Result<ConnectorConfig, ConfigError> {
    init_tracing();
    ConnectorConfig::from_env()
}

async fn read_batch(source: &str) -> Result<String, std::io::Error> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        std::fs::read_to_string(source)
    }
}

fn parse_batch(text: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(records) => Ok(records),
        _ => Err("batch must be a JSON array of records".into()),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "anylog.delivery", error = %err, "shutdown_signal_unavailable");
        pending::<()>().await;
    }
}

fn report_json(report: &DeliveryReport) -> Value {
    json!({
        "success": report.success,
        "lastObjectId": report.last_object_id,
        "countSent": report.count_sent,
    })
}
