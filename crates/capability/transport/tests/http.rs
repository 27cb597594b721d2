use anylog_transport::{HttpTransport, Transport, TransportConfig, TransportError};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wire_contract::{BulkRecord, StreamingHeaders, StreamingRecord};

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    headers: HeaderMap,
    body: String,
}

#[derive(Clone)]
struct Capture {
    requests: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
}

async fn capture(
    State(state): State<Capture>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    state.requests.lock().expect("lock").push(Captured {
        method,
        headers,
        body,
    });
    (state.status, "ack")
}

async fn spawn_receiver(status: StatusCode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route("/", any(capture)).with_state(Capture {
        requests: requests.clone(),
        status,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr.to_string(), requests)
}

fn transport(url: &str) -> HttpTransport {
    transport_with_timeout(url, Duration::from_secs(5))
}

fn transport_with_timeout(url: &str, request_timeout: Duration) -> HttpTransport {
    HttpTransport::new(TransportConfig {
        url: url.to_string(),
        verify_ssl: false,
        connect_timeout: Duration::from_secs(2),
        request_timeout,
    })
    .expect("transport")
}

async fn spawn_slow_receiver(delay: Duration) -> String {
    let app = Router::new().route(
        "/",
        any(move || async move {
            tokio::time::sleep(delay).await;
            "late"
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr.to_string()
}

fn header<'a>(captured: &'a Captured, name: &str) -> &'a str {
    captured
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn bulk_record() -> BulkRecord {
    let mut readings = Map::new();
    readings.insert("x".to_string(), json!(1));
    BulkRecord {
        dbms: "fledge".to_string(),
        asset: "Room_A_1".to_string(),
        timestamp: json!("t1"),
        readings,
    }
}

#[tokio::test]
async fn post_bulk_sends_headers_and_json_array() {
    let (addr, requests) = spawn_receiver(StatusCode::OK).await;
    let transport = transport(&addr);

    let body = transport
        .post_bulk(&[bulk_record()], "fledge")
        .await
        .expect("sent");
    assert_eq!(body, "ack");

    let requests = requests.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(header(request, "command"), "data");
    assert_eq!(header(request, "topic"), "fledge");
    assert_eq!(header(request, "user-agent"), "AnyLog/1.23");
    assert_eq!(header(request, "content-type"), "text/plain");
    assert_eq!(
        request.body,
        r#"[{"dbms":"fledge","asset":"Room_A_1","timestamp":"t1","readings":{"x":1}}]"#
    );
}

#[tokio::test]
async fn put_streaming_sends_flat_body() {
    let (addr, requests) = spawn_receiver(StatusCode::OK).await;
    let transport = transport(&format!("http://{}", addr));

    let mut body = Map::new();
    body.insert("timestamp".to_string(), json!("t1"));
    body.insert("x".to_string(), json!(1.5));
    let record = StreamingRecord {
        headers: StreamingHeaders {
            dbms: "plant".to_string(),
            table: "Room_A_1".to_string(),
        },
        body,
    };
    transport.put_streaming(&record).await.expect("sent");

    let requests = requests.lock().expect("lock");
    let request = &requests[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(header(request, "type"), "json");
    assert_eq!(header(request, "dbms"), "plant");
    assert_eq!(header(request, "table"), "Room_A_1");
    assert_eq!(header(request, "mode"), "streaming");
    assert_eq!(header(request, "content-type"), "text/plain");
    let sent: Value = serde_json::from_str(&request.body).expect("json");
    assert_eq!(sent, json!({"timestamp": "t1", "x": 1.5}));
}

#[tokio::test]
async fn client_and_server_errors_are_classified() {
    let (addr, _) = spawn_receiver(StatusCode::BAD_REQUEST).await;
    let err = transport(&addr)
        .post_bulk(&[bulk_record()], "fledge")
        .await
        .expect_err("4xx");
    assert_eq!(
        err,
        TransportError::Client {
            status: 400,
            reason: "Bad Request".to_string()
        }
    );

    let (addr, _) = spawn_receiver(StatusCode::SERVICE_UNAVAILABLE).await;
    let err = transport(&addr)
        .post_bulk(&[bulk_record()], "fledge")
        .await
        .expect_err("5xx");
    assert!(matches!(err, TransportError::Server { status: 503, .. }));
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = transport(&addr.to_string())
        .post_bulk(&[bulk_record()], "fledge")
        .await
        .expect_err("refused");
    assert!(matches!(err, TransportError::Connection(_)));
}

#[tokio::test]
async fn request_timeout_is_transport_error() {
    let addr = spawn_slow_receiver(Duration::from_secs(2)).await;
    let transport = transport_with_timeout(&addr, Duration::from_millis(100));

    let err = transport
        .post_bulk(&[bulk_record()], "fledge")
        .await
        .expect_err("timeout");
    assert!(matches!(err, TransportError::Connection(_)));

    let record = StreamingRecord {
        headers: StreamingHeaders {
            dbms: "fledge".to_string(),
            table: "a".to_string(),
        },
        body: Map::new(),
    };
    let err = transport.put_streaming(&record).await.expect_err("timeout");
    assert!(matches!(err, TransportError::Connection(_)));
}
