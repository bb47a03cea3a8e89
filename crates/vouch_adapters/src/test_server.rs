//! Scripted local HTTP server for provider client tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw path and query, percent-encoding preserved
    pub target: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct Script {
    responses: HashMap<String, (u16, String)>,
    requests: Vec<RecordedRequest>,
}

/// Responds to `"METHOD /path"` keys with canned status and body, 404 for
/// anything unscripted, and records every request.
pub struct TestServer {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let handler_script = script.clone();

        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let script = handler_script.clone();
                async move {
                    let target = uri
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_default();
                    let key = format!("{} {}", method, uri.path());

                    let mut script = script.lock().unwrap();
                    script.requests.push(RecordedRequest {
                        method: method.to_string(),
                        target,
                        headers,
                        body: String::from_utf8_lossy(&body).to_string(),
                    });

                    match script.responses.get(&key) {
                        Some((status, body)) => (
                            StatusCode::from_u16(*status).unwrap(),
                            [("content-type", "application/json")],
                            body.clone(),
                        ),
                        None => (
                            StatusCode::NOT_FOUND,
                            [("content-type", "application/json")],
                            r#"{"message":"Not Found"}"#.to_string(),
                        ),
                    }
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, script }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .responses
            .insert(format!("{} {}", method, path), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}
