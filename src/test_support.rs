//! Fixtures shared by the unit tests: log databases, a stand-in Loki and a
//! canned name resolver.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use sqlx::ConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use url::Url;

use crate::container::{NameResolver, ResolveError};

/// Writes a `log` table with the given `(created, text)` rows to `path`.
pub async fn create_log_db(path: &Path, rows: &[(&str, &str)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();

    sqlx::query("CREATE TABLE log (id INTEGER PRIMARY KEY, created TEXT, text TEXT)")
        .execute(&mut conn)
        .await
        .unwrap();
    for (created, text) in rows {
        sqlx::query("INSERT INTO log (created, text) VALUES (?, ?)")
            .bind(*created)
            .bind(*text)
            .execute(&mut conn)
            .await
            .unwrap();
    }
    sqlx::Connection::close(conn).await.unwrap();
}

#[derive(Debug, Clone)]
pub struct ReceivedPush {
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

struct FakeLokiState {
    statuses: Vec<StatusCode>,
    requests: Mutex<Vec<ReceivedPush>>,
}

/// An HTTP server answering push requests with the given statuses in
/// order, repeating the last one once they run out.
pub struct FakeLoki {
    addr: SocketAddr,
    state: Arc<FakeLokiState>,
    server: tokio::task::JoinHandle<()>,
}

impl FakeLoki {
    pub async fn start(statuses: Vec<StatusCode>) -> Self {
        let state = Arc::new(FakeLokiState {
            statuses,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/loki/api/v1/push", post(receive_push))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn push_url(&self) -> Url {
        Url::parse(&format!("http://{}/loki/api/v1/push", self.addr)).unwrap()
    }

    pub fn requests(&self) -> Vec<ReceivedPush> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeLoki {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn receive_push(
    State(state): State<Arc<FakeLokiState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let mut requests = state.requests.lock().unwrap();
    let status = state
        .statuses
        .get(requests.len())
        .or(state.statuses.last())
        .copied()
        .unwrap_or(StatusCode::NO_CONTENT);

    requests.push(ReceivedPush {
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    let body = if status.is_server_error() {
        "ingester unavailable"
    } else {
        ""
    };
    (status, body.to_string())
}

/// Resolves names from a fixed table. Ids missing from the table fail the
/// way a missing `docker` binary would.
pub struct StaticResolver {
    names: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new(names: &[(&str, &str)]) -> Self {
        Self {
            names: names
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn container_name(&self, id: &str) -> Result<String, ResolveError> {
        self.names.get(id).cloned().ok_or_else(|| {
            ResolveError::Spawn(
                PathBuf::from("docker"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such container"),
            )
        })
    }
}
