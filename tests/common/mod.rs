#![allow(dead_code)]
//! In-process fakes shared by the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use ingest_handlers::core::config::DlqConfig;
use ingest_handlers::core::models::{ApiCredentials, StatusUpdate};
use ingest_handlers::core::secrets::SecretStore;
use ingest_handlers::db_init::{ConnectParams, SchemaConnector, SchemaSession};
use ingest_handlers::dlq::StatusReporter;
use ingest_handlers::errors::IngestError;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:ingest-token";
pub const ORIGIN_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:origin-verify";
pub const DB_PASSWORD_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db-password";

pub fn dlq_config(origin_verify: bool) -> DlqConfig {
    let mut vars = HashMap::from([
        ("ALB_BASE_URL", "http://alb.internal".to_string()),
        ("INGESTION_API_TOKEN_ARN", TOKEN_ARN.to_string()),
    ]);
    if origin_verify {
        vars.insert("ORIGIN_VERIFY_ARN", ORIGIN_ARN.to_string());
    }
    DlqConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// SQS records carrying the given bodies, in order.
pub fn sqs_records(bodies: &[String]) -> Vec<SqsMessage> {
    let records: Vec<_> = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            json!({
                "messageId": format!("msg-{i}"),
                "body": body,
                "attributes": {},
                "messageAttributes": {},
                "eventSource": "aws:sqs"
            })
        })
        .collect();
    let event: SqsEvent = serde_json::from_value(json!({ "Records": records })).unwrap();
    event.records
}

pub fn ecs_body(key: &str, event_type: &str) -> String {
    json!({
        "detail-type": "ECS Task State Change",
        "detail": {
            "overrides": {
                "containerOverrides": [{
                    "environment": [
                        {"name": "S3_OBJECT_KEY", "value": key},
                        {"name": "EVENT_TYPE", "value": event_type}
                    ]
                }]
            }
        }
    })
    .to_string()
}

pub fn run_task_body(key: &str, event_type: &str) -> String {
    json!({
        "containerOverrides": [{
            "name": "ingestion",
            "environment": [
                {"name": "S3_OBJECT_KEY", "value": key},
                {"name": "EVENT_TYPE", "value": event_type}
            ]
        }]
    })
    .to_string()
}

#[derive(Default)]
pub struct FakeSecrets {
    values: HashMap<String, String>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeSecrets {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for FakeSecrets {
    async fn get_secret(&self, secret_id: &str) -> Result<String, IngestError> {
        self.requested.lock().unwrap().push(secret_id.to_string());
        self.values
            .get(secret_id)
            .cloned()
            .ok_or_else(|| IngestError::SecretError(format!("{secret_id}: not found")))
    }
}

/// Records every report; optionally fails on the n-th call (0-based).
#[derive(Default)]
pub struct RecordingReporter {
    pub calls: Mutex<Vec<(StatusUpdate, ApiCredentials)>>,
    pub fail_on_call: Option<usize>,
}

impl RecordingReporter {
    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        }
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    async fn report(
        &self,
        update: &StatusUpdate,
        credentials: &ApiCredentials,
    ) -> Result<(), IngestError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push((update.clone(), credentials.clone()));
        if self.fail_on_call == Some(index) {
            return Err(IngestError::HttpError("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

/// Emulates just enough of PostgreSQL's `CREATE EXTENSION` semantics.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub installed: Arc<Mutex<HashSet<String>>>,
    pub statements: Arc<Mutex<Vec<String>>>,
    pub connections: Arc<Mutex<Vec<ConnectParams>>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub refuse_connections: bool,
    pub fail_statements: bool,
}

impl FakeDatabase {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaConnector for FakeDatabase {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> Result<Box<dyn SchemaSession>, IngestError> {
        self.connections.lock().unwrap().push(params.clone());
        if self.refuse_connections {
            return Err(IngestError::DatabaseError(
                "connection refused".to_string(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession { db: self.clone() }))
    }
}

struct FakeSession {
    db: FakeDatabase,
}

#[async_trait]
impl SchemaSession for FakeSession {
    async fn execute_committed(&mut self, statement: &str) -> Result<(), IngestError> {
        self.db.statements.lock().unwrap().push(statement.to_string());
        if self.db.fail_statements {
            return Err(IngestError::DatabaseError(
                "permission denied to create extension".to_string(),
            ));
        }

        let statement = statement.trim().trim_end_matches(';');
        let mut installed = self.db.installed.lock().unwrap();
        if let Some(name) = statement.strip_prefix("CREATE EXTENSION IF NOT EXISTS ") {
            installed.insert(name.to_string());
            Ok(())
        } else if let Some(name) = statement.strip_prefix("CREATE EXTENSION ") {
            if installed.insert(name.to_string()) {
                Ok(())
            } else {
                Err(IngestError::DatabaseError(format!(
                    "extension \"{name}\" already exists"
                )))
            }
        } else {
            Err(IngestError::DatabaseError(format!(
                "unsupported statement: {statement}"
            )))
        }
    }

    async fn close(self: Box<Self>) {
        self.db.closed.fetch_add(1, Ordering::SeqCst);
    }
}


/// Accepts one connection, answers with `status_line`, and yields the raw
/// request it received.
pub async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    serve_once_with_headers(status_line, &[], body).await
}

/// Like [`serve_once`], with extra response header lines.
pub async fn serve_once_with_headers(
    status_line: &'static str,
    headers: &[&str],
    body: &'static str,
) -> (String, JoinHandle<String>) {
    let extra: String = headers.iter().map(|h| format!("{h}\r\n")).collect();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let content_length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\n{extra}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}"), handle)
}
