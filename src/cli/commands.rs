//! CLI command implementations
//!
//! `serve` loads the config, opens a store and answers one JSON request per
//! stdin line until EOF. Request failures are reported on stdout and the loop
//! keeps going; only config, open and I/O failures end the process.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::backend::MemoryStore;
use crate::batch::BatchOp;
use crate::blob::LocalBlobStore;
use crate::codec::Value;
use crate::config::StoreConfig;
use crate::iterator::{Entry, IteratorOptions};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::store::{DynaDown, Location};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// One request line
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Request {
    Put { key: String, value: JsonValue },
    Get { key: String },
    Del { key: String },
    Batch { ops: Vec<BatchRequestOp> },
    Scan {
        #[serde(default)]
        options: IteratorOptions,
    },
    Metrics,
}

/// One operation inside a `batch` request
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchRequestOp {
    Put { key: String, value: JsonValue },
    Del { key: String },
}

impl From<BatchRequestOp> for BatchOp {
    fn from(op: BatchRequestOp) -> Self {
        match op {
            BatchRequestOp::Put { key, value } => BatchOp::put(key, Value::from(value)),
            BatchRequestOp::Del { key } => BatchOp::del(key),
        }
    }
}

/// Entry point for the binary
pub async fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command).await
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config).await,
    }
}

/// Open the configured store and enter the request loop
pub async fn serve(config_path: &Path) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", config_path.display().to_string().as_str())],
    );

    let store = build_store(&config)?;
    store.open(config.open_options()).await?;
    log_event_with_fields(
        Event::Serving,
        &[("location", store.location().to_string().as_str())],
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match handle_line(&store, &line).await {
            Ok(data) => write_response(data)?,
            Err(e) => {
                log_event_with_fields(
                    Event::RequestFailed,
                    &[("code", e.code_str()), ("message", e.message())],
                );
                write_error(e.code_str(), e.message())?;
            }
        }
    }

    store.close().await?;
    Ok(())
}

/// Wire a store from config: the table lives in memory, blobs on disk
pub fn build_store(config: &StoreConfig) -> CliResult<DynaDown> {
    let location = Location::parse(&config.location)?;
    let primary = Arc::new(MemoryStore::new(location.table.clone()));
    let blobs = Arc::new(LocalBlobStore::new(config.blob_dir.clone(), &location.table));
    Ok(DynaDown::from_config(config, primary, blobs)?)
}

/// Parse and execute one request line
pub async fn handle_line(store: &DynaDown, line: &str) -> CliResult<JsonValue> {
    let request: Request = serde_json::from_str(line)
        .map_err(|e| CliError::invalid_request(format!("Invalid request: {}", e)))?;
    handle_request(store, request).await
}

pub async fn handle_request(store: &DynaDown, request: Request) -> CliResult<JsonValue> {
    match request {
        Request::Put { key, value } => {
            store.put(&key, Value::from(value)).await?;
            Ok(JsonValue::Null)
        }
        Request::Get { key } => Ok(store.get(&key).await?.to_json()),
        Request::Del { key } => {
            store.del(&key).await?;
            Ok(JsonValue::Null)
        }
        Request::Batch { ops } => {
            store
                .batch(ops.into_iter().map(BatchOp::from).collect())
                .await?;
            Ok(JsonValue::Null)
        }
        Request::Scan { options } => {
            let mut iterator = store.iterator(&options)?;
            let mut entries = Vec::new();
            while let Some(entry) = iterator.next().await? {
                entries.push(entry_to_json(entry));
            }
            Ok(JsonValue::Array(entries))
        }
        Request::Metrics => serde_json::to_value(store.metrics())
            .map_err(|e| CliError::io_error(format!("JSON error: {}", e))),
    }
}

fn entry_to_json(entry: Entry) -> JsonValue {
    let mut object = serde_json::Map::new();
    if let Some(key) = entry.key {
        object.insert("key".into(), json!(key));
    }
    if let Some(value) = entry.value {
        object.insert("value".into(), value.to_json());
    }
    JsonValue::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OpenOptions;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> DynaDown {
        let mut config = StoreConfig::new("items$users");
        config.blob_dir = dir.path().to_path_buf();
        let store = build_store(&config).unwrap();
        store.open(OpenOptions::default()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let put = handle_line(&store, r#"{"op":"put","key":"a","value":{"name":"x"}}"#)
            .await
            .unwrap();
        assert_eq!(put, JsonValue::Null);

        let got = handle_line(&store, r#"{"op":"get","key":"a"}"#)
            .await
            .unwrap();
        assert_eq!(got, json!({"name": "x"}));
    }

    #[tokio::test]
    async fn test_missing_key_reports_store_code() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let err = handle_line(&store, r#"{"op":"get","key":"nope"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "DYNADOWN_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_batch_then_scan() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        handle_line(
            &store,
            r#"{"op":"batch","ops":[
                {"type":"put","key":"a","value":1},
                {"type":"put","key":"b","value":2},
                {"type":"put","key":"c","value":3},
                {"type":"del","key":"b"}
            ]}"#,
        )
        .await
        .unwrap();

        let scanned = handle_line(&store, r#"{"op":"scan","options":{"reverse":true}}"#)
            .await
            .unwrap();
        assert_eq!(
            scanned,
            json!([{"key": "c", "value": 3.0}, {"key": "a", "value": 1.0}])
        );
    }

    #[tokio::test]
    async fn test_keys_only_scan() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        handle_line(&store, r#"{"op":"put","key":"k","value":"v"}"#)
            .await
            .unwrap();

        let scanned = handle_line(&store, r#"{"op":"scan","options":{"values":false}}"#)
            .await
            .unwrap();
        assert_eq!(scanned, json!([{"key": "k"}]));
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let err = handle_line(&store, r#"{"op":"explode"}"#).await.unwrap_err();
        assert_eq!(err.code_str(), "DYNADOWN_CLI_INVALID_REQUEST");
    }
}
