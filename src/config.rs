//! # Store Configuration
//!
//! JSON file read by `dynadown serve`. Only `location` is required.
//!
//! ```json
//! {
//!   "location": "records$!",
//!   "blob_dir": "./blobs",
//!   "attachments": [
//!     {"pattern": "^[^/]+/avatar$", "content_type_field": "type", "data_field": "body"}
//!   ],
//!   "retry": {"max_retries": 8, "initial_backoff_ms": 50, "max_backoff_ms": 2000}
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::attachment::AttachmentDefinition;
use crate::backend::{BillingMode, MAX_BATCH_WRITE};
use crate::batch::RetryPolicy;
use crate::codec::DataEncoding;
use crate::errors::{StoreError, StoreResult};
use crate::observability::Severity;
use crate::store::{Location, OpenOptions};

/// One attachment definition as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Regex matched against `<record key>/<field path>`
    pub pattern: String,
    #[serde(default = "default_content_type_field")]
    pub content_type_field: String,
    #[serde(default = "default_data_field")]
    pub data_field: String,
    #[serde(default)]
    pub encoding: Option<DataEncoding>,
}

impl AttachmentConfig {
    pub fn to_definition(&self) -> StoreResult<AttachmentDefinition> {
        Ok(AttachmentDefinition::new(
            &self.pattern,
            &self.content_type_field,
            &self.data_field,
            self.encoding,
        )?)
    }
}

fn default_content_type_field() -> String {
    "contentType".to_string()
}

fn default_data_field() -> String {
    "data".to_string()
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `<table>$<partition>`; the partition defaults to `!`
    pub location: String,

    /// Root directory of the local blob store
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,

    #[serde(default)]
    pub attachments: Vec<AttachmentConfig>,

    /// Strongly consistent point reads and queries
    #[serde(default)]
    pub use_consistency: bool,

    #[serde(default)]
    pub billing_mode: BillingMode,

    /// Requests per batch-write call, at most 25
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    #[serde(default)]
    pub error_if_exists: bool,

    /// trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./dynadown-blobs")
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_WRITE
}

fn default_create_if_missing() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl StoreConfig {
    /// Config with every optional field at its default
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            blob_dir: default_blob_dir(),
            attachments: Vec::new(),
            use_consistency: false,
            billing_mode: BillingMode::default(),
            max_batch_size: default_max_batch_size(),
            retry: RetryPolicy::default(),
            create_if_missing: default_create_if_missing(),
            error_if_exists: false,
            log_level: default_log_level(),
        }
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> StoreResult<Self> {
        let config: StoreConfig = serde_json::from_str(content)
            .map_err(|e| StoreError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        Location::parse(&self.location)?;

        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_WRITE {
            return Err(StoreError::Config(format!(
                "max_batch_size must be between 1 and {}, got {}",
                MAX_BATCH_WRITE, self.max_batch_size
            )));
        }

        if let BillingMode::Provisioned {
            read_capacity,
            write_capacity,
        } = self.billing_mode
        {
            if read_capacity == 0 || write_capacity == 0 {
                return Err(StoreError::Config(
                    "Provisioned capacity must be greater than 0".into(),
                ));
            }
        }

        if self.retry.max_backoff_ms > 0 && self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(StoreError::Config(
                "retry.max_backoff_ms must not be below retry.initial_backoff_ms".into(),
            ));
        }

        self.severity()?;
        self.definitions()?;
        Ok(())
    }

    /// Compiled attachment definitions, in file order
    pub fn definitions(&self) -> StoreResult<Vec<AttachmentDefinition>> {
        self.attachments
            .iter()
            .map(AttachmentConfig::to_definition)
            .collect()
    }

    pub fn severity(&self) -> StoreResult<Severity> {
        self.log_level.parse().map_err(StoreError::Config)
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            create_if_missing: self.create_if_missing,
            error_if_exists: self.error_if_exists,
        }
    }
}
