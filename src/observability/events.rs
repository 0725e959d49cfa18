//! Observable store events

use std::fmt;

use super::logger::Severity;

/// Observable events of a store's lifecycle and data path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    StoreOpen,
    TableCreated,
    BucketCreated,
    StoreClosed,
    StoreDestroyed,
    ConfigLoaded,

    // Writes
    BatchCommit,
    /// The backend returned unprocessed items that are being resubmitted
    BatchRetry,
    /// Retry cap reached with items still unprocessed
    BatchAbandoned,
    AttachmentsSynced,

    // Reads
    RecordRead,
    /// A scan hit a missing table and ended early
    ScanTableMissing,
    /// A fetched record referenced a blob that no longer exists
    AttachmentMissing,

    // CLI
    Serving,
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreOpen => "STORE_OPEN",
            Event::TableCreated => "TABLE_CREATED",
            Event::BucketCreated => "BUCKET_CREATED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::StoreDestroyed => "STORE_DESTROYED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::BatchCommit => "BATCH_COMMIT",
            Event::BatchRetry => "BATCH_RETRY",
            Event::BatchAbandoned => "BATCH_ABANDONED",
            Event::AttachmentsSynced => "ATTACHMENTS_SYNCED",
            Event::RecordRead => "RECORD_READ",
            Event::ScanTableMissing => "SCAN_TABLE_MISSING",
            Event::AttachmentMissing => "ATTACHMENT_MISSING",
            Event::Serving => "DYNADOWN_SERVING",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::BatchRetry | Event::ScanTableMissing | Event::AttachmentMissing => {
                Severity::Warn
            }
            Event::BatchAbandoned | Event::RequestFailed => Severity::Error,
            Event::RecordRead => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
