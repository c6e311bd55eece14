use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Gateway returned HTTP {status}: {body}")]
    GatewayError { status: u16, body: String },
    #[error("Invalid gateway response: {0}")]
    InvalidGatewayResponse(String),
    #[error("Gateway request timed out")]
    TimeoutError,
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

impl CheckoutError {
    /// Whether the caller can retry the same flow with corrected input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFoundError(_) | Self::ValidationError(_))
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
