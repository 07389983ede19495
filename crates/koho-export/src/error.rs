//! Error types for koho-export.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Shorthand for a malformed table.
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataFormat(message.into()))
    }

    /// Returns true if the export payload did not have the expected shape.
    pub fn is_data_format(&self) -> bool {
        matches!(self.kind, ErrorKind::DataFormat(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Malformed export table: {0}")]
    DataFormat(String),
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<koho_api_client::Error> for Error {
    fn from(err: koho_api_client::Error) -> Self {
        Error { kind: ErrorKind::Client(err.to_string()), source: Some(Box::new(err)) }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error { kind: ErrorKind::Csv(err.to_string()), source: Some(Box::new(err)) }
    }
}
