//! Error types for koho-resources.

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

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput(message.into()))
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedResponse(message.into()))
    }

    /// The underlying client error, if the request itself failed.
    pub fn client_error(&self) -> Option<&koho_api_client::Error> {
        let source = self.source.as_deref()?;
        if let Some(err) = source.downcast_ref::<koho_api_client::Error>() {
            return Some(err);
        }
        source
            .downcast_ref::<koho_api_export::Error>()
            .and_then(|err| err.source.as_deref())
            .and_then(|inner| inner.downcast_ref::<koho_api_client::Error>())
    }

    /// Returns true if the API reported `status: "error"`.
    pub fn is_api_error(&self) -> bool {
        self.client_error().is_some_and(koho_api_client::Error::is_api_error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<koho_api_client::Error> for Error {
    fn from(err: koho_api_client::Error) -> Self {
        Error { kind: ErrorKind::Client(err.to_string()), source: Some(Box::new(err)) }
    }
}

impl From<koho_api_export::Error> for Error {
    fn from(err: koho_api_export::Error) -> Self {
        Error { kind: ErrorKind::Export(err.to_string()), source: Some(Box::new(err)) }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error { kind: ErrorKind::UnexpectedResponse(err.to_string()), source: Some(Box::new(err)) }
    }
}
