#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No connection is configured, or the server could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The edit references offsets that do not exist in the current text.
    /// The document is left untouched; the host must resubmit.
    #[error("Edit conflict on {key}: {start}..{end} is outside 0..{len} or splits a character")]
    EditConflict {
        key: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Document already open: {0}")]
    DocumentExists(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl From<confique::Error> for Error {
    fn from(value: confique::Error) -> Self {
        Error::Config(value.to_string())
    }
}
