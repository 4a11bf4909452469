use thiserror::Error;

/// Errors surfaced to the caller by registration and activation.
///
/// Transport failures are deliberately absent here: a failed fetch is
/// recovered inside the engine (logged, state untouched) and never
/// propagated. See [`TransportError`] for the transport-level taxonomy.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A file-based language was registered while no base URL was configured.
    #[error("language {key:?} uses a file name but no base URL is configured (set the base URL before registering)")]
    Configuration { key: String },

    /// An activation or lookup named a key that was never registered.
    #[error("language map does not contain key {0:?}; maybe you forgot to register this language?")]
    UnknownLanguage(String),
}

/// Errors produced by a [`Transport`](crate::Transport) implementation or by
/// decoding the fetched document.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status code.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body was not a valid language pack document.
    #[error("failed to decode language pack: {0}")]
    Decode(#[from] serde_json::Error),
}
