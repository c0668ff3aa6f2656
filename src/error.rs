use thiserror::Error;

/// Errors raised while talking to the package index or preparing its inputs.
#[derive(Error, Debug)]
pub enum Error {
    /// A requirement string did not start with a valid project name.
    #[error("malformed project name: {0:?}")]
    MalformedName(String),

    /// The index answered with a non-success HTTP status.
    #[error("index responded with status {status} for {url}")]
    RemoteFetch { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The RPC endpoint returned an XML-RPC fault.
    #[error("index fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The RPC body could not be decoded. An empty result from the index
    /// surfaces as this variant too.
    #[error("malformed index response: {0}")]
    MalformedResponse(String),

    #[error("invalid override table: {0}")]
    Overrides(#[from] serde_json::Error),

    #[error("no bundled resource named {0:?}")]
    UnknownResource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
