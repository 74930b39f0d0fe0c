//! Error types. Read failures never surface; these are for transport,
//! identity and configuration edges.

use thiserror::Error;

/// A ledger call that could not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("ledger unreachable: {0}")]
    Unreachable(String),
    #[error("call rejected by replica: {0}")]
    Rejected(String),
    #[error("malformed reply: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("principal text is empty")]
    Empty,
    #[error("invalid character {0:?} in principal text")]
    InvalidChar(char),
    #[error("principal is {0} bytes, at most 29 allowed")]
    TooLong(usize),
    #[error("principal checksum mismatch")]
    Checksum,
    #[error("principal text is not in canonical form, expected {expected}")]
    NotCanonical { expected: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("config: {0}")]
    Config(String),
    #[error("auth: {0}")]
    Auth(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Principal(#[from] PrincipalError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
