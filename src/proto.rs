use self::types::Value;

pub mod codec;
pub mod command;
pub mod lock;
pub mod protocol;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("Timed out waiting for the gauge")]
    Timeout,
    #[error("Communication error: {}", _0)]
    Communication(CommunicationError),
    #[error("Decoding error: {}", _0)]
    Decoding(#[from] DecodingError),
    #[error("Invalid value {value:?} for {name}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("Connection was closed")]
    Abort,
    #[error("Unexpected response: {:?}", _0)]
    Unexpected(Vec<Value>),
}

impl From<CommunicationError> for ProtoError {
    fn from(value: CommunicationError) -> Self {
        Self::Communication(value)
    }
}

impl ProtoError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        Self::InvalidArgument {
            name,
            value: value.to_string(),
        }
    }
}

/// Failure of the request/handshake/response exchange itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommunicationError {
    #[error("Acknowledgement error! Negative acknowledgement received")]
    Nack,
    #[error("Acknowledgement error! No acknowledgement was sent back from gauge: {:?}", _0)]
    NoAck(Vec<u8>),
    #[error("Received a timeout")]
    Timeout,
}

/// A response field did not match the shape declared by its command.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodingError {
    #[error("Unrecognized {table} code: {code:?}")]
    UnknownCode { table: &'static str, code: String },
    #[error("Invalid float literal: {:?}", _0)]
    InvalidFloat(String),
    #[error("Arity mismatch: expected {expected} fields, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Response is not ASCII: {:?}", _0)]
    NotAscii(Vec<u8>),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
