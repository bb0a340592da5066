use std::time::Duration;

use thiserror::Error;

use crate::messaging::SerializationError;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("empty worker address")]
    EmptyAddress,
    #[error("worker {0} is not registered")]
    NotFound(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no workers available, start at least one worker first")]
    NoWorkers,
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] SerializationError),
    #[error("call to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },
    #[error("frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),
    #[error("remote fault: {0}")]
    Remote(String),
    #[error("unexpected reply, wanted {0}")]
    UnexpectedResponse(&'static str),
}

/// Failures raised by the worker-side handlers.
#[derive(Error, Debug, PartialEq)]
pub enum ServiceError {
    #[error("fibonacci index cannot be negative: {0}")]
    NegativeIndex(i64),
    #[error("fibonacci({0}) overflows a 64-bit integer")]
    Overflow(i64),
    #[error("counter key cannot be empty")]
    EmptyKey,
    #[error("counter store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("method {0} is not served here")]
    Unsupported(&'static str),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
