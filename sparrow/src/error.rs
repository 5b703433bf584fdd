/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;
use std::io;

/// Per-binding expression failure. Local to one solution: a FILTER drops the
/// binding, a BIND leaves the target variable unbound. Never aborts the
/// surrounding query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expression error: {}", self.message)
    }
}

impl Error for EvalError {}

/// Boundary failures that abort the query before or instead of evaluation.
#[derive(Debug)]
pub enum QueryError {
    /// Structurally unusable algebra, rejected before evaluation starts.
    InvalidAlgebra(String),
    /// A describer name no variant answers to; construction-time failure.
    UnknownDescriber(String),
    /// A named graph the dataset does not hold.
    UnknownGraph(String),
    /// Failure talking to a remote endpoint.
    Client(ClientError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidAlgebra(detail) => write!(f, "invalid algebra: {}", detail),
            QueryError::UnknownDescriber(name) => write!(f, "unknown describer: {}", name),
            QueryError::UnknownGraph(name) => write!(f, "unknown graph: {}", name),
            QueryError::Client(err) => write!(f, "remote query failed: {}", err),
        }
    }
}

impl Error for QueryError {}

impl From<ClientError> for QueryError {
    fn from(err: ClientError) -> Self {
        QueryError::Client(err)
    }
}

/// Remote endpoint failures. `Status` keeps the HTTP status code in the
/// message so a caller can diagnose without re-running the request.
#[derive(Debug)]
pub enum ClientError {
    InvalidEndpoint(String),
    Io(io::Error),
    MalformedResponse(String),
    Status { code: u16, body: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidEndpoint(url) => write!(f, "invalid endpoint url: {}", url),
            ClientError::Io(err) => write!(f, "endpoint io error: {}", err),
            ClientError::MalformedResponse(detail) => {
                write!(f, "malformed http response: {}", detail)
            }
            ClientError::Status { code, body } => {
                write!(f, "endpoint returned status {}: {}", code, body)
            }
        }
    }
}

impl Error for ClientError {}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        ClientError::Io(err)
    }
}

impl From<httparse::Error> for ClientError {
    fn from(err: httparse::Error) -> Self {
        ClientError::MalformedResponse(err.to_string())
    }
}

/// Failure delivered on the async completion channel. Worker panics are
/// captured and arrive here instead of unwinding a background thread.
#[derive(Debug, Clone)]
pub struct AsyncQueryError {
    pub message: String,
}

impl AsyncQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        AsyncQueryError {
            message: message.into(),
        }
    }
}

impl fmt::Display for AsyncQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "async query failed: {}", self.message)
    }
}

impl Error for AsyncQueryError {}
