//! ACP error types and their wire representation.
//!
//! Error codes follow JSON-RPC 2.0:
//! - -32700: Parse error
//! - -32600: Invalid request
//! - -32601: Method not found
//! - -32602: Invalid params
//! - -32603: Internal error
//! - -32002: Session not initialized (protocol-specific)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ErrorObject, error_codes};

/// ACP error type covering every error a target reports on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum AcpError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Session already initialized")]
    AlreadyInitialized,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AcpError {
    /// JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse { .. } => error_codes::PARSE_ERROR,
            Self::InvalidRequest { .. } | Self::AlreadyInitialized => {
                error_codes::INVALID_REQUEST
            }
            Self::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => error_codes::INVALID_PARAMS,
            Self::NotInitialized => error_codes::NOT_INITIALIZED,
            Self::Internal { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Structured details for the error, when any exist.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MethodNotFound { method } => Some(serde_json::json!({ "method": method })),
            _ => None,
        }
    }

    /// Convert to the wire error object.
    #[must_use]
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.to_string(),
            data: self.details(),
        }
    }
}

/// Result type alias for ACP operations.
pub type AcpResult<T> = Result<T, AcpError>;
