use serde_json::{json, Value};

/// JSON-RPC 2.0 error codes used when reporting a [`PulseError`] to a host.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Upstream (explorer or chain node) failure.
    pub const UPSTREAM_ERROR: i64 = -32000;
}

#[derive(thiserror::Error, Debug)]
pub enum PulseError {
    #[error("{target} query failed: {reason}")]
    QueryFailed {
        target: &'static str,
        status: Option<u16>,
        reason: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("method not found: {method}")]
    UnknownRequestMethod { method: String },
    #[error("invalid popularity tier: {0}")]
    InvalidTier(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("feedback has already been recorded for this dialog")]
    FeedbackAlreadyRecorded,
}

pub type Result<T> = std::result::Result<T, PulseError>;

impl PulseError {
    pub fn transport(target: &'static str, err: impl std::fmt::Display) -> Self {
        Self::QueryFailed {
            target,
            status: None,
            reason: err.to_string(),
        }
    }

    pub fn status(target: &'static str, status: u16) -> Self {
        Self::QueryFailed {
            target,
            status: Some(status),
            reason: format!("unexpected HTTP status {}", status),
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Transport failures, 5xx and 429 are transient; everything else,
    /// malformed bodies included, is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueryFailed { status: None, .. } => true,
            Self::QueryFailed {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::UnknownRequestMethod { .. } => codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::InvalidTier(_) | Self::FeedbackAlreadyRecorded => {
                codes::INVALID_PARAMS
            }
            Self::QueryFailed { .. } => codes::UPSTREAM_ERROR,
            Self::MalformedResponse(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Short, host-facing message for the JSON-RPC `message` field.
    pub fn rpc_message(&self) -> &'static str {
        match self {
            Self::UnknownRequestMethod { .. } => "Method not found",
            Self::InvalidParams(_) | Self::InvalidTier(_) | Self::FeedbackAlreadyRecorded => {
                "Invalid params"
            }
            Self::QueryFailed { .. } => "Upstream query failed",
            Self::MalformedResponse(_) => "Internal error",
        }
    }

    /// Structured diagnostic data attached to the JSON-RPC error.
    pub fn rpc_data(&self) -> Option<Value> {
        match self {
            Self::UnknownRequestMethod { method } => Some(json!({ "method": method })),
            Self::QueryFailed {
                target,
                status,
                reason,
            } => Some(json!({ "target": target, "status": status, "reason": reason })),
            Self::InvalidTier(value) => Some(json!({ "tier": value })),
            Self::MalformedResponse(reason) | Self::InvalidParams(reason) => {
                Some(json!({ "reason": reason }))
            }
            Self::FeedbackAlreadyRecorded => None,
        }
    }
}
