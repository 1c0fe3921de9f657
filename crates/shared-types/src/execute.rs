//! # Execute Envelope
//!
//! Result of calling a named method through a controller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code and response body of an execute call.
///
/// | status | meaning |
/// |--------|---------|
/// | 200 | method ran, `response` is its return value |
/// | 404 | no active module, or the module has no such method |
/// | 500 | the method itself reported a failure |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: u16,
    pub response: Value,
}

impl ExecuteResponse {
    pub const OK: u16 = 200;
    pub const NOT_FOUND: u16 = 404;
    pub const FAILED: u16 = 500;

    pub fn ok(response: Value) -> Self {
        Self {
            status: Self::OK,
            response,
        }
    }

    /// The inactive sentinel `{status: 404, response: null}`.
    pub fn not_found() -> Self {
        Self {
            status: Self::NOT_FOUND,
            response: Value::Null,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Self::FAILED,
            response: Value::String(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}
