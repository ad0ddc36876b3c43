//! Validation options.
//!
//! [`ValidationOptions`] is handed through the middleware untouched and read
//! only by the validation engine.

use serde::{Deserialize, Serialize};

/// Toggles consumed by the validation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Skip request body checks.
    pub exclude_request_body: bool,
    /// Skip response body checks.
    pub exclude_response_body: bool,
    /// Reject responses whose status the operation does not declare
    /// (neither exactly, by range, nor through `default`).
    pub include_response_status: bool,
}

impl ValidationOptions {
    /// Checks everything, including undeclared response statuses.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            include_response_status: true,
            ..Self::default()
        }
    }

    /// Checks requests only; response bodies pass through unchecked.
    #[must_use]
    pub fn request_only() -> Self {
        Self {
            exclude_response_body: true,
            ..Self::default()
        }
    }
}
