//! Radix tree path matcher for tollgate.
//!
//! Contract documents describe operations as `(method, path template)` pairs.
//! This crate indexes those pairs in a radix tree so a concrete request path
//! resolves in time proportional to its segment count, and it reports *why*
//! a lookup failed: no template matched the path at all, or a template
//! matched but the method is not registered on it. Callers answer those two
//! cases differently (404 versus 405), so the distinction is part of the
//! lookup result rather than something recovered afterwards.
//!
//! # Example
//!
//! ```rust
//! use tollgate_router::{MethodRouter, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(
//!     "/orgs/{orgId}/users/{userId}",
//!     MethodRouter::new().on(Method::GET, "getOrgUser"),
//! );
//!
//! let hit = router.lookup(&Method::GET, "/orgs/acme/users/7").unwrap();
//! assert_eq!(hit.operation_id, "getOrgUser");
//! assert_eq!(hit.params.get("orgId"), Some("acme"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!              (root)
//!                │
//!             "users"  [POST]
//!                │
//!              "{id}"  [GET, DELETE]
//! ```

mod method_router;
mod node;
mod params;
mod router;

use http::Method;
use thiserror::Error;

pub use method_router::MethodRouter;
pub use node::{validate_template, Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Operation id registered for the method and template.
    pub operation_id: &'a str,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a> RouteMatch<'a> {
    /// Creates a route match.
    #[must_use]
    pub fn new(operation_id: &'a str, params: Params) -> Self {
        Self {
            operation_id,
            params,
        }
    }
}

/// Why a lookup produced no operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    /// No template matches the path.
    NotFound,
    /// Templates match the path but none declares the method.
    MethodNotAllowed {
        /// Methods registered on the path-matching templates.
        allowed: Vec<Method>,
    },
}

/// A path template segment the tree cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported segment '{segment}' in path template '{template}'")]
pub struct InvalidTemplate {
    /// The full template.
    pub template: String,
    /// The offending segment.
    pub segment: String,
}
