//! Per-path method table.
//!
//! A [`MethodRouter`] holds the operation ids registered on one path
//! template. Any [`Method`] is accepted, including extension methods such as
//! `QUERY`, so a contract can describe whatever verbs it needs.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to operation ids for a single path template.
///
/// # Example
///
/// ```rust
/// use tollgate_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .on(Method::GET, "listUsers")
///     .on(Method::POST, "createUser");
///
/// assert_eq!(router.operation(&Method::GET), Some("listUsers"));
/// assert_eq!(router.operation(&Method::DELETE), None);
/// assert_eq!(router.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, String); 4]>,
}

impl MethodRouter {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operation_id` for `method`, replacing an earlier entry.
    #[must_use]
    pub fn on(mut self, method: Method, operation_id: impl Into<String>) -> Self {
        self.set(method, operation_id.into());
        self
    }

    fn set(&mut self, method: Method, operation_id: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            entry.1 = operation_id;
        } else {
            self.entries.push((method, operation_id));
        }
    }

    /// Returns the operation id registered for `method`.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, id)| id.as_str())
    }

    /// Merges `other` into this table. Existing entries win.
    pub fn merge(&mut self, other: MethodRouter) {
        for (method, id) in other.entries {
            if self.operation(&method).is_none() {
                self.entries.push((method, id));
            }
        }
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Methods registered on this path, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }
}
