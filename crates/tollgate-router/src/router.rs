//! Router front end.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::{RouteMatch, RouteMiss};

/// Radix tree router keyed by path template and method.
///
/// # Example
///
/// ```rust
/// use tollgate_router::{MethodRouter, RouteMiss, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users", MethodRouter::new().on(Method::POST, "createUser"));
/// router.insert("/users/{id}", MethodRouter::new().on(Method::GET, "getUser"));
///
/// let hit = router.lookup(&Method::GET, "/users/123").unwrap();
/// assert_eq!(hit.operation_id, "getUser");
/// assert_eq!(hit.params.get("id"), Some("123"));
///
/// assert_eq!(
///     router.lookup(&Method::GET, "/users").unwrap_err(),
///     RouteMiss::MethodNotAllowed { allowed: vec![Method::POST] },
/// );
/// assert_eq!(router.lookup(&Method::GET, "/teams").unwrap_err(), RouteMiss::NotFound);
/// ```
///
/// # Route Priority
///
/// Static segments are tried before parameter segments at every depth, so
/// `/users/me` wins over `/users/{id}` for the path `/users/me`.
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a method table on a path template.
    ///
    /// Segments are taken as given; run [`validate_template`] first when
    /// the template comes from untrusted input.
    ///
    /// [`validate_template`]: crate::validate_template
    pub fn insert(&mut self, template: &str, methods: MethodRouter) {
        self.root.insert(template, methods);
        self.route_count += 1;
    }

    /// Registers a single method on a path template.
    pub fn route(&mut self, method: Method, template: &str, operation_id: impl Into<String>) {
        self.insert(template, MethodRouter::new().on(method, operation_id));
    }

    /// Resolves `method` and `path` to an operation.
    ///
    /// Every template matching `path` is considered before giving up, so a
    /// static template lacking `method` does not hide a parameter template
    /// that declares it. A path that matches no template is
    /// [`RouteMiss::NotFound`]; a path whose templates all lack `method` is
    /// [`RouteMiss::MethodNotAllowed`] listing the union of their methods.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteMiss`] describing why nothing matched.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RouteMiss> {
        let (operation_id, params) = self.root.match_path(method, path)?;
        Ok(RouteMatch::new(operation_id, params))
    }

    /// Number of `insert`/`route` calls made.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
