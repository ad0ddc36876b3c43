//! Route matching against a contract.
//!
//! [`RouteMatcher`] is the seam the middleware resolves requests through.
//! [`ContractRouter`] is the implementation backed by a compiled document
//! and a radix tree.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use http::{Method, Uri};
use tollgate_router::{validate_template, MethodRouter, Params, RouteMiss, Router};
use tracing::{debug, info};

use crate::document::{ApiDocument, ContractLoader};
use crate::error::{ContractError, ContractResult, RouteError};
use crate::operation::Operation;
use crate::schema::SchemaDialect;

/// Path parameters captured by a route lookup, keyed by template name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Adds or replaces a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Params> for PathParams {
    fn from(params: Params) -> Self {
        Self(params.into_iter().collect())
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A request resolved to an operation.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// The matched operation.
    pub operation: Arc<Operation>,
    /// Captured path parameters.
    pub path_params: PathParams,
}

/// Maps a request to the operation it targets.
pub trait RouteMatcher: Send + Sync {
    /// Finds the operation for `method` and `uri`.
    fn find_route(&self, method: &Method, uri: &Uri) -> Result<ResolvedRoute, RouteError>;
}

impl<T: RouteMatcher + ?Sized> RouteMatcher for Arc<T> {
    fn find_route(&self, method: &Method, uri: &Uri) -> Result<ResolvedRoute, RouteError> {
        (**self).find_route(method, uri)
    }
}

/// Route matcher compiled from a contract document.
///
/// # Example
///
/// ```rust
/// use http::{Method, Uri};
/// use tollgate_contract::{ContractRouter, RouteMatcher};
///
/// let router = ContractRouter::from_json(r#"{
///     "openapi": "3.0.3",
///     "paths": {
///         "/users/{id}": {
///             "get": {"operationId": "getUser", "responses": {"200": {"description": "ok"}}}
///         }
///     }
/// }"#).unwrap();
///
/// let route = router.find_route(&Method::GET, &Uri::from_static("/users/7")).unwrap();
/// assert_eq!(route.operation.id(), "getUser");
/// assert_eq!(route.path_params.get("id"), Some("7"));
/// ```
#[derive(Debug)]
pub struct ContractRouter {
    tree: Router,
    operations: HashMap<String, Arc<Operation>>,
    base_paths: Vec<String>,
}

impl ContractRouter {
    /// Compiles every operation in `document` and indexes it.
    ///
    /// Path templates whose segments mix literal text with a parameter,
    /// such as `/report.{format}`, are rejected.
    pub fn new(document: &ApiDocument) -> ContractResult<Self> {
        let dialect = SchemaDialect::for_document(document);
        let mut tree = Router::new();
        let mut operations = HashMap::new();

        for (template, item) in &document.paths {
            validate_template(template)?;
            let mut methods = MethodRouter::new();
            for (method, spec) in item.operations() {
                let operation =
                    Operation::compile(document, dialect, template, item, method.clone(), spec)?;
                let id = operation.id().to_string();
                if operations.contains_key(&id) {
                    return Err(ContractError::DuplicateOperationId(id));
                }
                methods = methods.on(method, id.clone());
                operations.insert(id, Arc::new(operation));
            }
            if !methods.is_empty() {
                tree.insert(template, methods);
            }
        }

        let mut base_paths: Vec<String> = document
            .servers
            .iter()
            .map(|server| server.base_path().to_string())
            .collect();
        base_paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        base_paths.dedup();

        info!(
            title = %document.info.title,
            operations = operations.len(),
            routes = tree.len(),
            "contract router initialized"
        );

        Ok(Self {
            tree,
            operations,
            base_paths,
        })
    }

    /// Parses and compiles a JSON document.
    pub fn from_json(json: &str) -> ContractResult<Self> {
        Self::new(&ContractLoader::from_json(json)?)
    }

    /// Loads and compiles a JSON document from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> ContractResult<Self> {
        Self::new(&ContractLoader::from_file(path).await?)
    }

    /// Operation by id.
    #[must_use]
    pub fn operation(&self, id: &str) -> Option<&Arc<Operation>> {
        self.operations.get(id)
    }

    /// Every compiled operation, in no particular order.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.operations.values()
    }

    /// Number of compiled operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when the document declares no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn strip_base<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base_paths.is_empty() {
            return Some(path);
        }
        self.base_paths.iter().find_map(|base| {
            if base.is_empty() {
                return Some(path);
            }
            let rest = path.strip_prefix(base.as_str())?;
            match rest {
                "" => Some("/"),
                rest if rest.starts_with('/') => Some(rest),
                _ => None,
            }
        })
    }
}

impl RouteMatcher for ContractRouter {
    fn find_route(&self, method: &Method, uri: &Uri) -> Result<ResolvedRoute, RouteError> {
        let raw = uri.path();
        let not_found = || RouteError::NotFound {
            method: method.clone(),
            path: raw.to_string(),
        };

        let path = self.strip_base(raw).ok_or_else(not_found)?;
        match self.tree.lookup(method, path) {
            Ok(hit) => {
                let operation = self
                    .operations
                    .get(hit.operation_id)
                    .cloned()
                    .ok_or_else(|| {
                        let id = hit.operation_id.to_string();
                        RouteError::other(ContractError::UnknownOperation(id))
                    })?;
                debug!(operation_id = operation.id(), path = raw, "route resolved");
                Ok(ResolvedRoute {
                    operation,
                    path_params: hit.params.into(),
                })
            }
            Err(RouteMiss::NotFound) => Err(not_found()),
            Err(RouteMiss::MethodNotAllowed { allowed }) => Err(RouteError::MethodNotAllowed {
                method: method.clone(),
                path: raw.to_string(),
                allowed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router(servers: serde_json::Value) -> ContractRouter {
        let doc = ContractLoader::from_value(json!({
            "openapi": "3.0.3",
            "servers": servers,
            "paths": {
                "/users": {"post": {"operationId": "createUser", "responses": {}}},
                "/users/{id}": {"get": {"operationId": "getUser", "responses": {}}},
                "/users/me": {"get": {"responses": {}}}
            }
        }))
        .unwrap();
        ContractRouter::new(&doc).unwrap()
    }

    #[test]
    fn test_find_route_with_params() {
        let router = router(json!([]));
        let route = router
            .find_route(&Method::GET, &Uri::from_static("/users/42?verbose=true"))
            .unwrap();
        assert_eq!(route.operation.id(), "getUser");
        assert_eq!(route.path_params.get("id"), Some("42"));
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_static_route_wins() {
        let router = router(json!([]));
        let route = router
            .find_route(&Method::GET, &Uri::from_static("/users/me"))
            .unwrap();
        assert_eq!(route.operation.id(), "GET /users/me");
        assert!(route.path_params.is_empty());
    }

    #[test]
    fn test_not_found_and_method_not_allowed() {
        let router = router(json!([]));
        let err = router
            .find_route(&Method::GET, &Uri::from_static("/unknown"))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = router
            .find_route(&Method::GET, &Uri::from_static("/users"))
            .unwrap_err();
        match err {
            RouteError::MethodNotAllowed { allowed, path, .. } => {
                assert_eq!(allowed, vec![Method::POST]);
                assert_eq!(path, "/users");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_server_base_path_is_required() {
        let router = router(json!([{"url": "https://api.example.com/v1"}]));
        assert!(router
            .find_route(&Method::GET, &Uri::from_static("/v1/users/1"))
            .is_ok());
        assert!(router
            .find_route(&Method::GET, &Uri::from_static("/users/1"))
            .unwrap_err()
            .is_not_found());
        assert!(router
            .find_route(&Method::GET, &Uri::from_static("/v10/users/1"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_bare_server_keeps_root() {
        let router = router(json!([{"url": "https://api.example.com"}]));
        assert!(router
            .find_route(&Method::GET, &Uri::from_static("/users/1"))
            .is_ok());
    }

    #[test]
    fn test_method_mismatch_falls_through_to_param_template() {
        let router = ContractRouter::from_json(
            r#"{"openapi": "3.0.3", "paths": {
                "/users/me": {"get": {"operationId": "getMe", "responses": {}}},
                "/users/{id}": {"delete": {"operationId": "deleteUser", "responses": {}}}
            }}"#,
        )
        .unwrap();

        let route = router
            .find_route(&Method::DELETE, &Uri::from_static("/users/me"))
            .unwrap();
        assert_eq!(route.operation.id(), "deleteUser");
        assert_eq!(route.path_params.get("id"), Some("me"));

        let err = router
            .find_route(&Method::PATCH, &Uri::from_static("/users/me"))
            .unwrap_err();
        match err {
            RouteError::MethodNotAllowed { allowed, .. } => {
                assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_template_segment_is_rejected() {
        let err = ContractRouter::from_json(
            r#"{"openapi": "3.0.3", "paths": {
                "/reports/report.{format}": {"get": {"operationId": "getReport", "responses": {}}}
            }}"#,
        )
        .unwrap_err();
        match err {
            ContractError::InvalidPathTemplate(invalid) => {
                assert_eq!(invalid.segment, "report.{format}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_operation_id() {
        let err = ContractRouter::from_json(
            r#"{"openapi": "3.0.3", "paths": {
                "/a": {"get": {"operationId": "same", "responses": {}}},
                "/b": {"get": {"operationId": "same", "responses": {}}}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateOperationId(id) if id == "same"));
    }

    #[test]
    fn test_path_params_from_router_params() {
        let params: Params = vec![("id".to_string(), "7".to_string())].into_iter().collect();
        let converted = PathParams::from(params);
        assert_eq!(converted.get("id"), Some("7"));
        assert_eq!(converted.len(), 1);
    }
}
