//! Contract handling for tollgate.
//!
//! This crate turns an OpenAPI 3.x document into the two capabilities the
//! validation middleware is built on:
//!
//! - [`RouteMatcher`]: resolves a request to a compiled [`Operation`] and
//!   its path parameters, or to a classified [`RouteError`].
//! - [`ValidationEngine`]: checks a request or a captured response against
//!   that operation, reporting a [`RequestError`] or [`ResponseError`] with
//!   an optional field-level [`SchemaViolation`].
//!
//! [`ContractRouter`] and [`JsonSchemaEngine`] are the implementations
//! shipped here. Both are immutable after construction and safe to share
//! across concurrent requests.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use http::{HeaderMap, Method, Uri};
//! use tollgate_contract::{
//!     ContractRouter, JsonSchemaEngine, RequestSnapshot, RequestValidationInput, RouteMatcher,
//!     ValidationEngine, ValidationOptions,
//! };
//!
//! let router = ContractRouter::from_json(r#"{
//!     "openapi": "3.0.3",
//!     "paths": {"/users/{id}": {"get": {
//!         "operationId": "getUser",
//!         "parameters": [
//!             {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}
//!         ],
//!         "responses": {"200": {"description": "ok"}}
//!     }}}
//! }"#).unwrap();
//!
//! let uri = Uri::from_static("/users/abc");
//! let route = router.find_route(&Method::GET, &uri).unwrap();
//! let input = RequestValidationInput {
//!     request: Arc::new(RequestSnapshot::new(Method::GET, uri, HeaderMap::new(), Bytes::new())),
//!     path_params: route.path_params,
//!     operation: route.operation,
//!     options: Arc::new(ValidationOptions::default()),
//! };
//!
//! let err = JsonSchemaEngine::new().validate_request(&input).unwrap_err();
//! assert_eq!(err.violation().unwrap().field, "/id");
//! ```

mod coerce;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod input;
mod media;
pub mod operation;
pub mod router;
pub mod schema;

pub use config::ValidationOptions;
pub use document::{ApiDocument, ContractLoader, ParameterLocation};
pub use engine::{JsonSchemaEngine, ValidationEngine};
pub use error::{
    BoxError, ContractError, ContractResult, RequestError, RequestLocation, ResponseError,
    RouteError, SchemaViolation,
};
pub use input::{RequestSnapshot, RequestValidationInput, ResponseValidationInput};
pub use operation::{Content, MediaType, Operation, Parameter, RequestBody};
pub use router::{ContractRouter, PathParams, ResolvedRoute, RouteMatcher};
pub use schema::{CompiledSchema, SchemaDialect};
