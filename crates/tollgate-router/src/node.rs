//! Radix tree node.
//!
//! Each node owns one path segment. Static children are kept sorted for
//! binary search; parameter children are tried in insertion order because
//! two templates may name the same position differently
//! (`/users/{id}` and `/users/{userId}/posts`).

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::{InvalidTemplate, RouteMiss};

/// Kind of path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `users`.
    Static,
    /// Templated segment such as `{id}`, carrying the parameter name.
    Param(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Raw segment text (`users`, `{id}`).
    pub segment: String,
    /// Segment kind.
    pub kind: SegmentKind,
    /// Methods registered on the template that ends at this node.
    pub methods: Option<MethodRouter>,
    static_children: Vec<Node>,
    param_children: Vec<Node>,
}

impl Node {
    /// Creates a static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    /// Creates the tree root.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a path template, merging with methods already registered on it.
    pub fn insert(&mut self, template: &str, methods: MethodRouter) {
        let segments = parse_template(template);
        self.insert_segments(&segments, methods);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter) {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        let child = match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children.insert(i, Node::new_static(segment.clone()));
                        &mut self.static_children[i]
                    }
                }
            }
            SegmentKind::Param(name) => {
                let position = self
                    .param_children
                    .iter()
                    .position(|c| c.kind == SegmentKind::Param(name.clone()));
                let i = position.unwrap_or_else(|| {
                    self.param_children.push(Node::new_param(name.clone()));
                    self.param_children.len() - 1
                });
                &mut self.param_children[i]
            }
        };
        child.insert_segments(rest, methods);
    }

    /// Matches a concrete request path and method.
    ///
    /// A terminal node that lacks `method` does not end the search: sibling
    /// branches are still tried, and the methods seen on path-matching
    /// templates are reported only if no template accepts `method`.
    pub fn match_path(&self, method: &Method, path: &str) -> Result<(&str, Params), RouteMiss> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let mut allowed = None;
        match self.match_segments(method, &segments, &mut params, &mut allowed) {
            Some(operation_id) => Ok((operation_id, params)),
            None => match allowed {
                Some(allowed) => Err(RouteMiss::MethodNotAllowed { allowed }),
                None => Err(RouteMiss::NotFound),
            },
        }
    }

    fn match_segments<'a>(
        &'a self,
        method: &Method,
        segments: &[&str],
        params: &mut Params,
        allowed: &mut Option<Vec<Method>>,
    ) -> Option<&'a str> {
        let Some((segment, rest)) = segments.split_first() else {
            let methods = self.methods.as_ref().filter(|m| !m.is_empty())?;
            if let Some(operation_id) = methods.operation(method) {
                return Some(operation_id);
            }
            let seen = allowed.get_or_insert_with(Vec::new);
            for candidate in methods.allowed_methods() {
                if !seen.contains(&candidate) {
                    seen.push(candidate);
                }
            }
            return None;
        };

        if let Ok(i) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            let child = &self.static_children[i];
            if let Some(found) = child.match_segments(method, rest, params, allowed) {
                return Some(found);
            }
        }

        for child in &self.param_children {
            let SegmentKind::Param(name) = &child.kind else {
                continue;
            };
            let mark = params.len();
            params.push(name.clone(), *segment);
            if let Some(found) = child.match_segments(method, rest, params, allowed) {
                return Some(found);
            }
            params.truncate(mark);
        }

        None
    }
}

/// Checks that every templated segment of `template` is a whole `{name}`.
///
/// Segments such as `report.{format}` mix literal text with a template and
/// cannot be represented in the tree; [`Node::insert`] would store them as
/// literals that never match a real path.
///
/// # Errors
///
/// Returns [`InvalidTemplate`] naming the first offending segment.
pub fn validate_template(template: &str) -> Result<(), InvalidTemplate> {
    let invalid = template
        .split('/')
        .find(|s| (s.contains('{') || s.contains('}')) && param_name(s).is_none());
    match invalid {
        Some(segment) => Err(InvalidTemplate {
            template: template.to_string(),
            segment: segment.to_string(),
        }),
        None => Ok(()),
    }
}

fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
}

/// Splits a template into typed segments. Empty segments are ignored, so
/// `/users/` and `/users` are the same template.
fn parse_template(template: &str) -> Vec<(String, SegmentKind)> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match param_name(s) {
            Some(name) => (s.to_string(), SegmentKind::Param(name.to_string())),
            None => (s.to_string(), SegmentKind::Static),
        })
        .collect()
}
