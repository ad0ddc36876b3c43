//! Captured path parameters.
//!
//! Most contract paths carry one or two templated segments, so captures are
//! kept inline until they spill past [`INLINE_PARAMS`].

use smallvec::SmallVec;

/// Number of captures stored without a heap allocation.
const INLINE_PARAMS: usize = 4;

/// Path parameters captured while matching a request path.
///
/// Names are unique within a single template, so lookups by name are
/// unambiguous.
///
/// # Example
///
/// ```rust
/// use tollgate_router::Params;
///
/// let mut params = Params::new();
/// params.push("orgId", "acme");
/// params.push("userId", "42");
///
/// assert_eq!(params.get("userId"), Some("42"));
/// assert_eq!(params.get("teamId"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a captured segment.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the captured value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops captures recorded after the first `len`.
    ///
    /// Used when a parameter branch fails to match and the matcher backs out.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); INLINE_PARAMS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        params.push("id", "123");
        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_truncate_backs_out_captures() {
        let mut params = Params::new();
        params.push("orgId", "acme");
        let mark = params.len();
        params.push("userId", "7");
        params.truncate(mark);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("userId"), None);
        assert_eq!(params.get("orgId"), Some("acme"));
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let params: Params = (0..6)
            .map(|i| (format!("p{i}"), i.to_string()))
            .collect();
        assert_eq!(params.len(), 6);
        assert_eq!(params.get("p5"), Some("5"));
    }

    #[test]
    fn test_into_iter_preserves_order() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        let pairs: Vec<_> = params.into_iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }
}
