//! Media type helpers.

/// Lowercased `type/subtype` of a content type, parameters dropped.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True for `application/json` and structured `+json` types.
pub(crate) fn is_json(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}

/// How specifically `range` covers `essence`. Higher is better.
pub(crate) fn specificity(range: &str, essence: &str) -> Option<u8> {
    let range = range.trim().to_ascii_lowercase();
    if range == essence {
        return Some(2);
    }
    if range == "*/*" {
        return Some(0);
    }
    match (range.strip_suffix("/*"), essence.split_once('/')) {
        (Some(kind), Some((essence_kind, _))) if kind == essence_kind => Some(1),
        _ => None,
    }
}
