//! Upstream content-type classification.

/// Marker that selects JSON decoding of an upstream body.
pub const JSON_MARKER: &str = "application/json";

/// True if the content-type header value contains `application/json`.
///
/// Substring match, so parameters (`; charset=utf-8`) and vendor suffixes
/// around the marker still select JSON. An absent header is text.
pub fn contains_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.contains(JSON_MARKER))
}
