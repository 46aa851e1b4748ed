//! Two-source field resolution.
//!
//! The target URL and the payload may each arrive as a query parameter or as
//! a field of the JSON body. When both are present the query value wins,
//! even if the two differ.

/// Pick a field from the query string or the body, query first.
pub fn resolve_field<'a>(query: Option<&'a str>, body: Option<&'a str>) -> Option<&'a str> {
    query.or(body)
}
