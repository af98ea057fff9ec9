//! Query string shaping for service requests.

use url::form_urlencoded;

use crate::error::Result;

pub mod filters;

pub use filters::{format_filters, FilterValue, Filters};

/// Request target for `path` under the versioned API `base`, with the query
/// pairs form-urlencoded. No `?` is added for an empty query.
pub fn join(base: &str, path: &str, query: &[(&str, String)]) -> String {
    let mut target = format!("{}{}", base.trim_end_matches('/'), path);
    if !query.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())))
            .finish();
        target.push('?');
        target.push_str(&encoded);
    }
    target
}

/// The `filters` query pair, or `None` when there are no criteria and the
/// parameter must be omitted.
pub fn filters_param(filters: &Filters) -> Result<Option<(&'static str, String)>> {
    let json = format_filters(filters)?;
    Ok(if json.is_empty() { None } else { Some(("filters", json)) })
}
