//! Route and service names from `*.routing.yml` / `*.services.yml`.

use crate::error::ParseError;
use serde_yaml::{Mapping, Value};

/// Top-level keys of a routing file, in file order.
pub fn route_names(source: &str) -> Result<Vec<String>, ParseError> {
    let document: Value = serde_yaml::from_str(source)?;
    Ok(document.as_mapping().map(string_keys).unwrap_or_default())
}

/// Keys under the top-level `services:` mapping, in file order.
///
/// The `_defaults` entry configures the other services and is not itself a
/// service.
pub fn service_names(source: &str) -> Result<Vec<String>, ParseError> {
    let document: Value = serde_yaml::from_str(source)?;
    let services = document
        .as_mapping()
        .and_then(|m| m.get("services"))
        .and_then(Value::as_mapping);

    Ok(services
        .map(string_keys)
        .unwrap_or_default()
        .into_iter()
        .filter(|name| name != "_defaults")
        .collect())
}

fn string_keys(mapping: &Mapping) -> Vec<String> {
    mapping
        .keys()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect()
}
