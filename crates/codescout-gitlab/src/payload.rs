//! Element-wise decoding of list responses.

use codescout_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Decode a JSON array body into `T`s.
///
/// Elements that do not match `T` are logged and dropped. A body that is not
/// a JSON array fails with [`Error::Payload`].
pub fn parse_list<T: DeserializeOwned>(what: &str, body: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Payload(format!("{} response is not JSON: {}", what, e)))?;

    let Value::Array(elements) = value else {
        return Err(Error::Payload(format!(
            "{} response is not a list: {}",
            what,
            preview(body)
        )));
    };

    let total = elements.len();
    let parsed: Vec<T> = elements
        .into_iter()
        .enumerate()
        .filter_map(|(i, element)| match serde_json::from_value(element) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Dropping malformed {} element #{}: {}", what, i, e);
                None
            }
        })
        .collect();

    if parsed.len() < total {
        warn!("Kept {} of {} {} elements", parsed.len(), total, what);
    }
    Ok(parsed)
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 120;
    match body.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
