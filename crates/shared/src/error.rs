use serde::{Deserialize, Serialize};

/// Error body returned by the trip service on non-2xx responses.
///
/// Validation failures carry a list of field errors under `detail`, everything
/// else a plain string, so the raw JSON value is kept and flattened on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            detail: serde_json::Value::String(message.into()),
        }
    }

    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
