//! Caller identity and tracing metadata, carried opaquely.

use crate::envelope::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque per-request metadata passed through to the transport untouched.
///
/// This core never inspects the contents beyond forwarding them; whatever a
/// deployment stores here (tenant, auth token, trace parent) is between the
/// caller and the executing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    request_id: String,
    #[serde(default)]
    metadata: Args,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            metadata: Args::new(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn metadata(&self) -> &Args {
        &self.metadata
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(
            RequestContext::new().request_id(),
            RequestContext::new().request_id()
        );
    }

    #[test]
    fn test_metadata_passes_through() {
        let ctx = RequestContext::new()
            .with_metadata("project_id", json!("p-1"))
            .with_metadata("trace", json!({"span": 7}));
        assert_eq!(ctx.metadata().get("project_id"), Some(&json!("p-1")));
        assert_eq!(ctx.metadata().get("trace"), Some(&json!({"span": 7})));
    }
}
