//! The `{method, args, version}` unit of wire transmission.

use crate::error::{CellsError, CellsResult};
use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named arguments carried by an envelope. Values are structured data only;
/// the receiver executes in a separate process and never sees live references.
pub type Args = serde_json::Map<String, Value>;

/// An immutable message envelope, created per call, transmitted, discarded.
///
/// The receiving side must interpret any envelope whose `version` is at or
/// below the version it implements for that method; envelopes stamped with
/// newer versions are rejected by policy (see
/// [`VersionResolver::check_inbound`](crate::VersionResolver::check_inbound)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub method: String,
    pub args: Args,
    pub version: ProtocolVersion,
}

impl Envelope {
    /// Build an envelope, rejecting an empty method name.
    pub fn new(
        method: impl Into<String>,
        version: ProtocolVersion,
        args: Args,
    ) -> CellsResult<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(CellsError::invalid_argument("method name must not be empty"));
        }
        Ok(Self {
            method,
            args,
            version,
        })
    }
}

/// Serialize a value into an envelope argument, mapping serialization
/// failures to the local error category.
pub fn to_arg_value<T: Serialize>(value: &T) -> CellsResult<Value> {
    serde_json::to_value(value).map_err(|e| CellsError::invalid_argument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::BASE_RPC_API_VERSION;
    use serde_json::json;

    #[test]
    fn test_rejects_empty_method() {
        let result = Envelope::new("", BASE_RPC_API_VERSION, Args::new());
        assert!(matches!(result, Err(CellsError::InvalidArgument(_))));
    }

    #[test]
    fn test_wire_shape() {
        let mut args = Args::new();
        args.insert("instance".to_string(), json!({"uuid": "X"}));
        let envelope = Envelope::new("instance_update_at_top", BASE_RPC_API_VERSION, args).unwrap();

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "method": "instance_update_at_top",
                "args": {"instance": {"uuid": "X"}},
                "version": "1.0",
            })
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let mut args = Args::new();
        args.insert("filters".to_string(), json!({"host": "compute-1"}));
        let envelope = Envelope::new("service_get_all", ProtocolVersion::new(1, 2), args).unwrap();

        let wire = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, envelope);
    }
}
