//! Per-cell messaging configuration.
//!
//! Loaded once at process start and shared immutably; there is no ambient
//! global. Construct a [`CellsConfig`] explicitly (or from TOML) and hand it
//! to [`CellsApi::new`](crate::CellsApi::new).

use crate::dispatch::CallTimeout;
use crate::error::{CellsError, CellsResult};
use crate::topic::CellName;
use crate::version::{ProtocolVersion, CURRENT_RPC_API_VERSION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_enable() -> bool {
    true
}

fn default_version_cap() -> ProtocolVersion {
    CURRENT_RPC_API_VERSION
}

/// Configuration surface for one cell's messaging layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellsConfig {
    /// This cell's name: its dot-joined path from the root cell.
    pub name: String,

    /// Base transport topic for this cell's own message queue. Configured,
    /// not derived from the name.
    pub topic: String,

    /// Whether cells addressing is active at all.
    #[serde(default = "default_enable")]
    pub enable: bool,

    /// The highest protocol revision this cell will stamp or accept.
    #[serde(default = "default_version_cap")]
    pub api_version_cap: ProtocolVersion,

    /// Default timeout for call-mode operations, in seconds. Absent means
    /// the transport's own default applies.
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
}

impl CellsConfig {
    pub fn new(name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            enable: true,
            api_version_cap: CURRENT_RPC_API_VERSION,
            call_timeout_secs: None,
        }
    }

    /// Parse from TOML, validating the result.
    pub fn from_toml_str(raw: &str) -> CellsResult<Self> {
        let config: CellsConfig =
            toml::from_str(raw).map_err(|e| CellsError::invalid_argument(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CellsResult<()> {
        self.name.parse::<CellName>()?;
        if self.topic.is_empty() {
            return Err(CellsError::invalid_argument("cells topic must not be empty"));
        }
        Ok(())
    }

    /// The timeout applied to call-mode operations that do not override it.
    pub fn default_call_timeout(&self) -> CallTimeout {
        match self.call_timeout_secs {
            Some(secs) => CallTimeout::After(Duration::from_secs(secs)),
            None => CallTimeout::TransportDefault,
        }
    }
}
