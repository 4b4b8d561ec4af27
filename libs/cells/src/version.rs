//! Protocol version type and per-method version resolution.
//!
//! Versions are compared numerically as `(major, minor)` pairs. String
//! comparison is a known trap here: `"1.10"` sorts before `"1.2"`
//! lexicographically but is the later revision.

use crate::error::{CellsError, CellsResult};
use crate::operations::CellMethod;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A `MAJOR.MINOR` protocol revision marker.
///
/// Every outgoing envelope is stamped with the exact version its method
/// requires, never with the client's ceiling, so older operations keep their
/// old wire shape even after the client gains new capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

/// The baseline revision every cell understands.
pub const BASE_RPC_API_VERSION: ProtocolVersion = ProtocolVersion::new(1, 0);

/// The highest revision this code base implements.
pub const CURRENT_RPC_API_VERSION: ProtocolVersion = ProtocolVersion::new(1, 4);

impl ProtocolVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = CellsError;

    fn from_str(s: &str) -> CellsResult<Self> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| CellsError::invalid_argument(format!("malformed version: {s:?}")))?;
        let parse = |part: &str| {
            part.parse::<u16>()
                .map_err(|_| CellsError::invalid_argument(format!("malformed version: {s:?}")))
        };
        Ok(Self::new(parse(major)?, parse(minor)?))
    }
}

// Wire form is the dotted string, matching the envelope's `version` field.
impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: CellsError| D::Error::custom(e))
    }
}

/// Maps each operation to the version stamped on its outgoing envelope,
/// bounded by the cell's configured API version cap.
///
/// The required-version table itself lives on [`CellMethod`]; this type only
/// applies the local ceiling. Two cells running different code revisions
/// interoperate because a sender never stamps more than an operation needs
/// and a receiver accepts everything at or below what it implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionResolver {
    cap: ProtocolVersion,
}

impl VersionResolver {
    pub const fn new(cap: ProtocolVersion) -> Self {
        Self { cap }
    }

    pub const fn cap(&self) -> ProtocolVersion {
        self.cap
    }

    /// The version to stamp on an outgoing envelope for `method`.
    ///
    /// Fails locally when the method was introduced after this cell's
    /// configured ceiling; nothing is sent in that case.
    pub fn resolve(&self, method: CellMethod) -> CellsResult<ProtocolVersion> {
        let required = method.required_version();
        if required > self.cap {
            return Err(CellsError::invalid_argument(format!(
                "{} requires protocol version {required}, but this cell is capped at {}",
                method.wire_name(),
                self.cap
            )));
        }
        Ok(required)
    }

    /// Receiving-side policy: accept an inbound `method`/`version` pair only
    /// when the version is between the method's introduction version and the
    /// local ceiling. Backward compatible, never forward compatible.
    pub fn check_inbound(&self, method: CellMethod, version: ProtocolVersion) -> CellsResult<()> {
        if version > self.cap {
            return Err(CellsError::invalid_argument(format!(
                "unsupported version {version} for {} (implemented up to {})",
                method.wire_name(),
                self.cap
            )));
        }
        if version < method.required_version() {
            return Err(CellsError::invalid_argument(format!(
                "version {version} predates {} (introduced at {})",
                method.wire_name(),
                method.required_version()
            )));
        }
        Ok(())
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new(CURRENT_RPC_API_VERSION)
    }
}
