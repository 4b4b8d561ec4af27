//! Destination addressing: cell names and topic resolution.
//!
//! Cells form a strict tree and are addressed purely by name — the dot-joined
//! path from the root, e.g. `top.region-east.rack12`. A cell holds no live
//! handle to any other cell's state; a name is all that ever crosses the
//! boundary. Walking the tree to reach a named cell belongs to the
//! transport's routing layer, never to this module.

use crate::config::CellsConfig;
use crate::error::{CellsError, CellsResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated cell address: one or more dot-separated path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellName(String);

impl CellName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments from root to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    fn is_valid_segment(segment: &str) -> bool {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl FromStr for CellName {
    type Err = CellsError;

    fn from_str(s: &str) -> CellsResult<Self> {
        if s.is_empty() {
            return Err(CellsError::unknown_destination("empty cell name"));
        }
        if !s.split('.').all(Self::is_valid_segment) {
            return Err(CellsError::unknown_destination(format!(
                "malformed cell name: {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CellName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: CellsError| D::Error::custom(e))
    }
}

/// Where a message is headed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// This cell's own message queue; the common case for every catalog
    /// operation, including proxies (the target cell name rides in the args).
    SelfCell,
    /// A named cell, handed to the transport's routing layer to resolve by
    /// walking parent/child links.
    Cell(CellName),
}

impl Destination {
    pub fn cell(name: &str) -> CellsResult<Self> {
        Ok(Destination::Cell(name.parse()?))
    }
}

/// Maps a [`Destination`] to the transport-level topic string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResolver {
    self_topic: String,
}

impl TopicResolver {
    pub fn new(config: &CellsConfig) -> Self {
        Self {
            self_topic: config.topic.clone(),
        }
    }

    /// `SelfCell` resolves to the statically configured topic. A named cell
    /// is passed through unresolved; interpreting it is the routing layer's
    /// contract, not ours.
    pub fn resolve(&self, destination: &Destination) -> CellsResult<String> {
        match destination {
            Destination::SelfCell => {
                if self.self_topic.is_empty() {
                    return Err(CellsError::unknown_destination(
                        "no topic configured for this cell",
                    ));
                }
                Ok(self.self_topic.clone())
            }
            Destination::Cell(name) => Ok(name.to_string()),
        }
    }
}
