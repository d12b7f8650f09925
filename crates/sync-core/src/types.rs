//! Logical column types for the airtable-sync pipeline.
//!
//! This module defines `LogicalType`, the small type universe a pipeline
//! resource declares for its columns. Remote field types are mapped onto it
//! by the source crate; nothing downstream ever sees a remote type tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Pipeline-side type of a column.
///
/// # Serialized Format
///
/// Every variant serializes as a lowercase tag:
/// ```json
/// {"name": "Updated", "type": "datetime", "format": "%Y-%m-%dT%H:%M:%S%.3fZ"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Unicode text
    String,

    /// Whole number
    Integer,

    /// Any numeric value (integer or floating point)
    Number,

    /// true/false
    Boolean,

    /// Calendar date without time
    Date,

    /// Timestamp
    DateTime,

    /// List of values
    Array,

    /// Nested key/value structure
    Object,

    /// Value whose type depends on the record (formulas, rollups)
    Any,
}

impl LogicalType {
    /// All variants, in declaration order.
    pub const ALL: [LogicalType; 9] = [
        Self::String,
        Self::Integer,
        Self::Number,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
        Self::Array,
        Self::Object,
        Self::Any,
    ];

    /// The serialized tag of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Whether values of this type are temporal and carry a format hint.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised type tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown logical type: {0}")]
pub struct UnknownLogicalType(pub String);

impl FromStr for LogicalType {
    type Err = UnknownLogicalType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownLogicalType(s.to_string()))
    }
}

impl Serialize for LogicalType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogicalType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for t in LogicalType::ALL {
            assert_eq!(t.as_str().parse::<LogicalType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = "decimal".parse::<LogicalType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown logical type: decimal");
    }

    #[test]
    fn test_serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&LogicalType::DateTime).unwrap();
        assert_eq!(json, "\"datetime\"");

        let parsed: LogicalType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(parsed, LogicalType::Boolean);
    }

    #[test]
    fn test_temporal_types() {
        assert!(LogicalType::Date.is_temporal());
        assert!(LogicalType::DateTime.is_temporal());
        assert!(!LogicalType::String.is_temporal());
    }
}
