//! Airtable field type to logical type mapping.

use sync_core::LogicalType;

/// Format of `date` values as returned by the API (chrono syntax).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of timestamp values as returned by the API (chrono syntax).
///
/// The API always returns ISO-8601 UTC with milliseconds, independent of
/// how the field is formatted for display.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Logical type of a remote field type tag; `None` for unknown tags.
pub fn logical_type(field_type: &str) -> Option<LogicalType> {
    let t = match field_type {
        "autoNumber" => LogicalType::Integer,
        "barcode" | "button" | "createdBy" | "lastModifiedBy" | "singleCollaborator" => {
            LogicalType::Object
        }
        "checkbox" => LogicalType::Boolean,
        "count" | "currency" | "duration" | "number" | "percent" | "rating" => LogicalType::Number,
        "createdTime" | "dateTime" | "lastModifiedTime" => LogicalType::DateTime,
        "date" => LogicalType::Date,
        "email" | "externalSyncSource" | "multilineText" | "phoneNumber" | "richText"
        | "singleLineText" | "singleSelect" | "url" => LogicalType::String,
        "formula" | "rollup" => LogicalType::Any,
        "lookup"
        | "multipleAttachments"
        | "multipleCollaborators"
        | "multipleLookupValues"
        | "multipleRecordLinks"
        | "multipleSelects" => LogicalType::Array,
        _ => return None,
    };
    Some(t)
}

/// Format hint attached to columns of a temporal logical type.
pub fn format_for(logical: LogicalType) -> Option<&'static str> {
    if !logical.is_temporal() {
        return None;
    }
    match logical {
        LogicalType::Date => Some(DATE_FORMAT),
        _ => Some(DATETIME_FORMAT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_type_maps() {
        let expected = [
            ("autoNumber", LogicalType::Integer),
            ("barcode", LogicalType::Object),
            ("button", LogicalType::Object),
            ("checkbox", LogicalType::Boolean),
            ("count", LogicalType::Number),
            ("createdBy", LogicalType::Object),
            ("createdTime", LogicalType::DateTime),
            ("currency", LogicalType::Number),
            ("date", LogicalType::Date),
            ("dateTime", LogicalType::DateTime),
            ("duration", LogicalType::Number),
            ("email", LogicalType::String),
            ("externalSyncSource", LogicalType::String),
            ("formula", LogicalType::Any),
            ("lastModifiedBy", LogicalType::Object),
            ("lastModifiedTime", LogicalType::DateTime),
            ("lookup", LogicalType::Array),
            ("multilineText", LogicalType::String),
            ("multipleAttachments", LogicalType::Array),
            ("multipleCollaborators", LogicalType::Array),
            ("multipleLookupValues", LogicalType::Array),
            ("multipleRecordLinks", LogicalType::Array),
            ("multipleSelects", LogicalType::Array),
            ("number", LogicalType::Number),
            ("percent", LogicalType::Number),
            ("phoneNumber", LogicalType::String),
            ("rating", LogicalType::Number),
            ("richText", LogicalType::String),
            ("rollup", LogicalType::Any),
            ("singleCollaborator", LogicalType::Object),
            ("singleLineText", LogicalType::String),
            ("singleSelect", LogicalType::String),
            ("url", LogicalType::String),
        ];
        for (remote, logical) in expected {
            assert_eq!(logical_type(remote), Some(logical), "{remote}");
        }
    }

    #[test]
    fn test_unknown_type_has_no_mapping() {
        assert_eq!(logical_type("aiText"), None);
        assert_eq!(logical_type("Number"), None);
    }

    #[test]
    fn test_formats_only_for_temporal_types() {
        assert_eq!(format_for(LogicalType::Date), Some(DATE_FORMAT));
        assert_eq!(format_for(LogicalType::DateTime), Some(DATETIME_FORMAT));
        assert_eq!(format_for(LogicalType::Number), None);

        for logical in [LogicalType::String, LogicalType::Array, LogicalType::Any] {
            assert_eq!(format_for(logical).is_some(), logical.is_temporal());
        }
    }
}
