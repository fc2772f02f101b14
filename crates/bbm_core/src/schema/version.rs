//! Format version detection.

use serde_json::Value;

use crate::model::FormatVersion;

/// Top-level key holding the version string.
pub const FORMAT_VERSION_KEY: &str = "format_version";

/// Container key introduced by the list-based layouts.
pub const GEOMETRY_LIST_KEY: &str = "minecraft:geometry";

/// Pick the layout used to read a document.
///
/// An explicit `format_version` string wins. Without one, the presence of
/// the geometry list implies the newest layout; anything else is read as
/// 1.8.
pub fn detect_format_version(doc: &Value) -> FormatVersion {
    match doc.get(FORMAT_VERSION_KEY) {
        Some(version) => version
            .as_str()
            .and_then(parse_version)
            .map(version_for)
            .unwrap_or(FormatVersion::V1_8),
        None if doc.get(GEOMETRY_LIST_KEY).is_some() => FormatVersion::V1_16,
        None => FormatVersion::V1_8,
    }
}

/// Parse `"major.minor[.patch]"` into `(major, minor)`.
fn parse_version(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

fn version_for((major, minor): (u32, u32)) -> FormatVersion {
    if major == 0 {
        FormatVersion::V1_8
    } else if major > 1 || minor >= 16 {
        FormatVersion::V1_16
    } else if minor >= 12 {
        FormatVersion::V1_12
    } else {
        FormatVersion::V1_8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_versions() {
        assert_eq!(
            detect_format_version(&json!({ "format_version": "1.16.0" })),
            FormatVersion::V1_16
        );
        assert_eq!(
            detect_format_version(&json!({ "format_version": "1.12.5" })),
            FormatVersion::V1_12
        );
        assert_eq!(
            detect_format_version(&json!({ "format_version": "1.8.0" })),
            FormatVersion::V1_8
        );
        assert_eq!(
            detect_format_version(&json!({ "format_version": "1.21.40" })),
            FormatVersion::V1_16
        );
    }

    #[test]
    fn test_container_key_implies_1_16() {
        let doc = json!({ "minecraft:geometry": [] });
        assert_eq!(detect_format_version(&doc), FormatVersion::V1_16);
    }

    #[test]
    fn test_no_hints_defaults_to_1_8() {
        let doc = json!({ "geometry.pig": { "bones": [] } });
        assert_eq!(detect_format_version(&doc), FormatVersion::V1_8);
    }

    #[test]
    fn test_unreadable_version_defaults_to_1_8() {
        assert_eq!(
            detect_format_version(&json!({ "format_version": "latest" })),
            FormatVersion::V1_8
        );
        assert_eq!(
            detect_format_version(&json!({ "format_version": 1.12 })),
            FormatVersion::V1_8
        );
        assert_eq!(
            detect_format_version(&json!({ "format_version": "1" })),
            FormatVersion::V1_8
        );
    }

    #[test]
    fn test_version_key_beats_container_key() {
        let doc = json!({ "format_version": "1.12.0", "minecraft:geometry": [] });
        assert_eq!(detect_format_version(&doc), FormatVersion::V1_12);
    }
}
