//! Geometry-type tags and the reconciliation axes built on top of them.
//!
//! A style applies to one or more geometry kinds. Internally the tag domain
//! is three-valued; the engine reconciles it along two independent axes:
//! the sign axis (`Point`) and the outline axis (`Line`, `Polygon`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Geometry kind a style applies to.
///
/// `Ord` follows declaration order so that a `BTreeSet<GeometryType>`
/// serializes as a deterministically ordered array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryType {
    /// Point representation (sign axis).
    Point,
    /// Line representation (outline axis).
    Line,
    /// Polygon representation (outline axis).
    Polygon,
}

impl GeometryType {
    /// Returns the tag label used in the report.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Line => "Line",
            Self::Polygon => "Polygon",
        }
    }

    /// Maps a reference table's name suffix to a geometry tag.
    ///
    /// Reference tables are split per geometry kind and named
    /// `<logical>_<suffix>` with multi-geometry suffixes. Unknown suffixes
    /// yield `None` and that table contributes no styles.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Multipoint" => Some(Self::Point),
            "Multiline" => Some(Self::Line),
            "Multipolygon" => Some(Self::Polygon),
            _ => None,
        }
    }
}

/// Set of geometry tags attached to a style.
pub type GeometrySet = BTreeSet<GeometryType>;

/// The outline axis: tags describing line/polygon representations.
#[must_use]
pub fn outline_axis() -> GeometrySet {
    [GeometryType::Line, GeometryType::Polygon].into()
}

/// The sign axis: the point-only representation.
#[must_use]
pub fn sign_axis() -> GeometrySet {
    [GeometryType::Point].into()
}

/// Returns the outline tags present in `set`.
#[must_use]
pub fn outline_tags(set: &GeometrySet) -> GeometrySet {
    set.intersection(&outline_axis()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_mapping() {
        assert_eq!(
            GeometryType::from_suffix("Multipoint"),
            Some(GeometryType::Point)
        );
        assert_eq!(
            GeometryType::from_suffix("Multiline"),
            Some(GeometryType::Line)
        );
        assert_eq!(
            GeometryType::from_suffix("Multipolygon"),
            Some(GeometryType::Polygon)
        );
        assert_eq!(GeometryType::from_suffix("Voxel"), None);
        assert_eq!(GeometryType::from_suffix(""), None);
    }

    #[test]
    fn test_set_ordering_is_deterministic() {
        let set: GeometrySet = [
            GeometryType::Polygon,
            GeometryType::Point,
            GeometryType::Line,
        ]
        .into();
        let labels: Vec<&str> = set.iter().map(GeometryType::label).collect();
        assert_eq!(labels, vec!["Point", "Line", "Polygon"]);
    }

    #[test]
    fn test_outline_tags_filters_point() {
        let set: GeometrySet = [GeometryType::Point, GeometryType::Line].into();
        assert_eq!(outline_tags(&set), [GeometryType::Line].into());
    }
}
