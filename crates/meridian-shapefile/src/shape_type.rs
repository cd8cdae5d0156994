use std::fmt;

/// Geometry type of a shapefile or of a single record.
///
/// Values follow the ESRI specification. Only `Null`, `Point`, `MultiPoint`,
/// `PolyLine` and `Polygon` records can be decoded; the measured (`M`) and
/// 3D (`Z`) variants are recognised so that they can be reported precisely.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    /// Maps an ESRI shape type code to a `ShapeType`.
    pub fn from_code(code: i32) -> Option<Self> {
        let ty = match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            _ => return None,
        };
        Some(ty)
    }

    pub fn code(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    /// Returns `true` for the types whose records this crate can decode.
    pub fn is_decodable(self) -> bool {
        matches!(
            self,
            ShapeType::Null
                | ShapeType::Point
                | ShapeType::MultiPoint
                | ShapeType::PolyLine
                | ShapeType::Polygon
        )
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_known_types() {
        for code in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31] {
            let ty = ShapeType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(ShapeType::from_code(2), None);
        assert_eq!(ShapeType::from_code(-1), None);
        assert_eq!(ShapeType::from_code(32), None);
    }

    #[test]
    fn only_planar_types_are_decodable() {
        assert!(ShapeType::Polygon.is_decodable());
        assert!(ShapeType::Null.is_decodable());
        assert!(!ShapeType::PolygonZ.is_decodable());
        assert!(!ShapeType::MultiPatch.is_decodable());
    }

    #[test]
    fn display_includes_code() {
        assert_eq!(ShapeType::PolyLine.to_string(), "PolyLine (3)");
    }
}
