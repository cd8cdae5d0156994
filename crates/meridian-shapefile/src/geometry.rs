use crate::shape_type::ShapeType;

/// Planar point. For geographic data `x` is longitude and `y` latitude, in degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

/// Main file header (first 100 bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Declared file length in bytes.
    pub file_length: usize,
    pub shape_type: ShapeType,
    pub bbox: BoundingBox,
}

/// Decoded record geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Null,
    Point(Point),
    MultiPoint(Vec<Point>),
    /// One or more connected sequences of vertices.
    PolyLine { parts: Vec<Vec<Point>> },
    /// One or more closed rings; the first and last vertex of a ring coincide.
    Polygon { rings: Vec<Vec<Point>> },
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Null => ShapeType::Null,
            Shape::Point(_) => ShapeType::Point,
            Shape::MultiPoint(_) => ShapeType::MultiPoint,
            Shape::PolyLine { .. } => ShapeType::PolyLine,
            Shape::Polygon { .. } => ShapeType::Polygon,
        }
    }

    /// Total number of vertices in the shape.
    pub fn point_count(&self) -> usize {
        match self {
            Shape::Null => 0,
            Shape::Point(_) => 1,
            Shape::MultiPoint(points) => points.len(),
            Shape::PolyLine { parts } => parts.iter().map(Vec::len).sum(),
            Shape::Polygon { rings } => rings.iter().map(Vec::len).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based record number as stored in the file.
    pub number: i32,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shapefile {
    pub header: Header,
    pub records: Vec<Record>,
}

impl Shapefile {
    /// Iterates over non-null shapes in file order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.records
            .iter()
            .map(|r| &r.shape)
            .filter(|s| !matches!(s, Shape::Null))
    }
}
