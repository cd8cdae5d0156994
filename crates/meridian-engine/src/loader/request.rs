use meridian_shapefile::ShapeType;

/// Request to load one shapefile as a renderable layer.
///
/// The shape type is the discriminant used to pick a builder. Paths are
/// passed to builders unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileRequest {
    path: String,
    icon_path: Option<String>,
    shape_type: ShapeType,
}

impl ShapefileRequest {
    /// An empty `icon_path` is treated as "no icon".
    pub fn new(path: impl Into<String>, icon_path: Option<String>, shape_type: ShapeType) -> Self {
        Self {
            path: path.into(),
            icon_path: icon_path.filter(|p| !p.is_empty()),
            shape_type,
        }
    }

    pub fn polygon(path: impl Into<String>) -> Self {
        Self::new(path, None, ShapeType::Polygon)
    }

    pub fn polyline(path: impl Into<String>) -> Self {
        Self::new(path, None, ShapeType::PolyLine)
    }

    pub fn point(path: impl Into<String>, icon_path: impl Into<String>) -> Self {
        Self::new(path, Some(icon_path.into()), ShapeType::Point)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn icon_path(&self) -> Option<&str> {
        self.icon_path.as_deref()
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }
}
