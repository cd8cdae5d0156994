//! CPU-side geometry for map layers.
//!
//! Coordinates stay in lon/lat degrees; projection happens in the vertex
//! shader through the view uniform.

use bytemuck::{Pod, Zeroable};
use meridian_shapefile::{Point, Shape, Shapefile};

/// One end of a line segment (line-list topology).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub lonlat: [f32; 2],
}

impl LineVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Position of one point sprite.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub lonlat: [f32; 2],
}

impl PointInstance {
    // location 0 is the quad corner
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[inline]
fn lonlat(p: &Point) -> [f32; 2] {
    [p.x as f32, p.y as f32]
}

fn push_strip(out: &mut Vec<LineVertex>, strip: &[Point]) {
    for pair in strip.windows(2) {
        out.push(LineVertex { lonlat: lonlat(&pair[0]) });
        out.push(LineVertex { lonlat: lonlat(&pair[1]) });
    }
}

/// Converts polyline parts and polygon rings into a line list.
///
/// Each part of `n` vertices contributes `n - 1` segments. Point shapes are ignored.
pub fn line_vertices(shapefile: &Shapefile) -> Vec<LineVertex> {
    let mut out = Vec::new();
    for shape in shapefile.shapes() {
        match shape {
            Shape::PolyLine { parts } => parts.iter().for_each(|p| push_strip(&mut out, p)),
            Shape::Polygon { rings } => rings.iter().for_each(|r| push_strip(&mut out, r)),
            Shape::Null | Shape::Point(_) | Shape::MultiPoint(_) => {}
        }
    }
    out
}

/// Collects every point and multipoint vertex as a sprite instance.
pub fn point_instances(shapefile: &Shapefile) -> Vec<PointInstance> {
    let mut out = Vec::new();
    for shape in shapefile.shapes() {
        match shape {
            Shape::Point(p) => out.push(PointInstance { lonlat: lonlat(p) }),
            Shape::MultiPoint(points) => {
                out.extend(points.iter().map(|p| PointInstance { lonlat: lonlat(p) }))
            }
            Shape::Null | Shape::PolyLine { .. } | Shape::Polygon { .. } => {}
        }
    }
    out
}

/// Meridians and parallels every `step` degrees, both world edges included.
pub fn graticule(step: f32) -> Vec<LineVertex> {
    let step = if step > 0.0 { step } else { 15.0 };
    let mut out = Vec::new();

    let meridians = (360.0 / step).floor() as i32;
    for i in 0..=meridians {
        let lon = -180.0 + i as f32 * step;
        out.push(LineVertex { lonlat: [lon, -90.0] });
        out.push(LineVertex { lonlat: [lon, 90.0] });
    }

    let parallels = (180.0 / step).floor() as i32;
    for i in 0..=parallels {
        let lat = -90.0 + i as f32 * step;
        out.push(LineVertex { lonlat: [-180.0, lat] });
        out.push(LineVertex { lonlat: [180.0, lat] });
    }

    out
}

/// Corners of a unit quad, `(0,0)` top-left, drawn as two triangles.
pub(crate) const QUAD_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

pub(crate) fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shapefile::{BoundingBox, Header, Record, ShapeType};

    fn shapefile(shape_type: ShapeType, shapes: Vec<Shape>) -> Shapefile {
        Shapefile {
            header: Header {
                file_length: 100,
                shape_type,
                bbox: BoundingBox::default(),
            },
            records: shapes
                .into_iter()
                .enumerate()
                .map(|(i, shape)| Record { number: i as i32 + 1, shape })
                .collect(),
        }
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn polygon_ring_becomes_closed_outline() {
        let ring = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]);
        let file = shapefile(ShapeType::Polygon, vec![Shape::Polygon { rings: vec![ring] }]);

        let v = line_vertices(&file);
        assert_eq!(v.len(), 6);
        assert_eq!(v[0].lonlat, [0.0, 0.0]);
        assert_eq!(v[1].lonlat, [10.0, 0.0]);
        assert_eq!(v[5].lonlat, [0.0, 0.0]);
    }

    #[test]
    fn polyline_parts_are_not_joined() {
        let parts = vec![
            pts(&[(0.0, 0.0), (1.0, 1.0)]),
            pts(&[(5.0, 5.0), (6.0, 6.0), (7.0, 5.0)]),
        ];
        let file = shapefile(
            ShapeType::PolyLine,
            vec![Shape::PolyLine { parts }, Shape::Null],
        );

        let v = line_vertices(&file);
        // 1 + 2 segments; no segment from (1,1) to (5,5)
        assert_eq!(v.len(), 6);
        assert_eq!(v[1].lonlat, [1.0, 1.0]);
        assert_eq!(v[2].lonlat, [5.0, 5.0]);
    }

    #[test]
    fn single_vertex_part_draws_nothing() {
        let file = shapefile(
            ShapeType::PolyLine,
            vec![Shape::PolyLine { parts: vec![pts(&[(3.0, 4.0)])] }],
        );
        assert!(line_vertices(&file).is_empty());
    }

    #[test]
    fn points_and_multipoints_become_instances() {
        let file = shapefile(
            ShapeType::Point,
            vec![
                Shape::Point(Point::new(-122.4, 37.8)),
                Shape::Null,
                Shape::MultiPoint(pts(&[(1.0, 2.0), (3.0, 4.0)])),
            ],
        );

        let p = point_instances(&file);
        assert_eq!(p.len(), 3);
        assert_eq!(p[0].lonlat, [-122.4, 37.8]);
        assert_eq!(p[2].lonlat, [3.0, 4.0]);
        assert!(line_vertices(&file).is_empty());
    }

    #[test]
    fn graticule_covers_world_edges() {
        let g = graticule(15.0);
        // 25 meridians + 13 parallels, two vertices each
        assert_eq!(g.len(), (25 + 13) * 2);
        assert_eq!(g[0].lonlat, [-180.0, -90.0]);
        assert_eq!(g[49].lonlat, [180.0, 90.0]);
        assert!(g.iter().all(|v| v.lonlat[0].abs() <= 180.0 && v.lonlat[1].abs() <= 90.0));
    }

    #[test]
    fn graticule_rejects_non_positive_step() {
        assert_eq!(graticule(0.0), graticule(15.0));
    }
}
