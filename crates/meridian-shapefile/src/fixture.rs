//! In-memory `.shp` writer used by the reader tests.

use crate::geometry::Point;
use crate::shape_type::ShapeType;

pub(crate) struct ShpBuilder {
    shape_type: ShapeType,
    bbox: [f64; 4],
    records: Vec<Vec<u8>>,
}

impl ShpBuilder {
    pub(crate) fn new(shape_type: ShapeType) -> Self {
        Self { shape_type, bbox: [0.0; 4], records: Vec::new() }
    }

    pub(crate) fn bbox(mut self, min: Point, max: Point) -> Self {
        self.bbox = [min.x, min.y, max.x, max.y];
        self
    }

    pub(crate) fn raw_record(mut self, ty: ShapeType, body: impl FnOnce(&mut Vec<u8>)) -> Self {
        let mut content = ty.code().to_le_bytes().to_vec();
        body(&mut content);
        self.records.push(content);
        self
    }

    pub(crate) fn null(self) -> Self {
        self.raw_record(ShapeType::Null, |_| {})
    }

    pub(crate) fn point(self, p: Point) -> Self {
        let ty = self.shape_type;
        self.raw_record(ty, |c| push_point(c, p))
    }

    pub(crate) fn multi_point(self, points: &[Point]) -> Self {
        let ty = self.shape_type;
        self.raw_record(ty, |c| {
            c.extend_from_slice(&[0u8; 32]);
            c.extend_from_slice(&(points.len() as i32).to_le_bytes());
            for p in points {
                push_point(c, *p);
            }
        })
    }

    pub(crate) fn multi_part(self, parts: &[Vec<Point>]) -> Self {
        let ty = self.shape_type;
        self.raw_record(ty, |c| {
            let total: usize = parts.iter().map(Vec::len).sum();
            c.extend_from_slice(&[0u8; 32]);
            c.extend_from_slice(&(parts.len() as i32).to_le_bytes());
            c.extend_from_slice(&(total as i32).to_le_bytes());
            let mut start = 0i32;
            for part in parts {
                c.extend_from_slice(&start.to_le_bytes());
                start += part.len() as i32;
            }
            for p in parts.iter().flatten() {
                push_point(c, *p);
            }
        })
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&0i32.to_be_bytes()); // length, patched below
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&self.shape_type.code().to_le_bytes());
        for v in self.bbox {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 32]);
        debug_assert_eq!(out.len(), 100);

        for (i, content) in self.records.iter().enumerate() {
            out.extend_from_slice(&(i as i32 + 1).to_be_bytes());
            out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
            out.extend_from_slice(content);
        }

        let words = (out.len() / 2) as i32;
        out[24..28].copy_from_slice(&words.to_be_bytes());
        out
    }
}

fn push_point(c: &mut Vec<u8>, p: Point) {
    c.extend_from_slice(&p.x.to_le_bytes());
    c.extend_from_slice(&p.y.to_le_bytes());
}
