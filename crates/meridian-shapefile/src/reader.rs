use std::path::Path;

use crate::error::{ParseError, ReadError};
use crate::geometry::{BoundingBox, Header, Point, Record, Shape, Shapefile};
use crate::shape_type::ShapeType;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;

/// Reads and decodes a `.shp` file.
pub fn read_file(path: impl AsRef<Path>) -> Result<Shapefile, ReadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes).map_err(|source| ReadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes the content of a `.shp` file.
pub fn parse_bytes(bytes: &[u8]) -> Result<Shapefile, ParseError> {
    let mut reader = ByteReader::new(bytes);
    let header = reader.parse_header()?;

    if header.file_length > bytes.len() {
        return Err(ParseError::new(
            format!(
                "header declares {} bytes but only {} are present",
                header.file_length,
                bytes.len()
            ),
            24,
        ));
    }

    let mut records = Vec::new();
    while reader.pos + RECORD_HEADER_LEN <= header.file_length {
        records.push(reader.parse_record(header.shape_type, header.file_length)?);
    }

    Ok(Shapefile { header, records })
}

// ── ByteReader ────────────────────────────────────────────────────────────

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.pos)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let end = self.pos + N;
        let Some(slice) = self.bytes.get(self.pos..end) else {
            return Err(self.err(format!("unexpected end of data reading {N} bytes")));
        };
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn i32_be(&mut self) -> Result<i32, ParseError> {
        self.take::<4>().map(i32::from_be_bytes)
    }

    fn i32_le(&mut self) -> Result<i32, ParseError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    fn f64_le(&mut self) -> Result<f64, ParseError> {
        self.take::<8>().map(f64::from_le_bytes)
    }

    fn count(&mut self, what: &str) -> Result<usize, ParseError> {
        let at = self.pos;
        let n = self.i32_le()?;
        usize::try_from(n).map_err(|_| ParseError::new(format!("negative {what}: {n}"), at))
    }

    /// Fails unless `len` bytes (if representable) fit before `end`.
    fn ensure_fits(&self, len: Option<usize>, end: usize, what: &str) -> Result<(), ParseError> {
        match len {
            Some(len) if self.pos.saturating_add(len) <= end => Ok(()),
            _ => Err(self.err(format!("{what} exceeds the record's content length"))),
        }
    }

    fn point(&mut self) -> Result<Point, ParseError> {
        Ok(Point::new(self.f64_le()?, self.f64_le()?))
    }

    fn bbox(&mut self) -> Result<BoundingBox, ParseError> {
        let min = self.point()?;
        let max = self.point()?;
        Ok(BoundingBox { min, max })
    }

    fn shape_type(&mut self) -> Result<ShapeType, ParseError> {
        let at = self.pos;
        let code = self.i32_le()?;
        ShapeType::from_code(code)
            .ok_or_else(|| ParseError::new(format!("unknown shape type code {code}"), at))
    }

    // ── Header ────────────────────────────────────────────────────────────

    fn parse_header(&mut self) -> Result<Header, ParseError> {
        if self.bytes.len() < HEADER_LEN {
            return Err(self.err(format!(
                "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
                self.bytes.len()
            )));
        }

        let code = self.i32_be()?;
        if code != FILE_CODE {
            return Err(ParseError::new(format!("bad file code {code}, expected {FILE_CODE}"), 0));
        }

        self.pos = 24;
        let words = self.i32_be()?;
        let file_length = usize::try_from(words)
            .map_err(|_| ParseError::new(format!("negative file length {words}"), 24))?
            * 2;

        let version = self.i32_le()?;
        if version != VERSION {
            return Err(ParseError::new(format!("unsupported version {version}"), 28));
        }

        let shape_type = self.shape_type()?;
        let bbox = self.bbox()?;

        // Z and M ranges are not used.
        self.pos = HEADER_LEN;

        Ok(Header { file_length, shape_type, bbox })
    }

    // ── Records ───────────────────────────────────────────────────────────

    fn parse_record(&mut self, file_type: ShapeType, end: usize) -> Result<Record, ParseError> {
        let number = self.i32_be()?;
        let at = self.pos;
        let words = self.i32_be()?;
        let content_len = usize::try_from(words)
            .map_err(|_| ParseError::new(format!("negative content length {words}"), at))?
            * 2;

        let content_start = self.pos;
        let content_end = content_start + content_len;
        if content_end > end {
            return Err(ParseError::new(
                format!("record {number} runs past end of file"),
                content_start,
            ));
        }

        let shape = self.parse_shape(file_type, content_end)?;
        if self.pos > content_end {
            return Err(ParseError::new(
                format!("record {number} is longer than its declared content length"),
                content_start,
            ));
        }

        // Content may carry trailing bytes; the declared length is authoritative.
        self.pos = content_end;
        Ok(Record { number, shape })
    }

    fn parse_shape(&mut self, file_type: ShapeType, end: usize) -> Result<Shape, ParseError> {
        let at = self.pos;
        let ty = self.shape_type()?;
        if ty != ShapeType::Null && ty != file_type {
            return Err(ParseError::new(
                format!("record shape type {ty} does not match file shape type {file_type}"),
                at,
            ));
        }

        match ty {
            ShapeType::Null => Ok(Shape::Null),
            ShapeType::Point => Ok(Shape::Point(self.point()?)),
            ShapeType::MultiPoint => {
                let _bbox = self.bbox()?;
                let n = self.count("point count")?;
                self.ensure_fits(n.checked_mul(16), end, "point count")?;
                let points = (0..n).map(|_| self.point()).collect::<Result<_, _>>()?;
                Ok(Shape::MultiPoint(points))
            }
            ShapeType::PolyLine => Ok(Shape::PolyLine { parts: self.parts(end)? }),
            ShapeType::Polygon => Ok(Shape::Polygon { rings: self.parts(end)? }),
            other => Err(ParseError::new(format!("unsupported shape type {other}"), at)),
        }
    }

    /// Reads the bbox / part index / point layout shared by PolyLine and Polygon.
    fn parts(&mut self, end: usize) -> Result<Vec<Vec<Point>>, ParseError> {
        let _bbox = self.bbox()?;
        let num_parts = self.count("part count")?;
        let num_points = self.count("point count")?;

        let payload = num_parts
            .checked_mul(4)
            .zip(num_points.checked_mul(16))
            .and_then(|(parts, points)| parts.checked_add(points));
        self.ensure_fits(payload, end, "part and point counts")?;

        let starts_at = self.pos;
        let mut starts = Vec::with_capacity(num_parts);
        for _ in 0..num_parts {
            starts.push(self.count("part index")?);
        }

        if let Some(&first) = starts.first()
            && first != 0
        {
            return Err(ParseError::new(format!("first part starts at {first}, expected 0"), starts_at));
        }
        if starts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ParseError::new("part indices are not strictly increasing", starts_at));
        }
        if starts.last().is_some_and(|&last| last >= num_points) {
            return Err(ParseError::new("part index out of range", starts_at));
        }

        let points = (0..num_points).map(|_| self.point()).collect::<Result<Vec<_>, _>>()?;

        let mut parts = Vec::with_capacity(num_parts);
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(num_points);
            parts.push(points[start..end].to_vec());
        }
        Ok(parts)
    }
}
