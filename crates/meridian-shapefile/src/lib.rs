//! Reader for ESRI shapefile (`.shp`) geometry.
//!
//! No dependencies and no engine or GPU code. Only the main `.shp` file is
//! read; attribute (`.dbf`) and index (`.shx`) files are ignored.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`shape_type`] | `ShapeType` and its ESRI codes |
//! | [`geometry`] | `Shapefile`, `Header`, `Record`, `Shape`, `Point`, `BoundingBox` |
//! | [`error`] | `ParseError`, `ReadError` |
//! | [`reader`] | `parse_bytes` / `read_file` entry points |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use meridian_shapefile::{read_file, ShapeType};
//!
//! let shapefile = read_file("110m_admin_0_countries.shp").unwrap();
//! assert_eq!(shapefile.header.shape_type, ShapeType::Polygon);
//! println!("{} records", shapefile.records.len());
//! ```

pub mod error;
pub mod geometry;
pub mod reader;
pub mod shape_type;

pub use error::{ParseError, ReadError};
pub use geometry::{BoundingBox, Header, Point, Record, Shape, Shapefile};
pub use reader::{parse_bytes, read_file};
pub use shape_type::ShapeType;

#[cfg(test)]
pub(crate) mod fixture;
