use std::fmt;

use meridian_shapefile::ShapeType;

use crate::sync::{FenceError, QueueError, QueueThreadPanicked};

/// Failure to turn a load request into a posted resource.
#[derive(Debug)]
pub enum LoadError {
    /// No builder is registered for the request's shape type.
    UnsupportedShapeType { path: String, shape_type: ShapeType },
    /// The worker context could not be made current or could not create a fence.
    Context { path: String, source: anyhow::Error },
    /// The builder failed (I/O, parsing, resource creation).
    Build { path: String, source: anyhow::Error },
    Fence { path: String, source: FenceError },
    /// The result queue was disposed before the resource could be posted.
    Post { path: String, source: QueueError },
    WorkerPanicked(QueueThreadPanicked),
    Spawn(std::io::Error),
}

impl LoadError {
    /// Path of the request that failed, if the failure belongs to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            LoadError::UnsupportedShapeType { path, .. }
            | LoadError::Context { path, .. }
            | LoadError::Build { path, .. }
            | LoadError::Fence { path, .. }
            | LoadError::Post { path, .. } => Some(path),
            LoadError::WorkerPanicked(_) | LoadError::Spawn(_) => None,
        }
    }

    /// Returns `true` for the configuration error of an unknown discriminant.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, LoadError::UnsupportedShapeType { .. })
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::UnsupportedShapeType { path, shape_type } => {
                write!(f, "{path}: no builder for shape type {shape_type}")
            }
            LoadError::Context { path, source } => {
                write!(f, "{path}: worker context error: {source:#}")
            }
            LoadError::Build { path, source } => write!(f, "{path}: build failed: {source:#}"),
            LoadError::Fence { path, source } => write!(f, "{path}: {source}"),
            LoadError::Post { path, source } => write!(f, "{path}: cannot post result: {source}"),
            LoadError::WorkerPanicked(p) => write!(f, "{p}"),
            LoadError::Spawn(e) => write!(f, "failed to spawn load worker thread: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::UnsupportedShapeType { .. } => None,
            LoadError::Context { source, .. } | LoadError::Build { source, .. } => Some(&**source),
            LoadError::Fence { source, .. } => Some(source),
            LoadError::Post { source, .. } => Some(source),
            LoadError::WorkerPanicked(p) => Some(p),
            LoadError::Spawn(e) => Some(e),
        }
    }
}
