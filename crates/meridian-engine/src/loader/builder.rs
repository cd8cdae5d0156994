use std::collections::HashMap;

use meridian_shapefile::ShapeType;

use super::request::ShapefileRequest;

/// Builds a finished resource for a request on the caller's context.
pub type BuildFn<C, R> = Box<dyn FnMut(&ShapefileRequest, &mut C) -> anyhow::Result<R> + Send>;

/// Builders keyed by request discriminant. At most one builder per shape type.
pub struct BuilderRegistry<C, R> {
    builders: HashMap<ShapeType, BuildFn<C, R>>,
}

impl<C, R> Default for BuilderRegistry<C, R> {
    fn default() -> Self {
        Self { builders: HashMap::new() }
    }
}

impl<C, R> BuilderRegistry<C, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `build` for `shape_type`, replacing any previous builder.
    pub fn register<F>(&mut self, shape_type: ShapeType, build: F) -> &mut Self
    where
        F: FnMut(&ShapefileRequest, &mut C) -> anyhow::Result<R> + Send + 'static,
    {
        if self.builders.insert(shape_type, Box::new(build)).is_some() {
            log::warn!("replacing builder for shape type {shape_type}");
        }
        self
    }

    pub fn with<F>(mut self, shape_type: ShapeType, build: F) -> Self
    where
        F: FnMut(&ShapefileRequest, &mut C) -> anyhow::Result<R> + Send + 'static,
    {
        self.register(shape_type, build);
        self
    }

    pub fn supports(&self, shape_type: ShapeType) -> bool {
        self.builders.contains_key(&shape_type)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub(crate) fn get_mut(&mut self, shape_type: ShapeType) -> Option<&mut BuildFn<C, R>> {
        self.builders.get_mut(&shape_type)
    }
}
