use std::path::Path;

use anyhow::{Context, Result};
use meridian_shapefile::{ShapeType, Shapefile};

use crate::loader::{BuilderRegistry, ShapefileRequest};

use super::gpu::{StyleUniform, WgpuContext};
use super::layer::ShapefileLayer;
use super::mesh;

const POLYGON_COLOR: [f32; 4] = [0.85, 0.80, 0.55, 1.0];
const POLYLINE_COLOR: [f32; 4] = [0.55, 0.65, 0.80, 1.0];
const ICON_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const DOT_COLOR: [f32; 4] = [0.95, 0.35, 0.30, 1.0];

/// Edge length of the generated dot used when a point request has no icon.
pub const DOT_SIZE: u32 = 9;
/// Largest on-screen sprite edge, in logical pixels.
pub const MAX_SPRITE_SIZE: f32 = 24.0;

/// Builders for Polygon, PolyLine and Point shapefiles on the worker context.
pub fn default_builders() -> BuilderRegistry<WgpuContext, ShapefileLayer> {
    BuilderRegistry::new()
        .with(ShapeType::Polygon, |request, ctx| {
            build_lines(request, ctx, POLYGON_COLOR)
        })
        .with(ShapeType::PolyLine, |request, ctx| {
            build_lines(request, ctx, POLYLINE_COLOR)
        })
        .with(ShapeType::Point, build_points)
}

fn read(request: &ShapefileRequest) -> Result<Shapefile> {
    let shapefile = meridian_shapefile::read_file(request.path())
        .with_context(|| format!("reading {}", request.path()))?;
    if shapefile.header.shape_type != request.shape_type() {
        log::warn!(
            "{}: requested as {} but file declares {}",
            request.path(),
            request.shape_type(),
            shapefile.header.shape_type
        );
    }
    Ok(shapefile)
}

fn build_lines(
    request: &ShapefileRequest,
    ctx: &mut WgpuContext,
    color: [f32; 4],
) -> Result<ShapefileLayer> {
    let shapefile = read(request)?;
    let vertices = mesh::line_vertices(&shapefile);
    Ok(ShapefileLayer::lines(
        ctx.device(),
        ctx.layouts(),
        request.path(),
        request.shape_type(),
        &vertices,
        StyleUniform::line(color),
    ))
}

fn build_points(request: &ShapefileRequest, ctx: &mut WgpuContext) -> Result<ShapefileLayer> {
    let shapefile = read(request)?;
    let instances = mesh::point_instances(&shapefile);

    let (icon, tint) = match request.icon_path() {
        Some(path) => (load_icon(path)?, ICON_TINT),
        None => (dot_icon(DOT_SIZE), DOT_COLOR),
    };
    let style = StyleUniform::point(tint, sprite_size(icon.dimensions()));

    Ok(ShapefileLayer::points(
        ctx.device(),
        ctx.queue(),
        ctx.layouts(),
        request,
        &instances,
        &icon,
        style,
    ))
}

/// Decodes an icon bitmap into RGBA8.
pub fn load_icon(path: impl AsRef<Path>) -> Result<image::RgbaImage> {
    let path = path.as_ref();
    let image = image::open(path).with_context(|| format!("loading icon {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// White disc with a soft edge on a transparent background.
pub fn dot_icon(size: u32) -> image::RgbaImage {
    let size = size.max(1);
    let center = size as f32 / 2.0;
    image::RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let coverage = (center - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
        image::Rgba([255, 255, 255, (coverage * 255.0).round() as u8])
    })
}

/// On-screen sprite size for an icon: native size, scaled down to fit
/// [`MAX_SPRITE_SIZE`] with the aspect ratio kept.
pub fn sprite_size((width, height): (u32, u32)) -> [f32; 2] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let scale = (MAX_SPRITE_SIZE / w.max(h)).min(1.0);
    [w * scale, h * scale]
}
