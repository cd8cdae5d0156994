use meridian_shapefile::ShapeType;
use wgpu::util::DeviceExt;

use crate::loader::ShapefileRequest;

use super::gpu::{LayerLayouts, StyleUniform};
use super::mesh::{LineVertex, PointInstance};

/// GPU geometry of a layer. Empty layers own no vertex buffer.
pub enum LayerGeometry {
    Lines { buffer: Option<wgpu::Buffer>, vertex_count: u32 },
    Points { buffer: Option<wgpu::Buffer>, instance_count: u32 },
}

/// A loaded shapefile ready to draw: vertex data, style and optional icon.
///
/// GPU objects are released when the layer is dropped.
pub struct ShapefileLayer {
    name: String,
    shape_type: ShapeType,
    geometry: LayerGeometry,
    style: wgpu::BindGroup,
    _style_buffer: wgpu::Buffer,
    _icon: Option<wgpu::Texture>,
}

fn vertex_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
) -> Option<wgpu::Buffer> {
    if data.is_empty() {
        return None;
    }
    Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    }))
}

fn style_buffer(device: &wgpu::Device, label: &str, style: &StyleUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(style),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

impl ShapefileLayer {
    /// Line-list layer (polygon outlines, polylines, graticule).
    pub fn lines(
        device: &wgpu::Device,
        layouts: &LayerLayouts,
        name: impl Into<String>,
        shape_type: ShapeType,
        vertices: &[LineVertex],
        style: StyleUniform,
    ) -> Self {
        let name = name.into();

        let buffer = vertex_buffer(device, "meridian line vbo", vertices);
        let style_buffer = style_buffer(device, "meridian line style ubo", &style);
        let style = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("meridian line style bind group"),
            layout: &layouts.line_style,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: style_buffer.as_entire_binding(),
            }],
        });

        log::debug!("{name}: {} line segment(s)", vertices.len() / 2);

        Self {
            name,
            shape_type,
            geometry: LayerGeometry::Lines {
                buffer,
                vertex_count: vertices.len() as u32,
            },
            style,
            _style_buffer: style_buffer,
            _icon: None,
        }
    }

    /// Instanced sprite layer drawing `icon` at every point.
    pub fn points(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &LayerLayouts,
        request: &ShapefileRequest,
        instances: &[PointInstance],
        icon: &image::RgbaImage,
        style: StyleUniform,
    ) -> Self {
        let (width, height) = icon.dimensions();
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("meridian icon"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if width > 0 && height > 0 {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                icon.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let buffer = vertex_buffer(device, "meridian point instances", instances);
        let style_buffer = style_buffer(device, "meridian point style ubo", &style);
        let style = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("meridian point style bind group"),
            layout: &layouts.point_style,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: style_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&layouts.icon_sampler),
                },
            ],
        });

        log::debug!("{}: {} point(s), icon {width}x{height}", request.path(), instances.len());

        Self {
            name: request.path().to_string(),
            shape_type: request.shape_type(),
            geometry: LayerGeometry::Points {
                buffer,
                instance_count: instances.len() as u32,
            },
            style,
            _style_buffer: style_buffer,
            _icon: Some(texture),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn geometry(&self) -> &LayerGeometry {
        &self.geometry
    }

    pub fn style(&self) -> &wgpu::BindGroup {
        &self.style
    }
}

impl Drop for ShapefileLayer {
    fn drop(&mut self) {
        log::debug!("released layer {}", self.name);
    }
}
