use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::layers::mesh::{LineVertex, PointInstance, QUAD_CORNERS, QUAD_INDICES, quad_layout};
use crate::layers::{LayerGeometry, LayerLayouts, ShapefileLayer};

use super::ctx::{RenderCtx, RenderTarget};
use super::map_view::ViewUniform;

/// Draws map layers in the order given.
///
/// Owns the view uniform and the two pipelines (line list, instanced point
/// sprites). Pipelines are rebuilt when the surface format changes.
pub struct LayerRenderer {
    layouts: Arc<LayerLayouts>,

    pipeline_format: Option<wgpu::TextureFormat>,
    line_pipeline: Option<wgpu::RenderPipeline>,
    point_pipeline: Option<wgpu::RenderPipeline>,

    view_ubo: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
}

impl LayerRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        let layouts = Arc::new(LayerLayouts::new(device, std::mem::size_of::<ViewUniform>()));

        let view_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("meridian view ubo"),
            size: std::mem::size_of::<ViewUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("meridian view bind group"),
            layout: &layouts.view,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_ubo.as_entire_binding(),
            }],
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("meridian quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("meridian quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            layouts,
            pipeline_format: None,
            line_pipeline: None,
            point_pipeline: None,
            view_ubo,
            view_bind_group,
            quad_vbo,
            quad_ibo,
        }
    }

    /// Layouts to build layers against; shared with the load worker.
    pub fn layouts(&self) -> Arc<LayerLayouts> {
        Arc::clone(&self.layouts)
    }

    pub fn render<'l, I>(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, layers: I)
    where
        I: IntoIterator<Item = &'l ShapefileLayer>,
    {
        self.ensure_pipelines(ctx);
        ctx.queue
            .write_buffer(&self.view_ubo, 0, bytemuck::bytes_of(&ctx.view.uniform()));

        let Some(line_pipeline) = self.line_pipeline.as_ref() else { return };
        let Some(point_pipeline) = self.point_pipeline.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("meridian layer pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, &self.view_bind_group, &[]);

        for layer in layers {
            match layer.geometry() {
                LayerGeometry::Lines { buffer: Some(vbo), vertex_count } => {
                    rpass.set_pipeline(line_pipeline);
                    rpass.set_bind_group(1, layer.style(), &[]);
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.draw(0..*vertex_count, 0..1);
                }
                LayerGeometry::Points { buffer: Some(instances), instance_count } => {
                    rpass.set_pipeline(point_pipeline);
                    rpass.set_bind_group(1, layer.style(), &[]);
                    rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
                    rpass.set_vertex_buffer(1, instances.slice(..));
                    rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..*instance_count);
                }
                LayerGeometry::Lines { buffer: None, .. }
                | LayerGeometry::Points { buffer: None, .. } => {}
            }
        }
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format)
            && self.line_pipeline.is_some()
            && self.point_pipeline.is_some()
        {
            return;
        }

        let line_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("meridian line pipeline layout"),
            bind_group_layouts: &[&self.layouts.view, &self.layouts.line_style],
            immediate_size: 0,
        });
        let point_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("meridian point pipeline layout"),
            bind_group_layouts: &[&self.layouts.view, &self.layouts.point_style],
            immediate_size: 0,
        });

        let line_shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("meridian line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });
        let point_shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("meridian point shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point.wgsl").into()),
        });

        self.line_pipeline = Some(create_pipeline(
            ctx,
            "meridian line pipeline",
            &line_layout,
            &line_shader,
            &[LineVertex::layout()],
            wgpu::PrimitiveTopology::LineList,
        ));
        self.point_pipeline = Some(create_pipeline(
            ctx,
            "meridian point pipeline",
            &point_layout,
            &point_shader,
            &[quad_layout(), PointInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
        ));
        self.pipeline_format = Some(ctx.surface_format);
    }
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
