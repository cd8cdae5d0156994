use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

use crate::loader::LoadContext;
use crate::sync::{ClientWaitResult, Fence, FenceError};

/// Per-layer style uniform (32 bytes).
///
///  offset  0  color  [f32; 4]
///  offset 16  size   [f32; 2]  sprite size in logical px (points only)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StyleUniform {
    pub color: [f32; 4],
    pub size: [f32; 2],
    pub _pad: [f32; 2],
}

impl StyleUniform {
    pub fn line(color: [f32; 4]) -> Self {
        Self { color, size: [0.0; 2], _pad: [0.0; 2] }
    }

    pub fn point(color: [f32; 4], size: [f32; 2]) -> Self {
        Self { color, size, _pad: [0.0; 2] }
    }
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

/// Bind group layouts shared by the renderer and by builders on the worker.
///
/// Layers are built against these layouts on the secondary context and drawn
/// with pipelines created from them on the primary one.
pub struct LayerLayouts {
    /// group 0: view uniform.
    pub view: wgpu::BindGroupLayout,
    /// group 1 of the line pipeline: style uniform.
    pub line_style: wgpu::BindGroupLayout,
    /// group 1 of the point pipeline: style uniform, icon texture, sampler.
    pub point_style: wgpu::BindGroupLayout,
    pub icon_sampler: wgpu::Sampler,
}

impl LayerLayouts {
    pub fn new(device: &wgpu::Device, view_uniform_size: usize) -> Self {
        let style_size = std::mem::size_of::<StyleUniform>();

        let view = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("meridian view bgl"),
            entries: &[uniform_entry(0, view_uniform_size)],
        });

        let line_style = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("meridian line style bgl"),
            entries: &[uniform_entry(0, style_size)],
        });

        let point_style = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("meridian point style bgl"),
            entries: &[
                uniform_entry(0, style_size),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let icon_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("meridian icon sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self { view, line_style, point_style, icon_sampler }
    }
}

/// Secondary context for the load worker.
///
/// Shares the primary device: every buffer and texture created here is
/// visible to the render thread. wgpu contexts are not bound to threads, so
/// `make_current` has nothing to bind.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layouts: Arc<LayerLayouts>,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, layouts: Arc<LayerLayouts>) -> Self {
        Self { device, queue, layouts }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn layouts(&self) -> &LayerLayouts {
        &self.layouts
    }
}

impl LoadContext for WgpuContext {
    type Fence = WgpuFence;

    fn make_current(&mut self) -> Result<()> {
        log::trace!(
            "secondary context current on {:?}",
            std::thread::current().name().unwrap_or("<unnamed>")
        );
        Ok(())
    }

    fn create_fence(&mut self) -> Result<WgpuFence> {
        Ok(WgpuFence::insert(&self.device, &self.queue))
    }
}

impl Drop for WgpuContext {
    fn drop(&mut self) {
        log::debug!("secondary context released");
    }
}

/// Completion marker for everything submitted to the queue before it.
///
/// Inserting the fence submits an empty batch, which also flushes staged
/// `write_buffer`/`write_texture` uploads.
pub struct WgpuFence {
    device: wgpu::Device,
    submission: wgpu::SubmissionIndex,
    signaled: Arc<AtomicBool>,
}

impl WgpuFence {
    pub fn insert(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let signaled = Arc::new(AtomicBool::new(false));
        let submission = queue.submit(std::iter::empty::<wgpu::CommandBuffer>());

        let flag = Arc::clone(&signaled);
        queue.on_submitted_work_done(move || flag.store(true, Ordering::Release));

        Self {
            device: device.clone(),
            submission,
            signaled,
        }
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

impl Fence for WgpuFence {
    fn client_wait(&self, timeout: Duration) -> Result<ClientWaitResult, FenceError> {
        if self.is_signaled() {
            return Ok(ClientWaitResult::Signaled);
        }

        let poll = if timeout.is_zero() {
            wgpu::PollType::Poll
        } else {
            wgpu::PollType::Wait {
                submission_index: Some(self.submission.clone()),
                timeout: Some(timeout),
            }
        };

        match self.device.poll(poll) {
            Ok(_) => {}
            Err(wgpu::PollError::Timeout) => return Ok(ClientWaitResult::TimeoutExpired),
            Err(e) => return Err(FenceError::Device(format!("{e:?}"))),
        }

        Ok(if self.is_signaled() {
            ClientWaitResult::Signaled
        } else {
            ClientWaitResult::TimeoutExpired
        })
    }
}
