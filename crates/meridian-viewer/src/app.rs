use anyhow::{Context, Result};
use meridian_engine::core::{App, AppControl, FrameCtx};
use meridian_engine::device::Gpu;
use meridian_engine::layers::{
    ShapefileLayer, StyleUniform, WgpuContext, default_builders, mesh,
};
use meridian_engine::loader::{LoadCoordinator, LoadError};
use meridian_engine::render::LayerRenderer;
use meridian_shapefile::ShapeType;

use crate::config::ViewerConfig;

const CLEAR: wgpu::Color = wgpu::Color { r: 0.02, g: 0.04, b: 0.08, a: 1.0 };
const GRATICULE_COLOR: [f32; 4] = [0.20, 0.24, 0.30, 1.0];
const GRATICULE_STEP: f32 = 15.0;

/// Map viewer: graticule base layer plus shapefile layers loaded in the
/// background and adopted as they finish.
pub struct ViewerApp {
    config: ViewerConfig,
    renderer: Option<LayerRenderer>,
    graticule: Option<ShapefileLayer>,
    loader: Option<LoadCoordinator<WgpuContext, ShapefileLayer>>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            renderer: None,
            graticule: None,
            loader: None,
        }
    }
}

impl App for ViewerApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let renderer = LayerRenderer::new(gpu.device());
        let layouts = renderer.layouts();

        self.graticule = Some(ShapefileLayer::lines(
            gpu.device(),
            &layouts,
            "graticule",
            ShapeType::PolyLine,
            &mesh::graticule(GRATICULE_STEP),
            StyleUniform::line(GRATICULE_COLOR),
        ));
        self.renderer = Some(renderer);

        let (device, queue) = gpu.share();
        let context = WgpuContext::new(device, queue, layouts);
        let mut loader = LoadCoordinator::new(context, default_builders(), self.config.loader.clone());

        for request in self.config.requests() {
            loader.request(request).context("queueing startup layers")?;
        }

        log::info!(
            "loading {} layer(s) from {} ({:?})",
            loader.pending_requests(),
            self.config.data_dir.display(),
            loader.mode()
        );

        match loader.start() {
            Ok(()) => {}
            Err(e @ LoadError::Spawn(_)) => return Err(e).context("starting layer loader"),
            Err(e) => log::error!("layer loading stopped: {e}"),
        }

        self.loader = Some(loader);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (Some(renderer), Some(loader)) = (self.renderer.as_mut(), self.loader.as_mut()) else {
            return AppControl::Continue;
        };
        let graticule = self.graticule.as_ref();

        ctx.render(CLEAR, |rctx, target| {
            loader.on_frame(|layers| {
                renderer.render(rctx, target, graticule.into_iter().chain(layers));
            });
        })
    }

    fn on_exit(&mut self) {
        if let Some(loader) = self.loader.take() {
            let report = loader.dispose();
            log::info!(
                "released {} layer(s); {} request(s) never loaded",
                report.renderables_released,
                report.requests_discarded
            );
        }
        self.graticule = None;
        self.renderer = None;
    }
}
