use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::MapView;
use crate::time::{DEFAULT_UPDATE_RATE, FrameClock, FramePacer};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Fixed frame rate in Hz; `None` redraws continuously.
    pub update_rate: Option<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "meridian".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            update_rate: Some(DEFAULT_UPDATE_RATE),
        }
    }
}

/// Entry point for the runtime: one window, one primary GPU context.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.shutdown();
        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    pacer: FramePacer,
    view: MapView,

    exit_requested: bool,
    app_exited: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        let pacer = FramePacer::new(config.update_rate);
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            pacer,
            view: MapView::new(1, 1, 1.0),
            exit_requested: false,
            app_exited: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure.get_or_insert(error);
        self.exit(event_loop);
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        self.shutdown();
        event_loop.exit();
    }

    /// Runs `on_exit` once, then drops the window and its primary context.
    fn shutdown(&mut self) {
        if !self.app_exited {
            self.app_exited = true;
            self.app.on_exit();
        }
        if self.entry.take().is_some() {
            log::debug!("primary context released");
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let size = window.inner_size();
        self.view = MapView::new(size.width, size.height, window.scale_factor());

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let (app, entry) = (&mut self.app, self.entry.insert(entry));
        entry.with_gpu(|gpu| {
            let info = gpu.adapter_info();
            log::info!("using {} ({:?})", info.name, info.backend);
            app.on_gpu_ready(gpu)
        })?;
        app.on_resize(size, entry.with_window(|w| w.scale_factor()));

        Ok(())
    }

    fn resize(&mut self) {
        let Some(entry) = self.entry.as_mut() else { return };
        let (size, scale) = entry.with_window(|w| (w.inner_size(), w.scale_factor()));
        entry.with_gpu_mut(|gpu| gpu.resize(size));
        self.view.resize(size.width, size.height, scale);
        self.app.on_resize(size, scale);
    }

    fn redraw(&mut self) -> AppControl {
        let (app, view) = (&mut self.app, self.view);
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                time: fields.clock.tick(),
                view,
            };
            app.on_frame(&mut ctx)
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_ref() else { return };

        if self.pacer.poll(Instant::now()) {
            entry.with_window(|w| w.request_redraw());
        }

        match self.pacer.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resize();
                if let Some(entry) = self.entry.as_ref() {
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.exit(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
