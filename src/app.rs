use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::context::RenderContext;
use crate::gpu::GpuContext;

/// Configuration for the app window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Bokeh".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

type SetupFn = Box<dyn FnOnce(&GpuContext) -> crate::error::Result<RenderContext>>;

/// Run a windowed application. The setup closure builds the scene, camera,
/// and render context once the GPU is available; after that every redraw
/// runs one frame through the post-process pipeline.
///
/// # Example
/// ```ignore
/// bokeh::run(AppConfig::new().title("Scene"), |gpu| {
///     let camera = Camera::perspective(50.0, gpu.aspect(), 0.1, 15.0)?
///         .at(Vec3::new(0.0, 0.0, 10.0));
///     let mut scene = Scene::new();
///     scene.add(Node {
///         mesh: Mesh::plane(gpu, 4.0),
///         transform: Transform::new(),
///         color: [0.6, 0.6, 0.6, 1.0],
///     });
///     RenderContext::new(gpu, scene, camera, Animator::default())
/// })
/// ```
pub fn run<S>(config: AppConfig, setup: S) -> anyhow::Result<()>
where
    S: FnOnce(&GpuContext) -> crate::error::Result<RenderContext> + 'static,
{
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::Pending {
        config,
        setup: Some(Box::new(setup)),
    };

    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    if let App::Failed(e) = app {
        return Err(e);
    }
    Ok(())
}

enum App {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        context: RenderContext,
        start_time: Instant,
    },
    Failed(anyhow::Error),
}

impl App {
    fn start(config: &AppConfig, setup: SetupFn, event_loop: &ActiveEventLoop) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );
        let gpu = GpuContext::new(window.clone()).context("failed to initialize GPU")?;
        let context = setup(&gpu).context("application setup failed")?;

        log::info!("started at {}x{}", gpu.width(), gpu.height());

        Ok(App::Running {
            window,
            gpu,
            context,
            start_time: Instant::now(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let App::Pending { config, setup } = self {
            let Some(setup) = setup.take() else {
                return;
            };
            *self = match App::start(config, setup, event_loop) {
                Ok(running) => running,
                Err(e) => {
                    event_loop.exit();
                    App::Failed(e)
                }
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let App::Running {
            window,
            gpu,
            context,
            start_time,
        } = self
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Only stash the size; it is applied at the next frame
                // boundary so event bursts collapse into one rebuild.
                context.resize.notify(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let time = start_time.elapsed().as_secs_f32();
                context.frame(gpu, time);
                window.request_redraw();
            }
            _ => {}
        }
    }
}
