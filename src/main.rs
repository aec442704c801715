//! Desktop demo: three spinning cubes, one per geometry layout.
//!
//! Usage: `cube-demo [config.json]`

use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use std::error::Error;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use gl_cube_mesh::logging::{init_logging, LoggingConfig};
use gl_cube_mesh::{CubeScenePass, FrameInfo, GlowContext, RenderPassManager, RendererConfig};

#[cfg(target_os = "macos")]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(windows)]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Wgl(Some(window))
}

#[cfg(not(any(target_os = "macos", windows)))]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

// Field order is drop order: GPU objects go before the context that owns them.
struct Graphics {
    passes: RenderPassManager<GlowContext>,
    gl: Rc<GlowContext>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

struct App {
    config: RendererConfig,
    graphics: Option<Graphics>,
    start_time: Option<Instant>,
    error: Option<Box<dyn Error>>,
}

impl App {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            graphics: None,
            start_time: None,
            error: None,
        }
    }

    fn init_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, Box<dyn Error>> {
        let window_config = &self.config.window;
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title(window_config.title.clone())
                .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
        )?;

        let raw_handle = window.window_handle()?.as_raw();
        let display = unsafe {
            Display::new(window.display_handle()?.as_raw(), display_preference(raw_handle))?
        };
        let template = ConfigTemplateBuilder::new()
            .with_depth_size(24)
            .compatible_with_native_window(raw_handle)
            .build();
        let gl_config = unsafe { display.find_configs(template)? }
            .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
            .ok_or("no GL config offers a 24-bit depth buffer for this window")?;

        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(Some(raw_handle));
        let not_current = unsafe { display.create_context(&gl_config, &ctx_attrs)? };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_handle,
            NonZeroU32::new(size.width.max(1)).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(size.height.max(1)).unwrap_or(NonZeroU32::MIN),
        );
        let gl_surface = unsafe { display.create_window_surface(&gl_config, &attrs)? };
        let gl_context = not_current.make_current(&gl_surface)?;

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s))
        };
        let gl = Rc::new(GlowContext::new(gl));
        log::info!("GL context ready ({}x{})", size.width, size.height);

        let mut passes = RenderPassManager::new(gl.clone());
        passes.add_pass(Box::new(CubeScenePass::with_stock_cubes(&gl, &self.config)?));

        Ok(Graphics {
            passes,
            gl,
            gl_surface,
            gl_context,
            window,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        match self.init_graphics(event_loop) {
            Ok(graphics) => {
                graphics.window.request_redraw();
                self.start_time = Some(Instant::now());
                self.graphics = Some(graphics);
            }
            Err(e) => {
                log::error!("failed to initialise graphics: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                let size = graphics.window.inner_size();
                let frame = FrameInfo {
                    width: size.width,
                    height: size.height,
                    elapsed: self
                        .start_time
                        .map(|s| s.elapsed().as_secs_f32())
                        .unwrap_or(0.0),
                };
                graphics.passes.execute_passes(&frame);

                if let Err(e) = graphics.gl_surface.swap_buffers(&graphics.gl_context) {
                    log::warn!("swap_buffers failed: {e}; treating context as lost");
                    graphics.gl.dispose();
                }
                graphics.window.request_redraw();
            }

            WindowEvent::Resized(size) => {
                if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    graphics.gl_surface.resize(&graphics.gl_context, w, h);
                }
                graphics.window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging(LoggingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::load(path)?,
        None => RendererConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
