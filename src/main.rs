//! Myriad viewer: renders the instanced population in a window and maps
//! the keyboard to the instance-count control surface (Up/Down to double
//! or halve, Escape to quit).

use std::sync::Arc;

use myriad::engine::InstancedRenderEngine;
use myriad::options::Options;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

struct RenderApp {
    window: Option<Arc<Window>>,
    engine: Option<InstancedRenderEngine>,
    options: Options,
}

impl RenderApp {
    fn new(options: Options) -> Self {
        Self {
            window: None,
            engine: None,
            options,
        }
    }

    fn update_title(&self) {
        if let (Some(window), Some(engine)) = (&self.window, &self.engine) {
            window.set_title(&format!(
                "Myriad — {} instances — {:.0} fps",
                engine.applied_instance_count(),
                engine.fps()
            ));
        }
    }
}

impl ApplicationHandler for RenderApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Myriad")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let engine = pollster::block_on(InstancedRenderEngine::with_options(
            window.clone(),
            (size.width.max(1), size.height.max(1)),
            self.options.clone(),
        ));
        let engine = match engine {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("engine initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        self.update_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(engine) = &mut self.engine {
                    engine.release();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let Some(engine) = &mut self.engine else { return };
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => {
                        engine.release();
                        event_loop.exit();
                    }
                    Key::Named(NamedKey::ArrowUp) => {
                        let count = engine.desired_instance_count();
                        engine
                            .set_instance_count(f64::from(count) * 2.0);
                        log::info!(
                            "requested {} instances",
                            engine.desired_instance_count()
                        );
                    }
                    Key::Named(NamedKey::ArrowDown) => {
                        let count = engine.desired_instance_count();
                        engine
                            .set_instance_count(f64::from(count) / 2.0);
                        log::info!(
                            "requested {} instances",
                            engine.desired_instance_count()
                        );
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(engine) = &mut self.engine {
                    if engine.should_render() {
                        match engine.render_frame() {
                            Ok(()) => self.update_title(),
                            Err(
                                wgpu::SurfaceError::Lost
                                | wgpu::SurfaceError::Outdated,
                            ) => {
                                let (w, h) = (
                                    engine.context.config.width,
                                    engine.context.config.height,
                                );
                                engine.resize(w, h);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("surface out of memory");
                                event_loop.exit();
                            }
                            Err(e) => log::warn!("frame skipped: {e}"),
                        }
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let mut options = Options::default();
    if let Some(count) =
        std::env::args().nth(1).and_then(|arg| arg.parse::<f64>().ok())
    {
        options.instances.count = count.max(1.0) as u32;
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("event loop creation failed: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = RenderApp::new(options);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
