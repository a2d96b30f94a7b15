use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::error::RenderError;
use crate::gpu::{FrameDriver, GpuContext, MediaInputs, TickOutcome};
use crate::input::{InteractionTracker, SurfaceGeometry};
use crate::runtime::{FrameScheduler, SimulationClock};
use crate::types::{AdapterProfile, RendererConfig};

const SOFTWARE_FPS_CAP: f32 = 15.0;

#[derive(Debug)]
enum FrameError {
    Surface(wgpu::SurfaceError),
    Render(RenderError),
}

/// Window, device and simulation for the interactive host.
///
/// Field order matters: the surface must be dropped before the window.
struct WindowState {
    driver: FrameDriver,
    gpu: GpuContext,
    tracker: InteractionTracker,
    clock: SimulationClock,
    window: Arc<Window>,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig, media: MediaInputs) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.as_ref(), size, config.gpu_power)?;
        let driver = FrameDriver::start(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format,
            gpu.size,
            &config.simulation,
            media,
        )
        .context("failed to start simulation")?;
        // Events and the surface both arrive in physical pixels.
        let tracker = InteractionTracker::new(SurfaceGeometry::identity(gpu.size));

        Ok(Self {
            driver,
            gpu,
            tracker,
            clock: SimulationClock::start(),
            window,
        })
    }

    fn adapter_profile(&self) -> &AdapterProfile {
        &self.gpu.adapter_profile
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.tracker.set_geometry(SurfaceGeometry {
            display: (f64::from(new_size.width), f64::from(new_size.height)),
            drawable: self.gpu.size,
        });
    }

    /// Returns `false` when the tick was skipped.
    fn render_frame(&mut self) -> Result<bool, FrameError> {
        let window_size = self.window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
            return Ok(false);
        }

        let frame = self
            .gpu
            .surface
            .get_current_texture()
            .map_err(FrameError::Surface)?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let extent = frame.texture.size();
        let outcome = self
            .driver
            .tick(
                self.clock.elapsed(),
                PhysicalSize::new(extent.width, extent.height),
                self.tracker.snapshot(),
                &view,
            )
            .map_err(FrameError::Render)?;
        self.window.pre_present_notify();
        frame.present();
        Ok(matches!(outcome, TickOutcome::Rendered { .. }))
    }
}

/// Opens a window and runs the simulation until it is closed.
pub(crate) fn run_window(config: RendererConfig, media: MediaInputs) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, media)?;

    let profile = state.adapter_profile().clone();
    let mut target_fps = config.target_fps;
    if profile.is_software() && target_fps.is_none() {
        target_fps = Some(SOFTWARE_FPS_CAP);
        tracing::warn!(
            adapter = %profile.name,
            backend = ?profile.backend,
            cap = SOFTWARE_FPS_CAP,
            "software rasterizer detected; capping to {} FPS (override with --fps)",
            SOFTWARE_FPS_CAP
        );
    }
    let mut scheduler = FrameScheduler::new(target_fps);
    tracing::info!(
        adapter = %profile.name,
        fps_cap = ?target_fps,
        "window ready"
    );
    state.window.request_redraw();

    let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::new(RefCell::new(None));
    let loop_failure = Rc::clone(&failure);

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::Resized(new_size) => state.resize(new_size),
            WindowEvent::CursorMoved { position, .. } => {
                state.tracker.pointer_moved((position.x, position.y));
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match button_state {
                ElementState::Pressed => state.tracker.button_pressed(button),
                ElementState::Released => state.tracker.button_released(button),
            },
            WindowEvent::Touch(touch) => {
                state
                    .tracker
                    .touch(touch.phase, (touch.location.x, touch.location.y));
            }
            WindowEvent::RedrawRequested => match state.render_frame() {
                Ok(true) => scheduler.mark_rendered(Instant::now()),
                Ok(false) => {}
                Err(FrameError::Surface(err)) => match err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        tracing::debug!(error = ?err, "reconfiguring surface");
                        state.gpu.reconfigure();
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        tracing::error!("surface out of memory; exiting");
                        *loop_failure.borrow_mut() = Some(anyhow!("surface out of memory"));
                        elwt.exit();
                    }
                    wgpu::SurfaceError::Timeout => {
                        tracing::warn!("surface timeout; retrying next frame");
                    }
                    other => {
                        tracing::warn!(error = ?other, "surface error; retrying next frame");
                    }
                },
                Err(FrameError::Render(err)) => {
                    tracing::error!(error = %err, "simulation failed");
                    *loop_failure.borrow_mut() = Some(anyhow::Error::new(err));
                    elwt.exit();
                }
            },
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if scheduler.ready_for_frame(now) {
                state.window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = scheduler.next_deadline() {
                tracing::trace!(
                    deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                    "waiting until next frame"
                );
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    let taken = failure.borrow_mut().take();
    match taken {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
