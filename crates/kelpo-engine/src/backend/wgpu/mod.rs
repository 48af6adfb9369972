//! Windowed backend on `wgpu` and `winit`.
//!
//! A thin binding: the window is pumped from `process_events` instead of
//! owning the thread, and triangles handed to `draw_triangles` are collected
//! and drawn in a single pass when the frame is flipped.
//!
//! winit allows one event loop per process. It is created on the first
//! `initialize` and kept for the lifetime of the backend, so a released
//! backend can be initialized again but a second `WgpuBackend` in the same
//! process cannot.

mod gpu;
mod pipeline;
mod window;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::Window;

use self::gpu::{Gpu, GpuInit, SurfaceErrorAction};
use self::pipeline::TriangleRenderer;
use self::window::WindowHost;
use crate::error::{ErrorChannel, ErrorKind, ErrorRecord, Feature, RenderResult};
use crate::interface::{Backend, InitParams, Version};
use crate::polygon::{Texture, TextureId, Triangle};
use crate::window::{MessageHandler, WindowMessage};

/// Upper bound on event-loop iterations spent waiting for the window.
const WINDOW_PUMP_LIMIT: usize = 64;

/// Backend-specific settings not covered by `InitParams`.
#[derive(Debug, Clone)]
pub struct WgpuConfig {
    pub title: String,
    /// Pick an sRGB surface format when one exists. Off by default: vertex
    /// colors and textures are authored as plain 8-bit values.
    pub prefer_srgb: bool,
    /// Surface frame latency hint.
    pub desired_maximum_frame_latency: u32,
}

impl Default for WgpuConfig {
    fn default() -> Self {
        Self {
            title: "kelpo".to_string(),
            prefer_srgb: false,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Everything `initialize` acquires, in reverse acquisition order.
struct Stages {
    renderer: TriangleRenderer,
    gpu: Gpu,
    window: Arc<Window>,
}

pub struct WgpuBackend {
    config: WgpuConfig,
    event_loop: Option<EventLoop<()>>,
    host: WindowHost,
    stages: Option<Stages>,
    /// Triangles submitted since the last flip.
    frame: Vec<Triangle>,
    clear_requested: bool,
    handler: Option<MessageHandler>,
    open: bool,
}

impl WgpuBackend {
    pub const NAME: &'static str = "wgpu";
    pub const VERSION: Version = Version::new(1, 0, 0);

    pub fn new(config: WgpuConfig) -> Self {
        Self {
            config,
            event_loop: None,
            host: WindowHost::default(),
            stages: None,
            frame: Vec::new(),
            clear_requested: false,
            handler: None,
            open: false,
        }
    }

    pub fn config(&self) -> &WgpuConfig {
        &self.config
    }

    fn stages_mut(&mut self) -> RenderResult<&mut Stages> {
        self.stages
            .as_mut()
            .ok_or_else(|| ErrorRecord::api_call("wgpu backend is not initialized"))
    }

    /// Creates the OS window, creating the event loop first if needed.
    fn open_window(&mut self, params: &InitParams) -> RenderResult<Arc<Window>> {
        let event_loop = match self.event_loop.take() {
            Some(event_loop) => event_loop,
            None => EventLoop::new()
                .context("failed to create winit event loop")
                .map_err(|e| ErrorRecord::from_anyhow(ErrorKind::NativeApiCallFailed, &e))?,
        };
        let event_loop = self.event_loop.insert(event_loop);

        self.host.request_window(
            Window::default_attributes()
                .with_title(self.config.title.clone())
                .with_inner_size(PhysicalSize::new(params.width, params.height)),
        );

        for _ in 0..WINDOW_PUMP_LIMIT {
            if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.host) {
                return Err(ErrorRecord::api_call(format!(
                    "event loop exited with code {code} before the window opened"
                )));
            }
            if let Some(created) = self.host.take_created() {
                return created
                    .map(Arc::new)
                    .map_err(|e| ErrorRecord::from_anyhow(ErrorKind::NativeApiCallFailed, &e));
            }
        }

        Err(ErrorRecord::api_call("window system never created the window"))
    }
}

/// Device index 0, 1 and 2 select the high-performance, low-power and
/// software fallback adapter.
fn adapter_choice(device_index: u32) -> RenderResult<(wgpu::PowerPreference, bool)> {
    match device_index {
        0 => Ok((wgpu::PowerPreference::HighPerformance, false)),
        1 => Ok((wgpu::PowerPreference::LowPower, false)),
        2 => Ok((wgpu::PowerPreference::None, true)),
        n => Err(ErrorRecord::api_call(format!("no graphics device {n} (valid: 0-2)"))),
    }
}

impl Backend for WgpuBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> Version {
        Self::VERSION
    }

    fn initialize(&mut self, params: &InitParams, errors: &mut ErrorChannel) -> RenderResult<()> {
        let (power_preference, force_fallback_adapter) = adapter_choice(params.device_index)?;
        if params.width == 0 || params.height == 0 {
            return Err(ErrorRecord::unsupported(
                Feature::DisplayMode,
                format!("{}x{} surface", params.width, params.height),
            ));
        }

        let window = self.open_window(params)?;

        let init = GpuInit {
            power_preference,
            force_fallback_adapter,
            prefer_srgb: self.config.prefer_srgb,
            vsync: params.vsync,
            desired_maximum_frame_latency: self.config.desired_maximum_frame_latency,
        };
        let gpu = match pollster::block_on(Gpu::new(window.clone(), init)) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.host.detach();
                return Err(ErrorRecord::from_anyhow(ErrorKind::NativeApiCallFailed, &e));
            }
        };
        let renderer = TriangleRenderer::new(&gpu, params.width, params.height);

        if params.bits_per_pixel != 32 {
            errors.push(ErrorRecord::unsupported(
                Feature::DisplayMode,
                format!(
                    "{} bits per pixel requested; presenting in {:?}",
                    params.bits_per_pixel,
                    gpu.surface_format()
                ),
            ));
        }
        if !gpu.vsync_honored() {
            errors.push(ErrorRecord::unsupported(
                Feature::VsyncControl,
                "surface only supports FIFO presentation; vsync stays on",
            ));
        }

        let size = window.inner_size();
        self.host.pending.push_back(WindowMessage::Resized {
            width: size.width,
            height: size.height,
        });
        self.stages = Some(Stages {
            renderer,
            gpu,
            window,
        });
        self.frame.clear();
        self.clear_requested = true;
        self.open = true;
        Ok(())
    }

    fn release(&mut self) -> RenderResult<()> {
        if let Some(stages) = self.stages.take() {
            log::debug!("releasing {} gpu textures", stages.renderer.texture_count());
            drop(stages);
        }
        self.host.detach();
        self.frame.clear();
        self.open = false;

        // Let the window system see the window go away.
        if let Some(event_loop) = self.event_loop.as_mut() {
            let _ = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.host);
            self.host.pending.clear();
        }
        Ok(())
    }

    fn window_handle(&self) -> Option<RawWindowHandle> {
        let stages = self.stages.as_ref()?;
        stages.window.window_handle().ok().map(|h| h.as_raw())
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    fn process_events(&mut self) -> RenderResult<()> {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return Err(ErrorRecord::api_call("wgpu backend has no event loop"));
        };

        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.host) {
            log::info!("winit event loop exited with code {code}");
            self.open = false;
        }

        if let Some(size) = self.host.resized.take() {
            if let Some(stages) = self.stages.as_mut() {
                stages.gpu.resize(size);
            }
        }

        while let Some(message) = self.host.pending.pop_front() {
            if message == WindowMessage::CloseRequested {
                self.open = false;
            }
            if let Some(handler) = self.handler.as_mut() {
                handler(&message);
            }
        }
        Ok(())
    }

    fn flip_surface(&mut self) -> RenderResult<()> {
        let clear = std::mem::take(&mut self.clear_requested);
        let Some(stages) = self.stages.as_mut() else {
            return Err(ErrorRecord::api_call("wgpu backend is not initialized"));
        };

        let mut frame = match stages.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.frame.clear();
                return match stages.gpu.handle_surface_error(e) {
                    SurfaceErrorAction::Fatal => Err(ErrorRecord::new(
                        ErrorKind::OutOfVideoMemory,
                        "surface texture acquisition ran out of memory",
                    )),
                    action => {
                        log::debug!("frame skipped after surface error ({action:?})");
                        Ok(())
                    }
                };
            }
        };

        stages.renderer.render(&stages.gpu, &mut frame, &self.frame, clear);
        stages.gpu.submit(frame);
        log::trace!("wgpu frame presented with {} triangles", self.frame.len());
        self.frame.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn clear_frame(&mut self) -> RenderResult<()> {
        self.stages_mut()?;
        self.frame.clear();
        self.clear_requested = true;
        Ok(())
    }

    fn upload_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()> {
        let stages = self.stages_mut()?;
        stages.renderer.upload(&stages.gpu, id, texture)
    }

    fn update_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()> {
        let stages = self.stages_mut()?;
        if !stages.renderer.contains(id) {
            return Err(ErrorRecord::api_call(format!("update of texture {id:?} that was never uploaded")));
        }
        stages.renderer.upload(&stages.gpu, id, texture)
    }

    fn purge_textures(&mut self) -> RenderResult<()> {
        self.stages_mut()?.renderer.purge();
        Ok(())
    }

    fn draw_triangles(&mut self, triangles: &[Triangle]) -> RenderResult<()> {
        let Some(stages) = self.stages.as_ref() else {
            return Err(ErrorRecord::api_call("wgpu backend is not initialized"));
        };

        let mut unresolved = 0usize;
        self.frame.reserve(triangles.len());
        for tri in triangles {
            let mut tri = *tri;
            if tri.texture.is_some_and(|id| !stages.renderer.contains(id)) {
                tri.texture = None;
                unresolved += 1;
            }
            self.frame.push(tri);
        }

        if unresolved > 0 {
            return Err(ErrorRecord::api_call(format!(
                "{unresolved} triangles referenced textures that are not uploaded; drawn untextured"
            )));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
