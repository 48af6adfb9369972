//! Headless CPU backend.
//!
//! Renders into memory and "presents" by copying the back buffer into a
//! readable front buffer. There is no native window: the window surface is
//! simulated, with messages queued by the backend itself (or posted by the
//! host through [`SoftwareBackend::post_message`]).

mod framebuffer;
mod raster;

use std::any::Any;
use std::collections::{HashMap, VecDeque};

use raw_window_handle::RawWindowHandle;

use self::framebuffer::{DepthBuffer, Surface, CLEAR_COLOR, SUPPORTED_BPP};
use self::raster::{draw_triangle, CachedTexture, Target};
use crate::error::{ErrorChannel, ErrorKind, ErrorRecord, Feature, RenderResult};
use crate::interface::{Backend, InitParams, Version};
use crate::polygon::{Texture, TextureId, Triangle};
use crate::window::{MessageHandler, WindowMessage};

pub use self::framebuffer::Frame;

/// Everything `initialize` acquires.
///
/// Fields drop in declaration order, so they are listed in reverse
/// acquisition order: texture cache, then depth, then surface.
struct Stages {
    textures: HashMap<TextureId, CachedTexture>,
    depth: DepthBuffer,
    surface: Surface,
}

pub struct SoftwareBackend {
    stages: Option<Stages>,
    open: bool,
    handler: Option<MessageHandler>,
    pending: VecDeque<WindowMessage>,
    frames_presented: u64,
}

impl SoftwareBackend {
    pub const NAME: &'static str = "software";
    pub const VERSION: Version = Version::new(1, 0, 0);

    pub fn new() -> Self {
        Self {
            stages: None,
            open: false,
            handler: None,
            pending: VecDeque::new(),
            frames_presented: 0,
        }
    }

    /// The last frame handed to `flip_surface`, once initialized.
    pub fn front_buffer(&self) -> Option<Frame<'_>> {
        self.stages.as_ref().map(|s| Frame::new(&s.surface))
    }

    /// Number of `flip_surface` calls since initialization.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Queues a message for the next `process_events`, as if the window
    /// system had produced it.
    pub fn post_message(&mut self, message: WindowMessage) {
        self.pending.push_back(message);
    }

    fn stages_mut(&mut self) -> RenderResult<&mut Stages> {
        self.stages
            .as_mut()
            .ok_or_else(|| ErrorRecord::api_call("software backend is not initialized"))
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn acquire_surface(params: &InitParams) -> RenderResult<Surface> {
    if !SUPPORTED_BPP.contains(&params.bits_per_pixel) {
        return Err(ErrorRecord::unsupported(
            Feature::DisplayMode,
            format!("{} bits per pixel (supported: 16, 24, 32)", params.bits_per_pixel),
        ));
    }
    if params.width == 0 || params.height == 0 {
        return Err(ErrorRecord::unsupported(
            Feature::DisplayMode,
            format!("{}x{} surface", params.width, params.height),
        ));
    }

    Surface::allocate(params.width, params.height, params.bits_per_pixel).map_err(|e| {
        ErrorRecord::new(
            ErrorKind::OutOfVideoMemory,
            format!("{}x{} color buffers: {e}", params.width, params.height),
        )
    })
}

fn acquire_depth(params: &InitParams) -> RenderResult<DepthBuffer> {
    DepthBuffer::allocate(params.width, params.height)
        .map_err(|e| ErrorRecord::unsupported(Feature::ZBuffering, format!("depth buffer allocation failed: {e}")))
}

fn cache_texture(texture: &Texture) -> RenderResult<CachedTexture> {
    let texels = texture
        .level(0)
        .filter(|px| !px.is_empty())
        .ok_or_else(|| ErrorRecord::api_call("texture has no level-0 pixels to upload"))?;

    Ok(CachedTexture {
        width: texture.width(),
        height: texture.height(),
        texels: texels.to_vec(),
    })
}

impl Backend for SoftwareBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> Version {
        Self::VERSION
    }

    fn initialize(&mut self, params: &InitParams, errors: &mut ErrorChannel) -> RenderResult<()> {
        let surface = acquire_surface(params)?;
        let depth = acquire_depth(params)?;
        let textures = HashMap::new();

        if params.vsync {
            errors.report(
                ErrorKind::UnsupportedFeature(Feature::VsyncControl),
                Some("software backend presents without vsync"),
            );
        }

        self.stages = Some(Stages {
            textures,
            depth,
            surface,
        });
        self.open = true;
        self.frames_presented = 0;
        self.pending.push_back(WindowMessage::Resized {
            width: params.width,
            height: params.height,
        });
        Ok(())
    }

    fn release(&mut self) -> RenderResult<()> {
        self.stages = None;
        self.open = false;
        self.pending.clear();
        Ok(())
    }

    fn window_handle(&self) -> Option<RawWindowHandle> {
        None
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    fn process_events(&mut self) -> RenderResult<()> {
        while let Some(message) = self.pending.pop_front() {
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
        self.stages_mut()?.surface.present();
        self.frames_presented += 1;
        log::trace!("software frame {} presented", self.frames_presented);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn clear_frame(&mut self) -> RenderResult<()> {
        let stages = self.stages_mut()?;
        stages.surface.back.fill(CLEAR_COLOR);
        stages.depth.values.fill(DepthBuffer::FAR);
        Ok(())
    }

    fn upload_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()> {
        let cached = cache_texture(texture)?;
        if self.stages_mut()?.textures.insert(id, cached).is_some() {
            log::debug!("texture {id:?} re-uploaded");
        }
        Ok(())
    }

    fn update_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()> {
        let cached = cache_texture(texture)?;
        match self.stages_mut()?.textures.get_mut(&id) {
            Some(slot) => {
                *slot = cached;
                Ok(())
            }
            None => Err(ErrorRecord::api_call(format!("update of texture {id:?} that was never uploaded"))),
        }
    }

    fn purge_textures(&mut self) -> RenderResult<()> {
        let stages = self.stages_mut()?;
        log::debug!("purging {} textures", stages.textures.len());
        stages.textures.clear();
        Ok(())
    }

    fn draw_triangles(&mut self, triangles: &[Triangle]) -> RenderResult<()> {
        let Stages {
            textures,
            depth,
            surface,
        } = self.stages_mut()?;

        let mut target = Target {
            width: surface.width,
            height: surface.height,
            color: &mut surface.back,
            depth: &mut depth.values,
        };

        let mut unresolved = 0usize;
        for tri in triangles {
            let texture = match tri.texture {
                Some(id) => {
                    let found = textures.get(&id);
                    if found.is_none() {
                        unresolved += 1;
                    }
                    found
                }
                None => None,
            };
            draw_triangle(&mut target, tri, texture);
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

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::interface::Interface;
    use crate::polygon::{TextureRegistry, Vertex};

    fn params(width: u32, height: u32, bpp: u32) -> InitParams {
        InitParams {
            width,
            height,
            bits_per_pixel: bpp,
            vsync: false,
            device_index: 0,
        }
    }

    fn running(width: u32, height: u32) -> SoftwareBackend {
        let mut b = SoftwareBackend::new();
        b.initialize(&params(width, height, 32), &mut ErrorChannel::new()).unwrap();
        b
    }

    fn full_screen(w: f32, h: f32, z: f32, color: [u8; 4]) -> [Triangle; 2] {
        let v = |x, y| Vertex::at(x, y, z).with_uv(x / w, y / h).with_color(color);
        [
            Triangle::new([v(0.0, 0.0), v(0.0, h), v(w, h)]),
            Triangle::new([v(0.0, 0.0), v(w, h), v(w, 0.0)]),
        ]
    }

    #[test]
    fn unsupported_depth_fails_with_display_mode() {
        let mut b = SoftwareBackend::new();
        let err = b.initialize(&params(64, 64, 8), &mut ErrorChannel::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFeature(Feature::DisplayMode));
        assert!(b.front_buffer().is_none());
        assert!(!b.is_open());
    }

    #[test]
    fn vsync_request_is_reported_but_not_fatal() {
        let mut b = SoftwareBackend::new();
        let mut errors = ErrorChannel::new();
        b.initialize(&InitParams::default(), &mut errors).unwrap();
        assert!(b.is_open());
        assert_eq!(
            errors.drain()[0].kind,
            ErrorKind::UnsupportedFeature(Feature::VsyncControl)
        );
    }

    #[test]
    fn resized_message_is_delivered_after_initialize() {
        let mut b = running(32, 16);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        b.set_message_handler(Box::new(move |m: &WindowMessage| sink.borrow_mut().push(*m)));

        b.post_message(WindowMessage::CloseRequested);
        b.process_events().unwrap();

        assert_eq!(
            *seen.borrow(),
            [
                WindowMessage::Resized { width: 32, height: 16 },
                WindowMessage::CloseRequested
            ]
        );
        assert!(!b.is_open());
    }

    #[test]
    fn draw_then_flip_presents_the_frame() {
        let mut b = running(16, 16);
        b.clear_frame().unwrap();
        b.draw_triangles(&full_screen(16.0, 16.0, 0.5, [10, 20, 30, 255])).unwrap();

        // Nothing visible before the flip.
        assert_eq!(b.front_buffer().unwrap().pixel(8, 8), Some(CLEAR_COLOR));

        b.flip_surface().unwrap();
        let frame = b.front_buffer().unwrap();
        assert!(frame.pixels().iter().all(|&p| p == [10, 20, 30, 255]));
        assert_eq!(b.frames_presented(), 1);
    }

    #[test]
    fn depth_survives_draw_calls_until_cleared() {
        let mut b = running(8, 8);
        b.clear_frame().unwrap();
        b.draw_triangles(&full_screen(8.0, 8.0, 0.1, [255, 0, 0, 255])).unwrap();
        b.draw_triangles(&full_screen(8.0, 8.0, 0.9, [0, 255, 0, 255])).unwrap();
        b.flip_surface().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(3, 3), Some([255, 0, 0, 255]));

        b.clear_frame().unwrap();
        b.draw_triangles(&full_screen(8.0, 8.0, 0.9, [0, 255, 0, 255])).unwrap();
        b.flip_surface().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(3, 3), Some([0, 255, 0, 255]));
    }

    #[test]
    fn textured_draw_uses_the_upload_not_the_source() {
        let mut textures = TextureRegistry::new();
        let mut tex = Texture::create_from_rgb888(1, 1, &[255, 255, 255]).unwrap();
        let id = textures.insert(tex.clone());

        let mut b = running(4, 4);
        b.upload_texture(id, &tex).unwrap();
        tex.release_pixels();

        let tris = full_screen(4.0, 4.0, 0.0, [255, 128, 0, 255]).map(|t| Triangle { texture: Some(id), ..t });
        b.clear_frame().unwrap();
        b.draw_triangles(&tris).unwrap();
        b.flip_surface().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(1, 2), Some([255, 128, 0, 255]));

        // A source without pixels cannot refresh the upload.
        assert!(b.update_texture(id, &tex).is_err());
    }

    #[test]
    fn unknown_texture_draws_untextured_and_reports() {
        let mut textures = TextureRegistry::new();
        let id = textures.insert(Texture::create_from_rgb888(1, 1, &[0, 0, 0]).unwrap());

        let mut b = running(4, 4);
        let tris = full_screen(4.0, 4.0, 0.0, [1, 2, 3, 255]).map(|t| Triangle { texture: Some(id), ..t });
        b.clear_frame().unwrap();
        let err = b.draw_triangles(&tris).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NativeApiCallFailed);

        b.flip_surface().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(0, 0), Some([1, 2, 3, 255]));

        assert!(b.update_texture(id, &Texture::create_from_rgb888(1, 1, &[9, 9, 9]).unwrap()).is_err());
    }

    #[test]
    fn purge_forgets_uploads() {
        let mut textures = TextureRegistry::new();
        let tex = Texture::create_from_rgb888(1, 1, &[200, 0, 0]).unwrap();
        let id = textures.insert(tex.clone());

        let mut b = running(2, 2);
        b.upload_texture(id, &tex).unwrap();
        b.purge_textures().unwrap();
        assert!(b.update_texture(id, &tex).is_err());
    }

    #[test]
    fn sixteen_bit_frames_are_quantized() {
        let mut b = SoftwareBackend::new();
        b.initialize(&params(4, 4, 16), &mut ErrorChannel::new()).unwrap();
        b.clear_frame().unwrap();
        b.draw_triangles(&full_screen(4.0, 4.0, 0.0, [7, 7, 7, 255])).unwrap();
        b.flip_surface().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(0, 0), Some([0, 4, 0, 255]));
    }

    #[test]
    fn release_frees_everything() {
        let mut b = running(4, 4);
        b.release().unwrap();
        assert!(b.front_buffer().is_none());
        assert!(!b.is_open());
        assert!(b.clear_frame().is_err());
    }

    #[test]
    fn drives_through_an_interface() {
        let mut errors = ErrorChannel::new();
        let mut iface = Interface::from_backend(Box::new(SoftwareBackend::new()));
        assert!(iface.initialize(&params(8, 8, 24), &mut errors));
        assert!(iface.process_events(&mut errors));
        assert!(iface.clear_frame(&mut errors));
        assert!(iface.draw_triangles(&full_screen(8.0, 8.0, 0.0, [50, 60, 70, 80]), &mut errors));
        assert!(iface.flip_surface(&mut errors));
        assert!(errors.is_empty());

        let sw = iface.backend().as_any().downcast_ref::<SoftwareBackend>().unwrap();
        assert_eq!(sw.front_buffer().unwrap().pixel(7, 7), Some([50, 60, 70, 255]));
    }
}
