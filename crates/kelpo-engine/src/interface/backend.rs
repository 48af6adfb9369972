use std::any::Any;

use raw_window_handle::RawWindowHandle;

use super::{InitParams, Version};
use crate::error::{ErrorChannel, RenderResult};
use crate::polygon::{Texture, TextureId, Triangle};
use crate::window::MessageHandler;

/// Capability table every rendering backend implements.
///
/// Backends are driven through an [`Interface`](super::Interface), which only
/// forwards calls while the backend is running. Implementations can therefore
/// assume `initialize` succeeded before any window or rasterizer call.
pub trait Backend {
    /// Stable name the backend is registered under.
    fn name(&self) -> &str;

    fn version(&self) -> Version;

    /// Acquires the window, surface and rasterizer.
    ///
    /// On `Err` everything acquired so far must already be released. Non-fatal
    /// problems (an ignored vsync request, say) go to `errors` and the call
    /// still succeeds.
    fn initialize(&mut self, params: &InitParams, errors: &mut ErrorChannel) -> RenderResult<()>;

    /// Releases everything `initialize` acquired, in reverse order.
    fn release(&mut self) -> RenderResult<()>;

    /// Native handle of the output window, if the backend has one.
    fn window_handle(&self) -> Option<RawWindowHandle>;

    /// Installs the callback that receives window messages from `process_events`.
    fn set_message_handler(&mut self, handler: MessageHandler);

    /// Drains pending window events into the message handler. Never blocks.
    fn process_events(&mut self) -> RenderResult<()>;

    /// Presents the finished frame. May block for vsync.
    fn flip_surface(&mut self) -> RenderResult<()>;

    /// `false` once the window has been closed.
    fn is_open(&self) -> bool;

    /// Clears color and depth for a new frame.
    fn clear_frame(&mut self) -> RenderResult<()>;

    /// Copies `texture` (every level present) into backend storage under `id`.
    ///
    /// The caller may release the texture's pixels afterwards.
    fn upload_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()>;

    /// Re-copies the pixels of an already uploaded texture.
    fn update_texture(&mut self, id: TextureId, texture: &Texture) -> RenderResult<()>;

    /// Drops every uploaded texture.
    fn purge_textures(&mut self) -> RenderResult<()>;

    /// Rasterizes screen-space triangles into the current frame.
    fn draw_triangles(&mut self, triangles: &[Triangle]) -> RenderResult<()>;

    /// Access to the concrete backend, e.g. to read back a software frame.
    fn as_any(&self) -> &dyn Any;
}
