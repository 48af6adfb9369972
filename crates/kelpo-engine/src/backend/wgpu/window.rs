use std::collections::VecDeque;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, NativeKeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::window::{Key, WindowMessage};

/// winit application state pumped by the wgpu backend.
///
/// Windows can only be created from inside an event-loop callback, so
/// `initialize` leaves a request here and pumps until it is served.
#[derive(Default)]
pub(super) struct WindowHost {
    resumed: bool,
    requested: Option<WindowAttributes>,
    created: Option<Result<Window>>,
    window_id: Option<WindowId>,
    /// Latest surface size reported by the window system, not yet applied.
    pub resized: Option<PhysicalSize<u32>>,
    pub pending: VecDeque<WindowMessage>,
}

impl WindowHost {
    pub fn request_window(&mut self, attributes: WindowAttributes) {
        self.requested = Some(attributes);
        self.created = None;
    }

    pub fn take_created(&mut self) -> Option<Result<Window>> {
        let created = self.created.take()?;
        if let Ok(window) = &created {
            self.window_id = Some(window.id());
        }
        Some(created)
    }

    /// Forgets the current window; its late events are ignored.
    pub fn detach(&mut self) {
        self.window_id = None;
        self.resized = None;
        self.pending.clear();
    }

    fn serve_request(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attributes) = self.requested.take() {
            self.created = Some(event_loop.create_window(attributes).context("failed to create window"));
        }
    }
}

impl ApplicationHandler for WindowHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.resumed = true;
        self.serve_request(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Later initializations (after a release) are served here: `resumed`
        // is not repeated on desktop platforms.
        if self.resumed {
            self.serve_request(event_loop);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window_id != Some(window_id) {
            return;
        }

        if let WindowEvent::Resized(size) = event {
            self.resized = Some(size);
        }

        if let Some(message) = translate_window_event(&event) {
            self.pending.push_back(message);
        }
    }
}

/// Translates a winit `WindowEvent` into a `WindowMessage`.
///
/// Returns `None` for events without a message variant. Pointer positions are
/// physical pixels, matching the surface.
fn translate_window_event(event: &WindowEvent) -> Option<WindowMessage> {
    match event {
        WindowEvent::CloseRequested => Some(WindowMessage::CloseRequested),
        WindowEvent::Focused(f) => Some(WindowMessage::Focused(*f)),
        WindowEvent::Resized(size) => Some(WindowMessage::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::CursorMoved { position, .. } => Some(WindowMessage::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key);
            Some(match event.state {
                ElementState::Pressed => WindowMessage::KeyPressed(key),
                ElementState::Released => WindowMessage::KeyReleased(key),
            })
        }
        _ => None,
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Space => Key::Space,

            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,

            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
            KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
            KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,

            KeyCode::KeyA => Key::A,
            KeyCode::KeyB => Key::B,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyE => Key::E,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyI => Key::I,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyL => Key::L,
            KeyCode::KeyM => Key::M,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyQ => Key::Q,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyT => Key::T,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyX => Key::X,
            KeyCode::KeyY => Key::Y,
            KeyCode::KeyZ => Key::Z,

            KeyCode::Digit0 => Key::Digit0,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::Digit5 => Key::Digit5,
            KeyCode::Digit6 => Key::Digit6,
            KeyCode::Digit7 => Key::Digit7,
            KeyCode::Digit8 => Key::Digit8,
            KeyCode::Digit9 => Key::Digit9,

            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            KeyCode::F3 => Key::F3,
            KeyCode::F4 => Key::F4,
            KeyCode::F5 => Key::F5,
            KeyCode::F6 => Key::F6,
            KeyCode::F7 => Key::F7,
            KeyCode::F8 => Key::F8,
            KeyCode::F9 => Key::F9,
            KeyCode::F10 => Key::F10,
            KeyCode::F11 => Key::F11,
            KeyCode::F12 => Key::F12,

            other => Key::Unknown(other as u32),
        },

        PhysicalKey::Unidentified(native) => Key::Unknown(match native {
            NativeKeyCode::Android(c) | NativeKeyCode::Xkb(c) => c,
            NativeKeyCode::MacOS(c) | NativeKeyCode::Windows(c) => u32::from(c),
            _ => 0,
        }),
    }
}
