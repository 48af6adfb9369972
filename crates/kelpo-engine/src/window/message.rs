/// Keyboard key identifier.
///
/// Backends map native key codes into these variants where possible and fall
/// back to `Key::Unknown` with the native code otherwise.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,

    Shift,
    Control,
    Alt,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Native key without a variant here.
    Unknown(u32),
}

/// A window-system event, already translated out of the native API.
///
/// Pointer coordinates are in window pixels, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WindowMessage {
    KeyPressed(Key),
    KeyReleased(Key),
    PointerMoved { x: f32, y: f32 },
    Resized { width: u32, height: u32 },
    Focused(bool),
    /// The user asked to close the window. The backend stops reporting
    /// `is_open` after delivering this.
    CloseRequested,
}

/// Callback installed with `Backend::set_message_handler`.
pub type MessageHandler = Box<dyn FnMut(&WindowMessage)>;
