/// Pointer buttons. Only [`Button::Left`] drives the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
}

/// Keys with a binding in the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Rebuild the pipeline from its source.
    Reload,

    /// Stop the loop.
    Escape,
}

/// Everything the windowing side can tell the control loop. Events are applied in order, between
/// frames.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The pointer moved to `(x, y)`, with the origin at the top-left of the window.
    PointerMoved { x: f32, y: f32 },

    ButtonPressed(Button),

    ButtonReleased(Button),

    /// Vertical scroll, positive away from the user.
    Scrolled { dy: f32 },

    KeyPressed(Key),

    /// The framebuffer changed size.
    Resized { width: u32, height: u32 },

    /// Render a frame at `time` seconds since start.
    Frame { time: f32 },
}
