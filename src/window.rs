// Window + input plumbing for the binary.
// The window stands in for the embedding page: it shows the raster surface
// and reports pointer movement, clicks, key toggles and size changes.

use halftone_portrait::error::Error;
use halftone_portrait::types::FrameBuffer;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,
    left_was_down: bool,
}

impl Drawer {
    /// Create a resizable window. A new empty window appears with `title`.
    pub fn new(title: &str, width: usize, height: usize, target_fps: usize) -> Result<Self, Error> {
        let opts = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, opts).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(target_fps);
        Ok(Self { window, left_was_down: false })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Client-area size in pixels; the surface follows it.
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    /// Mouse position, or None while the pointer is outside the window.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    /// True on the frame the left button goes down.
    pub fn left_clicked(&mut self) -> bool {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let clicked = down && !self.left_was_down;
        self.left_was_down = down;
        clicked
    }

    // A toggles active/inactive (fade in/out).
    pub fn a_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::A, KeyRepeat::No)
    }
}
