// Physical pointer/keyboard injection.
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use crate::errors::{PilotError, PilotResult};
use crate::executor::coordinator::normalized_to_physical;

/// Pointer and keyboard primitives the executor drives.
///
/// Calls are synchronous and short; the executor never issues two at once.
pub trait InputDevice {
    /// Current size of the primary display in physical pixels.
    fn screen_size(&mut self) -> PilotResult<(u32, u32)>;

    fn move_to(&mut self, x: i32, y: i32) -> PilotResult<()>;

    /// Primary button click at the current pointer position.
    fn click(&mut self) -> PilotResult<()>;

    fn type_text(&mut self, text: &str) -> PilotResult<()>;

    /// One downward wheel notch.
    fn scroll_down(&mut self) -> PilotResult<()>;

    fn cursor_position(&mut self) -> PilotResult<(i32, i32)>;

    /// Move to a 0..1000 coordinate, mapped onto the live screen size.
    /// Returns the screen size used for the mapping.
    fn move_normalized(&mut self, xn: f64, yn: f64) -> PilotResult<(u32, u32)> {
        let (w, h) = self.screen_size()?;
        let (px, py) = normalized_to_physical(xn, yn, w, h);
        self.move_to(px, py)?;
        Ok((w, h))
    }
}

/// [`InputDevice`] backed by enigo (SendInput / XTest / CGEvent).
pub struct EnigoInput {
    enigo: Enigo,
}

impl EnigoInput {
    pub fn new() -> PilotResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PilotError::Executor(format!("input init: {e}")))?;
        Ok(Self { enigo })
    }
}

fn input_err(op: &str, e: impl std::fmt::Display) -> PilotError {
    PilotError::Executor(format!("{op}: {e}"))
}

impl InputDevice for EnigoInput {
    fn screen_size(&mut self) -> PilotResult<(u32, u32)> {
        let (w, h) = self
            .enigo
            .main_display()
            .map_err(|e| input_err("main_display", e))?;
        Ok((w.max(0) as u32, h.max(0) as u32))
    }

    fn move_to(&mut self, x: i32, y: i32) -> PilotResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| input_err("move_mouse", e))
    }

    fn click(&mut self) -> PilotResult<()> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| input_err("click", e))
    }

    fn type_text(&mut self, text: &str) -> PilotResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.enigo.text(text).map_err(|e| input_err("type_text", e))
    }

    fn scroll_down(&mut self) -> PilotResult<()> {
        self.enigo
            .scroll(1, Axis::Vertical)
            .map_err(|e| input_err("scroll", e))
    }

    fn cursor_position(&mut self) -> PilotResult<(i32, i32)> {
        self.enigo.location().map_err(|e| input_err("location", e))
    }
}
