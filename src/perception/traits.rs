use crate::errors::PilotResult;
use crate::perception::types::CapturedFrame;

/// Screen capture seam used by `take_screenshot`.
pub trait ScreenSource {
    /// Capture the primary screen scaled to `target_width`×`target_height`.
    /// The returned frame reports the real screen size, not the target.
    fn capture(&mut self, target_width: u32, target_height: u32) -> PilotResult<CapturedFrame>;
}
