// Action executor: one normalized action in, one physical effect out.
use std::path::PathBuf;
use std::time::Duration;

use crate::agent_engine::state::AgentAction;
use crate::errors::PilotResult;
use crate::executor::coordinator::physical_to_normalized;
use crate::executor::input::InputDevice;
use crate::llm::types::ChatMessage;
use crate::perception::traits::ScreenSource;

/// Where persisted screenshots go: `<dir>/<prefix><NNNN>.png`.
/// The index grows by one per capture and is never rewound by pruning.
#[derive(Debug, Clone)]
pub struct ScreenshotDump {
    dir: PathBuf,
    prefix: String,
    next_index: u32,
}

impl ScreenshotDump {
    pub fn new(dir: PathBuf, prefix: String, start: u32) -> Self {
        Self {
            dir,
            prefix,
            next_index: start,
        }
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    fn claim_path(&mut self) -> PathBuf {
        let path = self
            .dir
            .join(format!("{}{:04}.png", self.prefix, self.next_index));
        match self.next_index.checked_add(1) {
            Some(next) => self.next_index = next,
            None => tracing::warn!(
                index = self.next_index,
                "screenshot index exhausted; reusing last file name"
            ),
        }
        path
    }
}

/// Run-scoped state owned by the loop controller and lent to the executor
/// for each call.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Screen size seen at the most recent capture; cursor reports use it.
    pub last_screen: (u32, u32),
    pub dump: Option<ScreenshotDump>,
}

/// Text for the tool-result turn, plus the screenshot turn for captures.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub text: String,
    pub image_turn: Option<ChatMessage>,
}

impl ActionResult {
    fn text(text: String) -> Self {
        Self {
            text,
            image_turn: None,
        }
    }
}

pub struct ActionExecutor {
    screen: Box<dyn ScreenSource>,
    input: Box<dyn InputDevice>,
    target_size: (u32, u32),
    settle_delay: Duration,
}

impl ActionExecutor {
    pub fn new(
        screen: Box<dyn ScreenSource>,
        input: Box<dyn InputDevice>,
        target_size: (u32, u32),
        settle_delay: Duration,
    ) -> Self {
        Self {
            screen,
            input,
            target_size,
            settle_delay,
        }
    }

    /// Live screen size, used to seed [`RunState::last_screen`] before the
    /// first capture.
    pub fn screen_size(&mut self) -> PilotResult<(u32, u32)> {
        self.input.screen_size()
    }

    /// Perform `action`. Collaborator failures are reported back to the model
    /// as `error action_failed ...` rather than aborting the run.
    pub async fn execute(&mut self, action: &AgentAction, run: &mut RunState) -> ActionResult {
        match self.perform(action, run).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(?action, error = %e, "action failed");
                ActionResult::text(format!("error action_failed {e}"))
            }
        }
    }

    async fn perform(&mut self, action: &AgentAction, run: &mut RunState) -> PilotResult<ActionResult> {
        match action {
            AgentAction::TakeScreenshot => self.take_screenshot(run).await,

            AgentAction::MoveMouse { x, y } => {
                let (w, h) = self.input.move_normalized(*x, *y)?;
                tracing::info!(x, y, screen_w = w, screen_h = h, "pointer moved");
                self.settle().await;
                Ok(ActionResult::text(format!("ok {}", self.cursor_report(run)?)))
            }

            AgentAction::ClickMouse => {
                self.input.click()?;
                self.settle().await;
                Ok(ActionResult::text(format!("ok {}", self.cursor_report(run)?)))
            }

            AgentAction::TypeText { text } => {
                self.input.type_text(text)?;
                self.settle().await;
                Ok(ActionResult::text(format!(
                    "ok typed={text} {}",
                    self.cursor_report(run)?
                )))
            }

            AgentAction::ScrollDown => {
                self.input.scroll_down()?;
                self.settle().await;
                Ok(ActionResult::text(format!("ok {}", self.cursor_report(run)?)))
            }
        }
    }

    async fn take_screenshot(&mut self, run: &mut RunState) -> PilotResult<ActionResult> {
        let (tw, th) = self.target_size;
        let frame = self.screen.capture(tw, th)?;
        run.last_screen = (frame.screen_width, frame.screen_height);

        let mut text = "ok".to_string();
        if let Some(dump) = run.dump.as_mut() {
            let path = dump.claim_path();
            match tokio::fs::write(&path, &frame.png).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "screenshot persisted");
                    text = format!("ok file={}", path.display());
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to persist screenshot");
                }
            }
        }

        tracing::info!(
            screen_w = frame.screen_width,
            screen_h = frame.screen_height,
            bytes = frame.png.len(),
            "screenshot captured"
        );

        Ok(ActionResult {
            text,
            image_turn: Some(ChatMessage::screen(&frame.to_base64())),
        })
    }

    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    fn cursor_report(&mut self, run: &RunState) -> PilotResult<String> {
        let (cx, cy) = self.input.cursor_position()?;
        let (w, h) = run.last_screen;
        let (nx, ny) = physical_to_normalized(cx, cy, w, h);
        Ok(format!("cursor_px={cx},{cy} cursor_norm={nx},{ny}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::errors::PilotError;
    use crate::executor::coordinator::normalized_to_physical;
    use crate::perception::types::CapturedFrame;

    /// Everything the fakes were asked to do, in order.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub events: Vec<String>,
        pub captures: usize,
        pub cursor: (i32, i32),
    }

    impl Recorder {
        /// Physical actions and captures; cursor/size queries are not counted.
        pub fn effect_count(&self) -> usize {
            self.events.len()
        }
    }

    pub(crate) struct FakeScreen {
        pub rec: Arc<Mutex<Recorder>>,
        pub size: (u32, u32),
        pub fail: bool,
    }

    impl ScreenSource for FakeScreen {
        fn capture(&mut self, _tw: u32, _th: u32) -> PilotResult<CapturedFrame> {
            if self.fail {
                return Err(PilotError::Perception("no display".into()));
            }
            let mut rec = self.rec.lock().unwrap();
            rec.captures += 1;
            let n = rec.captures;
            rec.events.push(format!("capture#{n}"));
            Ok(CapturedFrame {
                png: format!("png-{n}").into_bytes(),
                screen_width: self.size.0,
                screen_height: self.size.1,
            })
        }
    }

    pub(crate) struct FakeInput {
        pub rec: Arc<Mutex<Recorder>>,
        pub size: (u32, u32),
    }

    impl InputDevice for FakeInput {
        fn screen_size(&mut self) -> PilotResult<(u32, u32)> {
            Ok(self.size)
        }

        fn move_to(&mut self, x: i32, y: i32) -> PilotResult<()> {
            let mut rec = self.rec.lock().unwrap();
            rec.cursor = (x, y);
            rec.events.push(format!("move {x},{y}"));
            Ok(())
        }

        fn click(&mut self) -> PilotResult<()> {
            self.rec.lock().unwrap().events.push("click".into());
            Ok(())
        }

        fn type_text(&mut self, text: &str) -> PilotResult<()> {
            self.rec.lock().unwrap().events.push(format!("type {text}"));
            Ok(())
        }

        fn scroll_down(&mut self) -> PilotResult<()> {
            self.rec.lock().unwrap().events.push("scroll".into());
            Ok(())
        }

        fn cursor_position(&mut self) -> PilotResult<(i32, i32)> {
            Ok(self.rec.lock().unwrap().cursor)
        }
    }

    pub(crate) fn fake_executor(
        screen_size: (u32, u32),
        input_size: (u32, u32),
    ) -> (ActionExecutor, Arc<Mutex<Recorder>>) {
        let rec = Arc::new(Mutex::new(Recorder::default()));
        let exec = ActionExecutor::new(
            Box::new(FakeScreen {
                rec: rec.clone(),
                size: screen_size,
                fail: false,
            }),
            Box::new(FakeInput {
                rec: rec.clone(),
                size: input_size,
            }),
            (1344, 756),
            Duration::ZERO,
        );
        (exec, rec)
    }

    fn run_state(size: (u32, u32)) -> RunState {
        RunState {
            last_screen: size,
            dump: None,
        }
    }

    #[tokio::test]
    async fn move_reports_pixel_and_normalized_cursor() {
        let (mut exec, rec) = fake_executor((2001, 1001), (2001, 1001));
        let mut run = run_state((2001, 1001));
        let result = exec
            .execute(&AgentAction::MoveMouse { x: 500.0, y: 250.0 }, &mut run)
            .await;
        assert_eq!(result.text, "ok cursor_px=1000,250 cursor_norm=500,250");
        assert!(result.image_turn.is_none());
        assert_eq!(rec.lock().unwrap().events, ["move 1000,250"]);
    }

    #[tokio::test]
    async fn cursor_report_uses_last_captured_screen_size() {
        // live screen is 1000x1000 but the last capture saw 2000x2000
        let (mut exec, _rec) = fake_executor((2001, 2001), (1001, 1001));
        let mut run = run_state((2001, 2001));
        let result = exec
            .execute(&AgentAction::MoveMouse { x: 1000.0, y: 1000.0 }, &mut run)
            .await;
        assert_eq!(result.text, "ok cursor_px=1000,1000 cursor_norm=500,500");
    }

    #[tokio::test]
    async fn type_text_echoes_text() {
        let (mut exec, rec) = fake_executor((1920, 1080), (1920, 1080));
        let mut run = run_state((1920, 1080));
        let result = exec
            .execute(&AgentAction::TypeText { text: "hello".into() }, &mut run)
            .await;
        assert_eq!(result.text, "ok typed=hello cursor_px=0,0 cursor_norm=0,0");
        assert_eq!(rec.lock().unwrap().events, ["type hello"]);
    }

    #[tokio::test]
    async fn click_and_scroll_are_single_effects() {
        let (mut exec, rec) = fake_executor((1920, 1080), (1920, 1080));
        let mut run = run_state((1920, 1080));
        let (px, py) = normalized_to_physical(1000.0, 0.0, 1920, 1080);
        rec.lock().unwrap().cursor = (px, py);
        let click = exec.execute(&AgentAction::ClickMouse, &mut run).await;
        let scroll = exec.execute(&AgentAction::ScrollDown, &mut run).await;
        assert_eq!(click.text, "ok cursor_px=1919,0 cursor_norm=1000,0");
        assert_eq!(scroll.text, click.text);
        assert_eq!(rec.lock().unwrap().events, ["click", "scroll"]);
    }

    #[tokio::test]
    async fn screenshot_updates_screen_size_and_adds_image_turn() {
        let (mut exec, _rec) = fake_executor((2560, 1440), (1920, 1080));
        let mut run = run_state((1920, 1080));
        let result = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;
        assert_eq!(result.text, "ok");
        assert_eq!(run.last_screen, (2560, 1440));
        let image = result.image_turn.expect("image turn");
        assert!(image.is_image_bearing());
    }

    #[tokio::test]
    async fn screenshot_dump_names_increment() {
        let dir = tempfile::tempdir().unwrap();
        let (mut exec, _rec) = fake_executor((800, 600), (800, 600));
        let mut run = RunState {
            last_screen: (800, 600),
            dump: Some(ScreenshotDump::new(dir.path().to_path_buf(), "shot_".into(), 7)),
        };

        let first = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;
        let second = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;

        let p7 = dir.path().join("shot_0007.png");
        let p8 = dir.path().join("shot_0008.png");
        assert_eq!(first.text, format!("ok file={}", p7.display()));
        assert_eq!(second.text, format!("ok file={}", p8.display()));
        assert_eq!(std::fs::read(&p7).unwrap(), b"png-1");
        assert_eq!(std::fs::read(&p8).unwrap(), b"png-2");
        assert_eq!(run.dump.as_ref().unwrap().next_index(), 9);
    }

    #[tokio::test]
    async fn dump_index_stops_at_its_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let (mut exec, _rec) = fake_executor((800, 600), (800, 600));
        let mut run = RunState {
            last_screen: (800, 600),
            dump: Some(ScreenshotDump::new(dir.path().to_path_buf(), "s_".into(), u32::MAX)),
        };

        let first = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;
        let second = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;

        let last = dir.path().join(format!("s_{}.png", u32::MAX));
        assert_eq!(first.text, format!("ok file={}", last.display()));
        assert_eq!(second.text, first.text);
        assert_eq!(std::fs::read(&last).unwrap(), b"png-2");
        assert_eq!(run.dump.as_ref().unwrap().next_index(), u32::MAX);
    }

    #[tokio::test]
    async fn unwritable_dump_still_reports_observation() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").join("deeper");
        let (mut exec, _rec) = fake_executor((800, 600), (800, 600));
        let mut run = RunState {
            last_screen: (800, 600),
            dump: Some(ScreenshotDump::new(missing, "s_".into(), 1)),
        };
        let result = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;
        assert_eq!(result.text, "ok");
        assert!(result.image_turn.is_some());
    }

    #[tokio::test]
    async fn capture_failure_becomes_error_text() {
        let rec = Arc::new(Mutex::new(Recorder::default()));
        let mut exec = ActionExecutor::new(
            Box::new(FakeScreen {
                rec: rec.clone(),
                size: (1, 1),
                fail: true,
            }),
            Box::new(FakeInput {
                rec,
                size: (1, 1),
            }),
            (1344, 756),
            Duration::ZERO,
        );
        let mut run = run_state((1920, 1080));
        let result = exec.execute(&AgentAction::TakeScreenshot, &mut run).await;
        assert!(result.text.starts_with("error action_failed"), "{}", result.text);
        assert!(result.image_turn.is_none());
        assert_eq!(run.last_screen, (1920, 1080));
    }
}
