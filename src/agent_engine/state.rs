use crate::executor::args::{parse_coords, parse_text};
use crate::llm::types::ToolCall;

/// Loop controller states.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoopState {
    AwaitingModel,
    DispatchingTools { calls: Vec<ToolCall> },
    Pacing,
    Done { reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without requesting any tool call.
    ModelFinished,
    BudgetExhausted,
}

/// The fixed tool vocabulary, resolved by exact name match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    TakeScreenshot,
    MoveMouse,
    ClickMouse,
    TypeText,
    ScrollDown,
    Unknown(String),
}

impl Tool {
    pub fn from_name(name: &str) -> Self {
        match name {
            "take_screenshot" => Tool::TakeScreenshot,
            "move_mouse" => Tool::MoveMouse,
            "click_mouse" => Tool::ClickMouse,
            "type_text" => Tool::TypeText,
            "scroll_down" => Tool::ScrollDown,
            other => Tool::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::TakeScreenshot => "take_screenshot",
            Tool::MoveMouse => "move_mouse",
            Tool::ClickMouse => "click_mouse",
            Tool::TypeText => "type_text",
            Tool::ScrollDown => "scroll_down",
            Tool::Unknown(name) => name,
        }
    }
}

/// A tool call with its arguments normalized. Built fresh for every call.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    TakeScreenshot,
    MoveMouse { x: f64, y: f64 },
    ClickMouse,
    TypeText { text: String },
    ScrollDown,
}

impl AgentAction {
    /// Normalize the raw argument payload for `tool`. Never fails for the five
    /// known tools; `None` means the name is outside the vocabulary.
    pub fn from_tool(tool: &Tool, raw_args: &str) -> Option<Self> {
        let action = match tool {
            Tool::TakeScreenshot => AgentAction::TakeScreenshot,
            Tool::MoveMouse => {
                let (x, y) = parse_coords(raw_args);
                if x.is_fallback() || y.is_fallback() {
                    tracing::debug!(args = %raw_args, "move_mouse: coordinate fallback to midpoint");
                }
                AgentAction::MoveMouse {
                    x: x.value(),
                    y: y.value(),
                }
            }
            Tool::ClickMouse => AgentAction::ClickMouse,
            Tool::TypeText => {
                let text = parse_text(raw_args);
                if text.is_fallback() {
                    tracing::debug!(args = %raw_args, "type_text: no usable text, typing nothing");
                }
                AgentAction::TypeText { text: text.value() }
            }
            Tool::ScrollDown => AgentAction::ScrollDown,
            Tool::Unknown(_) => return None,
        };
        Some(action)
    }
}

/// Summary returned when a run reaches `Done`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    /// Steps whose tool calls were dispatched.
    pub steps: u32,
    pub model_requests: u32,
    pub stop_reason: StopReason,
    pub transcript_len: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}
