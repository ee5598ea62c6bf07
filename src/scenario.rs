//! Scenario files.
//!
//! ```text
//! === SHARED_SYSTEM_PROMPT ===
//! You control a desktop ...
//!
//! === SCENARIO 1 ===
//! TASK_PROMPT: Open the start menu.
//! TOOLS_SCHEMA: [{"type":"function","function":{...}}, ...]
//!
//! === SCENARIO 2 ===
//! SYSTEM_PROMPT: Overrides the shared prompt for this block only.
//! TASK_PROMPT: ...
//! TOOLS_SCHEMA: [...]
//! ```

use std::path::Path;

use regex::Regex;

use crate::errors::{PilotError, PilotResult};
use crate::llm::tools::load_builtin_tools;
use crate::llm::types::ToolDef;

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You control a desktop computer using tool calls only. \
Tools: take_screenshot, move_mouse(x,y in 0..1000), click_mouse, type_text(text), scroll_down. \
Coordinates are normalized integers 0..1000: (0,0) top-left, (1000,1000) bottom-right. \
Workflow: observe (take_screenshot), do ONE action, observe again.";

pub const DEFAULT_TASK_PROMPT: &str =
    "Take a screenshot, move mouse to center, click, type hello, take another screenshot.";

const SHARED_HEADER: &str = "=== SHARED_SYSTEM_PROMPT ===";

/// One selected scenario. The system prompt is optional; the task prompt and a
/// non-empty tool catalog are not.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub system_prompt: Option<String>,
    pub task_prompt: String,
    pub tools: Vec<ToolDef>,
}

impl Scenario {
    /// Scenario used when no file is given on the command line.
    pub fn builtin() -> PilotResult<Self> {
        Ok(Self {
            system_prompt: None,
            task_prompt: DEFAULT_TASK_PROMPT.to_string(),
            tools: load_builtin_tools()?,
        })
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

fn scenario_header() -> PilotResult<Regex> {
    Ok(Regex::new(r"(?m)^[ \t]*=== SCENARIO[ \t]+(\d+)[ \t]*===[ \t\r]*$")?)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Select scenario `number` from the text of a scenario file.
pub fn parse_scenario(content: &str, number: u32) -> PilotResult<Scenario> {
    let header = scenario_header()?;
    let headers: Vec<_> = header.captures_iter(content).collect();
    if headers.is_empty() {
        return Err(PilotError::Scenario("no `=== SCENARIO <n> ===` blocks found".into()));
    }

    let first_block = headers[0].get(0).map_or(content.len(), |m| m.start());
    let shared = content[..first_block]
        .split_once(SHARED_HEADER)
        .and_then(|(_, block)| non_empty(block));

    let (idx, caps) = headers
        .iter()
        .enumerate()
        .find(|(_, c)| c[1].parse::<u32>().ok() == Some(number))
        .ok_or_else(|| PilotError::Scenario(format!("scenario {number} not found")))?;
    let start = caps.get(0).map_or(0, |m| m.end());
    let end = headers
        .get(idx + 1)
        .and_then(|c| c.get(0))
        .map_or(content.len(), |m| m.start());
    let block = &content[start..end];

    let mut system_prompt = shared;
    let mut task_prompt = None;
    let mut tools_json = None;
    for raw in block.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix("SYSTEM_PROMPT:") {
            if let Some(p) = non_empty(rest) {
                system_prompt = Some(p);
            }
        } else if let Some(rest) = line.strip_prefix("TASK_PROMPT:") {
            task_prompt = non_empty(rest);
        } else if let Some(rest) = line.strip_prefix("TOOLS_SCHEMA:") {
            tools_json = non_empty(rest);
        }
    }

    let task_prompt = task_prompt
        .ok_or_else(|| PilotError::Scenario(format!("scenario {number} has no TASK_PROMPT")))?;
    let tools_json = tools_json
        .ok_or_else(|| PilotError::Scenario(format!("scenario {number} has no TOOLS_SCHEMA")))?;
    let tools: Vec<ToolDef> = serde_json::from_str(&tools_json).map_err(|e| {
        PilotError::Scenario(format!("scenario {number}: invalid TOOLS_SCHEMA: {e}"))
    })?;
    if tools.is_empty() {
        return Err(PilotError::Scenario(format!(
            "scenario {number}: TOOLS_SCHEMA is empty"
        )));
    }

    Ok(Scenario {
        system_prompt,
        task_prompt,
        tools,
    })
}

pub fn load_scenario(path: &Path, number: u32) -> PilotResult<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PilotError::Scenario(format!("cannot read {}: {e}", path.display()))
    })?;
    let scenario = parse_scenario(&content, number)?;
    tracing::info!(
        path = %path.display(),
        scenario = number,
        tools = scenario.tools.len(),
        shared_prompt = scenario.system_prompt.is_some(),
        "scenario loaded"
    );
    Ok(scenario)
}
