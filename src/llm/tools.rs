use std::collections::HashSet;

use crate::errors::{PilotError, PilotResult};
use crate::llm::types::ToolDef;

/// Case-insensitive description marker that takes a tool out of service.
const UNAVAILABLE_MARKER: &str = "UNAVAILABLE";

/// Loads the built-in five-tool catalog from prompts/tools/builtin.json.
/// The JSON is embedded at compile time via include_str!.
pub fn load_builtin_tools() -> PilotResult<Vec<ToolDef>> {
    let json = include_str!("../../prompts/tools/builtin.json");
    serde_json::from_str(json)
        .map_err(|e| PilotError::Config(format!("Failed to parse builtin tools: {e}")))
}

/// Names of the catalog entries whose description marks them unavailable.
/// Computed once per run; requests for these never reach the executor.
pub fn disabled_tools(catalog: &[ToolDef]) -> HashSet<String> {
    catalog
        .iter()
        .filter(|t| t.function.description.to_uppercase().contains(UNAVAILABLE_MARKER))
        .map(|t| t.function.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(json: &str) -> Vec<ToolDef> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builtin_catalog_has_five_enabled_tools() {
        let tools = load_builtin_tools().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(
            names,
            ["take_screenshot", "move_mouse", "click_mouse", "type_text", "scroll_down"]
        );
        assert!(disabled_tools(&tools).is_empty());
    }

    #[test]
    fn marker_is_case_insensitive() {
        let tools = catalog(
            r#"[
                {"type":"function","function":{"name":"take_screenshot","description":"Capture screen. (unavailable)"}},
                {"type":"function","function":{"name":"scroll_down","description":"UNAVAILABLE in this scenario"}},
                {"type":"function","function":{"name":"click_mouse","description":"Left click."}}
            ]"#,
        );
        let disabled = disabled_tools(&tools);
        assert_eq!(disabled.len(), 2);
        assert!(disabled.contains("take_screenshot"));
        assert!(disabled.contains("scroll_down"));
        assert!(!disabled.contains("click_mouse"));
    }

    #[test]
    fn missing_description_counts_as_available() {
        let tools = catalog(r#"[{"type":"function","function":{"name":"type_text"}}]"#);
        assert!(disabled_tools(&tools).is_empty());
    }

    #[test]
    fn null_description_counts_as_available() {
        let tools = catalog(
            r#"[{"type":"function","function":{"name":"take_screenshot","description":null}}]"#,
        );
        assert_eq!(tools[0].function.description, "");
        assert!(disabled_tools(&tools).is_empty());
    }
}
