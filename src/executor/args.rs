//! Normalization of untrusted tool-call arguments.
//!
//! Payloads come straight from the model and may be anything. These helpers
//! never fail: a payload that cannot be read falls back to a safe value
//! (screen midpoint, empty text) and the action is still attempted.

use serde_json::Value;

pub const COORD_MIN: f64 = 0.0;
pub const COORD_MAX: f64 = 1000.0;
pub const COORD_MIDPOINT: f64 = 500.0;

/// Outcome of reading one argument: taken from the payload, or substituted.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Ok(T),
    Fallback(T),
}

impl<T> Parsed<T> {
    pub fn value(self) -> T {
        match self {
            Parsed::Ok(v) | Parsed::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Parsed::Fallback(_))
    }
}

fn decode(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_nan() {
        None
    } else {
        Some(n)
    }
}

fn axis(v: Option<&Value>) -> Parsed<f64> {
    match v.and_then(as_number) {
        Some(n) => Parsed::Ok(n.clamp(COORD_MIN, COORD_MAX)),
        None => Parsed::Fallback(COORD_MIDPOINT),
    }
}

/// Read `{x, y}` (or a two-element array) and clamp both axes to 0..=1000.
pub fn parse_coords(raw: &str) -> (Parsed<f64>, Parsed<f64>) {
    match decode(raw) {
        Some(Value::Object(map)) => (axis(map.get("x")), axis(map.get("y"))),
        Some(Value::Array(items)) if items.len() >= 2 => (axis(items.first()), axis(items.get(1))),
        _ => (
            Parsed::Fallback(COORD_MIDPOINT),
            Parsed::Fallback(COORD_MIDPOINT),
        ),
    }
}

/// Read `text`. Missing or null becomes "", other values their JSON text.
pub fn parse_text(raw: &str) -> Parsed<String> {
    let Some(Value::Object(map)) = decode(raw) else {
        return Parsed::Fallback(String::new());
    };
    match map.get("text") {
        Some(Value::String(s)) => Parsed::Ok(s.clone()),
        Some(Value::Null) | None => Parsed::Fallback(String::new()),
        Some(other) => Parsed::Ok(other.to_string()),
    }
}
