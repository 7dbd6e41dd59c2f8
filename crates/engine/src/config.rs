//! Capture configuration for recorded payloads.
//!
//! Applied by the engine when a span records input or output. Annotations
//! and error payloads pass through untouched.

use serde_json::{Map, Value};

/// How much of a span's input/output payloads to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureLevel {
    /// Drop input/output payloads entirely
    Minimal,
    /// Keep payloads, truncating oversized values
    Standard,
    /// Keep payloads verbatim
    #[default]
    Full,
}

/// Payload capture policy for a tracer.
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Capture level for input/output payloads
    pub level: CaptureLevel,
    /// Keys whose values are replaced with `"[redacted]"` (case-insensitive
    /// match on the key name), at every capture level that keeps payloads
    pub redact_keys: Vec<String>,
    /// Size bound for individual values under [`CaptureLevel::Standard`];
    /// values whose JSON form exceeds it are replaced with a marker
    pub max_value_bytes: Option<usize>,
}

impl CaptureConfig {
    /// Filter one payload map according to this policy.
    pub fn apply(&self, payload: Map<String, Value>) -> Map<String, Value> {
        if self.level == CaptureLevel::Minimal {
            return Map::new();
        }
        let truncate_at = match self.level {
            CaptureLevel::Standard => self.max_value_bytes,
            _ => None,
        };
        payload
            .into_iter()
            .map(|(key, value)| {
                if self.is_redacted(&key) {
                    return (key, Value::String("[redacted]".into()));
                }
                if let Some(max) = truncate_at {
                    let size = value.to_string().len();
                    if size > max {
                        return (key, Value::String(format!("[truncated {size} bytes]")));
                    }
                }
                (key, value)
            })
            .collect()
    }

    fn is_redacted(&self, key: &str) -> bool {
        self.redact_keys.iter().any(|r| r.eq_ignore_ascii_case(key))
    }
}
