//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`.
//! Role: Shared contract helper for CLI diagnostics (rows skipped under `--errors skip`).
//! Invariants: Notices are non-fatal and never alter stdout rows.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub input: String,
    pub line: Option<u64>,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("input".to_string(), json!(notice.input));
    if let Some(line) = notice.line {
        inner.insert("line".to_string(), json!(line));
    }
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

#[cfg(test)]
mod tests {
    use super::{Notice, notice_json};
    use serde_json::{Map, Value};

    #[test]
    fn notice_json_has_required_fields() {
        let mut details = Map::new();
        details.insert("error_kind".to_string(), Value::from("FieldConversion"));

        let notice = Notice {
            kind: "skip".to_string(),
            time: "2026-02-01T00:00:00Z".to_string(),
            input: "data.csv".to_string(),
            line: Some(12),
            message: "cannot parse \"x\" as int".to_string(),
            details,
        };

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("skip"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("input").and_then(|v| v.as_str()), Some("data.csv"));
        assert_eq!(obj.get("line").and_then(|v| v.as_u64()), Some(12));
        assert_eq!(
            obj.get("details")
                .and_then(|v| v.get("error_kind"))
                .and_then(|v| v.as_str()),
            Some("FieldConversion")
        );
    }

    #[test]
    fn line_is_omitted_when_unknown() {
        let notice = Notice {
            kind: "skip".to_string(),
            time: String::new(),
            input: "-".to_string(),
            line: None,
            message: "bad".to_string(),
            details: Map::new(),
        };
        let value = notice_json(&notice);
        assert!(value["notice"].get("line").is_none());
    }
}
