//! Turns the remote model's text reply into a validated [`Diagnosis`].

use serde_json::{Map, Value};

use crate::error::ClassifyError;
use crate::types::Diagnosis;
use nexus_store::{TicketStatus, Urgency, SENTINEL};

const REQUIRED_KEYS: [&str; 4] = ["summary", "urgency", "department", "response"];

/// Remove a Markdown code fence (```json ... ```) wrapping a reply.
/// Only the opening fence with its language tag and the closing fence are
/// removed; backticks inside the body are left alone.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let body = match rest.split_once('\n') {
        Some((tag, after)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => after,
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Parse and validate a reply. Any missing required key, non-string value
/// or unknown urgency is a validation failure.
pub fn parse_diagnosis(text: &str) -> Result<Diagnosis, ClassifyError> {
    let cleaned = strip_code_fences(text);

    // Models sometimes add a sentence around the object.
    let body = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned.as_str(),
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| ClassifyError::Parse(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ClassifyError::Parse("top-level value is not an object".into()))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| required_str(obj, k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ClassifyError::Validation(format!(
            "missing {}",
            missing.join(", ")
        )));
    }

    let urgency_raw = required_str(obj, "urgency").unwrap_or_default();
    let urgency: Urgency = urgency_raw
        .parse()
        .map_err(ClassifyError::Validation)?;

    Ok(Diagnosis {
        summary: required_str(obj, "summary").unwrap_or_default(),
        urgency,
        department: required_str(obj, "department").unwrap_or_default(),
        response: required_str(obj, "response").unwrap_or_default(),
        sentiment: optional_str(obj, "sentiment", "Neutral"),
        rca_hypothesis: optional_str(obj, "rca_hypothesis", SENTINEL),
        slack_draft: optional_str(obj, "slack_draft", SENTINEL),
        is_duplicate: flag(obj.get("is_duplicate"))?,
        status: TicketStatus::Open,
    })
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn optional_str(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    required_str(obj, key).unwrap_or_else(|| default.to_string())
}

fn flag(value: Option<&Value>) -> Result<bool, ClassifyError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" | "" => Ok(false),
            other => Err(ClassifyError::Validation(format!(
                "is_duplicate '{}' is not a boolean",
                other
            ))),
        },
        Some(other) => Err(ClassifyError::Validation(format!(
            "is_duplicate {} is not a boolean",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{"summary": "Printer Jam", "urgency": "high", "department": "Hardware",
        "response": "On our way.", "rca_hypothesis": "Paper feed", "slack_draft": "Jam on floor 3",
        "sentiment": "Angry", "is_duplicate": true}"#;

    #[test]
    fn test_parses_fenced_reply() {
        let reply = format!("```json\n{}\n```", FULL);
        let d = parse_diagnosis(&reply).unwrap();
        assert_eq!(d.summary, "Printer Jam");
        assert_eq!(d.urgency, Urgency::High);
        assert_eq!(d.department, "Hardware");
        assert!(d.is_duplicate);
        assert_eq!(d.status, TicketStatus::Open);
    }

    #[test]
    fn test_strip_code_fences_only_touches_the_wrapper() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```JSON{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(
            strip_code_fences("{\"cmd\": \"```ipconfig```\"}"),
            "{\"cmd\": \"```ipconfig```\"}"
        );
    }

    #[test]
    fn test_backticks_inside_values_survive() {
        let reply = "```json\n{\"summary\": \"DNS failure\", \"urgency\": \"Medium\", \"department\": \"Network\", \"response\": \"Run ```ipconfig /flushdns``` and retry.\"}\n```";
        let d = parse_diagnosis(reply).unwrap();
        assert_eq!(d.response, "Run ```ipconfig /flushdns``` and retry.");
    }

    #[test]
    fn test_parses_object_inside_prose() {
        let reply = format!("Here is the ticket: {} Let me know!", FULL);
        assert_eq!(parse_diagnosis(&reply).unwrap().sentiment, "Angry");
    }

    #[test]
    fn test_optional_fields_are_filled() {
        let reply = r#"{"summary": "Slow VPN", "urgency": "Medium", "department": "Network", "response": "Looking into it."}"#;
        let d = parse_diagnosis(reply).unwrap();
        assert_eq!(d.sentiment, "Neutral");
        assert_eq!(d.rca_hypothesis, SENTINEL);
        assert_eq!(d.slack_draft, SENTINEL);
        assert!(!d.is_duplicate);
    }

    #[test]
    fn test_missing_required_key_is_validation_error() {
        let reply = r#"{"summary": "Slow VPN", "urgency": "Medium", "response": "ok"}"#;
        match parse_diagnosis(reply) {
            Err(ClassifyError::Validation(msg)) => assert!(msg.contains("department")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_urgency_is_validation_error() {
        let reply = r#"{"summary": "x", "urgency": "Urgent!!", "department": "Network", "response": "ok"}"#;
        assert!(matches!(
            parse_diagnosis(reply),
            Err(ClassifyError::Validation(_))
        ));
    }

    #[test]
    fn test_non_json_is_parse_error() {
        assert!(matches!(
            parse_diagnosis("I cannot help with that."),
            Err(ClassifyError::Parse(_))
        ));
        assert!(matches!(parse_diagnosis("[1, 2]"), Err(ClassifyError::Parse(_))));
    }

    #[test]
    fn test_string_flag_is_accepted() {
        let reply = r#"{"summary": "x", "urgency": "Low", "department": "Access", "response": "ok", "is_duplicate": "True"}"#;
        assert!(parse_diagnosis(reply).unwrap().is_duplicate);
    }
}
