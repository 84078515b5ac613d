//! Instruction text sent to the remote classifier.

use crate::types::ClassifyRequest;

/// Context string used when no high-priority ticket is open.
pub const HEALTHY_CONTEXT: &str = "System healthy";

const SYSTEM_PROMPT: &str = "You are the triage agent of an IT helpdesk. \
Read the user's complaint and answer with a single raw JSON object and nothing else.";

const RULES: &str = r#"Business rules:
- urgency "Critical": fire, smoke, burning smell, water leak, sparks, or any security breach. department "Hardware".
- urgency "High": device crashes, blue screen, will not boot or turn on, broken or dead hardware, or a screenshot of an error. department "Hardware".
- urgency "Medium": slow or dropping Wi-Fi/internet, Zoom/Slack/WhatsApp glitches, loading or latency problems. department "Network".
- urgency "Low": password resets and login problems (department "Access"), everything else (department "Support" or "Software").
- sentiment is one of "Neutral", "Frustrated", "Angry", "Panic".
- is_duplicate is true only if the complaint clearly matches one of the active incidents."#;

const SCHEMA: &str = r#"{"summary": "short title", "urgency": "Low|Medium|High|Critical", "department": "Hardware|Network|Software|Access|Support", "response": "reply to the user", "rca_hypothesis": "likely root cause", "slack_draft": "alert for the on-call channel", "sentiment": "Neutral|Frustrated|Angry|Panic", "is_duplicate": false}"#;

/// System instruction shared by every provider.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// User turn: rules, schema, situational context and the complaint.
pub fn build_user_prompt(req: &ClassifyRequest<'_>) -> String {
    let incidents = if req.active_incidents.trim().is_empty() {
        HEALTHY_CONTEXT
    } else {
        req.active_incidents
    };
    let attachment = if req.image.is_some() {
        "\nA screenshot from the user is attached."
    } else {
        ""
    };

    format!(
        "{}\n\nSchema:\n{}\n\nActive incidents: {}\nChannel: {}{}\n\nUser complaint: {}",
        RULES, SCHEMA, incidents, req.channel, attachment, req.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageAttachment;

    #[test]
    fn test_prompt_embeds_context_and_complaint() {
        let req = ClassifyRequest {
            text: "printer on fire",
            channel: "Email",
            active_incidents: "Hardware Failure (Hardware)",
            image: None,
        };
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("User complaint: printer on fire"));
        assert!(prompt.contains("Active incidents: Hardware Failure (Hardware)"));
        assert!(prompt.contains("Channel: Email"));
        assert!(!prompt.contains("screenshot from the user"));
    }

    #[test]
    fn test_prompt_defaults_to_healthy() {
        let image = ImageAttachment {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        };
        let req = ClassifyRequest {
            text: "what is this error",
            channel: "Web Portal",
            active_incidents: "",
            image: Some(&image),
        };
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("Active incidents: System healthy"));
        assert!(prompt.contains("screenshot from the user is attached"));
    }
}
