//! Deterministic keyword classifier.
//!
//! Rules are checked top to bottom and the first match decides the whole
//! diagnosis. Matching is a case-insensitive substring test, so "down"
//! also fires on "download".

use serde::Serialize;

use crate::types::Diagnosis;
use nexus_store::{TicketStatus, Urgency};

/// Trimmed input shorter than this (in chars) is ignored.
pub const MIN_MEANINGFUL_CHARS: usize = 4;

const HAZARD_KEYWORDS: &[&str] = &[
    "fire", "smoke", "smell", "burn", "water", "leak", "spark", "security",
];

const HARDWARE_FAILURE_KEYWORDS: &[&str] = &[
    "crash",
    "blue screen",
    "broken",
    "boot",
    "fail",
    "not working",
    "dead",
    "stopped",
    "won't turn on",
    "won't start",
];

const DEGRADATION_KEYWORDS: &[&str] = &[
    "whatsapp", "zoom", "slack", "wifi", "slow", "internet", "connect", "down", "glitch",
    "loading", "latency",
];

const ACCESS_KEYWORDS: &[&str] = &["password", "login"];

/// The rule that decided a fallback diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackRule {
    Degenerate,
    Attachment,
    Hazard,
    HardwareFailure,
    Degradation,
    Access,
    Default,
}

/// Classify a complaint with no attachment.
pub fn classify(text: &str) -> Diagnosis {
    classify_with_image(text, false)
}

/// Classify a complaint; `has_image` is true when a screenshot was attached.
pub fn classify_with_image(text: &str, has_image: bool) -> Diagnosis {
    diagnosis_for(match_rule(text, has_image))
}

/// First rule in priority order that matches `text`.
pub fn match_rule(text: &str, has_image: bool) -> FallbackRule {
    if text.trim().chars().count() < MIN_MEANINGFUL_CHARS {
        return FallbackRule::Degenerate;
    }
    if has_image {
        return FallbackRule::Attachment;
    }

    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if mentions(HAZARD_KEYWORDS) {
        FallbackRule::Hazard
    } else if mentions(HARDWARE_FAILURE_KEYWORDS) {
        FallbackRule::HardwareFailure
    } else if mentions(DEGRADATION_KEYWORDS) {
        FallbackRule::Degradation
    } else if mentions(ACCESS_KEYWORDS) {
        FallbackRule::Access
    } else {
        FallbackRule::Default
    }
}

fn diagnosis_for(rule: FallbackRule) -> Diagnosis {
    let (summary, urgency, department, response, sentiment, rca, slack) = match rule {
        FallbackRule::Degenerate => (
            "Unclear Request",
            Urgency::Low,
            "General",
            "Could you describe the problem in a bit more detail?",
            "Neutral",
            "Insufficient information",
            "Info: Empty or unclear message ignored.",
        ),
        FallbackRule::Attachment => (
            "Visual Error Detected",
            Urgency::High,
            "Hardware",
            "Screenshot received. A technician will inspect the error shown.",
            "Frustrated",
            "Error state captured in attached image",
            "Visual error reported with screenshot. Needs hands-on review.",
        ),
        FallbackRule::Hazard => (
            "Hardware Fire Hazard",
            Urgency::Critical,
            "Hardware",
            "EVACUATE AREA. Fire safety protocols initiated and facilities escalated.",
            "Panic",
            "Thermal Runaway in Server Rack",
            "CRITICAL: Safety hazard detected. Evacuation ordered.",
        ),
        FallbackRule::HardwareFailure => (
            "Hardware Failure",
            Urgency::High,
            "Hardware",
            "Critical hardware error. Technician dispatched.",
            "Angry",
            "Disk/Motherboard Failure",
            "Hardware failure reported. Replacement required.",
        ),
        FallbackRule::Degradation => (
            "Service Degradation",
            Urgency::Medium,
            "Network",
            "Performance degradation detected. Clearing cache and resetting connection.",
            "Frustrated",
            "Application/Network Congestion",
            "Network warning: App latency reported.",
        ),
        FallbackRule::Access => (
            "Access Request",
            Urgency::Low,
            "Access",
            "A password reset link has been sent. Contact Access if it does not arrive.",
            "Neutral",
            "Expired or forgotten credentials",
            "Info: Account access request logged.",
        ),
        FallbackRule::Default => (
            "General Inquiry",
            Urgency::Low,
            "Support",
            "Ticket created. A technician will review shortly.",
            "Neutral",
            "User Information Request",
            "Info: Low priority ticket created.",
        ),
    };

    let status = if rule == FallbackRule::Degenerate {
        TicketStatus::Ignored
    } else {
        TicketStatus::Open
    };

    Diagnosis {
        summary: summary.into(),
        urgency,
        department: department.into(),
        response: response.into(),
        sentiment: sentiment.into(),
        rca_hypothesis: rca.into(),
        slack_draft: slack.into(),
        is_duplicate: false,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_keywords_are_critical_hardware() {
        for text in [
            "there is smoke",
            "I can SMELL something burning",
            "water leak above the racks",
            "saw a spark from the PSU",
            "possible security breach on my account",
        ] {
            let d = classify(text);
            assert_eq!(d.urgency, Urgency::Critical, "{}", text);
            assert_eq!(d.department, "Hardware", "{}", text);
            assert_eq!(d.sentiment, "Panic", "{}", text);
            assert_eq!(d.status, TicketStatus::Open);
        }
    }

    #[test]
    fn test_short_input_is_ignored() {
        for text in ["", "  ", "hi", "ok?", " abc "] {
            assert_eq!(classify(text).status, TicketStatus::Ignored, "{:?}", text);
        }
        assert_eq!(classify("help").status, TicketStatus::Open);
    }

    #[test]
    fn test_short_input_wins_over_attachment() {
        assert_eq!(match_rule("", true), FallbackRule::Degenerate);
    }

    #[test]
    fn test_attachment_is_high_hardware() {
        let d = classify_with_image("see the attached screen, wifi is slow", true);
        assert_eq!(d.urgency, Urgency::High);
        assert_eq!(d.department, "Hardware");
        assert_eq!(d.summary, "Visual Error Detected");
    }

    #[test]
    fn test_hardware_failure() {
        for text in [
            "My laptop won't turn on",
            "My laptop won\u{2019}t turn on",
            "Blue Screen after the update",
            "printer is not working",
            "disk is dead",
        ] {
            let d = classify(text);
            assert_eq!(d.urgency, Urgency::High, "{}", text);
            assert_eq!(d.department, "Hardware", "{}", text);
            assert_eq!(d.sentiment, "Angry", "{}", text);
        }
    }

    #[test]
    fn test_hardware_failure_outranks_degradation() {
        // "fail" (hardware) and "connect" (network) both appear.
        assert_eq!(
            match_rule("VPN failed to connect", false),
            FallbackRule::HardwareFailure
        );
    }

    #[test]
    fn test_hazard_outranks_everything_else() {
        assert_eq!(
            match_rule("wifi router crashed and there is smoke", false),
            FallbackRule::Hazard
        );
    }

    #[test]
    fn test_degradation_is_medium_network() {
        let d = classify("Zoom keeps freezing, internet very slow");
        assert_eq!(d.urgency, Urgency::Medium);
        assert_eq!(d.department, "Network");
        assert_eq!(d.sentiment, "Frustrated");
    }

    #[test]
    fn test_access_is_low() {
        let d = classify("I forgot my password");
        assert_eq!(d.urgency, Urgency::Low);
        assert_eq!(d.department, "Access");
    }

    #[test]
    fn test_default_is_low_support() {
        let d = classify("How do I request a second monitor?");
        assert_eq!(d.urgency, Urgency::Low);
        assert_eq!(d.department, "Support");
        assert_eq!(d.sentiment, "Neutral");
        assert!(!d.is_duplicate);
    }

    #[test]
    fn test_is_deterministic() {
        let text = "Slack is down for the whole team";
        assert_eq!(classify(text), classify(text));
    }
}
