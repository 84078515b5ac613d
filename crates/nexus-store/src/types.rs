//! Ticket record and the enums stored in its cells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Written in place of any empty cell so every row has all columns.
pub const SENTINEL: &str = "N/A";

/// Column order of the ticket table. Matches the field order of [`Ticket`].
pub const COLUMNS: [&str; 14] = [
    "ticket_id",
    "timestamp",
    "channel",
    "user_contact",
    "status",
    "urgency",
    "department",
    "summary",
    "raw_issue",
    "response",
    "sentiment",
    "is_duplicate",
    "rca_hypothesis",
    "slack_draft",
];

/// Timestamp format of the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix of every ticket identifier.
pub const TICKET_ID_PREFIX: &str = "TKT-";

/// Intake channels offered by the chat front end. Free text is tolerated.
pub const CHANNELS: &[&str] = &["Web Portal", "Email", "WhatsApp", "Slack", "Voice"];

/// Departments a ticket can be routed to. Free text is tolerated.
pub const DEPARTMENTS: &[&str] = &[
    "Hardware", "Network", "Software", "Access", "Support", "General",
];

/// Ticket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    /// Degenerate input that was recorded but never queued.
    Ignored,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Ignored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "in progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "ignored" => Ok(Self::Ignored),
            _ => Err(format!("unknown status '{}'", s)),
        }
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Priority band. Ordered so that `Critical` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// High and Critical tickets count as high priority on the dashboard.
    pub fn is_high_priority(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("unknown urgency '{}'", s)),
        }
    }
}

impl TryFrom<String> for Urgency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Urgency> for String {
    fn from(urgency: Urgency) -> Self {
        urgency.as_str().to_string()
    }
}

/// One row of the ticket table.
///
/// Field order is the column order on disk; see [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub timestamp: String,
    pub channel: String,
    pub user_contact: String,
    pub status: TicketStatus,
    pub urgency: Urgency,
    pub department: String,
    pub summary: String,
    pub raw_issue: String,
    pub response: String,
    pub sentiment: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_duplicate: bool,
    pub rca_hypothesis: String,
    pub slack_draft: String,
}

impl Ticket {
    /// Replace every blank text cell with [`SENTINEL`].
    pub fn fill_missing(&mut self) {
        for field in [
            &mut self.ticket_id,
            &mut self.timestamp,
            &mut self.channel,
            &mut self.user_contact,
            &mut self.department,
            &mut self.summary,
            &mut self.raw_issue,
            &mut self.response,
            &mut self.sentiment,
            &mut self.rca_hypothesis,
            &mut self.slack_draft,
        ] {
            if field.trim().is_empty() {
                *field = SENTINEL.to_string();
            }
        }
    }

    /// Copy of this ticket with blank cells filled.
    pub fn normalized(&self) -> Self {
        let mut ticket = self.clone();
        ticket.fill_missing();
        ticket
    }

    pub fn apply(&mut self, update: &TicketUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(urgency) = update.urgency {
            self.urgency = urgency;
        }
        if let Some(department) = &update.department {
            self.department = department.clone();
        }
        if let Some(response) = &update.response {
            self.response = response.clone();
        }
    }
}

/// Field updates applied by id. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl TicketUpdate {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// `TKT-` followed by exactly six uppercase ASCII alphanumerics.
pub fn is_valid_ticket_id(id: &str) -> bool {
    id.strip_prefix(TICKET_ID_PREFIX)
        .map(|suffix| {
            suffix.len() == 6
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        })
        .unwrap_or(false)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagCell {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Accepts `true`/`false` in any case (spreadsheet exports write `True`)
/// and `1`/`0`, and reads blank or sentinel cells as `false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagCell::deserialize(deserializer)? {
        FlagCell::Bool(b) => Ok(b),
        FlagCell::Number(1) => Ok(true),
        FlagCell::Number(0) => Ok(false),
        FlagCell::Number(n) => Err(serde::de::Error::custom(format!(
            "invalid is_duplicate value '{}'",
            n
        ))),
        FlagCell::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" | "" | "n/a" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid is_duplicate value '{}'",
                other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!("In Progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert_eq!("in_progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert_eq!(" open ".parse::<TicketStatus>(), Ok(TicketStatus::Open));
        assert!("Closed".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Medium);
        assert!(Urgency::Medium > Urgency::Low);
        assert!(Urgency::Critical.is_high_priority());
        assert!(!Urgency::Medium.is_high_priority());
    }

    #[test]
    fn test_ticket_id_format() {
        assert!(is_valid_ticket_id("TKT-A1B2C3"));
        assert!(!is_valid_ticket_id("TKT-a1b2c3"));
        assert!(!is_valid_ticket_id("TKT-A1B2C"));
        assert!(!is_valid_ticket_id("A1B2C3"));
    }

    #[test]
    fn test_json_uses_display_names() {
        let update = TicketUpdate::status(TicketStatus::InProgress);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "In Progress" }));
    }
}
