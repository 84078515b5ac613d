//! Service-level request and result types.

use serde::Serialize;

use nexus_classify::{ClassifierSource, ImageAttachment};
use nexus_store::Ticket;

/// Marker appended to `raw_issue` when a screenshot came with the complaint.
pub const ATTACHMENT_MARKER: &str = "[Image Attached]";

/// Default intake channel.
pub const DEFAULT_CHANNEL: &str = "Web Portal";

/// A complaint as submitted by the front end.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub raw_text: String,
    pub channel: String,
    pub contact: String,
    pub image: Option<ImageAttachment>,
}

impl NewTicket {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            channel: DEFAULT_CHANNEL.into(),
            ..Default::default()
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    pub fn image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// A persisted ticket plus how it was classified.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    pub ticket: Ticket,
    pub source: ClassifierSource,
    /// Passive notice shown when the local fallback classified the ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
