//! Ticket service: classify a complaint, assemble and persist the ticket,
//! and apply operator actions.
//!
//! The service keeps no per-session state; everything lives in the store.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::metrics::{open_queue, DashboardMetrics};
use crate::types::{CreatedTicket, NewTicket, ATTACHMENT_MARKER, DEFAULT_CHANNEL};
use nexus_classify::fallback::{self, FallbackRule};
use nexus_classify::prompt::HEALTHY_CONTEXT;
use nexus_classify::providers::{self, Endpoints};
use nexus_classify::{ClassifierSource, ClassifyRequest, Credential, Diagnosis};
use nexus_core::{Error, Result};
use nexus_store::{
    is_valid_ticket_id, Ticket, TicketStatus, TicketStore, SENTINEL, TICKET_ID_PREFIX,
    TIMESTAMP_FORMAT,
};

/// Orchestrates the classifier and the ticket store.
pub struct TicketService {
    store: TicketStore,
    client: Client,
    endpoints: Endpoints,
}

impl TicketService {
    pub fn new(store: TicketStore, classifier_timeout: Duration) -> Self {
        Self {
            store,
            client: providers::build_client(classifier_timeout),
            endpoints: Endpoints::default(),
        }
    }

    /// Send remote classifications somewhere other than the public
    /// provider APIs, e.g. an internal gateway.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn store(&self) -> &TicketStore {
        &self.store
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    /// Classify, assemble and persist one ticket.
    ///
    /// With a credential the remote classifier is tried first; any remote
    /// failure falls back to the keyword table. Input too short to act on
    /// never reaches the remote model.
    pub async fn create_ticket(
        &self,
        new: NewTicket,
        credential: Option<&Credential>,
    ) -> Result<CreatedTicket> {
        let has_image = new.image.is_some();
        let degenerate =
            fallback::match_rule(&new.raw_text, has_image) == FallbackRule::Degenerate;

        let (diagnosis, source, notice) = match credential {
            Some(credential) if !degenerate => {
                let context = self.active_incidents_context();
                let req = ClassifyRequest {
                    text: &new.raw_text,
                    channel: &new.channel,
                    active_incidents: &context,
                    image: new.image.as_ref(),
                };
                match providers::classify_remote(&self.client, &self.endpoints, &req, credential).await {
                    Ok(d) => (d, ClassifierSource::Remote, None),
                    Err(e) => {
                        warn!("Remote classifier ({}) failed, using fallback: {}", credential.provider, e);
                        (
                            fallback::classify_with_image(&new.raw_text, has_image),
                            ClassifierSource::Fallback,
                            Some(format!("Using local backup classifier ({})", e)),
                        )
                    }
                }
            }
            Some(_) => (
                fallback::classify_with_image(&new.raw_text, has_image),
                ClassifierSource::Fallback,
                None,
            ),
            None => (
                fallback::classify_with_image(&new.raw_text, has_image),
                ClassifierSource::Fallback,
                Some("Using local backup classifier (no API key configured)".to_string()),
            ),
        };

        let ticket = assemble_ticket(&new, diagnosis);
        validate_ticket(&ticket)?;
        let ticket = self.store.append_unique(ticket, new_ticket_id)?;

        info!(
            "Created {} [{} / {} / {}] via {:?}",
            ticket.ticket_id, ticket.urgency, ticket.department, ticket.status, source
        );

        Ok(CreatedTicket {
            ticket,
            source,
            notice,
        })
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    /// Open → In Progress.
    pub fn claim(&self, ticket_id: &str) -> Result<Ticket> {
        let ticket = self.store.modify(ticket_id, |t| {
            require_status(t, "claim", &[TicketStatus::Open])?;
            t.status = TicketStatus::InProgress;
            Ok(())
        })?;
        info!("Claimed {}", ticket_id);
        Ok(ticket)
    }

    /// Open or In Progress → Resolved.
    pub fn resolve(&self, ticket_id: &str) -> Result<Ticket> {
        let ticket = self.store.modify(ticket_id, |t| {
            require_status(t, "resolve", &[TicketStatus::Open, TicketStatus::InProgress])?;
            t.status = TicketStatus::Resolved;
            Ok(())
        })?;
        info!("Resolved {}", ticket_id);
        Ok(ticket)
    }

    /// Route to another department and put back in the Open queue.
    pub fn transfer(&self, ticket_id: &str, department: &str) -> Result<Ticket> {
        let department = department.trim();
        if department.is_empty() {
            return Err(Error::Validation("department must not be empty".into()));
        }
        let ticket = self.store.modify(ticket_id, |t| {
            require_status(t, "transfer", &[TicketStatus::Open, TicketStatus::InProgress])?;
            t.department = department.to_string();
            t.status = TicketStatus::Open;
            Ok(())
        })?;
        info!("Transferred {} to {}", ticket_id, department);
        Ok(ticket)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn list_tickets(&self) -> Result<Vec<Ticket>> {
        self.store.read_all()
    }

    pub fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>> {
        Ok(self
            .store
            .read_all()?
            .into_iter()
            .filter(|t| t.status == status)
            .collect())
    }

    /// Case-insensitive id fragment search used by the status tracker.
    pub fn find_by_id(&self, fragment: &str) -> Result<Vec<Ticket>> {
        self.store.find_by_id(fragment)
    }

    /// Open tickets, most urgent first.
    pub fn open_queue(&self) -> Result<Vec<Ticket>> {
        Ok(open_queue(&self.store.read_all()?))
    }

    pub fn metrics(&self) -> Result<DashboardMetrics> {
        Ok(DashboardMetrics::from_tickets(&self.store.read_all()?))
    }

    /// Drop every ticket.
    pub fn reset_store(&self) -> Result<()> {
        self.store.clear()?;
        info!("Ticket store reset");
        Ok(())
    }

    /// Open High/Critical tickets as `summary (department)` joined by `; `.
    /// Best effort: an unreadable store reads as healthy.
    pub fn active_incidents_context(&self) -> String {
        let tickets = match self.store.read_all() {
            Ok(t) => t,
            Err(e) => {
                warn!("Could not read tickets for incident context: {}", e);
                return HEALTHY_CONTEXT.to_string();
            }
        };

        let incidents: Vec<String> = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Open && t.urgency.is_high_priority())
            .map(|t| format!("{} ({})", t.summary, t.department))
            .collect();

        if incidents.is_empty() {
            HEALTHY_CONTEXT.to_string()
        } else {
            incidents.join("; ")
        }
    }
}

const ID_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_SUFFIX_LEN: usize = 6;

/// `TKT-` plus six base-36 characters (`0-9A-Z`) drawn from a fresh UUID v4.
/// Uniqueness against stored rows is enforced by the store on append.
pub fn new_ticket_id() -> String {
    // Low bits of a v4 UUID are all random.
    let mut bits = uuid::Uuid::new_v4().as_u128() as u64;
    let mut id = String::with_capacity(TICKET_ID_PREFIX.len() + ID_SUFFIX_LEN);
    id.push_str(TICKET_ID_PREFIX);
    for _ in 0..ID_SUFFIX_LEN {
        id.push(ID_ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    id
}

/// Merge a diagnosis with the generated and submitted fields.
pub fn assemble_ticket(new: &NewTicket, diagnosis: Diagnosis) -> Ticket {
    let raw_issue = if new.image.is_some() {
        format!("{} {}", new.raw_text.trim(), ATTACHMENT_MARKER)
            .trim()
            .to_string()
    } else {
        new.raw_text.trim().to_string()
    };
    let channel = if new.channel.trim().is_empty() {
        DEFAULT_CHANNEL.to_string()
    } else {
        new.channel.trim().to_string()
    };
    let contact = if new.contact.trim().is_empty() {
        SENTINEL.to_string()
    } else {
        new.contact.trim().to_string()
    };

    let mut ticket = Ticket {
        ticket_id: new_ticket_id(),
        timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        channel,
        user_contact: contact,
        status: diagnosis.status,
        urgency: diagnosis.urgency,
        department: diagnosis.department,
        summary: diagnosis.summary,
        raw_issue,
        response: diagnosis.response,
        sentiment: diagnosis.sentiment,
        is_duplicate: diagnosis.is_duplicate,
        rca_hypothesis: diagnosis.rca_hypothesis,
        slack_draft: diagnosis.slack_draft,
    };
    ticket.fill_missing();
    ticket
}

/// Checks run before a ticket is persisted.
pub fn validate_ticket(ticket: &Ticket) -> Result<()> {
    if !is_valid_ticket_id(&ticket.ticket_id) {
        return Err(Error::Validation(format!(
            "malformed ticket id '{}'",
            ticket.ticket_id
        )));
    }
    for (name, value) in [
        ("summary", &ticket.summary),
        ("department", &ticket.department),
        ("response", &ticket.response),
    ] {
        if value.trim().is_empty() || value == SENTINEL {
            return Err(Error::Validation(format!("{} is missing", name)));
        }
    }
    Ok(())
}

fn require_status(ticket: &Ticket, action: &'static str, allowed: &[TicketStatus]) -> Result<()> {
    if allowed.contains(&ticket.status) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            id: ticket.ticket_id.clone(),
            action,
            status: ticket.status.to_string(),
        })
    }
}
