//! Dashboard figures computed from the ticket table.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use nexus_store::{Ticket, TicketStatus};

/// Headline numbers and breakdowns for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total: usize,
    /// High and Critical together.
    pub high_priority: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub by_department: BTreeMap<String, usize>,
    pub by_urgency: BTreeMap<String, usize>,
    /// Distinct statuses present, for the status filter.
    pub statuses: Vec<TicketStatus>,
}

impl DashboardMetrics {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut metrics = Self {
            total: tickets.len(),
            ..Default::default()
        };

        for ticket in tickets {
            if ticket.urgency.is_high_priority() {
                metrics.high_priority += 1;
            }
            match ticket.status {
                TicketStatus::Open => metrics.open += 1,
                TicketStatus::InProgress => metrics.in_progress += 1,
                TicketStatus::Resolved => metrics.resolved += 1,
                TicketStatus::Ignored => {}
            }
            *metrics
                .by_department
                .entry(ticket.department.clone())
                .or_default() += 1;
            *metrics
                .by_urgency
                .entry(ticket.urgency.to_string())
                .or_default() += 1;
            if !metrics.statuses.contains(&ticket.status) {
                metrics.statuses.push(ticket.status);
            }
        }
        metrics.statuses.sort();
        metrics
    }
}

/// Open tickets, Critical first; oldest first within a band.
pub fn open_queue(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut queue: Vec<Ticket> = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Open)
        .cloned()
        .collect();
    queue.sort_by(|a, b| {
        (Reverse(a.urgency), &a.timestamp).cmp(&(Reverse(b.urgency), &b.timestamp))
    });
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_store::Urgency;

    fn ticket(id: &str, status: TicketStatus, urgency: Urgency, dept: &str, ts: &str) -> Ticket {
        Ticket {
            ticket_id: id.into(),
            timestamp: ts.into(),
            channel: "Email".into(),
            user_contact: "N/A".into(),
            status,
            urgency,
            department: dept.into(),
            summary: "s".into(),
            raw_issue: "r".into(),
            response: "ok".into(),
            sentiment: "Neutral".into(),
            is_duplicate: false,
            rca_hypothesis: "N/A".into(),
            slack_draft: "N/A".into(),
        }
    }

    fn sample() -> Vec<Ticket> {
        vec![
            ticket("TKT-000001", TicketStatus::Open, Urgency::Medium, "Network", "2024-05-01 09:00:00"),
            ticket("TKT-000002", TicketStatus::Open, Urgency::Critical, "Hardware", "2024-05-01 10:00:00"),
            ticket("TKT-000003", TicketStatus::InProgress, Urgency::High, "Hardware", "2024-05-01 08:00:00"),
            ticket("TKT-000004", TicketStatus::Resolved, Urgency::Low, "Access", "2024-05-01 07:00:00"),
            ticket("TKT-000005", TicketStatus::Open, Urgency::Critical, "Hardware", "2024-05-01 09:30:00"),
        ]
    }

    #[test]
    fn test_metrics_counts() {
        let metrics = DashboardMetrics::from_tickets(&sample());
        assert_eq!(metrics.total, 5);
        assert_eq!(metrics.high_priority, 3);
        assert_eq!(metrics.open, 3);
        assert_eq!(metrics.in_progress, 1);
        assert_eq!(metrics.resolved, 1);
        assert_eq!(metrics.by_department["Hardware"], 3);
        assert_eq!(metrics.by_urgency["Critical"], 2);
        assert_eq!(
            metrics.statuses,
            vec![TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved]
        );
    }

    #[test]
    fn test_empty_metrics() {
        assert_eq!(DashboardMetrics::from_tickets(&[]), DashboardMetrics::default());
    }

    #[test]
    fn test_open_queue_order() {
        let ids: Vec<String> = open_queue(&sample()).into_iter().map(|t| t.ticket_id).collect();
        assert_eq!(ids, vec!["TKT-000005", "TKT-000002", "TKT-000001"]);
    }
}
