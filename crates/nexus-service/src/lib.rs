//! NexusDesk Service: turns complaints into persisted tickets and moves
//! them through their lifecycle.

pub mod metrics;
pub mod service;
pub mod types;

pub use metrics::DashboardMetrics;
pub use service::TicketService;
pub use types::*;
