//! NexusDesk Store: ticket records in an append-only CSV table.

pub mod csv_store;
pub mod types;

pub use csv_store::TicketStore;
pub use types::*;
