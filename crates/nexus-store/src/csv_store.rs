//! CSV-backed ticket table.
//!
//! Appends add one row; every other mutation loads the whole table,
//! edits it in memory and writes it back through a temp file + rename.
//! All writes within a process go through one lock, so read-modify-write
//! cycles never interleave. Separate processes sharing the same file are
//! not coordinated and can still lose each other's updates.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::types::{Ticket, TicketUpdate, COLUMNS};
use nexus_core::{Error, Result};

/// How many fresh ids [`TicketStore::append_unique`] draws before giving up.
pub const MAX_ID_ATTEMPTS: usize = 16;

/// Flat-file ticket store.
pub struct TicketStore {
    path: PathBuf,
    /// Readers share, writers are exclusive.
    lock: RwLock<()>,
}

impl TicketStore {
    /// Open a store backed by `path`. The file itself is created lazily on
    /// the first append.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
            }
        }
        info!("TicketStore opened at {}", path.display());
        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Append one ticket. Creates the table with its header if missing.
    pub fn append(&self, ticket: &Ticket) -> Result<()> {
        let _guard = self.lock.write();
        self.write_row(ticket)
    }

    /// Append `ticket` under an id no stored row already uses.
    ///
    /// The id check and the append happen under one write lock. While the
    /// ticket's id is taken, `next_id` is asked for another one, up to
    /// [`MAX_ID_ATTEMPTS`] times. Returns the ticket as stored.
    pub fn append_unique<F>(&self, mut ticket: Ticket, mut next_id: F) -> Result<Ticket>
    where
        F: FnMut() -> String,
    {
        let _guard = self.lock.write();
        let taken: HashSet<String> = self.load()?.into_iter().map(|t| t.ticket_id).collect();

        let mut attempts = 0;
        while taken.contains(&ticket.ticket_id) {
            attempts += 1;
            if attempts > MAX_ID_ATTEMPTS {
                return Err(Error::Storage(format!(
                    "no free ticket id after {} attempts",
                    MAX_ID_ATTEMPTS
                )));
            }
            debug!("Ticket id {} already in use, drawing another", ticket.ticket_id);
            ticket.ticket_id = next_id();
        }

        self.write_row(&ticket)?;
        Ok(ticket)
    }

    /// Apply `update` to the first ticket whose id matches exactly and
    /// rewrite the table. Returns the updated ticket.
    pub fn update_by_key(&self, ticket_id: &str, update: &TicketUpdate) -> Result<Ticket> {
        self.modify(ticket_id, |ticket| {
            ticket.apply(update);
            Ok(())
        })
    }

    /// Run `edit` on the first ticket whose id matches exactly, then rewrite
    /// the table. The whole cycle holds the write lock, so `edit` may check
    /// the current state before changing it. If `edit` fails nothing is
    /// written.
    pub fn modify<F>(&self, ticket_id: &str, edit: F) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        let _guard = self.lock.write();
        let mut tickets = self.load()?;

        let ticket = tickets
            .iter_mut()
            .find(|t| t.ticket_id == ticket_id)
            .ok_or_else(|| Error::NotFound(ticket_id.to_string()))?;

        edit(ticket)?;
        ticket.fill_missing();
        let updated = ticket.clone();

        self.rewrite(&tickets)?;
        debug!("Updated ticket {} (status={})", updated.ticket_id, updated.status);
        Ok(updated)
    }

    /// Delete the backing file. A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.write();
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared ticket table {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Every ticket in file order. A missing table is an empty store.
    pub fn read_all(&self) -> Result<Vec<Ticket>> {
        let _guard = self.lock.read();
        self.load()
    }

    /// Tickets whose id contains `fragment`, ignoring case.
    pub fn find_by_id(&self, fragment: &str) -> Result<Vec<Ticket>> {
        let needle = fragment.trim().to_uppercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|t| t.ticket_id.to_uppercase().contains(&needle))
            .collect())
    }

    // ---------------------------------------------------------------
    // Internals (callers hold the lock)
    // ---------------------------------------------------------------

    fn write_row(&self, ticket: &Ticket) -> Result<()> {
        let needs_header = !self.has_content();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Storage(format!("open {}: {}", self.path.display(), e)))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(ticket.normalized())
            .map_err(|e| Error::Storage(format!("append {}: {}", ticket.ticket_id, e)))?;
        writer.flush()?;

        debug!("Appended ticket {}", ticket.ticket_id);
        Ok(())
    }

    fn has_content(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false)
    }

    fn load(&self) -> Result<Vec<Ticket>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(e.to_string())),
        };

        let mut reader = csv::Reader::from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| Error::Malformed(format!("header: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if !headers.iter().eq(COLUMNS.iter().copied()) {
            return Err(Error::Malformed(format!(
                "unexpected header [{}]",
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut tickets = Vec::new();
        for record in reader.deserialize::<Ticket>() {
            let ticket = record.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                Error::Malformed(format!("line {}: {}", line, e))
            })?;
            tickets.push(ticket);
        }
        Ok(tickets)
    }

    fn rewrite(&self, tickets: &[Ticket]) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");

        let file = File::create(&tmp_path)
            .map_err(|e| Error::Storage(format!("create {}: {}", tmp_path.display(), e)))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        // Header is written explicitly so an empty table still has one.
        writer
            .write_record(COLUMNS)
            .map_err(|e| Error::Storage(e.to_string()))?;
        for ticket in tickets {
            writer
                .serialize(ticket.normalized())
                .map_err(|e| Error::Storage(format!("rewrite {}: {}", ticket.ticket_id, e)))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| Error::Storage(e.to_string()))?;
        file.sync_all()?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            Error::Storage(format!(
                "rename {} to {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}
