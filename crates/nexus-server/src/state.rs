//! Shared application state.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_classify::ClassifierConfig;
use nexus_core::NexusConfig;
use nexus_service::TicketService;
use nexus_store::TicketStore;

/// One line of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Sessions kept before the least recently used one is dropped.
pub const MAX_CHAT_SESSIONS: usize = 256;

/// Messages kept per session; older ones fall off the front.
pub const MAX_SESSION_MESSAGES: usize = 100;

struct Transcript {
    messages: VecDeque<ChatMessage>,
    last_used: u64,
}

#[derive(Default)]
struct SessionMap {
    sessions: HashMap<String, Transcript>,
    /// Bumped on every push; orders sessions by recency.
    clock: u64,
}

/// Per-session chat transcripts. Presentation state only; the ticket
/// service never sees it. Bounded in both sessions and messages.
pub struct ChatSessions {
    inner: RwLock<SessionMap>,
    max_sessions: usize,
    max_messages: usize,
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::with_limits(MAX_CHAT_SESSIONS, MAX_SESSION_MESSAGES)
    }
}

impl ChatSessions {
    pub fn with_limits(max_sessions: usize, max_messages: usize) -> Self {
        Self {
            inner: RwLock::new(SessionMap::default()),
            max_sessions: max_sessions.max(1),
            max_messages: max_messages.max(1),
        }
    }

    pub fn push(&self, session_id: &str, role: &str, content: impl Into<String>) {
        let mut guard = self.inner.write();
        let map = &mut *guard;
        map.clock += 1;
        let now = map.clock;

        if !map.sessions.contains_key(session_id) && map.sessions.len() >= self.max_sessions {
            let oldest = map
                .sessions
                .iter()
                .min_by_key(|(_, t)| t.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                map.sessions.remove(&oldest);
                debug!("Evicted chat session {}", oldest);
            }
        }

        let transcript = map
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Transcript {
                messages: VecDeque::new(),
                last_used: now,
            });
        transcript.last_used = now;
        transcript.messages.push_back(ChatMessage {
            role: role.to_string(),
            content: content.into(),
        });
        while transcript.messages.len() > self.max_messages {
            transcript.messages.pop_front();
        }
    }

    pub fn history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        self.inner
            .read()
            .sessions
            .get(session_id)
            .map(|t| t.messages.iter().cloned().collect())
    }

    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn clear(&self) {
        self.inner.write().sessions.clear();
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: NexusConfig,
    pub service: TicketService,
    pub classifier_config: RwLock<ClassifierConfig>,
    pub sessions: ChatSessions,
}

impl AppState {
    pub fn new(config: NexusConfig) -> nexus_core::Result<Self> {
        let store = TicketStore::open(&config.data_paths.tickets_file)?;
        let service = TicketService::new(store, config.classifier_timeout());
        let classifier_config = ClassifierConfig::load(&config.data_paths.classifier_config_file);

        Ok(Self {
            config,
            service,
            classifier_config: RwLock::new(classifier_config),
            sessions: ChatSessions::default(),
        })
    }
}
