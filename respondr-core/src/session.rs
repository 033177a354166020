use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::types::FinalAssessment;

/// One step of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEntry {
    Analysis {
        assessment: FinalAssessment,
        created_at: DateTime<Utc>,
    },
    ChatTurn {
        message: String,
        reply: String,
        created_at: DateTime<Utc>,
    },
}

impl SessionEntry {
    pub fn analysis(assessment: FinalAssessment) -> Self {
        SessionEntry::Analysis {
            assessment,
            created_at: Utc::now(),
        }
    }

    pub fn chat_turn(message: impl Into<String>, reply: impl Into<String>) -> Self {
        SessionEntry::ChatTurn {
            message: message.into(),
            reply: reply.into(),
            created_at: Utc::now(),
        }
    }
}

/// Session information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub entries: Vec<SessionEntry>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// The most recent analysis, ignoring chat turns recorded after it.
    pub fn latest_analysis(&self) -> Option<&FinalAssessment> {
        self.entries.iter().rev().find_map(|entry| match entry {
            SessionEntry::Analysis { assessment, .. } => Some(assessment),
            SessionEntry::ChatTurn { .. } => None,
        })
    }
}

/// Trait for storing and retrieving session history
pub trait SessionRepository: Send + Sync {
    fn latest_analysis(&self, session_id: &str) -> Result<Option<FinalAssessment>>;
    /// Appends to the session, creating it if needed.
    fn append_entry(&self, session_id: &str, entry: SessionEntry) -> Result<()>;
    fn get(&self, session_id: &str) -> Result<Option<Session>>;
}

/// In-memory implementation of SessionRepository
pub struct InMemorySessionRepository {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn latest_analysis(&self, session_id: &str) -> Result<Option<FinalAssessment>> {
        Ok(self
            .sessions
            .get(session_id)
            .and_then(|session| session.latest_analysis().cloned()))
    }

    fn append_entry(&self, session_id: &str, entry: SessionEntry) -> Result<()> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id))
            .entries
            .push(entry);
        Ok(())
    }

    fn get(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(session_id).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::fuse;
    use crate::signals::{TextSignal, VideoSignal};
    use crate::types::Severity;

    #[test]
    fn test_latest_analysis_skips_chat_turns() {
        let repo = InMemorySessionRepository::new();
        assert!(repo.latest_analysis("s1").unwrap().is_none());

        let first = fuse(&VideoSignal::default(), &TextSignal::default());
        let second = fuse(
            &VideoSignal {
                severity: Severity::Major,
                ..VideoSignal::default()
            },
            &TextSignal::default(),
        );

        repo.append_entry("s1", SessionEntry::analysis(first)).unwrap();
        repo.append_entry("s1", SessionEntry::analysis(second.clone()))
            .unwrap();
        repo.append_entry("s1", SessionEntry::chat_turn("hi", "hello"))
            .unwrap();

        assert_eq!(repo.latest_analysis("s1").unwrap(), Some(second));
        assert_eq!(repo.get("s1").unwrap().unwrap().entries.len(), 3);
        assert!(repo.get("other").unwrap().is_none());
    }

    #[test]
    fn test_session_entry_serializes_kind_tag() {
        let value = serde_json::to_value(SessionEntry::chat_turn("a", "b")).unwrap();
        assert_eq!(value["kind"], "chat_turn");
        assert_eq!(value["message"], "a");
    }
}
