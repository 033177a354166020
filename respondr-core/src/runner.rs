//! IncidentRunner – convenience wrapper around the load → compute → save pattern.
//!
//! Each call reads what it needs from the [`SessionRepository`], runs the pure fusion /
//! intent / composition functions, and appends exactly one entry back to the session.
//!
//! ## When should you use `IncidentRunner`?
//! * **Web services**: one runner built at startup, shared across requests, one call per
//!   request.
//! * **Tests and demos**: no need to repeat the fetch-latest-analysis boilerplate.
//!
//! ## When should you call the free functions directly?
//! * When session history lives somewhere the repository trait does not fit, or when
//!   you only need an assessment and do not want it recorded.

use std::sync::Arc;
use tracing::info;

use crate::{
    catalog::ServiceCatalog,
    composer::{AnalysisResponse, ChatResponse, compose_analysis_response, compose_chat_response},
    error::{CoreError, Result},
    fusion::fuse,
    intent::classify_intent,
    session::{SessionEntry, SessionRepository},
    signals::{TextSignal, VideoSignal},
};

#[derive(Clone)]
pub struct IncidentRunner {
    sessions: Arc<dyn SessionRepository>,
    catalog: Arc<dyn ServiceCatalog>,
}

impl IncidentRunner {
    pub fn new(sessions: Arc<dyn SessionRepository>, catalog: Arc<dyn ServiceCatalog>) -> Self {
        Self { sessions, catalog }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    /// Fuses the signals, composes the response, and records the assessment as the
    /// session's latest analysis.
    pub fn analyze(
        &self,
        session_id: &str,
        video: &VideoSignal,
        text: &TextSignal,
        location: &str,
    ) -> Result<AnalysisResponse> {
        let assessment = fuse(video, text);
        let response = compose_analysis_response(&assessment, self.catalog.as_ref(), location);

        self.sessions
            .append_entry(session_id, SessionEntry::analysis(assessment))?;

        info!(
            session_id = %session_id,
            severity = %response.assessment.severity,
            services = response.recommended_services.len(),
            "analysis recorded"
        );
        Ok(response)
    }

    /// Answers a follow-up message anchored on the session's latest analysis.
    ///
    /// Fails with [`CoreError::InvalidSession`] when the session has no analysis yet.
    pub fn chat(&self, session_id: &str, message: &str, location: &str) -> Result<ChatResponse> {
        let prior = self
            .sessions
            .latest_analysis(session_id)?
            .ok_or_else(|| CoreError::InvalidSession(session_id.to_string()))?;

        let intent = classify_intent(message, Some(&prior));
        let response =
            compose_chat_response(message, &intent, &prior, self.catalog.as_ref(), location);

        self.sessions.append_entry(
            session_id,
            SessionEntry::chat_turn(message, response.reply.clone()),
        )?;

        info!(
            session_id = %session_id,
            needs_location_search = intent.needs_location_search,
            services = response.services.len(),
            "chat turn recorded"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::full_catalog;
    use crate::session::InMemorySessionRepository;
    use crate::types::Severity;

    fn runner() -> IncidentRunner {
        IncidentRunner::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(full_catalog()),
        )
    }

    #[test]
    fn test_chat_without_analysis_is_invalid_session() {
        let runner = runner();
        let err = runner
            .chat("missing", "where can I get towed, this is an emergency", "Miami")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSession(id) if id == "missing"));
        assert!(runner.sessions().get("missing").unwrap().is_none());
    }

    #[test]
    fn test_analyze_then_chat_records_history() {
        let runner = runner();
        let video = VideoSignal {
            severity: Severity::Major,
            ..VideoSignal::default()
        };
        let note = TextSignal::from_note("the other driver ran a red light");
        runner.analyze("s1", &video, &note, "Miami").unwrap();

        let response = runner.chat("s1", "how much will this cost", "Miami").unwrap();
        assert!(response.reply.contains("$2,000 to $15,000"));

        let session = runner.sessions().get("s1").unwrap().unwrap();
        assert_eq!(session.entries.len(), 2);
        assert_eq!(session.latest_analysis().unwrap().cars_involved, 2);
    }
}
