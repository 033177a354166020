pub mod catalog;
pub mod composer;
pub mod cues;
pub mod error;
pub mod fusion;
pub mod intent;
pub mod runner;
pub mod session;
pub mod signals;
pub mod types;

// Re-export commonly used types
pub use catalog::{CandidateService, Coordinates, InMemoryCatalog, ServiceCatalog};
pub use composer::{
    AnalysisResponse, ChatResponse, MapData, MapMarker, RecommendedService,
    compose_analysis_response, compose_chat_response,
};
pub use cues::{CarsOverride, TextCues, classify};
pub use error::{CoreError, Result};
pub use fusion::fuse;
pub use intent::{IntentKind, QueryIntent, SpecificRequest, Urgency, classify_intent};
pub use runner::IncidentRunner;
pub use session::{InMemorySessionRepository, Session, SessionEntry, SessionRepository};
pub use signals::{TextSignal, VideoSignal};
pub use types::{
    DamageSet, DamageTag, FinalAssessment, LocationRecommendation, Priority,
    RecommendationPriority, ServiceType, Severity,
};
