//! Video analyzers: the external collaborator that turns an upload into a raw
//! assessment. Their output is untrusted and is normalized by
//! [`VideoSignal::from_text`] before it reaches fusion.

mod llm;
mod mock;

pub use llm::LlmVideoAnalyzer;
pub use mock::MockVideoAnalyzer;

use async_trait::async_trait;
use respondr_core::VideoSignal;
use std::time::Duration;
use tracing::{debug, warn};

/// What the client sent about the footage.
#[derive(Debug, Clone, Default)]
pub struct MediaInput {
    pub media_ref: Option<String>,
    pub scene_description: Option<String>,
}

#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Raw analyzer output, expected to be (possibly fenced) JSON.
    async fn analyze(&self, media: &MediaInput) -> anyhow::Result<String>;
}

/// Runs `analyzer` under `timeout`. Errors, timeouts and unreadable output all yield
/// the default signal.
pub async fn resolve_video_signal(
    analyzer: &dyn VideoAnalyzer,
    media: &MediaInput,
    timeout: Duration,
) -> VideoSignal {
    match tokio::time::timeout(timeout, analyzer.analyze(media)).await {
        Ok(Ok(raw)) => {
            debug!(analyzer = analyzer.name(), output_len = raw.len(), "analyzer returned");
            VideoSignal::from_text(&raw)
        }
        Ok(Err(e)) => {
            warn!(analyzer = analyzer.name(), error = %e, "video analysis failed, using defaults");
            VideoSignal::default()
        }
        Err(_) => {
            warn!(
                analyzer = analyzer.name(),
                timeout_secs = timeout.as_secs(),
                "video analysis timed out, using defaults"
            );
            VideoSignal::default()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubAnalyzer;
    use super::*;
    use respondr_core::Severity;

    #[tokio::test]
    async fn test_fenced_output_is_parsed() {
        let analyzer = StubAnalyzer::returning(
            "```json\n{\"severity\":\"major\",\"cars_involved\":2,\"damages\":[\"front bumper\"]}\n```",
        );
        let signal =
            resolve_video_signal(&analyzer, &MediaInput::default(), Duration::from_secs(1)).await;
        assert_eq!(signal.severity, Severity::Major);
        assert_eq!(signal.cars_involved, 2);
        assert_eq!(signal.damages.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_default() {
        let signal = resolve_video_signal(
            &StubAnalyzer::failing(),
            &MediaInput::default(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(signal, VideoSignal::default());
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_default() {
        let analyzer = StubAnalyzer {
            output: Some("{\"severity\":\"severe\"}".to_string()),
            delay: Duration::from_millis(200),
        };
        let signal =
            resolve_video_signal(&analyzer, &MediaInput::default(), Duration::from_millis(10))
                .await;
        assert_eq!(signal, VideoSignal::default());
    }
}
