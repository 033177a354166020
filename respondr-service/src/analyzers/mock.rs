use async_trait::async_trait;
use tracing::info;

use super::{MediaInput, VideoAnalyzer};

const CANNED_ANALYSES: &[&str] = &[
    r#"{"severity":"major","cars_involved":2,"damages":["front collision"],"location_type":"intersection","immediate_concerns":["airbag deployment"]}"#,
    r#"{"severity":"minor","cars_involved":1,"damages":["rear bumper scratch"],"location_type":"parking lot","immediate_concerns":[]}"#,
    r#"{"severity":"minor","cars_involved":1,"damages":["tire damage"],"location_type":"residential street","immediate_concerns":["vehicle not drivable"]}"#,
    r#"{"severity":"severe","cars_involved":3,"damages":["side impact","broken glass","fluid leak"],"location_type":"highway","immediate_concerns":["possible injuries","traffic hazard"]}"#,
];

/// Stand-in analyzer used when no model credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockVideoAnalyzer;

#[async_trait]
impl VideoAnalyzer for MockVideoAnalyzer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, media: &MediaInput) -> anyhow::Result<String> {
        let pick = rand::random_range(0..CANNED_ANALYSES.len());
        info!(
            media_ref = ?media.media_ref,
            canned_result = pick,
            "returning mock video analysis"
        );
        Ok(CANNED_ANALYSES[pick].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondr_core::VideoSignal;

    #[test]
    fn test_canned_analyses_are_readable() {
        for raw in CANNED_ANALYSES {
            let value: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert!(value["severity"].is_string());
            assert!(!VideoSignal::from_text(raw).damages.is_empty());
        }
    }

    #[tokio::test]
    async fn test_mock_returns_a_canned_result() {
        let raw = MockVideoAnalyzer
            .analyze(&MediaInput::default())
            .await
            .unwrap();
        assert!(CANNED_ANALYSES.contains(&raw.as_str()));
    }
}
