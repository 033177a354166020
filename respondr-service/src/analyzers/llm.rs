use async_trait::async_trait;
use rig::completion::Chat;
use tracing::info;

use super::{MediaInput, VideoAnalyzer};
use crate::utils::get_llm_agent;

const ANALYZER_PROMPT: &str = r#"
You are a vehicle accident assessor. You receive a description of footage recorded at
the scene of a road incident. Describe only what is visible.

Respond with a single JSON object and nothing else:
{
  "severity": "minor" | "major" | "severe",
  "cars_involved": <integer, at least 1>,
  "damages": [<short damage descriptions, e.g. "front bumper", "tire damage", "broken glass">],
  "location_type": <short description of the setting, e.g. "highway">,
  "immediate_concerns": [<hazards that need attention now>]
}

Use "severe" only for visible injuries, fire, rollovers or vehicles that are destroyed.
Use "major" for significant structural damage. Otherwise use "minor".
"#;

/// Model-backed analyzer working from the scene description sent with the upload.
pub struct LlmVideoAnalyzer {
    api_key: String,
    model: String,
}

impl LlmVideoAnalyzer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl VideoAnalyzer for LlmVideoAnalyzer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn analyze(&self, media: &MediaInput) -> anyhow::Result<String> {
        let description = media
            .scene_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| anyhow::anyhow!("no scene description to analyze"))?;

        let agent = get_llm_agent(&self.api_key, &self.model, ANALYZER_PROMPT);
        let prompt = match &media.media_ref {
            Some(media_ref) => format!("Footage {}:\n{}", media_ref, description),
            None => description.to_string(),
        };

        info!(model = %self.model, prompt_len = prompt.len(), "requesting video analysis");
        let response = agent.chat(&prompt, vec![]).await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_description_fails_without_calling_model() {
        let analyzer = LlmVideoAnalyzer::new("sk-unused", "openai/gpt-4o-mini");
        let err = analyzer
            .analyze(&MediaInput {
                media_ref: Some("clip-1".to_string()),
                scene_description: Some("   ".to_string()),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("scene description"));
    }
}
