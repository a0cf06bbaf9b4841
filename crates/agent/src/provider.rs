use async_trait::async_trait;
use etymo_core::config::LlmConfig;
use etymo_core::{ExplanationProvider, ProviderError};
use tracing::info;

use crate::analysis::ModelAnalysis;
use crate::llm::LlmClient;
use crate::prompt::explanation_request;

pub struct ModelExplanationProvider<C> {
    client: C,
    model: String,
    temperature: f32,
}

impl<C> ModelExplanationProvider<C>
where
    C: LlmClient,
{
    pub fn new(client: C, model: impl Into<String>, temperature: f32) -> Self {
        Self { client, model: model.into(), temperature }
    }

    pub fn from_config(client: C, config: &LlmConfig) -> Self {
        Self::new(client, config.model.clone(), config.temperature)
    }

    pub async fn analyze(&self, word: &str) -> Result<ModelAnalysis, ProviderError> {
        let request = explanation_request(&self.model, self.temperature, word);
        let completion = self.client.complete(&request).await?;
        let analysis = ModelAnalysis::parse(&completion);

        info!(
            event_name = "agent.explanation.generated",
            word,
            hebrew_root = analysis.hebrew_root.as_deref().unwrap_or("unknown"),
            arabic_root = analysis.arabic_root.as_deref().unwrap_or("none"),
            derived_count = analysis.derived.len(),
            "model explanation parsed"
        );

        Ok(analysis)
    }
}

#[async_trait]
impl<C> ExplanationProvider for ModelExplanationProvider<C>
where
    C: LlmClient,
{
    async fn generate(&self, word: &str) -> Result<String, ProviderError> {
        let explanation = self.analyze(word).await?.explanation();
        if explanation.trim().is_empty() {
            return Err(ProviderError::malformed("model returned no explanation text"));
        }
        Ok(explanation)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use etymo_core::{ExplanationProvider, ProviderErrorKind};
    use tokio::sync::Mutex;

    use super::ModelExplanationProvider;
    use crate::llm::{ChatRequest, LlmClient, LlmError};

    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn with_replies(replies: Vec<Result<String, LlmError>>) -> Self {
            Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            self.requests.lock().await.push(request.clone());
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_owned())))
        }
    }

    #[tokio::test]
    async fn plain_completion_becomes_explanation() {
        let provider = ModelExplanationProvider::new(
            ScriptedClient::with_replies(vec![Ok("participle of To prepare".to_owned())]),
            "deepseek-chat",
            0.2,
        );

        let explanation = provider.generate("מכין").await.expect("generation succeeds");

        assert_eq!(explanation, "participle of To prepare");
        let requests = provider.client.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[1].content.contains("Word: מכין"));
        assert!((requests[0].temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn client_failures_keep_their_kind() {
        let provider = ModelExplanationProvider::new(
            ScriptedClient::with_replies(vec![
                Err(LlmError::Unauthorized { status: 401 }),
                Err(LlmError::MalformedResponse("no choices".to_owned())),
                Err(LlmError::Transport("timed out".to_owned())),
            ]),
            "deepseek-chat",
            0.2,
        );

        let kinds = [
            provider.generate("a").await.expect_err("401").kind,
            provider.generate("b").await.expect_err("malformed").kind,
            provider.generate("c").await.expect_err("transport").kind,
        ];

        assert_eq!(
            kinds,
            [
                ProviderErrorKind::Authentication,
                ProviderErrorKind::MalformedResponse,
                ProviderErrorKind::Network
            ]
        );
    }

    #[tokio::test]
    async fn blank_main_text_is_malformed() {
        let provider = ModelExplanationProvider::new(
            ScriptedClient::with_replies(vec![Ok("DERIVED_JSON: []".to_owned())]),
            "deepseek-chat",
            0.2,
        );

        let error = provider.generate("x").await.expect_err("nothing to show");
        assert_eq!(error.kind, ProviderErrorKind::MalformedResponse);
    }
}
