use std::future::Future;

use anyhow::Result;
use tracing::{error, info};

use super::ImagePayload;
use crate::llm::{ChatMessage, ImageAttachment, LlmClient, LlmRequest, MessageRole};

/// Shown to the student whenever the model provider cannot be reached.
pub const SERVICE_ERROR_MESSAGE: &str = "Sorry, I encountered an error while analyzing your request. Please ensure you have a valid API key and internet connection.";

/// The external advisor query: prompt text plus an optional image in, answer text out.
pub trait AdvisorBackend: Send + Sync {
    fn query(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Forwards advisor queries to the configured LLM provider.
#[derive(Clone)]
pub struct LlmAdvisor {
    llm: LlmClient,
    model: String,
    system_prompt: String,
}

impl LlmAdvisor {
    pub fn new(llm: LlmClient, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    fn build_request(&self, prompt: &str, image: Option<&ImagePayload>) -> LlmRequest {
        let messages = vec![
            ChatMessage::new(MessageRole::System, self.system_prompt.as_str()),
            ChatMessage::new(MessageRole::User, prompt),
        ];
        let images = image
            .map(|image| ImageAttachment::new(image.content_type(), image.bytes().to_vec()))
            .into_iter()
            .collect();

        LlmRequest::new(self.model.as_str(), messages).with_images(images)
    }
}

impl AdvisorBackend for LlmAdvisor {
    /// Never fails: provider errors are logged and turned into a readable apology.
    async fn query(&self, prompt: &str, image: Option<&ImagePayload>) -> Result<String> {
        let request = self.build_request(prompt, image);

        match self.llm.execute(request).await {
            Ok(response) => {
                info!(
                    provider = %response.provider,
                    model = %response.model,
                    prompt_tokens = response.token_usage.prompt_tokens,
                    response_tokens = response.token_usage.response_tokens,
                    total_tokens = response.token_usage.total_tokens,
                    "advisor response received"
                );
                Ok(response.text)
            }
            Err(err) => {
                error!(?err, model = %self.model, "advisor LLM call failed");
                Ok(SERVICE_ERROR_MESSAGE.to_string())
            }
        }
    }
}
