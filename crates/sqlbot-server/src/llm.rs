//! OpenAI chat completions as the pipeline's completion service

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use sqlbot_core::{CompletionError, CompletionRequest, CompletionService};

pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn request_error(e: OpenAIError) -> CompletionError {
    CompletionError::Request(e.to_string())
}

/// Build the chat request for one system + user exchange
fn chat_request(
    model: &str,
    request: CompletionRequest,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = vec![
        ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()?,
        ),
        ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user)
                .build()?,
        ),
    ];

    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .temperature(request.temperature)
        .max_completion_tokens(request.max_tokens)
        .build()
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let chat = chat_request(&self.model, request).map_err(request_error)?;

        let response = self.client.chat().create(chat).await.map_err(request_error)?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(CompletionError::EmptyResponse)?;

        tracing::debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }
}
