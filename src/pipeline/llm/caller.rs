use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::adapters::{default_adapters, ProviderAdapter};
use super::transport::{HttpTransport, ReqwestTransport};
use super::types::{CallOptions, ChatMessage, ResolvedModel};
use super::LlmError;
use crate::config::MODEL_CALL_TIMEOUT_SECS;
use crate::models::Provider;

/// Provider-agnostic prompt → completion text. Requests are routed to the
/// adapter registered for the model's provider.
pub struct ModelCaller {
    transport: Arc<dyn HttpTransport>,
    adapters: HashMap<Provider, Box<dyn ProviderAdapter>>,
    timeout: Duration,
}

impl ModelCaller {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_registry(transport, default_adapters())
    }

    /// Caller over exactly `adapters`; a later adapter for the same
    /// provider replaces an earlier one.
    pub fn with_registry(
        transport: Arc<dyn HttpTransport>,
        adapters: impl IntoIterator<Item = Box<dyn ProviderAdapter>>,
    ) -> Self {
        Self {
            transport,
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.provider(), adapter))
                .collect(),
            timeout: Duration::from_secs(MODEL_CALL_TIMEOUT_SECS),
        }
    }

    /// Caller over the real HTTP transport and public endpoints.
    pub fn with_default_transport() -> Self {
        Self::new(Arc::new(ReqwestTransport::default()))
    }

    /// Register `adapter`, replacing any adapter for the same provider.
    pub fn with_adapter(mut self, adapter: Box<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn call(
        &self,
        model: &ResolvedModel,
        messages: &[ChatMessage],
        options: CallOptions,
    ) -> Result<String, LlmError> {
        let adapter = self
            .adapters
            .get(&model.provider)
            .ok_or(LlmError::NoAdapter(model.provider))?;
        let max_tokens = options.max_tokens.unwrap_or(model.max_tokens);
        let temperature = options.temperature.unwrap_or(model.temperature);
        let request = adapter.build_request(model, messages, max_tokens, temperature);

        tracing::debug!(
            model = %model.model,
            provider = %model.provider,
            max_tokens,
            temperature,
            "Sending model request"
        );

        let response = tokio::time::timeout(self.timeout, self.transport.post_json(&request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))??;

        if !response.is_success() {
            // Non-JSON error bodies are carried as a plain `error` string.
            let body: Value = serde_json::from_str(&response.body)
                .unwrap_or_else(|_| json!({ "error": response.body }));
            let message = adapter.error_message(response.status, &body);
            tracing::warn!(
                provider = %model.provider,
                status = response.status,
                message = %message,
                "Model request failed"
            );
            return Err(LlmError::ProviderRequest {
                provider: model.provider.display_name(),
                status: response.status,
                message,
            });
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;
        adapter.extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::adapters::{AnthropicAdapter, OpenAiAdapter};
    use crate::pipeline::llm::transport::MockTransport;
    use crate::pipeline::llm::types::{HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(provider: Provider, max_tokens: u32, temperature: f64) -> ResolvedModel {
        ResolvedModel {
            model: "test-model".into(),
            provider,
            api_key: SecretString::from("sk-test-0123456789".to_string()),
            max_tokens,
            temperature,
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("usr")]
    }

    #[tokio::test]
    async fn openai_completion_text() {
        let mock = Arc::new(MockTransport::new().with_response(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"hello there"}}]}"#,
        ));
        let caller = ModelCaller::new(mock.clone());
        let text = caller
            .call(&model(Provider::OpenAi, 4096, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "hello there");

        let sent = &mock.requests()[0];
        assert_eq!(sent.body["max_tokens"], 4096);
    }

    #[tokio::test]
    async fn options_override_model_defaults() {
        let mock = Arc::new(
            MockTransport::new().with_response(200, r#"{"content":[{"text":"ok"}]}"#),
        );
        let caller = ModelCaller::new(mock.clone());
        caller
            .call(
                &model(Provider::Anthropic, 8192, 0.7),
                &messages(),
                CallOptions::new(0.0, 50),
            )
            .await
            .unwrap();
        let sent = &mock.requests()[0];
        assert_eq!(sent.body["max_tokens"], 50);
        assert_eq!(sent.body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn error_status_carries_provider_message() {
        let mock = Arc::new(MockTransport::new().with_response(
            401,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        ));
        let err = ModelCaller::new(mock)
            .call(&model(Provider::OpenAi, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect API key provided");
        assert!(matches!(err, LlmError::ProviderRequest { status: 401, .. }));
    }

    #[tokio::test]
    async fn non_json_error_body_used_as_message() {
        let mock = Arc::new(MockTransport::new().with_response(503, "upstream unavailable"));
        let err = ModelCaller::new(mock)
            .call(&model(Provider::Anthropic, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream unavailable");
    }

    #[tokio::test]
    async fn generic_message_without_error_body() {
        let mock = Arc::new(MockTransport::new().with_response(500, "{}"));
        let err = ModelCaller::new(mock)
            .call(&model(Provider::OpenAi, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API request failed with status 500");
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mock = Arc::new(
            MockTransport::new().with_error(LlmError::Transport("connection refused".into())),
        );
        let err = ModelCaller::new(mock)
            .call(&model(Provider::OpenAi, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[tokio::test]
    async fn invalid_success_body_is_parse_error() {
        let mock = Arc::new(MockTransport::new().with_response(200, "not json"));
        let err = ModelCaller::new(mock)
            .call(&model(Provider::OpenAi, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ResponseParsing(_)));
    }

    struct HangingTransport;

    #[async_trait]
    impl HttpTransport for HangingTransport {
        async fn post_json(&self, _request: &HttpRequest) -> Result<HttpResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(LlmError::Transport("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn hung_call_times_out() {
        let caller =
            ModelCaller::new(Arc::new(HangingTransport)).with_timeout(Duration::from_millis(20));
        let err = caller
            .call(&model(Provider::OpenAi, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn anthropic_round_trip_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"content":[{"type":"text","text":"{\"styleName\":\"bottts\"}"}]}"#),
            )
            .mount(&server)
            .await;

        let caller = ModelCaller::with_default_transport().with_adapter(Box::new(
            AnthropicAdapter::new(format!("{}/v1/messages", server.uri())),
        ));
        let text = caller
            .call(&model(Provider::Anthropic, 50, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap();
        assert_eq!(text, r#"{"styleName":"bottts"}"#);
    }

    #[tokio::test]
    async fn unregistered_provider_is_an_error() {
        let mock = Arc::new(MockTransport::new().with_response(200, "{}"));
        let caller = ModelCaller::with_registry(
            mock.clone(),
            vec![Box::new(OpenAiAdapter::default()) as Box<dyn ProviderAdapter>],
        );
        let err = caller
            .call(&model(Provider::Anthropic, 100, 0.5), &messages(), CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NoAdapter(Provider::Anthropic)));
        assert_eq!(mock.call_count(), 0);
    }
}
