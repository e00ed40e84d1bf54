//! Evaluation executor
//!
//! Turns an [`EvaluationRequest`] into exactly one provider call and
//! normalizes the reply into an [`EvaluationResult`]:
//!
//! 1. pick the wire dialect (unknown providers fail before any I/O)
//! 2. substitute the default model, overlay default hyperparameters
//! 3. build the payload (or take the caller's override verbatim)
//! 4. send it through the [`Transport`]
//! 5. map non-2xx replies to [`LlmError::ProviderCall`], otherwise parse text,
//!    structured content and token usage
//!
//! Nothing is retried here.

use std::sync::Arc;
use std::time::Instant;

use secrecy::ExposeSecret;
use serde_json::Value;

use crate::config::EvaluatorConfig;
use crate::error::{LlmError, extract_provider_message};
use crate::hyperparams::resolve;
use crate::transport::{HttpCall, ReqwestTransport, Transport};
use crate::types::{
    Dialect, EvaluationRequest, EvaluationResult, ParamMap, PayloadPreview, ProviderId,
};

/// Shared, cheaply cloneable evaluation client
#[derive(Clone)]
pub struct Evaluator {
    config: Arc<EvaluatorConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Everything needed to send a request, computed without I/O.
struct Prepared {
    dialect: Dialect,
    model: String,
    url: String,
    payload: Value,
    hyperparams: ParamMap,
}

impl Evaluator {
    /// Evaluator over a `reqwest` transport built from `config`.
    pub fn new(config: EvaluatorConfig) -> Result<Self, LlmError> {
        let transport =
            ReqwestTransport::new(config.http_timeout, config.user_agent.as_deref())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: EvaluatorConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Send the request and normalize the reply.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, LlmError> {
        let prepared = self.prepare(request)?;
        if request.credential.expose_secret().trim().is_empty() {
            return Err(LlmError::Configuration(format!(
                "Missing API Key for {}",
                request.provider
            )));
        }
        let headers = prepared.dialect.headers(&request.credential)?;
        let family = resolve(&request.provider, Some(&prepared.model)).family;

        let call = HttpCall {
            provider: request.provider.to_string(),
            url: prepared.url,
            headers,
            body: prepared.payload,
        };

        let started = Instant::now();
        let reply = self.transport.call(&call).await.map_err(|e| {
            tracing::warn!(target: "redguard::evaluator", provider=%request.provider, model=%prepared.model, err=%e, "provider unreachable");
            match e {
                e @ LlmError::ProviderCall { .. } => e,
                other => LlmError::provider_call(None, other.to_string()),
            }
        })?;
        let latency = started.elapsed();

        let body = serde_json::from_str::<Value>(&reply.body);

        if !reply.is_success() {
            let body = body.unwrap_or_else(|_| Value::String(reply.body.clone()));
            let message = extract_provider_message(&body);
            tracing::warn!(
                target: "redguard::evaluator",
                provider=%request.provider,
                model=%prepared.model,
                status=reply.status,
                latency_ms=latency.as_millis() as u64,
                "provider returned an error: {message}"
            );
            return Err(LlmError::ProviderCall {
                status: Some(reply.status),
                message,
                body: Some(body),
            });
        }

        let body = body.map_err(|e| {
            LlmError::malformed(format!("response body is not JSON: {e}"), reply.body.clone())
        });
        let reply = body
            .and_then(|body| prepared.dialect.parse_reply(&body).map(|r| (body, r)))
            .inspect_err(|e| {
                tracing::warn!(target: "redguard::evaluator", provider=%request.provider, model=%prepared.model, err=%e, "could not decode reply");
            });
        let (raw_response, parsed) = reply?;

        tracing::info!(
            target: "redguard::evaluator",
            provider=%request.provider,
            model=%prepared.model,
            family,
            tokens=?parsed.usage.map(|u| u.total_tokens),
            latency_ms=latency.as_millis() as u64,
            "evaluation completed"
        );

        Ok(EvaluationResult {
            provider: request.provider.clone(),
            model: prepared.model,
            parsed: parsed.parsed,
            raw_text: parsed.raw_text,
            usage: parsed.usage,
            latency,
            request_payload: call.body,
            raw_response,
            hyperparams: prepared.hyperparams,
        })
    }

    /// The payload `evaluate` would send, without sending it.
    pub fn preview(&self, request: &EvaluationRequest) -> Result<PayloadPreview, LlmError> {
        let prepared = self.prepare(request)?;
        Ok(PayloadPreview {
            provider: request.provider.clone(),
            model: prepared.model,
            url: prepared.url,
            payload: prepared.payload,
            prompt: request.prompt.clone(),
        })
    }

    fn prepare(&self, request: &EvaluationRequest) -> Result<Prepared, LlmError> {
        let dialect = Dialect::for_provider(&request.provider)?;
        let model = match request.model_hint() {
            Some(model) => model.to_string(),
            None => self.required(&request.provider, self.config.default_model(&request.provider))?,
        };
        let base_url = self.required(&request.provider, self.config.base_url(&request.provider))?;
        let url = dialect.endpoint(&base_url, &model);

        let (payload, hyperparams) = match &request.override_payload {
            Some(payload) => {
                let recovered = dialect.params_from_payload(payload);
                (
                    payload.clone(),
                    self.config.default_hyperparams.overlay(&recovered),
                )
            }
            None => {
                let hyperparams = self.config.default_hyperparams.overlay(&request.params);
                (
                    dialect.build_payload(&model, &request.prompt, &hyperparams),
                    hyperparams,
                )
            }
        };

        tracing::debug!(
            target: "redguard::evaluator",
            provider=%request.provider,
            model=%model,
            url=%url,
            overridden=request.override_payload.is_some(),
            "payload prepared"
        );

        Ok(Prepared {
            dialect,
            model,
            url,
            payload,
            hyperparams,
        })
    }

    fn required(&self, provider: &ProviderId, value: Option<&str>) -> Result<String, LlmError> {
        value
            .map(str::to_string)
            .ok_or_else(|| LlmError::UnsupportedProvider(provider.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpReply;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    /// Answers every call with a fixed reply and records what was sent.
    struct CannedTransport {
        status: u16,
        body: String,
        calls: Mutex<Vec<HttpCall>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn call(&self, call: &HttpCall) -> Result<HttpReply, LlmError> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(HttpReply {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn evaluator(transport: Arc<CannedTransport>) -> Evaluator {
        Evaluator::with_transport(EvaluatorConfig::default(), transport)
    }

    #[tokio::test]
    async fn default_model_and_hyperparams_are_applied() {
        let transport = CannedTransport::new(
            200,
            json!({"choices": [{"message": {"content": "{\"ok\": true}"}}]}),
        );
        let result = evaluator(transport.clone())
            .evaluate(&EvaluationRequest::new("openai", "sk", "p"))
            .await
            .unwrap();

        assert_eq!(result.model, "gpt-4o");
        assert_eq!(result.parsed["ok"], true);
        assert_eq!(result.usage, None);
        assert_eq!(result.request_payload["max_tokens"], json!(4096));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn override_payload_is_sent_verbatim() {
        let transport = CannedTransport::new(
            200,
            json!({"content": [{"type": "text", "text": "{}"}]}),
        );
        let payload = json!({"model": "claude-x", "max_tokens": 10, "temperature": 0.9, "messages": []});
        let request = EvaluationRequest::new("anthropic", "k", "ignored")
            .with_override_payload(payload.clone());
        let result = evaluator(transport.clone()).evaluate(&request).await.unwrap();

        assert_eq!(transport.calls.lock().unwrap()[0].body, payload);
        assert_eq!(result.hyperparams["temperature"].as_f64(), Some(0.9));
        assert_eq!(result.hyperparams["max_tokens"].as_f64(), Some(10.0));
        assert_eq!(result.hyperparams["top_p"].as_f64(), Some(1.0));
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_as_text() {
        let transport = Arc::new(CannedTransport {
            status: 502,
            body: "Bad Gateway".into(),
            calls: Mutex::new(Vec::new()),
        });
        let err = evaluator(transport)
            .evaluate(&EvaluationRequest::new("qwen", "k", "p"))
            .await
            .unwrap_err();
        match err {
            LlmError::ProviderCall {
                status, message, ..
            } => {
                assert_eq!(status, Some(502));
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Fails every call with a non-HTTP error.
    struct BrokenTransport;

    #[async_trait]
    impl Transport for BrokenTransport {
        async fn call(&self, _call: &HttpCall) -> Result<HttpReply, LlmError> {
            Err(LlmError::Http("connection reset by peer".into()))
        }
    }

    #[tokio::test]
    async fn transport_errors_surface_as_provider_call() {
        let evaluator = Evaluator::with_transport(EvaluatorConfig::default(), Arc::new(BrokenTransport));
        let err = evaluator
            .evaluate(&EvaluationRequest::new("openai", "k", "p"))
            .await
            .unwrap_err();
        match err {
            LlmError::ProviderCall { status, message, .. } => {
                assert_eq!(status, None);
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_credential_fails_before_sending() {
        let transport = CannedTransport::new(200, json!({}));
        for credential in ["", "   "] {
            let err = evaluator(transport.clone())
                .evaluate(&EvaluationRequest::new("anthropic", credential, "p"))
                .await
                .unwrap_err();
            assert!(matches!(err, LlmError::Configuration(ref msg) if msg == "Missing API Key for anthropic"));
        }
        assert!(transport.calls.lock().unwrap().is_empty());

        // previews need no key
        assert!(
            evaluator(transport)
                .preview(&EvaluationRequest::new("anthropic", "", "p"))
                .is_ok()
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn credentials_never_reach_the_logs() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const SECRET: &str = "AIza-super-secret-credential";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"message": "API key not valid"}
            })))
            .mount(&server)
            .await;

        let config = EvaluatorConfig::builder()
            .base_url("gemini", server.uri())
            .build()
            .unwrap();
        let evaluator = Evaluator::new(config).unwrap();
        let request = EvaluationRequest::new("gemini", SECRET, "p");

        evaluator.evaluate(&request).await.unwrap();
        evaluator.evaluate(&request).await.unwrap_err();

        assert!(logs_contain("evaluation completed"));
        assert!(logs_contain("provider returned an error"));
        assert!(logs_contain("response received"));
        assert!(!logs_contain(SECRET));
    }

    #[test]
    fn preview_builds_without_io() {
        let transport = CannedTransport::new(200, json!({}));
        let preview = evaluator(transport.clone())
            .preview(&EvaluationRequest::new("gemini", "k", "rate").with_model("gemini-2.5-flash"))
            .unwrap();
        assert!(preview.url.ends_with("/models/gemini-2.5-flash:generateContent"));
        assert_eq!(preview.payload["generationConfig"]["maxOutputTokens"], json!(4096));
        assert_eq!(preview.prompt, "rate");
        assert!(transport.calls.lock().unwrap().is_empty());
    }
}
