//! Model backend selection from configuration.

use crate::config::{BackendKind, Config};
use crate::error::Result;
use eltariff_domain::ModelBackend;
use eltariff_llm::{anthropic, ollama, AnthropicBackend, OllamaBackend};
use std::sync::Arc;
use tracing::debug;

/// Build the configured backend.
///
/// The HTTP client timeout matches the extractor's call timeout so the
/// extractor, not the client, decides when a call has taken too long.
pub fn build_backend(config: &Config) -> Result<Arc<dyn ModelBackend>> {
    let settings = &config.backend;
    let timeout = config.extractor.call_timeout();
    let backend: Arc<dyn ModelBackend> = match settings.kind {
        BackendKind::Anthropic => {
            let model = settings.model.as_deref().unwrap_or(anthropic::DEFAULT_MODEL);
            debug!(model, "Using Anthropic backend");
            let mut backend = AnthropicBackend::from_secret(Config::api_key()?)
                .with_model(model)
                .with_timeout(timeout);
            if let Some(endpoint) = &settings.endpoint {
                backend = backend.with_endpoint(endpoint);
            }
            Arc::new(backend)
        }
        BackendKind::Ollama => {
            let model = settings.model.as_deref().unwrap_or(ollama::DEFAULT_MODEL);
            let endpoint = settings.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
            debug!(model, endpoint, "Using Ollama backend");
            Arc::new(OllamaBackend::new(endpoint, model).with_timeout(timeout))
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSettings;

    #[test]
    fn test_ollama_needs_no_key() {
        let config = Config {
            backend: BackendSettings {
                kind: BackendKind::Ollama,
                model: Some("llama3.1".to_string()),
                endpoint: None,
            },
            ..Config::default()
        };
        let backend = build_backend(&config).unwrap();
        assert_eq!(backend.name(), "ollama");
    }
}
