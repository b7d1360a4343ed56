//! OpenAI-compatible `/embeddings` provider.

use std::future::Future;

use chatmine_core::{EmbeddingConfig, EmbeddingError, EmbeddingErrorKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::provider::EmbeddingProvider;

pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build from config. Fails with an auth error when no API key is set.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EmbeddingError::new(
                    EmbeddingErrorKind::Auth,
                    "no API key configured (set apiKey or OPENAI_API_KEY)",
                )
            })?;
        Ok(Self::new(api_key, config.model.clone(), &config.base_url))
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send {
        let expected = texts.len();
        let url = self.endpoint();
        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": texts,
            }));

        async move {
            debug!("POST {} ({} inputs)", url, expected);

            let response = request
                .send()
                .await
                .map_err(|e| EmbeddingError::network(format!("Request failed: {}", e)))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| EmbeddingError::network(format!("Response read error: {}", e)))?;

            if !status.is_success() {
                return Err(EmbeddingError::from_status(status.as_u16(), body));
            }
            parse_embeddings(&body, expected)
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Parse a response body into vectors ordered by input index.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EmbeddingError::invalid_response(format!("unparsable body: {}", e)))?;

    if response.data.len() != expected {
        return Err(EmbeddingError::invalid_response(format!(
            "expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }

    response.data.sort_by_key(|d| d.index);
    if response.data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(EmbeddingError::invalid_response(
            "embedding indices are not a permutation of the inputs",
        ));
    }
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reorders_by_index() {
        let body = r#"{"data":[
            {"object":"embedding","index":1,"embedding":[0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"text-embedding-3-small"}"#;
        let vectors = parse_embeddings(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]}]}"#;
        let err = parse_embeddings(body, 2).unwrap_err();
        assert_eq!(err.kind, EmbeddingErrorKind::InvalidResponse);
    }

    #[test]
    fn test_parse_duplicate_index() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#;
        assert!(parse_embeddings(body, 2).is_err());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_embeddings("<html>bad gateway</html>", 1).unwrap_err();
        assert_eq!(err.kind, EmbeddingErrorKind::InvalidResponse);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = EmbeddingConfig::default();
        let err = OpenAiEmbedder::from_config(&config).err().unwrap();
        assert_eq!(err.kind, EmbeddingErrorKind::Auth);

        let config = EmbeddingConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://localhost:8080/v1/".into(),
            ..Default::default()
        };
        let embedder = OpenAiEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.endpoint(), "http://localhost:8080/v1/embeddings");
        assert_eq!(embedder.model(), "text-embedding-3-small");
    }
}
