//! Batched, bounded-concurrency embedding dispatch.
//!
//! Texts are looked up in the cache, the misses are split into provider-sized
//! batches, and at most `concurrency` batches are in flight at once. Results
//! land in the slot of their input, so output order never depends on which
//! request finished first. The first failing batch (in input order) aborts the
//! call and no further waves are started.

use std::collections::HashMap;

use chatmine_core::config::MAX_EMBEDDING_INPUT_CHARS;
use chatmine_core::{
    EmbeddedMessage, EmbeddingConfig, EmbeddingError, ParsedMessage, QueryEmbedding,
    SemanticQuery,
};
use futures::future::join_all;
use tracing::{debug, info};

use crate::cache::EmbeddingCache;
use crate::provider::EmbeddingProvider;

pub struct EmbeddingDispatcher<P> {
    provider: P,
    cache: EmbeddingCache,
    batch_size: usize,
    concurrency: usize,
}

impl<P: EmbeddingProvider> EmbeddingDispatcher<P> {
    pub fn new(provider: P, config: &EmbeddingConfig) -> Self {
        Self::with_limits(provider, config.batch_size, config.concurrency)
    }

    /// Batch size is clamped to the provider's limit; both limits are at least 1.
    pub fn with_limits(provider: P, batch_size: usize, concurrency: usize) -> Self {
        let batch_size = batch_size.min(provider.max_batch_size()).max(1);
        Self {
            provider,
            cache: EmbeddingCache::default_cache(),
            batch_size,
            concurrency: concurrency.max(1),
        }
    }

    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed `texts`, one vector per input, in input order.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut slots: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.cache.get(t)).collect();

        // Unique uncached texts, each with every slot it fills
        let mut pending: Vec<String> = Vec::new();
        let mut targets: Vec<Vec<usize>> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (slot, text) in texts.iter().enumerate() {
            if slots[slot].is_some() {
                continue;
            }
            match seen.get(text.as_str()) {
                Some(&p) => targets[p].push(slot),
                None => {
                    seen.insert(text.as_str(), pending.len());
                    pending.push(text.clone());
                    targets.push(vec![slot]);
                }
            }
        }

        let batches: Vec<&[String]> = pending.chunks(self.batch_size).collect();
        debug!(
            "Embedding {} texts with {}: {} cached, {} to fetch in {} batches",
            texts.len(),
            self.provider.model(),
            texts.len() - targets.iter().map(Vec::len).sum::<usize>(),
            pending.len(),
            batches.len()
        );

        for (wave_index, wave) in batches.chunks(self.concurrency).enumerate() {
            let results = join_all(wave.iter().map(|batch| self.provider.embed_batch(batch))).await;

            for (i, result) in results.into_iter().enumerate() {
                let vectors = result?;
                let batch = wave[i];
                if vectors.len() != batch.len() {
                    return Err(EmbeddingError::invalid_response(format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        vectors.len()
                    )));
                }

                let offset = (wave_index * self.concurrency + i) * self.batch_size;
                for (j, vector) in vectors.into_iter().enumerate() {
                    for &slot in &targets[offset + j] {
                        slots[slot] = Some(vector.clone());
                    }
                    self.cache.put(batch[j].clone(), vector);
                }
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EmbeddingError::invalid_response("provider left inputs unembedded"))
    }

    /// Embed every message with real text content.
    ///
    /// Empty messages and media placeholders ("image omitted") are skipped.
    /// Text is truncated to the provider input limit.
    pub async fn embed_messages(
        &self,
        messages: &[ParsedMessage],
    ) -> Result<Vec<EmbeddedMessage>, EmbeddingError> {
        let embeddable: Vec<&ParsedMessage> =
            messages.iter().filter(|m| is_embeddable(&m.content)).collect();
        let texts: Vec<String> = embeddable
            .iter()
            .map(|m| truncate_chars(&m.content, MAX_EMBEDDING_INPUT_CHARS))
            .collect();

        let vectors = self.embed_texts(&texts).await?;
        info!(
            "Embedded {} of {} messages",
            vectors.len(),
            messages.len()
        );

        Ok(embeddable
            .into_iter()
            .zip(vectors)
            .map(|(m, embedding)| EmbeddedMessage {
                message_id: m.id,
                content: m.content.clone(),
                embedding,
            })
            .collect())
    }

    pub async fn embed_queries(
        &self,
        queries: &[SemanticQuery],
    ) -> Result<Vec<QueryEmbedding>, EmbeddingError> {
        let texts: Vec<String> = queries.iter().map(|q| q.text.clone()).collect();
        let vectors = self.embed_texts(&texts).await?;

        Ok(queries
            .iter()
            .zip(vectors)
            .map(|(q, embedding)| QueryEmbedding {
                query: q.text.clone(),
                query_type: q.query_type,
                embedding,
            })
            .collect())
    }
}

fn is_embeddable(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && !trimmed.to_lowercase().contains("omitted")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmine_core::{ChatSource, EmbeddingErrorKind, QueryType};
    use chrono::DateTime;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Embeds each text as `[chars, call_index]`.
    #[derive(Default)]
    struct MockProvider {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        /// Earlier calls sleep longer, so completions arrive in reverse.
        staggered: bool,
        max_batch: Option<usize>,
        short_response: bool,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl EmbeddingProvider for MockProvider {
        fn embed_batch(
            &self,
            texts: &[String],
        ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(texts.to_vec());
            let texts = texts.to_vec();
            let fail = self.fail_on_call == Some(call);
            let staggered = self.staggered;
            let short = self.short_response;
            async move {
                if staggered {
                    let wait = 40u64.saturating_sub(call as u64 * 10);
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                }
                if fail {
                    return Err(EmbeddingError::new(EmbeddingErrorKind::RateLimit, "slow down"));
                }
                let mut out: Vec<Vec<f32>> = texts
                    .iter()
                    .map(|t| vec![t.chars().count() as f32, call as f32])
                    .collect();
                if short {
                    out.pop();
                }
                Ok(out)
            }
        }

        fn max_batch_size(&self) -> usize {
            self.max_batch.unwrap_or(2048)
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let provider = MockProvider {
            staggered: true,
            ..Default::default()
        };
        let dispatcher = EmbeddingDispatcher::with_limits(provider, 1, 4);
        let input = texts(&["a", "bb", "ccc", "dddd"]);

        let vectors = dispatcher.embed_texts(&input).await.unwrap();
        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(dispatcher.provider().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_batch_size_clamped_to_provider_limit() {
        let provider = MockProvider {
            max_batch: Some(2),
            ..Default::default()
        };
        let dispatcher = EmbeddingDispatcher::with_limits(provider, 100, 1);
        assert_eq!(dispatcher.batch_size(), 2);

        dispatcher
            .embed_texts(&texts(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();
        let seen = dispatcher.provider().seen.lock().unwrap().clone();
        let sizes: Vec<usize> = seen.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_first_error_stops_further_waves() {
        let provider = MockProvider {
            fail_on_call: Some(0),
            ..Default::default()
        };
        let dispatcher = EmbeddingDispatcher::with_limits(provider, 1, 2);

        let err = dispatcher
            .embed_texts(&texts(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, EmbeddingErrorKind::RateLimit);
        // Only the first wave of two batches was sent
        assert_eq!(dispatcher.provider().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_invalid_response() {
        let provider = MockProvider {
            short_response: true,
            ..Default::default()
        };
        let dispatcher = EmbeddingDispatcher::with_limits(provider, 10, 1);
        let err = dispatcher
            .embed_texts(&texts(&["a", "b"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, EmbeddingErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_cache_and_duplicates() {
        let dispatcher = EmbeddingDispatcher::with_limits(MockProvider::default(), 10, 1);

        let first = dispatcher
            .embed_texts(&texts(&["ok", "ok", "lets go"]))
            .await
            .unwrap();
        assert_eq!(first[0], first[1]);
        // Duplicates are sent once
        assert_eq!(dispatcher.provider().seen.lock().unwrap()[0].len(), 2);

        let second = dispatcher.embed_texts(&texts(&["lets go"])).await.unwrap();
        assert_eq!(second[0], first[2]);
        assert_eq!(dispatcher.provider().calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_embed_messages_skips_placeholders() {
        let message = |id: u64, content: &str| ParsedMessage {
            id,
            sender: "Alex".into(),
            content: content.into(),
            timestamp: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
            urls: Vec::new(),
            source: ChatSource::WhatsApp,
        };
        let long = "x".repeat(MAX_EMBEDDING_INPUT_CHARS + 50);
        let messages = vec![
            message(1, "we should go camping"),
            message(2, "   "),
            message(3, "image omitted"),
            message(4, &long),
        ];
        let dispatcher = EmbeddingDispatcher::with_limits(MockProvider::default(), 10, 1);

        let embedded = dispatcher.embed_messages(&messages).await.unwrap();
        let ids: Vec<u64> = embedded.iter().map(|e| e.message_id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(embedded[1].embedding[0], MAX_EMBEDDING_INPUT_CHARS as f32);
        assert_eq!(embedded[1].content.len(), long.len());
    }

    #[tokio::test]
    async fn test_embed_queries_keeps_types() {
        let dispatcher = EmbeddingDispatcher::with_limits(MockProvider::default(), 10, 1);
        let queries = vec![
            SemanticQuery::new("let's go", QueryType::Suggestion),
            SemanticQuery::new("count me in", QueryType::Agreement),
        ];
        let embedded = dispatcher.embed_queries(&queries).await.unwrap();
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[1].query, "count me in");
        assert_eq!(embedded[1].query_type, QueryType::Agreement);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
