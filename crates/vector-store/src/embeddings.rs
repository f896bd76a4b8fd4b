use crate::error::{EmbedError, ProviderError};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Opaque producer of fixed-length vectors for text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier stored in snapshots; changing it invalidates them
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input, same order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Exponential backoff with jitter for transient provider failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per batch, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay randomly added or removed, in [0, 1]
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        // NaN or infinite jitter from config disables jitter
        let jitter = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if jitter == 0.0 || backoff.is_zero() {
            return backoff;
        }
        let factor = 1.0 + rand::rng().random_range(-jitter..=jitter);
        backoff.mul_f64(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingClientConfig {
    pub max_batch_size: usize,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            concurrency: 4,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Batches, retries and validates calls to an [`EmbeddingProvider`].
///
/// Callers receive either one vector per input or an error, never a partial
/// result.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingClientConfig,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            config: EmbeddingClientConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EmbeddingClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    #[must_use]
    pub const fn config(&self) -> &EmbeddingClientConfig {
        &self.config
    }

    /// Embed `texts` in batches issued concurrently, reassembled in input order
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = self.config.max_batch_size.max(1);
        let batches = texts.len().div_ceil(batch_size);
        log::debug!(
            "Embedding {} texts in {batches} batches with {}",
            texts.len(),
            self.model_id()
        );

        let results: Vec<Vec<Vec<f32>>> = futures::stream::iter(texts.chunks(batch_size).enumerate())
            .map(|(batch_idx, batch)| self.embed_batch(batch_idx, batch))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        Ok(results.into_iter().flatten().collect())
    }

    /// Embed a single text
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::InvalidResponse("no vector returned".to_string()))
    }

    async fn embed_batch(
        &self,
        batch_idx: usize,
        batch: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome =
                match tokio::time::timeout(self.config.request_timeout, self.provider.embed(batch))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Transient(format!(
                        "request timed out after {:?}",
                        self.config.request_timeout
                    ))),
                };

            match outcome {
                Ok(vectors) => return self.validate(batch.len(), vectors),
                Err(ProviderError::Fatal(reason)) => return Err(EmbedError::Rejected(reason)),
                Err(ProviderError::Transient(reason)) => {
                    if attempt >= max_attempts {
                        log::warn!(
                            "Embedding batch {batch_idx} failed after {attempt} attempts: {reason}"
                        );
                        return Err(EmbedError::ProviderUnavailable {
                            attempts: attempt,
                            last_error: reason,
                        });
                    }
                    let delay = self.retry.delay(attempt);
                    log::warn!(
                        "Embedding batch {batch_idx} attempt {attempt}/{max_attempts} failed: {reason}; retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn validate(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>, EmbedError> {
        if vectors.len() != expected {
            return Err(EmbedError::InvalidResponse(format!(
                "expected {expected} vectors, got {}",
                vectors.len()
            )));
        }
        let dimension = self.dimension();
        for (idx, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(EmbedError::InvalidResponse(format!(
                    "vector {idx} has dimension {}, expected {dimension}",
                    vector.len()
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(EmbedError::InvalidResponse(format!(
                    "vector {idx} contains non-finite values"
                )));
            }
        }
        Ok(vectors)
    }
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("model_id", &self.model_id())
            .field("dimension", &self.dimension())
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider whose first calls follow a script; afterwards it echoes text lengths
    struct ScriptedProvider {
        dimension: usize,
        script: Mutex<VecDeque<Result<(), ProviderError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn new(dimension: usize, script: Vec<Result<(), ProviderError>>) -> Self {
            Self {
                dimension,
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                delay: None,
                batch_sizes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        fn model_id(&self) -> &str {
            "scripted"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let step = self.script.lock().unwrap().pop_front();
            if let Some(Err(err)) = step {
                return Err(err);
            }
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; self.dimension];
                    v[0] = t.len() as f32;
                    v
                })
                .collect())
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: 0.0,
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| "x".repeat(i + 1)).collect()
    }

    #[tokio::test]
    async fn test_batches_keep_input_order() {
        let provider = Arc::new(ScriptedProvider::new(2, Vec::new()));
        let client = EmbeddingClient::new(provider.clone()).with_config(EmbeddingClientConfig {
            max_batch_size: 3,
            concurrency: 4,
            request_timeout: Duration::from_secs(5),
        });

        let vectors = client.embed(&texts(10)).await.unwrap();
        let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(firsts, (1..=10).map(|i| i as f32).collect::<Vec<_>>());

        let mut sizes = provider.batch_sizes.lock().unwrap().clone();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 3, 3, 3]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let provider = Arc::new(ScriptedProvider::new(2, Vec::new()));
        let client = EmbeddingClient::new(provider.clone());
        assert!(client.embed(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            2,
            vec![
                Err(ProviderError::Transient("429".into())),
                Err(ProviderError::Transient("503".into())),
            ],
        ));
        let client = EmbeddingClient::new(provider.clone()).with_retry_policy(fast_retry(3));

        let vector = client.embed_one("hello").await.unwrap();
        assert_eq!(vector, vec![5.0, 0.0]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_reports_unavailable() {
        let script = (0..5)
            .map(|_| Err(ProviderError::Transient("connection refused".into())))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(2, script));
        let client = EmbeddingClient::new(provider.clone()).with_retry_policy(fast_retry(3));

        let err = client.embed(&texts(2)).await.unwrap_err();
        assert_eq!(
            err,
            EmbedError::ProviderUnavailable {
                attempts: 3,
                last_error: "connection refused".to_string(),
            }
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            2,
            vec![Err(ProviderError::Fatal("invalid api key".into()))],
        ));
        let client = EmbeddingClient::new(provider.clone()).with_retry_policy(fast_retry(5));

        let err = client.embed(&texts(1)).await.unwrap_err();
        assert_eq!(err, EmbedError::Rejected("invalid api key".to_string()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_transient() {
        let mut provider = ScriptedProvider::new(2, Vec::new());
        provider.delay = Some(Duration::from_secs(60));
        let provider = Arc::new(provider);
        let client = EmbeddingClient::new(provider.clone())
            .with_config(EmbeddingClientConfig {
                request_timeout: Duration::from_secs(1),
                ..EmbeddingClientConfig::default()
            })
            .with_retry_policy(fast_retry(2));

        let err = client.embed(&texts(1)).await.unwrap_err();
        assert!(matches!(err, EmbedError::ProviderUnavailable { attempts: 2, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    struct WrongShapeProvider {
        drop_one: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for WrongShapeProvider {
        fn model_id(&self) -> &str {
            "wrong"
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            if self.drop_one {
                Ok(vec![vec![0.0; 4]; texts.len().saturating_sub(1)])
            } else {
                Ok(vec![vec![0.0; 3]; texts.len()])
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_responses_are_rejected() {
        let client = EmbeddingClient::new(Arc::new(WrongShapeProvider { drop_one: true }));
        assert!(matches!(
            client.embed(&texts(3)).await,
            Err(EmbedError::InvalidResponse(_))
        ));

        let client = EmbeddingClient::new(Arc::new(WrongShapeProvider { drop_one: false }));
        assert!(matches!(
            client.embed_one("q").await,
            Err(EmbedError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            jitter: 0.0,
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_millis(1000));
        assert_eq!(policy.delay(40), Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_jitter_stays_in_band() {
        let policy = RetryPolicy {
            jitter: 0.5,
            base_delay: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        for _ in 0..100 {
            let delay = policy.delay(1);
            assert!(delay >= Duration::from_millis(49));
            assert!(delay <= Duration::from_millis(151));
        }
    }

    #[test]
    fn test_non_finite_jitter_falls_back_to_plain_backoff() {
        for jitter in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let policy = RetryPolicy {
                jitter,
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_millis(1000),
                ..RetryPolicy::default()
            };
            assert_eq!(policy.delay(1), Duration::from_millis(100));
            assert_eq!(policy.delay(3), Duration::from_millis(400));
        }
    }
}
