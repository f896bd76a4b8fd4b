use crate::error::Result;
use docqa_vector_store::{EmbeddingClient, IndexError, IndexHandle, QueryResult};
use std::sync::Arc;

/// Embeds a query and searches the index snapshot published at call time
#[derive(Debug, Clone)]
pub struct Retriever {
    handle: Arc<IndexHandle>,
    client: EmbeddingClient,
}

impl Retriever {
    #[must_use]
    pub const fn new(handle: Arc<IndexHandle>, client: EmbeddingClient) -> Self {
        Self { handle, client }
    }

    #[must_use]
    pub fn handle(&self) -> &Arc<IndexHandle> {
        &self.handle
    }

    /// Top `k` chunks for `query`, best first.
    ///
    /// `k == 0` returns an empty result. An empty index fails with
    /// [`IndexError::EmptyIndex`] before the provider is called.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<QueryResult> {
        if k == 0 {
            return Ok(QueryResult::empty());
        }

        let index = self.handle.snapshot();
        if index.is_empty() {
            return Err(IndexError::EmptyIndex.into());
        }

        let vector = self.client.embed_one(query).await?;
        let result = index.search(&vector, k)?;
        log::debug!(
            "Retrieved {} of {} chunks for query ({} chars), top score {:?}",
            result.len(),
            index.len(),
            query.chars().count(),
            result.top_score()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use async_trait::async_trait;
    use docqa_chunker::Chunker;
    use docqa_vector_store::{
        EmbedError, EmbeddingProvider, IndexSpec, ProviderError, RetryPolicy, VectorIndex,
        VectorRecord,
    };
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps "alpha"/"beta" queries onto the two axes
    struct AxisProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl AxisProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        fn model_id(&self) -> &str {
            "axis"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Fatal("quota exceeded".to_string()));
            }
            Ok(texts
                .iter()
                .map(|t| if t.contains("alpha") { vec![1.0, 0.1] } else { vec![0.1, 1.0] })
                .collect())
        }
    }

    fn populated_index() -> VectorIndex {
        let chunks = Chunker::default()
            .chunk_str("# Alpha\n\nFirst.\n\n# Beta\n\nSecond.\n", "docs/guide.md")
            .unwrap();
        let mut index = VectorIndex::new(IndexSpec::new("axis", 2));
        index
            .add(vec![
                VectorRecord::new(chunks[0].clone(), vec![1.0, 0.0]),
                VectorRecord::new(chunks[1].clone(), vec![0.0, 1.0]),
            ])
            .unwrap();
        index
    }

    fn retriever(index: VectorIndex, provider: Arc<AxisProvider>) -> Retriever {
        let client = EmbeddingClient::new(provider).with_retry_policy(RetryPolicy::none());
        Retriever::new(Arc::new(IndexHandle::new(index)), client)
    }

    #[tokio::test]
    async fn retrieves_best_match_first() {
        let provider = AxisProvider::new(false);
        let retriever = retriever(populated_index(), provider.clone());

        let result = retriever.retrieve("tell me about beta", 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].chunk.header_context, vec!["Beta"]);
        assert!(result.hits[0].score > result.hits[1].score);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_k_and_empty_index_skip_the_provider() {
        let provider = AxisProvider::new(false);
        let retriever_full = retriever(populated_index(), provider.clone());
        assert!(retriever_full.retrieve("alpha", 0).await.unwrap().is_empty());

        let retriever_empty = retriever(VectorIndex::new(IndexSpec::new("axis", 2)), provider.clone());
        let err = retriever_empty.retrieve("alpha", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Index(IndexError::EmptyIndex)));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_an_error_not_an_empty_result() {
        let retriever = retriever(populated_index(), AxisProvider::new(true));
        let err = retriever.retrieve("alpha", 1).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Embed(EmbedError::Rejected(ref msg)) if msg == "quota exceeded"
        ));
    }

    #[tokio::test]
    async fn queries_see_the_latest_published_index() {
        let provider = AxisProvider::new(false);
        let retriever = retriever(VectorIndex::new(IndexSpec::new("axis", 2)), provider);
        assert!(retriever.retrieve("alpha", 1).await.is_err());

        retriever.handle().replace(populated_index());
        let result = retriever.retrieve("alpha", 1).await.unwrap();
        assert_eq!(result.hits[0].chunk.header_context, vec!["Alpha"]);
    }
}
