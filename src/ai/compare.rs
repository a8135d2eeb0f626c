use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use log::{info, warn};
use serde::{Serialize, Deserialize};

use super::{AiInsight, InsightProvider, InsightRequest};

/// One provider's answer in a side-by-side comparison.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderComparison {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<AiInsight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Ask every provider at once and collect one result each, in input order.
pub async fn compare(
    providers: &[Arc<dyn InsightProvider>],
    request: &InsightRequest,
) -> Vec<ProviderComparison> {
    info!("🔀 Comparing {} AI providers", providers.len());

    let calls = providers.iter().map(|provider| async move {
        let started = Instant::now();
        let result = provider.generate(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(insight) => ProviderComparison {
                provider: provider.name().to_string(),
                model: provider.model().to_string(),
                insight: Some(insight),
                error: None,
                elapsed_ms,
            },
            Err(e) => {
                warn!("AI provider {} failed during comparison: {}", provider.name(), e);
                ProviderComparison {
                    provider: provider.name().to_string(),
                    model: provider.model().to_string(),
                    insight: None,
                    error: Some(e.to_string()),
                    elapsed_ms,
                }
            }
        }
    });

    join_all(calls).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::tests::{sample_request, StaticProvider};

    #[tokio::test]
    async fn one_result_per_provider_even_on_failure() {
        let providers: Vec<Arc<dyn InsightProvider>> = vec![
            Arc::new(StaticProvider { name: "openai", fail: false }),
            Arc::new(StaticProvider { name: "anthropic", fail: true }),
        ];

        let results = compare(&providers, &sample_request()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].provider, "openai");
        assert!(results[0].insight.is_some());
        assert!(results[0].error.is_none());
        assert_eq!(results[1].provider, "anthropic");
        assert!(results[1].insight.is_none());
        assert!(results[1].error.as_deref().unwrap_or_default().contains("500"));
    }

    #[tokio::test]
    async fn no_providers_gives_no_results() {
        assert!(compare(&[], &sample_request()).await.is_empty());
    }
}
