//! Per-image product analysis pipeline.
//!
//! Each image goes through one vision call, label extraction and, when the
//! answer names a product but lacks sizes or weight, one enrichment call.
//! Provider failures never fail the request: the image gets the fixed
//! placeholder list with a note describing what went wrong.

use crate::config::{AnalysisConfig, AnalysisLayout};
use crate::models::{ImageAnalysis, UploadedImage};
use crate::services::enrichment::{
    apply_enrichment, enrichment_request, needs_enrichment, parse_enrichment,
};
use crate::services::extraction::{parse_spec, placeholder, render_spec};
use crate::services::metrics;
use crate::services::prompts;
use crate::services::providers::{complete_within, ChatProvider, ChatRequest, ProviderError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

const ANALYSIS_TEMPERATURE: f32 = 0.15;
const ANALYSIS_MAX_TOKENS: u32 = 320;

#[derive(Clone)]
pub struct ProductAnalyzer {
    provider: Arc<dyn ChatProvider>,
    layout: AnalysisLayout,
    timeout: Duration,
    concurrency: usize,
}

impl ProductAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            layout: config.layout,
            timeout: config.timeout(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Analyze images in upload order, `concurrency` at a time. The output
    /// has one entry per image, in the same order.
    pub async fn analyze_batch(&self, images: &[UploadedImage]) -> Vec<ImageAnalysis> {
        let mut results = Vec::with_capacity(images.len());

        for (chunk_index, chunk) in images.chunks(self.concurrency).enumerate() {
            let offset = chunk_index * self.concurrency;
            let partial = join_all(
                chunk
                    .iter()
                    .enumerate()
                    .map(|(j, image)| self.analyze_one(image, offset + j)),
            )
            .await;
            results.extend(partial);
        }

        results
    }

    /// Analyze the image at 0-based `index`.
    pub async fn analyze_one(&self, image: &UploadedImage, index: usize) -> ImageAnalysis {
        let image_index = index + 1;

        let analysis = match self.try_analyze(image).await {
            Ok(text) => {
                metrics::record_image_analyzed("ok");
                text
            }
            Err(e) => {
                let note = e.human_message(self.provider.name());
                tracing::warn!(
                    image_index,
                    mime_type = %image.mime_type,
                    error = %e,
                    "Image analysis failed, returning placeholder"
                );
                metrics::record_image_analyzed("placeholder");
                placeholder(&note, self.layout)
            }
        };

        ImageAnalysis {
            image_index,
            analysis,
        }
    }

    async fn try_analyze(&self, image: &UploadedImage) -> Result<String, ProviderError> {
        let request = ChatRequest::new(
            prompts::analysis_prompt(self.layout),
            prompts::ANALYSIS_USER_TEXT,
        )
        .with_image(image.data_url())
        .temperature(ANALYSIS_TEMPERATURE)
        .max_tokens(ANALYSIS_MAX_TOKENS);

        let text =
            complete_within(self.provider.as_ref(), &request, self.timeout, "analyze").await?;

        let mut spec = parse_spec(&text);
        if !needs_enrichment(&spec) {
            return Ok(text);
        }

        let missing_size = spec.missing_size();
        let missing_weight = spec.missing_weight();
        tracing::debug!(
            product = spec.product.as_deref().unwrap_or_default(),
            missing_size,
            missing_weight,
            "Requesting enrichment"
        );

        let raw = complete_within(
            self.provider.as_ref(),
            &enrichment_request(&spec),
            self.timeout,
            "enrich",
        )
        .await
        .inspect_err(|_| metrics::record_enrichment("failed"))?;

        match parse_enrichment(&raw) {
            Some(enriched) => {
                apply_enrichment(&mut spec, &enriched, missing_size, missing_weight);
                metrics::record_enrichment("applied");
                Ok(render_spec(&spec, self.layout))
            }
            None => {
                tracing::debug!(reply_len = raw.len(), "Enrichment reply had no JSON object");
                metrics::record_enrichment("unparsed");
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockChatProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COMPLETE_REPLY: &str = "- Produkt/serie: IKEA MALM\n\
        - Serienummer/modell: 802.145.49\n\
        - Längd: 80 cm\n\
        - Bredd: 48 cm\n\
        - Höjd: 100 cm\n\
        - Vikt: 40 kg\n\
        - Osäkerhet/antaganden: —";

    const WEIGHTLESS_REPLY: &str = "- Produkt/serie: IKEA MALM\n\
        - Serienummer/modell: okänd\n\
        - Längd: 80 cm\n\
        - Bredd: 48 cm\n\
        - Höjd: 100 cm\n\
        - Vikt: osäker\n\
        - Osäkerhet/antaganden: Sex lådor.";

    fn analyzer(provider: Arc<dyn ChatProvider>, layout: AnalysisLayout) -> ProductAnalyzer {
        let config = AnalysisConfig {
            timeout_secs: 45,
            concurrency: 2,
            layout,
            max_upload_bytes: 1024,
        };
        ProductAnalyzer::new(provider, &config)
    }

    fn image() -> UploadedImage {
        UploadedImage::new(vec![0xFF, 0xD8, 0xFF], Some("image/jpeg"))
    }

    #[tokio::test]
    async fn complete_reply_is_returned_verbatim() {
        let provider = Arc::new(MockChatProvider::new("OpenAI").push_reply(COMPLETE_REPLY));
        let analyzer = analyzer(provider.clone(), AnalysisLayout::Detailed);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(result.image_index, 1);
        assert_eq!(result.analysis, COMPLETE_REPLY);
        assert_eq!(provider.call_count(), 1);

        let request = &provider.requests()[0];
        assert_eq!(request.image_urls, vec!["data:image/jpeg;base64,/9j/"]);
        assert_eq!(request.max_tokens, Some(320));
    }

    #[tokio::test]
    async fn uncertain_weight_triggers_enrichment_and_rerender() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .push_reply(WEIGHTLESS_REPLY)
                .push_reply(r#"{"langd_cm":"81","bredd_cm":"","hojd_cm":"","vikt_kg":"41","notis":"Vit ek."}"#),
        );
        let analyzer = analyzer(provider.clone(), AnalysisLayout::Detailed);

        let result = analyzer.analyze_one(&image(), 2).await;

        assert_eq!(result.image_index, 3);
        assert_eq!(
            result.analysis,
            "- Produkt/serie: IKEA MALM\n\
             - Serienummer/modell: okänd\n\
             - Längd: 80 cm\n\
             - Bredd: 48 cm\n\
             - Höjd: 100 cm\n\
             - Vikt: 41 kg\n\
             - Osäkerhet/antaganden: Sex lådor. Vit ek."
        );

        let enrichment = &provider.requests()[1];
        assert!(enrichment.image_urls.is_empty());
        assert!(enrichment.user_text.contains("Modell: okänd"));
    }

    #[tokio::test]
    async fn compact_layout_rerenders_five_lines_after_enrichment() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .push_reply(
                    "- Produkt/serie: IKEA MALM\n\
                     - Längd: 80 cm\n\
                     - Bredd: okänd\n\
                     - Höjd: 100 cm\n\
                     - Vikt: osäker",
                )
                .push_reply(r#"{"langd_cm":79.0,"bredd_cm":"48","hojd_cm":"","vikt_kg":41,"notis":"Vit ek."}"#),
        );
        let analyzer = analyzer(provider, AnalysisLayout::Compact);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(
            result.analysis,
            "- Produkt/serie: IKEA MALM\n\
             - Längd: 79 cm\n\
             - Bredd: 48 cm\n\
             - Höjd: 100 cm\n\
             - Vikt: 41 kg"
        );
    }

    #[tokio::test]
    async fn unparseable_enrichment_keeps_first_reply() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .push_reply(WEIGHTLESS_REPLY)
                .push_reply("Jag vet tyvärr inte."),
        );
        let analyzer = analyzer(provider.clone(), AnalysisLayout::Detailed);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(result.analysis, WEIGHTLESS_REPLY);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn anonymous_product_is_not_enriched() {
        let reply = "- Produkt/serie: \n- Längd: osäker";
        let provider = Arc::new(MockChatProvider::new("OpenAI").push_reply(reply));
        let analyzer = analyzer(provider.clone(), AnalysisLayout::Detailed);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(result.analysis, reply);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn timeout_becomes_placeholder() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .with_delay(Duration::from_secs(5))
                .push_reply(COMPLETE_REPLY),
        );
        let mut analyzer = analyzer(provider, AnalysisLayout::Detailed);
        analyzer.timeout = Duration::from_millis(20);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(result.analysis.lines().count(), 7);
        assert!(result
            .analysis
            .ends_with("- Osäkerhet/antaganden: Timeout mot OpenAI."));
    }

    #[tokio::test]
    async fn failed_enrichment_becomes_placeholder() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .push_reply(WEIGHTLESS_REPLY)
                .push_error(ProviderError::RateLimited),
        );
        let analyzer = analyzer(provider, AnalysisLayout::Compact);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert_eq!(result.analysis.lines().count(), 5);
        assert!(result
            .analysis
            .starts_with("- Produkt/serie: — (Rate limit hos OpenAI.)"));
    }

    #[tokio::test]
    async fn api_status_is_reported_in_note() {
        let provider = Arc::new(MockChatProvider::new("OpenAI").push_error(ProviderError::Api {
            status: 500,
            body: "boom".to_string(),
        }));
        let analyzer = analyzer(provider, AnalysisLayout::Detailed);

        let result = analyzer.analyze_one(&image(), 0).await;

        assert!(result.analysis.contains("OpenAI-fel 500"));
    }

    #[tokio::test]
    async fn batch_keeps_upload_order() {
        let provider = Arc::new(
            MockChatProvider::new("OpenAI")
                .push_reply("första")
                .push_reply("andra")
                .push_reply("tredje"),
        );
        let analyzer = analyzer(provider, AnalysisLayout::Detailed);

        let results = analyzer.analyze_batch(&[image(), image(), image()]).await;

        let pairs: Vec<(usize, &str)> = results
            .iter()
            .map(|r| (r.image_index, r.analysis.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "första"), (2, "andra"), (3, "tredje")]);
    }

    struct GaugeProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ChatProvider for GaugeProvider {
        fn name(&self) -> &str {
            "Gauge"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<String, ProviderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("fritext".to_string())
        }
    }

    #[tokio::test]
    async fn batch_caps_calls_in_flight() {
        let provider = Arc::new(GaugeProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let analyzer = analyzer(provider.clone(), AnalysisLayout::Detailed);

        let images = vec![image(); 5];
        let results = analyzer.analyze_batch(&images).await;

        assert_eq!(results.len(), 5);
        assert_eq!(results[4].image_index, 5);
        assert_eq!(provider.peak.load(Ordering::SeqCst), 2);
    }
}
