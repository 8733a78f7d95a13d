//! Keyword routing of free-text requests to service companies.

use crate::models::AskResponse;
use crate::services::metrics;
use crate::services::prompts;
use crate::services::providers::{complete_within, ChatProvider, ChatRequest};
use std::sync::Arc;
use std::time::Duration;

pub const NO_MATCH_REPLY: &str =
    "Tyvärr, jag kan inte hitta något företag som passar för din förfrågan just nu.";

const ROUTING_TEMPERATURE: f32 = 0.3;
const ROUTING_MAX_TOKENS: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Moving,
    Garden,
    Cleaning,
    Building,
}

impl ServiceCategory {
    /// Match order; the first category with a keyword hit wins.
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Moving,
        ServiceCategory::Garden,
        ServiceCategory::Cleaning,
        ServiceCategory::Building,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCategory::Moving => "flytt",
            ServiceCategory::Garden => "trädgård",
            ServiceCategory::Cleaning => "städning",
            ServiceCategory::Building => "bygg",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            ServiceCategory::Moving => &["flytt", "piano"],
            ServiceCategory::Garden => &["trädgård", "gräsmatta"],
            ServiceCategory::Cleaning => &["städning", "städa"],
            ServiceCategory::Building => &["bygg", "renovera"],
        }
    }

    /// Companies in preference order; the first is recommended.
    pub fn companies(self) -> &'static [&'static str] {
        match self {
            ServiceCategory::Moving => &["Pooya AB", "Flyttexperterna AB", "Snabba Flyttar"],
            ServiceCategory::Garden => &["Gröna Fingrar AB", "Trädgårdsmästarna AB"],
            ServiceCategory::Cleaning => &["Rent & Fint AB", "Städproffsen AB"],
            ServiceCategory::Building => &["Bygg & Fix AB", "Hantverkarna AB"],
        }
    }

    pub fn recommended_company(self) -> &'static str {
        self.companies()[0]
    }
}

/// First category whose keyword occurs in `text`, ignoring case.
pub fn match_category(text: &str) -> Option<ServiceCategory> {
    let lowered = text.to_lowercase();
    ServiceCategory::ALL
        .into_iter()
        .find(|category| category.keywords().iter().any(|kw| lowered.contains(kw)))
}

/// Answers `/ask`: a keyword match names a company directly, anything else
/// goes to the chat model when one is available.
#[derive(Clone)]
pub struct ServiceRouter {
    provider: Option<Arc<dyn ChatProvider>>,
    timeout: Duration,
}

impl ServiceRouter {
    pub fn new(provider: Option<Arc<dyn ChatProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn route(&self, prompt: &str) -> AskResponse {
        if let Some(category) = match_category(prompt) {
            tracing::info!(category = category.as_str(), "Routed prompt by keyword");
            metrics::record_ask_route("category");
            return AskResponse::reply(category.recommended_company());
        }

        let Some(provider) = &self.provider else {
            metrics::record_ask_route("no_match");
            return AskResponse::reply(NO_MATCH_REPLY);
        };

        let request = ChatRequest::new(prompts::ROUTING_PROMPT, prompt)
            .temperature(ROUTING_TEMPERATURE)
            .max_tokens(ROUTING_MAX_TOKENS);

        match complete_within(provider.as_ref(), &request, self.timeout, "ask").await {
            Ok(reply) if !reply.trim().is_empty() => {
                metrics::record_ask_route("model");
                AskResponse::reply(reply)
            }
            Ok(_) => {
                metrics::record_ask_route("no_match");
                AskResponse::reply(NO_MATCH_REPLY)
            }
            Err(e) => {
                metrics::record_ask_route("fallback");
                AskResponse::with_message(e.human_message(provider.name()), NO_MATCH_REPLY)
            }
        }
    }
}
