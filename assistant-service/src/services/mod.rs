pub mod analyzer;
pub mod enrichment;
pub mod extraction;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod routing;

pub use analyzer::ProductAnalyzer;
pub use routing::ServiceRouter;
