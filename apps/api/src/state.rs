use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::pipeline::analysis::CvAnalyzer;
use crate::pipeline::extraction::RequirementsExtractor;
use crate::pipeline::scoring::MatchScorer;
use crate::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: RequirementsExtractor,
    /// Also owns the session-keyed analysis store behind `analysis-summary`.
    pub analyzer: CvAnalyzer,
    pub scorer: MatchScorer,
}

impl AppState {
    /// Wires the three stages to one generator, each with its own decoding settings.
    pub fn new(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            extractor: RequirementsExtractor::new(generator.clone(), config.extraction.clone()),
            analyzer: CvAnalyzer::new(generator.clone(), config.analysis.clone(), store),
            scorer: MatchScorer::new(generator, config.scoring.clone()),
            config,
        }
    }
}
