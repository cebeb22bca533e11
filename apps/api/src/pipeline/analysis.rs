//! Analysis stage — CV document to `CvAnalysis`, remembered per session.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info};

use crate::config::GenerationSettings;
use crate::errors::PipelineError;
use crate::llm_client::{Attachment, TextGenerator};
use crate::pipeline::prompts::CV_REVIEW;
use crate::pipeline::run_stage;
use crate::pipeline::schema::CvAnalysis;
use crate::store::AnalysisStore;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Clone)]
pub struct CvAnalyzer {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    store: Arc<dyn AnalysisStore>,
}

impl CvAnalyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            generator,
            settings,
            store,
        }
    }

    /// Analyzes a CV document and stores the result as the session's latest analysis.
    ///
    /// The document bytes are forwarded as-is, always labelled as PDF; no local text
    /// extraction happens. The store is only written once the reply has passed validation.
    pub async fn analyze(
        &self,
        session: &str,
        document: Bytes,
    ) -> Result<CvAnalysis, PipelineError> {
        let attachment = Attachment {
            media_type: PDF_MEDIA_TYPE.to_string(),
            data: document,
        };

        let analysis: CvAnalysis = run_stage(
            self.generator.as_ref(),
            &self.settings,
            &CV_REVIEW,
            CV_REVIEW.instruction.to_string(),
            Some(attachment),
        )
        .await?;

        self.store
            .put(session, analysis.clone())
            .await
            .map_err(|e| {
                error!("Failed to store CV analysis for session {session}: {e}");
                e
            })?;

        info!(
            "CV analyzed for session {session}: {} skills, {} strengths",
            analysis.skills.len(),
            analysis.strengths.len()
        );
        Ok(analysis)
    }

    /// Returns the most recent analysis for `session`, or `None` if none was produced yet.
    pub async fn latest(&self, session: &str) -> Result<Option<CvAnalysis>, PipelineError> {
        Ok(self.store.get(session).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::pipeline::testing::ScriptedGenerator;
    use crate::store::{MemoryAnalysisStore, StoreError, DEFAULT_SESSION};

    const FIRST_REPLY: &str = r#"{
        "skills": ["Go", "Kubernetes"],
        "experience_summary": "Six years of backend engineering in fintech.",
        "strengths": ["Distributed systems"],
        "weaknesses": ["No AWS exposure"],
        "recommendations": ["Add metrics to achievements"],
        "languages": ["English"],
        "certifications": [],
        "responsibilities": ["Owned the ledger service"],
        "seniority_level": "Senior"
    }"#;

    const SECOND_REPLY: &str = r#"{
        "skills": ["Python"],
        "experience_summary": "Two years of data engineering."
    }"#;

    fn analyzer(generator: Arc<ScriptedGenerator>) -> (CvAnalyzer, Arc<MemoryAnalysisStore>) {
        let store = Arc::new(MemoryAnalysisStore::new(100, Duration::from_secs(60)));
        let analyzer = CvAnalyzer::new(generator, GenerationSettings::default(), store.clone());
        (analyzer, store)
    }

    #[tokio::test]
    async fn test_analyze_forwards_document_as_attachment() {
        let generator = Arc::new(ScriptedGenerator::with_replies([FIRST_REPLY]));
        let (analyzer, _) = analyzer(generator.clone());

        analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();

        let (_, request) = generator.last_request();
        let attachment = request.attachment.expect("attachment missing");
        assert_eq!(attachment.media_type, "application/pdf");
        assert_eq!(attachment.data.as_ref(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_latest_returns_identical_record_after_analysis() {
        let generator = Arc::new(ScriptedGenerator::with_replies([FIRST_REPLY]));
        let (analyzer, _) = analyzer(generator);

        assert!(analyzer.latest(DEFAULT_SESSION).await.unwrap().is_none());

        let analysis = analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert!(!analysis.experience_summary.is_empty());

        let latest = analyzer.latest(DEFAULT_SESSION).await.unwrap().unwrap();
        assert_eq!(latest, analysis);
    }

    #[tokio::test]
    async fn test_second_analysis_replaces_first() {
        let generator = Arc::new(ScriptedGenerator::with_replies([FIRST_REPLY, SECOND_REPLY]));
        let (analyzer, _) = analyzer(generator);

        analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"a"))
            .await
            .unwrap();
        let second = analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"b"))
            .await
            .unwrap();

        let latest = analyzer.latest(DEFAULT_SESSION).await.unwrap().unwrap();
        assert_eq!(latest, second);
        assert_eq!(latest.skills, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_invalid_reply_does_not_touch_store() {
        let generator = Arc::new(ScriptedGenerator::with_replies([
            FIRST_REPLY,
            r#"{"skills": ["Go"]}"#,
        ]));
        let (analyzer, store) = analyzer(generator);

        let first = analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"a"))
            .await
            .unwrap();
        let err = analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"b"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
        assert_eq!(store.get(DEFAULT_SESSION).await.unwrap(), Some(first));
    }

    /// A store whose backend is always down.
    struct UnreachableStore;

    #[async_trait]
    impl AnalysisStore for UnreachableStore {
        async fn get(&self, _session: &str) -> Result<Option<CvAnalysis>, StoreError> {
            Err(serde_json::from_str::<serde_json::Value>("{").unwrap_err().into())
        }

        async fn put(&self, _session: &str, _analysis: CvAnalysis) -> Result<(), StoreError> {
            Err(serde_json::from_str::<serde_json::Value>("{").unwrap_err().into())
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_a_pipeline_error() {
        let generator = Arc::new(ScriptedGenerator::with_replies([FIRST_REPLY]));
        let analyzer = CvAnalyzer::new(
            generator,
            GenerationSettings::default(),
            Arc::new(UnreachableStore),
        );

        let err = analyzer
            .analyze(DEFAULT_SESSION, Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
        assert!(matches!(
            analyzer.latest(DEFAULT_SESSION).await,
            Err(PipelineError::Store(_))
        ));
    }
}
