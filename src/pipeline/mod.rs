//! Pipeline orchestration
//!
//! Sequences the stages: research, provider selection, blend, message
//! generation, assets, render. Execution is sequential and synchronous at
//! stage granularity; every stage degrades to defaults or skips its own step
//! on failure, so a run always completes. The only hard failures are
//! configuration-time (missing credentials), raised before the pipeline
//! starts.

pub mod assets;
pub mod blend;
pub mod messages;
pub mod provider;
pub mod render;
pub mod research;

use crate::config::BrandbriefConfig;
use crate::content::{ContentService, ImageSearch};
use crate::error::Result;
use crate::store::ArtifactStore;
use assets::{AssetKind, AssetStage};
use blend::DataBlender;
use messages::MessageGenerationStage;
use provider::ProviderSelectionStage;
use rand::Rng;
use render::RenderStage;
use research::ResearchStage;

/// Outcome summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The provider selected for this run, when selection succeeded
    pub provider: Option<String>,

    /// Number of rendered documents
    pub documents: usize,
}

/// End-to-end pipeline over a store and the two external collaborators.
pub struct Pipeline<'a> {
    store: &'a ArtifactStore,
    content: &'a dyn ContentService,
    search: &'a dyn ImageSearch,
    config: &'a BrandbriefConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a ArtifactStore,
        content: &'a dyn ContentService,
        search: &'a dyn ImageSearch,
        config: &'a BrandbriefConfig,
    ) -> Self {
        Self {
            store,
            content,
            search,
            config,
        }
    }

    /// Run the full stage sequence for `company`.
    ///
    /// Provider-dependent stages are gated on a successful selection; when
    /// no provider can be selected the run ends after research with zero
    /// documents rather than failing.
    pub async fn run<R: Rng>(&self, rng: &mut R, company: &str) -> Result<PipelineReport> {
        ResearchStage::new(self.store, self.content)
            .run(company)
            .await?;

        let Some(provider) = ProviderSelectionStage::new(self.store, self.content)
            .run(rng, company)
            .await?
        else {
            tracing::warn!("No provider selected; stopping after research");
            return Ok(PipelineReport {
                provider: None,
                documents: 0,
            });
        };

        DataBlender::new(self.store).blend_and_store(&provider)?;

        MessageGenerationStage::new(self.store, self.content)
            .run(rng, company, &provider)
            .await?;

        let asset_stage = AssetStage::new(self.search, &self.config.storage.asset_dir)?;
        asset_stage.resolve(company, AssetKind::Company).await;
        let logo = asset_stage.resolve(&provider, AssetKind::Provider).await;

        let documents = RenderStage::new(self.store, &self.config.storage.document_dir)?
            .run(company, &provider, logo.as_deref())?;

        Ok(PipelineReport {
            provider: Some(provider),
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{GenerationConfig, ImageHit};
    use crate::store::ArtifactKind;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned responses in call order: 5 research calls, 3 provider
    /// report calls, then one call per message archetype.
    struct ScriptedContent {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedContent {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ContentService for ScriptedContent {
        async fn generate(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> crate::error::Result<String> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "out of script".to_string()))
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageSearch for NoImages {
        async fn lookup_image(&self, _query: &str) -> crate::error::Result<Option<ImageHit>> {
            Ok(None)
        }
    }

    fn message_payload(subject: &str) -> String {
        format!(
            r#"[{{"subject": "{subject}", "body": "Plain text body.",
                 "email_sign_fullname": "Nina Peeters", "email_sign_role": "Account Manager",
                 "email_sign_company": "Acme Networks", "call_to_action_text": "Open portal",
                 "call_to_action_color": [28, 151, 212], "receiver_full_name": "Marie Declercq"}}]"#
        )
    }

    #[tokio::test]
    async fn test_end_to_end_with_malformed_then_valid_payloads() {
        let artifact_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(artifact_dir.path()).unwrap();

        let mut config = BrandbriefConfig::default();
        config.storage.asset_dir = out_dir.path().join("assets");
        config.storage.document_dir = out_dir.path().join("documents");

        let service_msgs = format!(
            "```json\n{}",
            message_payload("Service: review 3/4?").trim_start_matches('[')
        );
        let content = ScriptedContent::new(vec![
            // Research: main report, employees (malformed), departments, colors, providers
            r#"[{"subject": "Expansion", "overview": "...", "source": "press"}]"#,
            "employees response with no JSON",
            r#"[{"department": "Support", "address": "1 Main St", "phone": "+32 2 000", "vat": "BE 0123"}]"#,
            r#"[{"color_name_1": "Blue", "rgb_code_1": [200, 100, 50]}]"#,
            r#"[{"provider": "Acme Networks", "service": "connectivity"}]"#,
            // Provider reports: employees, colors, departments
            r#"[{"first_name": "Nina", "family_name": "Peeters", "role": "Account Manager"}]"#,
            r#"[{"color_name_1": "Orange", "rgb_code_1": [200, 100, 50]}]"#,
            r#"[{"department": "Managed Services", "address": "2 Canal St", "phone": "+32 2 111", "vat": "BE 0456"}]"#,
            // Messages: service (fenced, repair mode), event, issue, news
            &service_msgs,
            &message_payload("Event invitation"),
            &message_payload("Issue follow-up"),
            &message_payload("News update"),
        ]);
        let search = NoImages;

        let pipeline = Pipeline::new(&store, &content, &search, &config);
        let mut rng = StdRng::seed_from_u64(5);
        let report = pipeline.run(&mut rng, "Globex").await.unwrap();

        assert_eq!(report.provider.as_deref(), Some("Acme Networks"));

        // One artifact per archetype
        for kind in [
            ArtifactKind::ServiceMessages,
            ArtifactKind::EventMessages,
            ArtifactKind::IssueMessages,
            ArtifactKind::NewsMessages,
        ] {
            assert_eq!(store.get_records("Globex", kind).len(), 1, "{:?}", kind);
        }

        // One rendered document per record in each batch
        assert_eq!(report.documents, 4);
        let files: Vec<String> = std::fs::read_dir(&config.storage.document_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 4);
        for name in &files {
            for c in ['/', ':', '*', '?', '"', '<', '>', '|'] {
                assert!(!name.contains(c), "unsafe char in {}", name);
            }
        }

        // Blended view persisted for the provider; header color derived from
        // the provider's palette
        let blended = store.get("Acme Networks", ArtifactKind::Blended).unwrap();
        assert_eq!(blended["acme_networks"]["header_color"], "rgb(160, 80, 40)");

        // Malformed employees research output skipped without aborting
        assert!(!store.contains("Globex", ArtifactKind::Employees));
    }

    #[tokio::test]
    async fn test_run_without_providers_stops_after_research() {
        let artifact_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(artifact_dir.path()).unwrap();

        let mut config = BrandbriefConfig::default();
        config.storage.asset_dir = out_dir.path().join("assets");
        config.storage.document_dir = out_dir.path().join("documents");

        // Every call returns prose; no artifacts can be extracted
        let content = ScriptedContent::new(vec![]);
        let search = NoImages;

        let pipeline = Pipeline::new(&store, &content, &search, &config);
        let mut rng = StdRng::seed_from_u64(5);
        let report = pipeline.run(&mut rng, "Globex").await.unwrap();

        assert!(report.provider.is_none());
        assert_eq!(report.documents, 0);
    }
}
