//! Provider selection stage
//!
//! Loads the providers artifact produced by research, picks one provider
//! uniformly at random, records the selection, and generates the three
//! provider-scoped reports (employees, colors, departments). The selection
//! artifact is overwritten on every run; no history is kept.

use crate::content::{ContentService, GenerationConfig};
use crate::error::Result;
use crate::extract;
use crate::pipeline::research::ReportKind;
use crate::store::{ArtifactKind, ArtifactStore};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

const PROVIDER_INSTRUCTION: &str = "You are an analyst that conducts company research. \
    You are given the name of a service provider and the company it serves, and you \
    produce a factual report about the provider from public sources. Do not add \
    comments after the report.";

/// Selects a provider and produces its three scoped report artifacts.
pub struct ProviderSelectionStage<'a> {
    store: &'a ArtifactStore,
    content: &'a dyn ContentService,
}

impl<'a> ProviderSelectionStage<'a> {
    pub fn new(store: &'a ArtifactStore, content: &'a dyn ContentService) -> Self {
        Self { store, content }
    }

    /// Run the stage for `company`.
    ///
    /// Returns the selected provider's display name, or `None` when the
    /// providers artifact is missing, empty, or carries no usable name; in
    /// that case the stage is skipped with a warning.
    pub async fn run<R: Rng>(&self, rng: &mut R, company: &str) -> Result<Option<String>> {
        let providers = self.store.get_records(company, ArtifactKind::Providers);
        if providers.is_empty() {
            tracing::warn!("No providers artifact for {}; skipping selection", company);
            return Ok(None);
        }

        let Some(selected) = providers.choose(rng).cloned() else {
            return Ok(None);
        };

        let name = match selected.get("provider").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                tracing::warn!("Selected provider record has no usable name; skipping");
                return Ok(None);
            }
        };
        tracing::info!("Selected provider: {}", name);

        // Single-element selection artifact, keyed by the provider entity and
        // overwritten on each run.
        self.store.put(
            &name,
            ArtifactKind::SelectedProvider,
            &Value::Array(vec![Value::Object(selected)]),
        )?;

        let config =
            GenerationConfig::research().with_system_instruction(PROVIDER_INSTRUCTION);
        for kind in [ReportKind::Employees, ReportKind::Colors, ReportKind::Departments] {
            self.generate_one(&name, company, kind, &config).await;
        }

        Ok(Some(name))
    }

    /// Provider-flavored prompt: the company-level report prompt plus the
    /// provider relationship context.
    fn prompt(provider: &str, company: &str, kind: ReportKind) -> String {
        format!(
            "{} This company is a service provider of {}. Do not include employees or \
             details of {} itself in the report.",
            kind.prompt(provider),
            company,
            company
        )
    }

    async fn generate_one(
        &self,
        provider: &str,
        company: &str,
        kind: ReportKind,
        config: &GenerationConfig,
    ) {
        let prompt = Self::prompt(provider, company, kind);
        let text = match self.content.generate(&prompt, config).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Provider report call failed for {}: {}", provider, e);
                return;
            }
        };

        let batch = extract::extract(&text);
        if batch.is_empty() {
            tracing::warn!("No records recovered from provider report for {}", provider);
            return;
        }

        if let Err(e) = self.store.put(
            provider,
            kind.artifact_kind(),
            &Value::Array(batch.into_iter().map(Value::Object).collect()),
        ) {
            tracing::warn!("Failed to store provider report for {}: {}", provider, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use tempfile::TempDir;

    struct FixedContent(&'static str);

    #[async_trait]
    impl ContentService for FixedContent {
        async fn generate(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> crate::error::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn store_with_providers(providers: Value) -> (ArtifactStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        store.put("Globex", ArtifactKind::Providers, &providers).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_selection_is_deterministic_under_seed() {
        let (store, _dir) = store_with_providers(json!([
            {"provider": "Acme Networks"},
            {"provider": "Initech Cloud"},
            {"provider": "Umbrella Logistics"},
        ]));
        let content = FixedContent(r#"[{"department": "IT"}]"#);
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = stage.run(&mut rng_a, "Globex").await.unwrap().unwrap();
        let b = stage.run(&mut rng_b, "Globex").await.unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_selection_artifact_and_reports_written() {
        let (store, _dir) = store_with_providers(json!([{"provider": "Acme Networks"}]));
        let content = FixedContent(r#"[{"department": "Support", "phone": "+32 2 000 00 00"}]"#);
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng = StdRng::seed_from_u64(1);
        let name = stage.run(&mut rng, "Globex").await.unwrap().unwrap();
        assert_eq!(name, "Acme Networks");

        let selection = store.get_records(&name, ArtifactKind::SelectedProvider);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0]["provider"], "Acme Networks");

        assert!(store.contains(&name, ArtifactKind::Employees));
        assert!(store.contains(&name, ArtifactKind::Colors));
        assert!(store.contains(&name, ArtifactKind::Departments));
    }

    #[tokio::test]
    async fn test_provider_name_with_path_characters_is_stored() {
        let (store, _dir) =
            store_with_providers(json!([{"provider": "Acme/Networks Telecom"}]));
        let content = FixedContent(r#"[{"department": "IT"}]"#);
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng = StdRng::seed_from_u64(1);
        let name = stage.run(&mut rng, "Globex").await.unwrap().unwrap();
        assert_eq!(name, "Acme/Networks Telecom");

        let selection = store.get_records(&name, ArtifactKind::SelectedProvider);
        assert_eq!(selection.len(), 1);
        assert!(store.contains(&name, ArtifactKind::Departments));
    }

    #[tokio::test]
    async fn test_missing_providers_artifact_skips_stage() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let content = FixedContent("[]");
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng = StdRng::seed_from_u64(1);
        assert!(stage.run(&mut rng, "Globex").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_nameless_provider_record_skips_stage() {
        let (store, _dir) = store_with_providers(json!([{"service": "unnamed"}]));
        let content = FixedContent("[]");
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng = StdRng::seed_from_u64(1);
        assert!(stage.run(&mut rng, "Globex").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_selection() {
        let (store, _dir) = store_with_providers(json!([{"provider": "Acme Networks", "run": 1}]));
        let content = FixedContent("[]");
        let stage = ProviderSelectionStage::new(&store, &content);

        let mut rng = StdRng::seed_from_u64(1);
        stage.run(&mut rng, "Globex").await.unwrap();

        store
            .put("Globex", ArtifactKind::Providers, &json!([{"provider": "Acme Networks", "run": 2}]))
            .unwrap();
        stage.run(&mut rng, "Globex").await.unwrap();

        let selection = store.get_records("Acme Networks", ArtifactKind::SelectedProvider);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0]["run"], 2);
    }
}
