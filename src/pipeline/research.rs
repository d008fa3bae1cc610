//! Research stage: the five company-level reports
//!
//! One content-service call per report kind, salvage-parsed into a record
//! batch and persisted as an artifact. A call whose output cannot be parsed
//! is logged and skipped; it never aborts the stage.

use crate::content::{ContentService, GenerationConfig};
use crate::error::Result;
use crate::extract;
use crate::store::{ArtifactKind, ArtifactStore};
use serde_json::{json, Value};

/// System instruction shared by all research calls.
const RESEARCH_INSTRUCTION: &str = "You are an analyst that conducts company research. \
    You are given a company name and produce a factual research report from public \
    sources. Plan your work thoroughly but do not discuss the plan, and do not add \
    comments after the report.";

/// The five company-level report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Overview of the most important recent news
    MainReport,
    /// Employee roster with roles and departments
    Employees,
    /// Departments, subdivisions, and head-office contact details
    Departments,
    /// Primary brand colors with hex and RGB codes
    Colors,
    /// Main service providers
    Providers,
}

impl ReportKind {
    /// All report kinds in generation order.
    pub const ALL: [ReportKind; 5] = [
        ReportKind::MainReport,
        ReportKind::Employees,
        ReportKind::Departments,
        ReportKind::Colors,
        ReportKind::Providers,
    ];

    /// The artifact kind this report is stored under.
    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            ReportKind::MainReport => ArtifactKind::MainReport,
            ReportKind::Employees => ArtifactKind::Employees,
            ReportKind::Departments => ArtifactKind::Departments,
            ReportKind::Colors => ArtifactKind::Colors,
            ReportKind::Providers => ArtifactKind::Providers,
        }
    }

    /// The literal JSON schema description embedded in the prompt.
    pub fn schema(&self) -> Value {
        match self {
            ReportKind::MainReport => json!({
                "subject": "str",
                "overview": "str",
                "source": "str"
            }),
            ReportKind::Employees => json!({
                "first_name": "str",
                "family_name": "str",
                "role": "str",
                "department": "str",
                "email_address": "str"
            }),
            ReportKind::Departments => json!({
                "department": "str",
                "subdivision": "list[str]",
                "address": "str",
                "phone": "str",
                "vat": "str"
            }),
            ReportKind::Colors => json!({
                "color_name_1": "str",
                "hex_code_1": "str",
                "rgb_code_1": "list[int]",
                "color_name_2": "str",
                "hex_code_2": "str",
                "rgb_code_2": "list[int]"
            }),
            ReportKind::Providers => json!({
                "provider": "str",
                "service": "str",
                "type": "str",
                "provider_homepage": "str"
            }),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ReportKind::MainReport => "main report",
            ReportKind::Employees => "employees report",
            ReportKind::Departments => "departments report",
            ReportKind::Colors => "colors report",
            ReportKind::Providers => "providers report",
        }
    }

    /// Prompt for a company-level report.
    pub fn prompt(&self, company: &str) -> String {
        let schema = self.schema();
        match self {
            ReportKind::MainReport => format!(
                "Write a report about {company}. The report should contain an extensive \
                 overview of the most important news facts of the last two weeks.\n\
                 Use this JSON schema: {schema}\nReturn: list[main_report_items]"
            ),
            ReportKind::Employees => format!(
                "Write a report about {company}. The report should contain a comprehensive \
                 summary of publicly listed employees: complete first name and family name, \
                 an email address shaped as first_name.family_name@{domain}.com in lower \
                 case, their role, and their department. Exclude entries whose full name \
                 cannot be found and do not abbreviate names.\n\
                 Use this JSON schema: {schema}\nReturn: list[employees_report]",
                domain = crate::store::normalize_name(company),
            ),
            ReportKind::Departments => format!(
                "Write a report about {company}. The report should exclusively provide a \
                 detailed summary of the company's departments and their subdivisions, \
                 including the full headquarters address, main phone number, and VAT \
                 number. Only include verified public information.\n\
                 Use this JSON schema: {schema}\nReturn: list[departments]"
            ),
            ReportKind::Colors => format!(
                "Write a report about {company}. The report should exclusively provide the \
                 main colors of the company's branding with official HEX and RGB codes, \
                 focusing on the logo and website. Do not include speculative colors.\n\
                 Use this JSON schema: {schema}\nReturn: list[company_colors]"
            ),
            ReportKind::Providers => format!(
                "Write a report about {company}. List the company's main service providers: \
                 known suppliers, contractors, and technology service providers, with the \
                 type and a description of the service and the provider homepage.\n\
                 Use this JSON schema: {schema}\nReturn: list[providers]"
            ),
        }
    }
}

/// Produces the five company-level report artifacts.
pub struct ResearchStage<'a> {
    store: &'a ArtifactStore,
    content: &'a dyn ContentService,
}

impl<'a> ResearchStage<'a> {
    pub fn new(store: &'a ArtifactStore, content: &'a dyn ContentService) -> Self {
        Self { store, content }
    }

    /// Generate and persist every company-level report.
    ///
    /// Each report is independent: a failed call or unparseable response
    /// skips that artifact only.
    pub async fn run(&self, company: &str) -> Result<()> {
        let config = GenerationConfig::research().with_system_instruction(RESEARCH_INSTRUCTION);

        for kind in ReportKind::ALL {
            tracing::info!("Generating {} for {}", kind.describe(), company);
            self.generate_one(company, kind, &config).await;
        }
        Ok(())
    }

    async fn generate_one(&self, company: &str, kind: ReportKind, config: &GenerationConfig) {
        let text = match self.content.generate(&kind.prompt(company), config).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} call failed for {}: {}", kind.describe(), company, e);
                return;
            }
        };

        let batch = extract::extract(&text);
        if batch.is_empty() {
            tracing::warn!(
                "No records recovered from {} output for {}",
                kind.describe(),
                company
            );
            return;
        }

        if let Err(e) = self
            .store
            .put(company, kind.artifact_kind(), &Value::Array(
                batch.into_iter().map(Value::Object).collect(),
            ))
        {
            tracing::warn!("Failed to store {} for {}: {}", kind.describe(), company, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GenerationConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Stub that replays canned responses in call order.
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
        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> crate::error::Result<String> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "no more responses".to_string()))
        }
    }

    #[test]
    fn test_prompts_embed_company_and_schema() {
        for kind in ReportKind::ALL {
            let prompt = kind.prompt("Globex");
            assert!(prompt.contains("Globex"), "{:?}", kind);
            assert!(prompt.contains("JSON schema"), "{:?}", kind);
        }
        assert!(ReportKind::Providers.prompt("Globex").contains("provider_homepage"));
    }

    #[tokio::test]
    async fn test_run_stores_parseable_reports_and_skips_malformed() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let content = ScriptedContent::new(vec![
            r#"[{"subject": "Q3 results", "overview": "...", "source": "press"}]"#,
            "this response has no JSON at all",
            r#"prose first [{"department": "IT", "address": "1 Main St"}] prose after"#,
            r#"[{"color_name_1": "Blue", "rgb_code_1": [28, 151, 212]}]"#,
            r#"[{"provider": "Acme Networks", "service": "connectivity"}]"#,
        ]);

        let stage = ResearchStage::new(&store, &content);
        stage.run("Globex").await.unwrap();

        assert!(store.contains("Globex", ArtifactKind::MainReport));
        // Malformed employees response is skipped, not fatal
        assert!(!store.contains("Globex", ArtifactKind::Employees));
        assert!(store.contains("Globex", ArtifactKind::Departments));
        assert!(store.contains("Globex", ArtifactKind::Colors));
        assert_eq!(
            store.get_records("Globex", ArtifactKind::Providers)[0]["provider"],
            "Acme Networks"
        );
    }
}
