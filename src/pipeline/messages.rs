//! Message generation stage
//!
//! For each of the four message archetypes, composes one persona- and
//! archetype-specific prompt, calls the content service with the creative
//! profile, salvage-parses the response in repair mode, and persists the
//! resulting batch. One persona is chosen per run and reused across
//! archetypes. A failed archetype is logged and skipped; it never aborts the
//! other three.
//!
//! Generated bodies must not contain a literal hyperlink: the call to action
//! carries the link semantics and the link itself is injected at render time.
//! The prompt states this contract; rendering relies on it.

use crate::content::{ContentService, GenerationConfig};
use crate::error::Result;
use crate::extract;
use crate::store::{ArtifactKind, ArtifactStore};
use chrono::{DateTime, Datelike, Duration, Local, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

/// The four message archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    /// A service matter that needs attention
    Service,
    /// An invitation to an upcoming event
    Event,
    /// An open issue with a resolution deadline
    Issue,
    /// A business opportunity tied to recent news
    News,
}

impl Archetype {
    /// All archetypes in generation order.
    pub const ALL: [Archetype; 4] = [
        Archetype::Service,
        Archetype::Event,
        Archetype::Issue,
        Archetype::News,
    ];

    /// The artifact kind this archetype's batch is stored under.
    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Archetype::Service => ArtifactKind::ServiceMessages,
            Archetype::Event => ArtifactKind::EventMessages,
            Archetype::Issue => ArtifactKind::IssueMessages,
            Archetype::News => ArtifactKind::NewsMessages,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Archetype::Service => "service",
            Archetype::Event => "event",
            Archetype::Issue => "issue",
            Archetype::News => "news",
        }
    }
}

/// A recipient persona: who the message is addressed to.
#[derive(Debug, Clone, Serialize)]
pub struct Persona {
    pub name: &'static str,
    pub role: &'static str,
    pub language: &'static str,
    pub department: &'static str,
}

/// Fixed recipient roster; one entry is chosen uniformly per run.
pub const PERSONAS: [Persona; 5] = [
    Persona {
        name: "Marie Declercq",
        role: "Data Analyst",
        language: "Dutch",
        department: "Consumer Market",
    },
    Persona {
        name: "Luc Vandenberg",
        role: "Cybersecurity Specialist",
        language: "Dutch",
        department: "Network & Wholesale",
    },
    Persona {
        name: "Emma Wouters",
        role: "Marketing Specialist",
        language: "English",
        department: "Enterprise Market",
    },
    Persona {
        name: "Jai Mehta",
        role: "System Administrator",
        language: "English",
        department: "IT Infrastructure",
    },
    Persona {
        name: "Guillaume Boutin",
        role: "Chief Executive Officer",
        language: "French",
        department: "Executive Office",
    },
];

/// Message tones, chosen uniformly per run.
pub const TONES: [&str; 8] = [
    "Professional",
    "Friendly",
    "Supportive",
    "Respectful",
    "Direct",
    "Time-Sensitive",
    "Empathetic",
    "Formal",
];

/// Event topics for the event archetype.
pub const EVENT_TOPICS: [&str; 10] = [
    "Seminars",
    "Workshops",
    "Training Sessions",
    "Industry Roundtables",
    "Panel Discussions",
    "Webinars",
    "Conferences",
    "Product Demos",
    "Leadership Forums",
    "Innovation Labs",
];

/// Issue topics for the issue archetype.
pub const ISSUE_TOPICS: [&str; 8] = [
    "Network Outages",
    "SLA Violations",
    "Contract Renewals",
    "Quality Reviews",
    "Missed Deadlines",
    "Billing Discrepancies",
    "Capacity Planning",
    "Regulatory Updates",
];

/// The literal message schema embedded in every archetype prompt.
pub fn message_schema() -> Value {
    json!({
        "subject": "str",
        "body": "str",
        "email_sign_fullname": "str",
        "email_sign_role": "str",
        "email_sign_company": "str",
        "call_to_action_text": "str",
        "call_to_action_color": "list[int]",
        "receiver_full_name": "str"
    })
}

/// Pick a business slot: a weekday within the next 7 calendar days (today
/// excluded), start hour uniform in 09..=16, minutes zeroed.
pub fn pick_business_slot<R: Rng>(rng: &mut R, now: DateTime<Local>) -> DateTime<Local> {
    let valid_days: Vec<DateTime<Local>> = (1..=7)
        .map(|offset| now + Duration::days(offset))
        .filter(|day| day.weekday().number_from_monday() <= 5)
        .collect();

    // A 7-day window always spans at least 5 weekdays.
    let day = valid_days[rng.gen_range(0..valid_days.len())];
    let hour = rng.gen_range(9..=16);

    day.with_hour(hour)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(day)
}

/// Draw a news snippet from the company's main-report artifact.
///
/// A list source yields a uniformly random element; a singleton object with a
/// `news` field yields that object. Anything else yields `None`.
pub fn pick_news<R: Rng>(rng: &mut R, store: &ArtifactStore, company: &str) -> Option<Value> {
    match store.get(company, ArtifactKind::MainReport)? {
        Value::Array(items) if !items.is_empty() => items.choose(rng).cloned(),
        value @ Value::Object(_) if value.get("news").is_some() => Some(value),
        _ => None,
    }
}

/// Generates the four persona-targeted message batches.
pub struct MessageGenerationStage<'a> {
    store: &'a ArtifactStore,
    content: &'a dyn ContentService,
}

impl<'a> MessageGenerationStage<'a> {
    pub fn new(store: &'a ArtifactStore, content: &'a dyn ContentService) -> Self {
        Self { store, content }
    }

    /// Generate and persist one batch per archetype for `company`, writing
    /// messages framed as coming from `provider`.
    pub async fn run<R: Rng>(&self, rng: &mut R, company: &str, provider: &str) -> Result<()> {
        let persona = &PERSONAS[rng.gen_range(0..PERSONAS.len())];
        let tone = TONES[rng.gen_range(0..TONES.len())];
        let config = GenerationConfig::creative()
            .with_system_instruction(system_instruction(company, provider, persona, tone));

        let departments = self.departments_summary(provider);

        for archetype in Archetype::ALL {
            let context = match archetype {
                Archetype::Service => String::new(),
                Archetype::Event => {
                    let topic = EVENT_TOPICS[rng.gen_range(0..EVENT_TOPICS.len())];
                    let slot = pick_business_slot(rng, Local::now());
                    format!(
                        "The event is {} and takes place {}.",
                        topic,
                        slot.format("%A %d %B at %H:00")
                    )
                }
                Archetype::Issue => {
                    let topic = ISSUE_TOPICS[rng.gen_range(0..ISSUE_TOPICS.len())];
                    let deadline = pick_business_slot(rng, Local::now());
                    format!(
                        "The issue is {} and needs a response before {}.",
                        topic,
                        deadline.format("%A %d %B at %H:00")
                    )
                }
                Archetype::News => match pick_news(rng, self.store, company) {
                    Some(news) => format!("The relevant recent news is: {}.", news),
                    None => {
                        // No usable news source: skip this archetype rather
                        // than fabricate an empty-news message.
                        tracing::warn!(
                            "No news source for {}; skipping news messages",
                            company
                        );
                        continue;
                    }
                },
            };

            self.generate_archetype(archetype, company, provider, persona, &departments, &context, &config)
                .await;
        }

        Ok(())
    }

    /// Compact summary of the provider's departments for prompt context.
    fn departments_summary(&self, provider: &str) -> String {
        let records = self.store.get_records(provider, ArtifactKind::Departments);
        if records.is_empty() {
            return String::from("no published department information");
        }
        serde_json::to_string(&records).unwrap_or_else(|_| String::from("departments"))
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_archetype(
        &self,
        archetype: Archetype,
        company: &str,
        provider: &str,
        persona: &Persona,
        departments: &str,
        context: &str,
        config: &GenerationConfig,
    ) {
        let prompt = archetype_prompt(archetype, company, provider, persona, departments, context);

        let text = match self.content.generate(&prompt, config).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} message call failed: {}", archetype.describe(), e);
                return;
            }
        };

        let batch = extract::extract_with_repair(&text);
        if batch.is_empty() {
            tracing::warn!(
                "No records recovered from {} message output",
                archetype.describe()
            );
            return;
        }

        tracing::info!(
            "Generated {} {} message(s)",
            batch.len(),
            archetype.describe()
        );

        if let Err(e) = self.store.put(
            company,
            archetype.artifact_kind(),
            &Value::Array(batch.into_iter().map(Value::Object).collect()),
        ) {
            tracing::warn!("Failed to store {} messages: {}", archetype.describe(), e);
        }
    }
}

/// System instruction for message drafting, built per run from the chosen
/// persona and tone.
fn system_instruction(company: &str, provider: &str, persona: &Persona, tone: &str) -> String {
    format!(
        "You are a copywriter drafting professional notification emails sent by {provider} \
         to employees of {company}. Keep the tone {tone}. The receiver is {name}, {role} \
         in the {department} department; address them formally by full name and write in \
         {language}. Sign with the first name, family name, role, and company of a \
         {provider} employee. Do not include any link or URL in the body: the call to \
         action is rendered separately below the text, so only refer to it in the body. \
         Provide a call-to-action text of at most three words and a suitable \
         call-to-action color in RGB based on the subject. Return only complete emails.",
        name = persona.name,
        role = persona.role,
        department = persona.department,
        language = persona.language,
    )
}

/// Compose the archetype prompt embedding entity, provider, persona fields,
/// archetype context, and the literal target schema.
fn archetype_prompt(
    archetype: Archetype,
    company: &str,
    provider: &str,
    persona: &Persona,
    departments: &str,
    context: &str,
) -> String {
    let schema = message_schema();
    let scenario = match archetype {
        Archetype::Service => format!(
            "Write tailored emails, based on the role of {role}, about a service matter \
             concerning a service that {provider} offers to {company}. Explain the matter \
             and why it should be addressed promptly.",
            role = persona.role,
        ),
        Archetype::Event => format!(
            "Write tailored emails, based on the role of {role}, about an event organized \
             by {provider} and geared towards that role. {context} Mention that available \
             spots are limited.",
            role = persona.role,
        ),
        Archetype::Issue => format!(
            "Write tailored emails, based on the role of {role}, about an open issue \
             between {provider} and {company}. {context} Elaborate on the issue.",
            role = persona.role,
        ),
        Archetype::News => format!(
            "Write tailored emails, based on the role of {role}, about a business \
             opportunity that {provider} can offer {company}. {context} Relate the \
             opportunity to the receiver's role.",
            role = persona.role,
        ),
    };

    format!(
        "{provider} is a service provider of {company}. {provider} has these departments: \
         {departments}.\n{scenario}\nUse this JSON schema: {schema}\n\
         Return: list[{kind}_messages]",
        kind = archetype.describe(),
    )
}
