//! Render stage: styled documents from message records
//!
//! Consumes the blended entity view plus the message batches and emits one
//! self-contained HTML document per message record. Substitution is data
//! driven: a static template with `{{placeholder}}` slots and a field map,
//! so markup changes never touch the substitution logic.
//!
//! The link is injected structurally here (the call-to-action anchor); bodies
//! arrive link-free per the generation-stage contract. Unresolvable fields
//! fall back to literal defaults so no document ever shows a blank field.

use crate::error::{Error, Result};
use crate::extract::Record;
use crate::pipeline::blend::{BlendedRecord, DataBlender};
use crate::pipeline::messages::Archetype;
use crate::store::ArtifactStore;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Render-time fallbacks: a document never shows a blank field.
const DEFAULT_SUBJECT: &str = "Important notification";
const DEFAULT_BODY: &str = "We have an important update for you.";
const DEFAULT_SIGNER: &str = "Customer Support Team";
const DEFAULT_SIGNER_ROLE: &str = "Customer Support";
const DEFAULT_CTA_TEXT: &str = "Learn more";
const DEFAULT_CTA_COLOR: &str = "rgb(0, 123, 255)";
const DEFAULT_RECEIVER: &str = "Valued Customer";

/// Structural link placeholder injected at render time.
const DEFAULT_LANDING_URL: &str = "https://example.com";

/// A message record on the wire schema. Every field is optional at parse
/// time; missing values degrade to defaults at render time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRecord {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub email_sign_fullname: Option<String>,
    #[serde(default)]
    pub email_sign_role: Option<String>,
    #[serde(default)]
    pub email_sign_company: Option<String>,
    #[serde(default)]
    pub call_to_action_text: Option<String>,
    #[serde(default)]
    pub call_to_action_color: Option<Value>,
    #[serde(default)]
    pub receiver_full_name: Option<String>,
}

impl MessageRecord {
    /// Parse from an extracted record; unknown fields are ignored.
    pub fn from_record(record: Record) -> Self {
        serde_json::from_value(Value::Object(record)).unwrap_or_default()
    }
}

/// Call-to-action color: a list of 3 ints becomes an `rgb(r,g,b)` string, a
/// string passes through, anything else falls to the default.
pub fn cta_color(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) if items.len() == 3 => {
            let channels: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
            match channels[..] {
                [r, g, b] => format!("rgb({}, {}, {})", r, g, b),
                _ => DEFAULT_CTA_COLOR.to_string(),
            }
        }
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_CTA_COLOR.to_string(),
    }
}

fn unsafe_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("filename sanitize regex"))
}

/// Replace filesystem-unsafe characters with underscores.
pub fn sanitize_filename_part(part: &str) -> String {
    unsafe_chars_re().replace_all(part.trim(), "_").to_string()
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{subject}}</title>
    <style>
        body { font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0; }
        .email-container { width: 600px; margin: 20px auto; background-color: #fff; border: 1px solid #ddd; border-radius: 10px; padding: 20px; }
        .email-header { background-color: {{header_color}}; color: #fff; padding: 10px 0; text-align: center; }
        .email-header img { width: 120px; margin-bottom: 10px; }
        .email-header h1 { font-size: 24px; font-weight: bold; margin: 0; }
        .email-content { font-size: 16px; color: #333; margin-top: 20px; }
        .cta-button { display: inline-block; padding: 10px 20px; background-color: {{cta_color}}; color: white; text-align: center; font-weight: bold; border-radius: 5px; text-decoration: none; margin-top: 20px; }
        .cta-button:hover { background-color: {{header_color}}; }
        .email-footer { font-size: 14px; color: #777; text-align: center; margin-top: 20px; border-top: 1px solid #ddd; padding-top: 20px; }
        .email-footer a { color: {{header_color}}; text-decoration: none; }
        .legal-footer { font-size: 12px; color: #333; background-color: #d3d3d3; text-align: center; padding: 10px; border-top: 1px solid #ccc; border-radius: 0 0 10px 10px; margin-top: 10px; }
    </style>
</head>
<body>
    <div class="email-container">
        <div class="email-header">
            <img src="{{logo}}" alt="">
            <h1>{{subject}}</h1>
        </div>
        <div class="email-content">
            <h2>{{receiver}}</h2>
            <p>{{body}}</p>
            <a href="{{link}}" class="cta-button">{{cta_text}}</a>
            <p style="margin-top: 20px;">Best regards,</p>
            <p style="margin: 5px 0;"><strong>{{signer}}</strong></p>
            <p style="margin: 5px 0;">{{signer_role}}</p>
            <p style="margin: 5px 0;">{{signer_company}}</p>
        </div>
        <div class="email-footer">
            <p><strong>{{department}}</strong></p>
            <p>Phone: {{phone}}</p>
            <p>Visit our website: <a href="{{link}}">{{provider}}</a></p>
        </div>
        <div class="legal-footer">
            <p><strong>{{provider}}</strong></p>
            <p>{{address}}<br>VAT {{vat}}</p>
        </div>
    </div>
</body>
</html>
"#;

/// Render one message record against a blended entity view.
///
/// Returns the document file name and its HTML content.
pub fn render(
    message: &MessageRecord,
    blended: &BlendedRecord,
    logo: Option<&Path>,
    landing_url: &str,
) -> (String, String) {
    let non_empty = |opt: &Option<String>, default: &str| -> String {
        opt.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    let subject = non_empty(&message.subject, DEFAULT_SUBJECT);
    let receiver = non_empty(&message.receiver_full_name, DEFAULT_RECEIVER);
    let logo = logo
        .and_then(|p| p.to_str())
        .unwrap_or_default()
        .to_string();

    let substitutions = [
        ("{{subject}}", subject.clone()),
        ("{{body}}", non_empty(&message.body, DEFAULT_BODY)),
        ("{{receiver}}", receiver.clone()),
        ("{{signer}}", non_empty(&message.email_sign_fullname, DEFAULT_SIGNER)),
        ("{{signer_role}}", non_empty(&message.email_sign_role, DEFAULT_SIGNER_ROLE)),
        ("{{signer_company}}", non_empty(&message.email_sign_company, &blended.provider)),
        ("{{cta_text}}", non_empty(&message.call_to_action_text, DEFAULT_CTA_TEXT)),
        ("{{cta_color}}", cta_color(message.call_to_action_color.as_ref())),
        ("{{header_color}}", blended.header_color.clone()),
        ("{{provider}}", blended.provider.clone()),
        ("{{department}}", blended.department.clone()),
        ("{{phone}}", blended.phone.clone()),
        ("{{address}}", blended.address.clone()),
        ("{{vat}}", blended.vat.clone()),
        ("{{link}}", landing_url.to_string()),
        ("{{logo}}", logo),
    ];

    let mut html = TEMPLATE.to_string();
    for (placeholder, value) in substitutions {
        html = html.replace(placeholder, &value);
    }

    let filename = format!(
        "{}_{}.html",
        sanitize_filename_part(&receiver),
        sanitize_filename_part(&subject)
    );
    (filename, html)
}

/// Renders every stored message batch into styled documents.
#[derive(Debug)]
pub struct RenderStage<'a> {
    store: &'a ArtifactStore,
    dir: PathBuf,
    landing_url: String,
}

impl<'a> RenderStage<'a> {
    /// Create the stage, ensuring the document directory exists.
    pub fn new(store: &'a ArtifactStore, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Render(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(Self {
            store,
            dir,
            landing_url: DEFAULT_LANDING_URL.to_string(),
        })
    }

    /// Replace the structural link target.
    pub fn with_landing_url(mut self, url: impl Into<String>) -> Self {
        self.landing_url = url.into();
        self
    }

    /// Render every message batch stored for `company` against the blended
    /// view of `entity` (the selected provider), writing one document per
    /// record. Returns the number of documents written.
    ///
    /// Rendering never writes back into the artifact store.
    pub fn run(&self, company: &str, entity: &str, logo: Option<&Path>) -> Result<usize> {
        let blended = DataBlender::new(self.store).blend(entity);
        let mut written = 0;

        for archetype in Archetype::ALL {
            let records = self.store.get_records(company, archetype.artifact_kind());
            for record in records {
                let message = MessageRecord::from_record(record);
                let (filename, html) = render(&message, &blended, logo, &self.landing_url);
                let path = self.dir.join(&filename);
                std::fs::write(&path, html).map_err(|e| {
                    Error::Render(format!("Failed to write {}: {}", path.display(), e))
                })?;
                tracing::debug!("Rendered document: {}", path.display());
                written += 1;
            }
        }

        tracing::info!("Rendered {} document(s) for {}", written, company);
        Ok(written)
    }
}
