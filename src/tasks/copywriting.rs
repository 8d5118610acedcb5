//! Copywriting tasks
//!
//! Two plain-text assistants: multi-platform social media copy and B2B cold
//! outreach emails. The outreach reply is requested in marker-delimited
//! blocks and split into its parts.

use crate::error::AppError;
use crate::generation::{GenerationClient, GenerationError};
use crate::state::keys::{MARKETING_INPUTS, MARKETING_RESULT, OUTREACH_INPUTS, OUTREACH_RESULT};
use crate::state::StateStore;
use crate::tasks::settings::Settings;
use crate::tasks::TaskSlots;
use serde::{Deserialize, Serialize};

const MARKETING_SYSTEM: &str = "You are an auto-parts export expert fluent in every social media platform. \
You only output copy blocks that can be pasted directly and never use tables.";

const OUTREACH_SYSTEM: &str = "You are a 20-year B2B Export Expert.";

const TITLE_MARKER: &str = "---TITLE---";
const BODY_MARKER: &str = "---BODY---";
const NOTES_MARKER: &str = "---EXPERT NOTES---";
const SUGGESTIONS_MARKER: &str = "---SUGGESTIONS---";

/// Social media copy form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketingInputs {
    /// Product keyword
    pub keyword: String,
    /// Target markets, free text
    pub target_market: String,
    /// Customer groups addressed
    pub target_customers: Vec<String>,
    /// Platforms to write for
    pub platforms: Vec<String>,
    /// Product description and selling points
    pub product_desc: String,
}

impl Default for MarketingInputs {
    fn default() -> Self {
        Self {
            keyword: "Wheel Hub Bearing".to_string(),
            target_market: "Europe, North America, Middle East".to_string(),
            target_customers: vec![
                "Overseas brand owners".to_string(),
                "Regional distributors".to_string(),
            ],
            platforms: ["TikTok", "Facebook", "Instagram", "YouTube", "X (Twitter)"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            product_desc: "High-carbon chromium bearing steel with excellent sensitivity and a precise fit. \
Rust-proof coated finish that looks good and lasts. Plenty of stock, ships fast."
                .to_string(),
        }
    }
}

fn marketing_prompt(inputs: &MarketingInputs, company_line: &str) -> String {
    format!(
        r#"Role: You are a senior marketing copywriter with 10 years in the auto-parts export trade.

Background:
- Product keyword: {keyword}
- Target market: {market}
- Target customers: {customers}
- Platforms: {platforms}
- Product description / selling points: {desc}
{company}

Goal:
Write ready-to-paste marketing copy for each selected platform.

Output format (no tables):
1. Group the copy by platform.
2. Under each platform give three versions: [Formal outreach], [Short traffic driver], [Lifestyle / seeding].
3. Follow every version with a [Recommended hashtags] block.
4. Bilingual copy, English first then Chinese, with emoji suited to social media.
5. Work the core advantages in naturally: precision and sensitivity, clean finish, in-stock fast shipping.

Tone per platform:
- TikTok: strong hook and visuals, fast rhythm.
- Facebook: professional credibility and supply capacity, suited to B2B.
- X/Twitter: minimal, industry news or stock advantage.
- YouTube: full video description format with SEO keywords.
- Instagram: craftsmanship and detail.

Start the platform copy directly."#,
        keyword = inputs.keyword,
        market = inputs.target_market,
        customers = inputs.target_customers.join(", "),
        platforms = inputs.platforms.join(", "),
        desc = inputs.product_desc,
        company = company_line,
    )
}

/// Multi-platform marketing copy
#[derive(Debug, Clone)]
pub struct MarketingAssistant {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<MarketingInputs, String>,
}

impl MarketingAssistant {
    /// Create the assistant
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, MARKETING_INPUTS, MARKETING_RESULT),
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> MarketingInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &MarketingInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last generated copy, empty if none
    pub async fn result(&self) -> String {
        self.slots.results().await
    }

    /// Generate copy for every selected platform
    ///
    /// # Errors
    /// * `Validation` if no platform is selected (nothing is sent)
    pub async fn generate(&self, inputs: MarketingInputs) -> Result<String, AppError> {
        if inputs.platforms.is_empty() {
            return Err(
                GenerationError::Validation("Select at least one platform".to_string()).into(),
            );
        }
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let prompt = marketing_prompt(&inputs, &settings.prompt_line("Company Background"));
        let result = self
            .client
            .generate_text(&prompt, Some(MARKETING_SYSTEM), false)
            .await?;

        self.slots.set_results(&result.text).await?;
        tracing::info!(
            platforms = inputs.platforms.len(),
            copy_len = result.text.len(),
            "Marketing copy generated"
        );
        Ok(result.text)
    }

    /// Clear form and copy
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }
}

/// Cold outreach email form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutreachInputs {
    /// Recipient market
    pub target_market: String,
    /// Email language
    pub language: String,
    /// Product name
    pub product_name: String,
    /// Product category
    pub product_category: String,
    /// Core specifications
    pub product_specs: String,
    /// Application scenarios
    pub application_scenario: String,
    /// Key selling points
    pub selling_points: String,
}

impl Default for OutreachInputs {
    fn default() -> Self {
        Self {
            target_market: "Germany".to_string(),
            language: "English".to_string(),
            product_name: "Precision Wheel Hub Bearing".to_string(),
            product_category: "Auto Parts / Bearings".to_string(),
            product_specs: "High-carbon chromium steel, G3 precision, zero-noise technology"
                .to_string(),
            application_scenario: "Aftermarket repair, high-end vehicle maintenance".to_string(),
            selling_points:
                "Direct factory price, CE & IATF16949 certified, 24-hour shipping from stock"
                    .to_string(),
        }
    }
}

/// A generated outreach email split into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutreachEmail {
    /// Subject line
    pub title: String,
    /// Email body
    pub body: String,
    /// Why the email is written this way for the market
    pub expert_notes: String,
    /// Tips for the sender
    pub suggestions: String,
}

impl OutreachEmail {
    /// Split a marker-delimited reply
    ///
    /// Each part is the trimmed text between its marker and the next one.
    /// A reply without a recognisable body becomes the body as a whole.
    pub fn parse(text: &str) -> Self {
        Self {
            title: section(text, TITLE_MARKER, Some(BODY_MARKER)).unwrap_or_default(),
            body: section(text, BODY_MARKER, Some(NOTES_MARKER))
                .unwrap_or_else(|| text.to_string()),
            expert_notes: section(text, NOTES_MARKER, Some(SUGGESTIONS_MARKER))
                .unwrap_or_default(),
            suggestions: section(text, SUGGESTIONS_MARKER, None).unwrap_or_default(),
        }
    }
}

fn section(text: &str, start: &str, end: Option<&str>) -> Option<String> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    let content = match end {
        Some(end) => &rest[..rest.find(end)?],
        None => rest,
    };
    Some(content.trim().to_string())
}

fn outreach_prompt(inputs: &OutreachInputs, company_line: &str) -> String {
    format!(
        r#"Role: You are a 20-year veteran Foreign Trade Expert (Senior Export Manager).

Input Context:
- Target Market: {market}
- Email Language: {language}
- Product Name: {name}
- Product Category: {category}
- Core Specs: {specs}
- Application Scenarios: {scenario}
- Key USPs: {usps}
{company}

Task:
Generate a high-converting, professional B2B cold outreach email in {language}.

Strategy Guidelines based on Market:
- Europe/USA: Direct, value-driven, high-efficiency, focus on certifications and quality standards.
- Middle East: Respectful, emphasis on company reputation, longevity, and long-term partnership.
- SE Asia: Pragmatic, clear cost-benefit analysis, focus on lead times and reliability.
- Latin America: Warm yet professional, focus on relationship building and local market success.

Structure:
1. Professional Greeting (Market-appropriate).
2. Strong Hook / Value Prop.
3. Company & Product Intro (Customized to context).
4. TOP 3 Selling Points selection.
5. Clear Call to Action (CTA).
6. Professional Sign-off.

Output Requirements (NO TABLES):
Please output in the following blocks:
{title_marker}
[Email Subject Line]
{body_marker}
[Email Content]
{notes_marker}
[1-2 sentences explaining the logic for this market]
{suggestions_marker}
[1-2 improvement tips for the user]

STRICT: Use only {language} for the Title and Body. Use Chinese for Expert Notes and Suggestions."#,
        market = inputs.target_market,
        language = inputs.language,
        name = inputs.product_name,
        category = inputs.product_category,
        specs = inputs.product_specs,
        scenario = inputs.application_scenario,
        usps = inputs.selling_points,
        company = company_line,
        title_marker = TITLE_MARKER,
        body_marker = BODY_MARKER,
        notes_marker = NOTES_MARKER,
        suggestions_marker = SUGGESTIONS_MARKER,
    )
}

/// B2B cold outreach email writer
#[derive(Debug, Clone)]
pub struct OutreachAssistant {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<OutreachInputs, OutreachEmail>,
}

impl OutreachAssistant {
    /// Create the assistant
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, OUTREACH_INPUTS, OUTREACH_RESULT),
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> OutreachInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &OutreachInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last generated email
    pub async fn result(&self) -> OutreachEmail {
        self.slots.results().await
    }

    /// Write an email for the given market and language
    ///
    /// # Errors
    /// * `Validation` if the market or language is blank (nothing is sent)
    pub async fn generate(&self, inputs: OutreachInputs) -> Result<OutreachEmail, AppError> {
        if inputs.target_market.trim().is_empty() || inputs.language.trim().is_empty() {
            return Err(GenerationError::Validation(
                "Target market and language are required".to_string(),
            )
            .into());
        }
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let prompt = outreach_prompt(&inputs, &settings.prompt_line("Company Profile"));
        let result = self
            .client
            .generate_text(&prompt, Some(OUTREACH_SYSTEM), false)
            .await?;

        let email = OutreachEmail::parse(&result.text);
        if email.title.is_empty() {
            tracing::warn!("Outreach reply had no title block, keeping the whole text as body");
        }
        self.slots.set_results(&email).await?;
        Ok(email)
    }

    /// Clear form and email
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }
}
