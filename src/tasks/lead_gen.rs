//! Lead generation
//!
//! Web-grounded prospect research. The report and the sources the service
//! cited are persisted together.

use crate::error::AppError;
use crate::generation::{GenerationClient, Source};
use crate::state::keys::{LEADGEN_INPUTS, LEADGEN_RESULTS};
use crate::state::StateStore;
use crate::tasks::settings::Settings;
use crate::tasks::TaskSlots;
use serde::{Deserialize, Serialize};

const SYSTEM: &str = "You are a professional foreign trade prospecting expert.";

/// Prospect research form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadGenInputs {
    /// Industry
    pub industry: String,
    /// Product keyword
    pub keyword: String,
    /// Target markets, free text
    pub target_market: String,
    /// Kind of buyer sought
    pub user_portrait: String,
    /// Selling points to pitch
    pub selling_points: String,
}

impl Default for LeadGenInputs {
    fn default() -> Self {
        Self {
            industry: "Auto parts".to_string(),
            keyword: "Wheel Hub Bearing".to_string(),
            target_market: "Europe, North America, Middle East, South America, CIS".to_string(),
            user_portrait: "Brand owners, distributors".to_string(),
            selling_points: "High sensitivity, good looks, fast shipping".to_string(),
        }
    }
}

/// Research report with its citations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadGenResults {
    /// Markdown report
    pub analysis: String,
    /// Cited web sources in service order
    pub sources: Vec<Source>,
}

fn prompt(inputs: &LeadGenInputs, company: Option<&str>) -> String {
    format!(
        r#"Role: You are a foreign trade sales representative with 10 years of experience in customer development. You are strong at collecting and organising information and at market research, you identify customer pain points precisely and give workable plans for winning customers.

Goal:
Use the industry keyword and buyer profile below to dig up relevant customer information so I can start developing these customers.

Background:
Industry: {industry}
Product keyword: {keyword}
Target market: {market}
Buyer profile: {portrait} dealing in {keyword}.
Selling points: {points}
Company background: {company}

Constraints:
Be precise, logical and practical. Do not invent data; everything must be verifiable. Understand each customer's business basics, core product lines, market position and competitive strengths, and find the entry point for approaching them.

Workflow:
1. Analyse the industry keyword and buyer profile to identify exactly which customers are needed.
2. Use Google Search over public sources: company websites, marketplaces, LinkedIn, Facebook and other public material.
3. Give at least 10 verifiable businesses (prioritise quality and authenticity over count).

Output format:
A Markdown table with these columns:
1. Company basics (name, website, summary, founding year)
2. Related products (core product lines, main markets)
3. Contact approach (email, social media angle)
4. Cooperation entry point (a concrete development strategy built on: {points})

List the real source URLs you cited below the table."#,
        industry = inputs.industry,
        keyword = inputs.keyword,
        market = inputs.target_market,
        portrait = inputs.user_portrait,
        points = inputs.selling_points,
        company = company.unwrap_or("Not provided"),
    )
}

/// Prospect research assistant
#[derive(Debug, Clone)]
pub struct LeadGenAssistant {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<LeadGenInputs, LeadGenResults>,
}

impl LeadGenAssistant {
    /// Create the assistant
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, LEADGEN_INPUTS, LEADGEN_RESULTS),
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> LeadGenInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &LeadGenInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last report
    pub async fn results(&self) -> LeadGenResults {
        self.slots.results().await
    }

    /// Run grounded research and persist the report with its sources
    pub async fn generate(&self, inputs: LeadGenInputs) -> Result<LeadGenResults, AppError> {
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let prompt = prompt(&inputs, settings.company_context());
        let result = self.client.generate_text(&prompt, Some(SYSTEM), true).await?;

        let results = LeadGenResults {
            analysis: result.text,
            sources: result.sources,
        };
        self.slots.set_results(&results).await?;
        tracing::info!(
            keyword = %inputs.keyword,
            sources = results.sources.len(),
            "Lead research complete"
        );
        Ok(results)
    }

    /// Clear form and report
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }
}
