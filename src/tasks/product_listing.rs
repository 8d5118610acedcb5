//! Product listing generator
//!
//! Builds a full marketplace listing from product details: SEO titles,
//! bullet points, technical attributes and image prompts.

use crate::error::AppError;
use crate::generation::{GenerationClient, Schema};
use crate::state::keys::{LISTING_INPUTS, LISTING_RESULTS};
use crate::state::StateStore;
use crate::tasks::settings::Settings;
use crate::tasks::{parse_required, TaskSlots};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product details form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingInputs {
    /// Product parameters, free text
    pub prod_info: String,
    /// Brand name
    pub brand: String,
    /// Core keyword every title ends with
    pub keyword: String,
    /// Reference listing URL
    pub amazon_url: String,
    /// Reference listing bullet points
    pub bullet_points: String,
}

/// One technical attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingAttribute {
    /// Attribute name
    pub param: String,
    /// Attribute value
    pub value: String,
}

/// Generated listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingResults {
    /// Candidate titles
    pub titles: Vec<String>,
    /// Bullet points
    pub bullets: Vec<String>,
    /// Image prompts, main shot first
    pub image_prompts: Vec<String>,
    /// Technical attributes
    pub attributes: Vec<ListingAttribute>,
}

impl ListingResults {
    /// Declared output shape
    pub fn schema() -> Schema {
        let attribute = Schema::object()
            .property("param", Schema::string())
            .property("value", Schema::string())
            .required(["param", "value"]);
        Schema::object()
            .property("titles", Schema::array(Schema::string()))
            .property("bullets", Schema::array(Schema::string()))
            .property("attributes", Schema::array(attribute))
            .property("imagePrompts", Schema::array(Schema::string()))
            .required(["titles", "bullets", "attributes", "imagePrompts"])
    }
}

fn prompt(inputs: &ListingInputs, company: Option<&str>) -> String {
    format!(
        r#"You are a cross-border e-commerce expert specialized in Amazon and Alibaba Global.

CONTEXT:
Brand: {brand}
Core Keyword: {keyword}
Amazon Reference: URL ({url}) | Bullets ({bullets})
Product Details: {info}
Company Context: {company}

TASKS:
1. Generate exactly 5 high-converting SEO product titles.
   Structure: [Important Attribute] + [Product Center Word] + [Attribute Synonyms/Variants] + [Center Word Synonyms/Variants] + [Usage Scene].
   Requirements: Max 128 characters. End with the Core Keyword "{keyword}". NO special symbols except "-" and "/". Capitalize the first letter of every word except prepositions.

2. Generate 5 professional Amazon Bullet Points (Points of Description).

3. Create exactly 10 Technical Attributes (Attribute Value pairs):
   - Product Name: A long-tail SEO keyword based on the core keyword and Google trends, max 50 chars.
   - Dimensions: Based on input or standard size.
   - Weight: Based on input or standard weight.
   - Material: Based on input.
   - Bearing Type: Professional bearing specification.
   - Universal Model: Common industry standard models.
   - ABS Included: Specify "Yes" or "No".
   - Applicable Vehicle: List compatible vehicles or "Universal".
   - Packaging: Default to "Regular Packaging" unless specified.
   - Shipping Time: Default to "7 Days".

4. Generate prompts for 6 product images (1 Main Studio shot, 5 Secondary/Sub images).
   - Requirements: Include "1:1 aspect ratio" in all prompts. Focus on lighting, materials, and angles.

STRICT RULES:
- OUTPUT ALL CONTENT IN ENGLISH ONLY. NO CHINESE CHARACTERS."#,
        brand = inputs.brand,
        keyword = inputs.keyword,
        url = inputs.amazon_url,
        bullets = inputs.bullet_points,
        info = inputs.prod_info,
        company = company.unwrap_or_default(),
    )
}

/// Listing generator
#[derive(Debug, Clone)]
pub struct ProductListing {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<ListingInputs, ListingResults>,
}

impl ProductListing {
    /// Create the task
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, LISTING_INPUTS, LISTING_RESULTS),
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> ListingInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &ListingInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last generated listing
    pub async fn results(&self) -> ListingResults {
        self.slots.results().await
    }

    /// Generate the listing
    pub async fn generate(&self, inputs: ListingInputs) -> Result<ListingResults, AppError> {
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let schema = ListingResults::schema();
        let reply = self
            .client
            .generate_structured::<Value>(&prompt(&inputs, settings.company_context()), &schema, None)
            .await?;
        let results: ListingResults = parse_required(&schema, reply)?;

        if results.titles.len() != 5 {
            tracing::warn!(titles = results.titles.len(), "Listing title count differs from request");
        }
        self.slots.set_results(&results).await?;
        Ok(results)
    }

    /// Clear form and listing
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }
}
