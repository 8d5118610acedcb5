//! Product fission
//!
//! Turns a reference marketplace listing into an optimised variant: title,
//! bullet points and image prompts, as structured output.

use crate::error::AppError;
use crate::generation::{GenerationClient, Schema};
use crate::state::keys::{FISSION_INPUTS, FISSION_RESULTS};
use crate::state::StateStore;
use crate::tasks::settings::Settings;
use crate::tasks::{parse_required, TaskSlots};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference listing form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FissionInputs {
    /// Reference product URL
    pub amazon_url: String,
    /// Brand name
    pub brand: String,
    /// Core keyword
    pub keyword: String,
}

/// Generated listing variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FissionResults {
    /// Optimised title
    pub title: String,
    /// Bullet points
    pub bullets: Vec<String>,
    /// Prompt for the main studio image
    pub main_image_prompt: String,
    /// Prompts for the secondary images
    pub sub_image_prompts: Vec<String>,
}

impl FissionResults {
    /// Declared output shape; every field is required
    pub fn schema() -> Schema {
        Schema::object()
            .property("title", Schema::string())
            .property("bullets", Schema::array(Schema::string()))
            .property("mainImagePrompt", Schema::string())
            .property("subImagePrompts", Schema::array(Schema::string()))
            .required(["title", "bullets", "mainImagePrompt", "subImagePrompts"])
    }
}

fn prompt(inputs: &FissionInputs, company: Option<&str>) -> String {
    format!(
        r#"Amazon URL: {url}
Brand Name: {brand}
Core Keyword: {keyword}
Company Info: {company}

TASK: Parse the Amazon product and create a "fission" version (a new variant optimization).
1. Optimized Title: Max 128 chars, Title Case, no symbols except - and /.
2. Product 5 Bullet Points: English only, high conversion focus.
3. 6 Image Prompts for Nano Banana Pro:
   - 1 Main Image (Amazon standard studio shot)
   - 5 Sub Images (Features, Detail, Environment, Multi-angle, Packaging)
   - Requirement: Specify 1:1 aspect ratio in each prompt.

OUTPUT ENGLISH ONLY."#,
        url = inputs.amazon_url,
        brand = inputs.brand,
        keyword = inputs.keyword,
        company = company.unwrap_or_default(),
    )
}

/// Listing variant generator
#[derive(Debug, Clone)]
pub struct ProductFission {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<FissionInputs, FissionResults>,
}

impl ProductFission {
    /// Create the task
    pub fn new(client: GenerationClient, store: StateStore) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, FISSION_INPUTS, FISSION_RESULTS),
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> FissionInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &FissionInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last generated variant
    pub async fn results(&self) -> FissionResults {
        self.slots.results().await
    }

    /// Generate a variant listing
    ///
    /// # Errors
    /// * `SchemaParse` if the reply is not JSON or lacks a required field
    pub async fn generate(&self, inputs: FissionInputs) -> Result<FissionResults, AppError> {
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let schema = FissionResults::schema();
        let reply = self
            .client
            .generate_structured::<Value>(&prompt(&inputs, settings.company_context()), &schema, None)
            .await?;
        let results: FissionResults = parse_required(&schema, reply)?;

        self.slots.set_results(&results).await?;
        Ok(results)
    }

    /// Clear form and variant
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::tasks::test_support::{client_for, mock_text, TEXT_PATH};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_generate_sends_schema_and_persists() {
        let mut server = Server::new_async().await;
        let reply = json!({
            "title": "Wheel Hub Bearing - Front",
            "bullets": ["One", "Two"],
            "mainImagePrompt": "studio shot, 1:1",
            "subImagePrompts": ["detail, 1:1"]
        })
        .to_string();
        let mock = server
            .mock("POST", TEXT_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .with_status(200)
            .with_body(crate::tasks::test_support::text_body(&reply))
            .create_async()
            .await;
        let task = ProductFission::new(client_for(&server), StateStore::in_memory());

        let results = task
            .generate(FissionInputs {
                brand: "Acme".to_string(),
                ..FissionInputs::default()
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(results.bullets, ["One", "Two"]);
        assert_eq!(task.results().await, results);
        assert_eq!(task.inputs().await.brand, "Acme");
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_required_field_is_schema_error() {
        let mut server = Server::new_async().await;
        let _mock = mock_text(&mut server, TEXT_PATH, r#"{"title": "Only a title"}"#).await;
        let task = ProductFission::new(client_for(&server), StateStore::in_memory());

        let err = task.generate(FissionInputs::default()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Generation(GenerationError::SchemaParse { .. })
        ));
        assert_eq!(task.results().await, FissionResults::default());
    }
}
