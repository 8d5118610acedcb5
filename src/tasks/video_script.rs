//! Video script assistant
//!
//! Generates a scene-by-scene promotional video script as structured output,
//! then renders individual scenes (or all of them) as video jobs through the
//! operation tracker.

use crate::error::AppError;
use crate::generation::{
    FailureReason, GenerationClient, GenerationError, Operation, Schema, VideoAspectRatio,
};
use crate::state::keys::{VIDEO_SCRIPT_DATA, VIDEO_SCRIPT_INPUTS};
use crate::state::StateStore;
use crate::tasks::settings::Settings;
use crate::tasks::{parse_required, TaskSlots};
use crate::tracker::{
    BatchSupervisor, OperationPoller, OperationTracker, TrackedVideo, TrackerPolicy,
    TrackerRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SYSTEM: &str = "You are an expert video producer. Output strictly valid JSON.";

/// Script request form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoScriptInputs {
    /// Product description
    pub product_desc: String,
    /// Platforms the video is cut for
    pub platforms: Vec<String>,
    /// Target market
    pub target_market: String,
    /// Visual style
    pub video_style: String,
}

impl Default for VideoScriptInputs {
    fn default() -> Self {
        Self {
            product_desc: "High-precision wheel hub bearing, wear and heat resistant, fits many premium models"
                .to_string(),
            platforms: vec!["TikTok".to_string(), "YouTube".to_string()],
            target_market: "USA".to_string(),
            video_style: "Cinematic Product Showcase".to_string(),
        }
    }
}

/// One scene of a script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scene {
    /// Scene number
    pub id: i64,
    /// What is on screen
    pub visual_description: String,
    /// Music and sound
    pub audio_bgm: String,
    /// Scene length, free text
    pub duration: String,
    /// Narration
    pub voiceover: String,
    /// On-screen text
    pub subtitles: String,
    /// Production notes, may be empty
    pub notes: String,
    /// Prompt for the video model
    pub veo_prompt: String,
}

/// Post copy for one platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformPost {
    /// Platform name
    pub platform: String,
    /// Post text
    pub content: String,
}

/// A generated video script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptData {
    /// Video title
    pub title: String,
    /// Total length, free text
    pub duration: String,
    /// Orientation, free text such as "9:16 Portrait"
    pub aspect_ratio: String,
    /// Creative concept
    pub concept: String,
    /// Scenes in order
    pub scenes: Vec<Scene>,
    /// Accompanying post per platform
    pub platform_posts: Vec<PlatformPost>,
}

impl ScriptData {
    /// Declared output shape; scene notes are optional
    pub fn schema() -> Schema {
        let scene = Schema::object()
            .property("id", Schema::integer())
            .property("visualDescription", Schema::string())
            .property("audioBgm", Schema::string())
            .property("duration", Schema::string())
            .property("voiceover", Schema::string())
            .property("subtitles", Schema::string())
            .property("notes", Schema::string())
            .property("veoPrompt", Schema::string())
            .required([
                "id",
                "visualDescription",
                "audioBgm",
                "duration",
                "voiceover",
                "subtitles",
                "veoPrompt",
            ]);
        let post = Schema::object()
            .property("platform", Schema::string())
            .property("content", Schema::string())
            .required(["platform", "content"]);
        Schema::object()
            .property("title", Schema::string())
            .property("duration", Schema::string())
            .property("aspectRatio", Schema::string())
            .property("concept", Schema::string())
            .property("scenes", Schema::array(scene))
            .property("platformPosts", Schema::array(post))
            .required([
                "title",
                "duration",
                "aspectRatio",
                "concept",
                "scenes",
                "platformPosts",
            ])
    }

    /// Orientation for rendering scenes
    pub fn video_aspect_ratio(&self) -> VideoAspectRatio {
        VideoAspectRatio::from_description(&self.aspect_ratio)
    }

    /// Scene by id
    pub fn scene(&self, id: i64) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }
}

fn prompt(inputs: &VideoScriptInputs, company_line: &str) -> String {
    format!(
        r#"Role: You are a 20-year veteran Video Director and Global Social Media Strategist.

INPUTS:
- Product Description: {desc}
- Platforms: {platforms}
- Target Market: {market}
- Style: {style}
{company}

TASK:
Create a detailed, interactive video script structured for high conversion.

SCENE REQUIREMENTS:
For each scene, provide a "veoPrompt" which is a highly descriptive English paragraph for the Veo 3.1 video generation model. It must describe lighting, materials, motion, and camera angles.

OUTPUT FORMAT: JSON ONLY"#,
        desc = inputs.product_desc,
        platforms = inputs.platforms.join(", "),
        market = inputs.target_market,
        style = inputs.video_style,
        company = company_line,
    )
}

/// Script writer and scene renderer
#[derive(Debug, Clone)]
pub struct VideoScriptAssistant {
    client: GenerationClient,
    settings: Settings,
    slots: TaskSlots<VideoScriptInputs, Option<ScriptData>>,
    policy: TrackerPolicy,
    registry: TrackerRegistry,
}

impl VideoScriptAssistant {
    /// Create the assistant
    ///
    /// # Arguments
    /// * `client` - Generation client used for scripts and video jobs
    /// * `store` - State store holding the form and the script
    /// * `policy` - Polling policy for scene renders
    /// * `registry` - Registry shared with every other tracker in the process
    pub fn new(
        client: GenerationClient,
        store: StateStore,
        policy: TrackerPolicy,
        registry: TrackerRegistry,
    ) -> Self {
        Self {
            client,
            settings: Settings::new(store.clone()),
            slots: TaskSlots::new(store, VIDEO_SCRIPT_INPUTS, VIDEO_SCRIPT_DATA),
            policy,
            registry,
        }
    }

    /// Persisted form
    pub async fn inputs(&self) -> VideoScriptInputs {
        self.slots.inputs().await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &VideoScriptInputs) -> Result<(), AppError> {
        Ok(self.slots.set_inputs(inputs).await?)
    }

    /// Last generated script, `None` before the first run
    pub async fn script(&self) -> Option<ScriptData> {
        self.slots.results().await
    }

    /// Generate and persist a script
    ///
    /// # Errors
    /// * `Validation` if the description is blank or no platform is selected
    /// * `SchemaParse` if the reply is not a complete script
    pub async fn generate_script(&self, inputs: VideoScriptInputs) -> Result<ScriptData, AppError> {
        if inputs.product_desc.trim().is_empty() || inputs.platforms.is_empty() {
            return Err(GenerationError::Validation(
                "Enter a product description and select at least one platform".to_string(),
            )
            .into());
        }
        self.slots.set_inputs(&inputs).await?;

        let settings = self.settings.get().await;
        let schema = ScriptData::schema();
        let prompt = prompt(&inputs, &settings.prompt_line("Company Background"));
        let reply = self
            .client
            .generate_structured::<Value>(&prompt, &schema, Some(SYSTEM))
            .await?;
        let script: ScriptData = parse_required(&schema, reply)?;

        self.slots.set_results(&Some(script.clone())).await?;
        tracing::info!(
            title = %script.title,
            scenes = script.scenes.len(),
            "Video script generated"
        );
        Ok(script)
    }

    /// Supervisor for `render_all_scenes`; subscribe to it for batch progress
    pub fn supervisor(&self) -> BatchSupervisor {
        BatchSupervisor::new(self.poller(), self.policy)
    }

    /// Submit the video job for one scene of the persisted script
    ///
    /// # Errors
    /// * `InvalidRequest` if there is no script or no scene with this id
    pub async fn start_scene(&self, scene_id: i64) -> Result<Operation, AppError> {
        let script = self.require_script().await?;
        let scene = script
            .scene(scene_id)
            .ok_or_else(|| AppError::InvalidRequest(format!("No scene with id {}", scene_id)))?;
        let operation = self
            .client
            .start_video_generation(&scene.veo_prompt, script.video_aspect_ratio())
            .await?;
        Ok(operation)
    }

    /// Render one scene and wait for its video
    pub async fn render_scene(
        &self,
        scene_id: i64,
        cancel: CancellationToken,
    ) -> Result<TrackedVideo, AppError> {
        let operation = self.start_scene(scene_id).await?;
        let claim = self
            .registry
            .claim(&operation.handle)
            .ok_or_else(|| AppError::OperationInUse(operation.handle.clone()))?;

        let tracker = OperationTracker::new(self.poller(), operation, self.policy).with_claim(claim);
        Ok(tracker.track(cancel).await?)
    }

    /// Render every scene of `script`
    ///
    /// Jobs are submitted in scene order, each claimed in the registry, and
    /// then tracked side by side. Outcomes are in scene order; a scene whose
    /// submission failed carries that error and is not tracked.
    pub async fn render_all_scenes(
        &self,
        script: &ScriptData,
        supervisor: &BatchSupervisor,
        cancel: CancellationToken,
    ) -> Vec<Result<TrackedVideo, GenerationError>> {
        let ratio = script.video_aspect_ratio();

        let mut jobs = Vec::with_capacity(script.scenes.len());
        for scene in &script.scenes {
            let job = match self
                .client
                .start_video_generation(&scene.veo_prompt, ratio)
                .await
            {
                Ok(operation) => match self.registry.claim(&operation.handle) {
                    Some(claim) => Ok(supervisor.tracker(operation).with_claim(claim)),
                    None => Err(GenerationError::operation(
                        &operation.handle,
                        FailureReason::AlreadyTracked,
                    )),
                },
                Err(e) => {
                    tracing::warn!(scene = scene.id, error = %e, "Scene render not submitted");
                    Err(e)
                }
            };
            jobs.push(job);
        }

        supervisor.track_all(jobs, cancel).await
    }

    /// Clear form and script
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.slots.reset().await?)
    }

    async fn require_script(&self) -> Result<ScriptData, AppError> {
        self.script()
            .await
            .ok_or_else(|| AppError::InvalidRequest("No script has been generated yet".to_string()))
    }

    fn poller(&self) -> Arc<dyn OperationPoller> {
        Arc::new(self.client.clone())
    }
}
