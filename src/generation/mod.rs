//! Generation module
//!
//! Uniform access to the generative service: text, grounded text, structured
//! data, images, image-to-prompt inversion and long-running video jobs.
//! Each modality keeps its request building and response normalisation in its
//! own module; `GenerationClient` is the only type that talks to the network.

pub mod api_client;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini_types;
pub mod image;
pub mod operation;
pub mod request;
pub mod schema;
pub mod structured;
pub mod text;
pub mod video;

pub use client::GenerationClient;
pub use config::GenerationConfig;
pub use credentials::{ApiKeyProvider, EnvApiKey, StaticApiKey};
pub use error::{FailureReason, GenerationError, ServiceErrorKind};
pub use operation::{Operation, OperationStatus};
pub use request::{
    GenerationOutcome, GenerationRequest, ImageArtifact, ImageOptions, ImageResult, Modality,
    Source, SourceMedia, StructuredResult, TextResult, VideoAspectRatio,
};
pub use schema::Schema;
