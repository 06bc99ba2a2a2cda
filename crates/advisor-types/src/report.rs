//! Wire DTOs for the REST surface.
//!
//! The analysis report mirrors the JSON shape the model is instructed to
//! return. The proxy passes the provider's JSON through verbatim, so these
//! types exist for OpenAPI documentation and for consumers that want a typed
//! view; the handler itself does not round-trip the payload through them.
//!
//! Field naming is part of the wire contract and is deliberately mixed:
//! overview fields are camelCase while herb fields use snake_case, matching
//! what the model is prompted to produce.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/analyze`.
///
/// Both fields default to `None` so that an absent key deserializes instead
/// of failing in the extractor; the handler turns absence (like emptiness)
/// into the missing-information response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Free-text symptom description, possibly assembled from preset tags
    #[serde(default)]
    pub user_feeling: Option<String>,
    /// Tongue photo as a base64 data URL
    #[serde(default)]
    pub tongue_image: Option<String>,
}

/// Request body for `POST /api/session/feeling`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeelingRequest {
    #[serde(default)]
    pub user_feeling: Option<String>,
}

/// Overview section of the analysis report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientOverview {
    pub primary_concerns: String,
    pub tongue_analysis: String,
    pub recommendation_basis: String,
}

/// One herb slot in the four-role formula.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HerbEntry {
    pub herb: String,
    pub traditional_name: String,
    pub role: String,
    pub specific_benefits: String,
}

/// The four-role (君臣佐使) herbal formula.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HerbalFormula {
    pub emperor: HerbEntry,
    pub minister: HerbEntry,
    pub assistant: HerbEntry,
    pub courier: HerbEntry,
}

/// Full analysis report as produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub patient_overview: PatientOverview,
    pub herbal_formula: HerbalFormula,
}

/// Error envelope for all 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub message: String,
}

/// Payload for the liveness endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusRes {
    pub status: String,
}

/// Current contents of the two session slots.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user_feeling: Option<String>,
    pub tongue_image: Option<String>,
}

/// Response for `POST /api/session/tongue-image`: the stored data URL plus
/// compression diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredImageRes {
    pub tongue_image: String,
    /// Final JPEG quality in percent (70 down to 20)
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    /// Encoded size in bytes before base64 expansion
    pub bytes: usize,
}
