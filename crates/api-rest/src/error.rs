//! Mapping from core errors to client-visible responses.
//!
//! Every failure renders as `{ "message": ... }` with a status from the
//! taxonomy: missing input and bad images are the caller's to fix (4xx),
//! provider trouble is reported with whatever detail the provider gave (502),
//! and anything unexpected collapses to a generic 500.

use advisor_core::AdvisorError;
use advisor_imaging::ImagingError;
use advisor_types::report::ApiMessage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required information (userFeeling or tongueImage)")]
    MissingInformation,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Could not read the uploaded image: {0}")]
    Image(ImagingError),

    #[error("The photo is too large to store even after compression; please retry with a smaller image")]
    ImageTooLarge,

    #[error("Analysis provider error: {detail}")]
    Provider { status: u16, detail: String },

    #[error("Could not reach the analysis provider: {0}")]
    ProviderUnreachable(String),

    #[error("The analysis provider returned an unreadable response")]
    UnreadableCompletion,

    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error("Internal server error")]
    Internal(#[source] AdvisorError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInformation => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Image(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Provider { .. } => StatusCode::BAD_GATEWAY,
            ApiError::ProviderUnreachable(_) => StatusCode::BAD_GATEWAY,
            ApiError::UnreadableCompletion => StatusCode::BAD_GATEWAY,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::SlotCapacity { .. } => ApiError::ImageTooLarge,
            // Decode and payload failures are the caller's to fix; an encode
            // failure is ours.
            AdvisorError::Imaging(e) => match e {
                ImagingError::Encode(_) => ApiError::Internal(AdvisorError::Imaging(e)),
                other => ApiError::Image(other),
            },
            AdvisorError::Provider { status, detail } => ApiError::Provider { status, detail },
            AdvisorError::ProviderRequest(e) => ApiError::ProviderUnreachable(e.to_string()),
            AdvisorError::EmptyCompletion | AdvisorError::MalformedCompletion(_) => {
                ApiError::UnreadableCompletion
            }
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (
            status,
            Json(ApiMessage {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
