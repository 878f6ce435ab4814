use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snafu::Snafu;

use crate::service::EngagementError;

#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(transparent)]
    Engagement { source: EngagementError },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engagement { source } => match source {
                EngagementError::VideoNotFound { .. } => StatusCode::NOT_FOUND,
                EngagementError::EmptyComment { .. } => StatusCode::BAD_REQUEST,
                EngagementError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }

        let body = Json(serde_json::json!({ "message": self.to_string() }));

        (status, body).into_response()
    }
}
