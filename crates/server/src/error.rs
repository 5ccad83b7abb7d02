use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use locscout_common::LocScoutError;
use std::fmt;
use tracing::{error, warn};

use crate::types::ErrorResponse;

/// HTTP wrapper around [`LocScoutError`]
#[derive(Debug)]
pub struct ApiError(pub LocScoutError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<LocScoutError> for ApiError {
    fn from(err: LocScoutError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.0.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(LocScoutError::provider_unavailable("down"));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(LocScoutError::invalid_query("dim"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
