// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};

use pulse_notify_core::ValidationError;
use pulse_server_api::ErrorResponse;
use pulse_server_audit::AuditError;
use pulse_server_db::DbError;
use pulse_server_notify::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Invalid request: {0}")]
	Validation(#[from] ValidationError),

	/// Audit pipeline could not be set up.
	#[error("Audit setup failed: {0}")]
	Audit(#[from] AuditError),

	/// Push transport could not be set up.
	#[error("Push setup failed: {0}")]
	Push(#[from] DeliveryError),

	#[error("Internal error: {0}")]
	Internal(String),
}

fn body(error: &str, message: impl Into<String>) -> Json<ErrorResponse> {
	Json(ErrorResponse {
		error: error.to_string(),
		message: message.into(),
	})
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error_response) = match &self {
			ServerError::Db(DbError::NotFound(what)) => {
				(StatusCode::NOT_FOUND, body("not_found", format!("{what} not found")))
			}
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					body("database_error", "A database error occurred"),
				)
			}
			ServerError::Validation(e) => (StatusCode::BAD_REQUEST, body("bad_request", e.to_string())),
			ServerError::Audit(e) => {
				tracing::error!(error = %e, "audit error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					body("internal_error", "An internal error occurred"),
				)
			}
			ServerError::Push(e) => {
				tracing::error!(error = %e, "push error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					body("internal_error", "An internal error occurred"),
				)
			}
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					body("internal_error", "An internal error occurred"),
				)
			}
		};

		(status, error_response).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_not_found_maps_to_404() {
		let response = ServerError::Db(DbError::NotFound("notification x".to_string())).into_response();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[test]
	fn test_validation_maps_to_400() {
		let response =
			ServerError::Validation(ValidationError::InvalidNotificationId("x".to_string())).into_response();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[test]
	fn test_internal_db_error_maps_to_500() {
		let response = ServerError::Db(DbError::Internal("boom".to_string())).into_response();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
