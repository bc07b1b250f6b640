// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification ledger HTTP handlers.
//!
//! Any actor may act on any user's records; ownership is enforced by the
//! upstream auth layer.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};

use pulse_notify_core::{NotificationId, NotificationRecord};
use pulse_server_api::{CountResponse, ErrorResponse};

use crate::{
	api::AppState,
	auth_middleware::RequireActor,
	error::ServerError,
	parse_id,
	validation::{parse_notification_id, parse_user_id},
};

#[utoipa::path(
    get,
    path = "/notifications/{id}",
    params(("id" = String, Path, description = "Recipient user id")),
    responses(
        (status = 200, description = "Records for the user, newest first", body = [NotificationRecord]),
        (status = 400, description = "Malformed user id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn list_notifications(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> impl IntoResponse {
	let user_id = parse_id!(parse_user_id(&user_id));

	match state.notifications.list_for_user(&user_id).await {
		Ok(records) => Json(records).into_response(),
		Err(e) => ServerError::from(e).into_response(),
	}
}

#[utoipa::path(
    get,
    path = "/notifications/{id}/unread-count",
    params(("id" = String, Path, description = "Recipient user id")),
    responses(
        (status = 200, description = "Unread record count", body = CountResponse),
        (status = 400, description = "Malformed user id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn unread_count(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> impl IntoResponse {
	let user_id = parse_id!(parse_user_id(&user_id));

	match state.notifications.unread_count(&user_id).await {
		Ok(count) => Json(CountResponse { count }).into_response(),
		Err(e) => ServerError::from(e).into_response(),
	}
}

async fn set_read(state: &AppState, id: &NotificationId, read: bool) -> axum::response::Response {
	let result = if read {
		state.notifications.mark_read(id).await
	} else {
		state.notifications.mark_unread(id).await
	};
	match result {
		Ok(record) => {
			tracing::debug!(notification_id = %id, read, "notification read state set");
			Json(record).into_response()
		}
		Err(e) => ServerError::from(e).into_response(),
	}
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated record", body = NotificationRecord),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn mark_read(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> impl IntoResponse {
	let id = parse_id!(parse_notification_id(&id));
	set_read(&state, &id, true).await
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/unread",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated record", body = NotificationRecord),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn mark_unread(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> impl IntoResponse {
	let id = parse_id!(parse_notification_id(&id));
	set_read(&state, &id, false).await
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/readAll",
    params(("id" = String, Path, description = "Recipient user id")),
    responses(
        (status = 200, description = "Records moved from unread to read", body = CountResponse),
        (status = 400, description = "Malformed user id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn mark_all_read(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> impl IntoResponse {
	let user_id = parse_id!(parse_user_id(&user_id));

	match state.notifications.mark_all_read(&user_id).await {
		Ok(count) => {
			tracing::info!(user_id = %user_id, count, "marked all notifications read");
			Json(CountResponse { count }).into_response()
		}
		Err(e) => ServerError::from(e).into_response(),
	}
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn delete_notification(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> impl IntoResponse {
	let id = parse_id!(parse_notification_id(&id));

	match state.notifications.delete(&id).await {
		Ok(()) => StatusCode::NO_CONTENT.into_response(),
		Err(e) => ServerError::from(e).into_response(),
	}
}

#[utoipa::path(
    delete,
    path = "/notifications/user/{id}",
    params(("id" = String, Path, description = "Recipient user id")),
    responses(
        (status = 200, description = "Records deleted", body = CountResponse),
        (status = 400, description = "Malformed user id", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "notifications"
)]
#[tracing::instrument(skip(state), fields(actor = %actor))]
pub async fn delete_all_notifications(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> impl IntoResponse {
	let user_id = parse_id!(parse_user_id(&user_id));

	match state.notifications.delete_all_for_user(&user_id).await {
		Ok(count) => {
			tracing::info!(user_id = %user_id, count, "deleted all notifications");
			Json(CountResponse { count }).into_response()
		}
		Err(e) => ServerError::from(e).into_response(),
	}
}
