// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{rejection::JsonRejection, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};

use pulse_notify_core::PushSubscription;
use pulse_server_api::{ErrorResponse, SubscribeRequest, SubscribeResponse};

use crate::{
	api::AppState, api_response::bad_request, auth_middleware::RequireActor, error::ServerError,
};

fn validate_subscription(subscription: &PushSubscription) -> Result<(), &'static str> {
	let endpoint = subscription.endpoint.trim();
	if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
		return Err("subscription endpoint must be an http(s) URL");
	}
	if subscription.keys.p256dh.is_empty() || subscription.keys.auth.is_empty() {
		return Err("subscription keys must not be empty");
	}
	Ok(())
}

/// Register (or replace) the push endpoint for a user.
#[utoipa::path(
    post,
    path = "/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription stored", body = SubscribeResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "push"
)]
#[tracing::instrument(skip(state, payload), fields(actor = %actor))]
pub async fn subscribe(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> impl IntoResponse {
	let Json(request) = match payload {
		Ok(payload) => payload,
		Err(rejection) => {
			return bad_request::<ErrorResponse>("bad_request", rejection.body_text()).into_response();
		}
	};

	if let Err(message) = validate_subscription(&request.subscription) {
		return bad_request::<ErrorResponse>("invalid_subscription", message).into_response();
	}

	match state
		.subscriptions
		.upsert(&request.user_id, &request.subscription)
		.await
	{
		Ok(()) => {
			tracing::info!(user_id = %request.user_id, "push subscription registered");
			(
				StatusCode::CREATED,
				Json(SubscribeResponse {
					message: "subscription stored".to_string(),
				}),
			)
				.into_response()
		}
		Err(e) => ServerError::from(e).into_response(),
	}
}
