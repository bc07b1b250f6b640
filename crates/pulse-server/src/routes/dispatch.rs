// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Inbound dispatch endpoint for resource controllers.
//!
//! The event is handed to the dispatcher and the request returns `202` at
//! once; delivery runs detached and never affects this response.

use axum::{
	extract::{rejection::JsonRejection, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};

use pulse_notify_core::DispatchEvent;
use pulse_server_api::{DispatchAcceptedResponse, ErrorResponse};

use crate::{
	api::AppState, api_response::bad_request, auth_middleware::RequireActor, error::ServerError,
};

#[utoipa::path(
    post,
    path = "/internal/dispatch",
    request_body = DispatchEvent,
    responses(
        (status = 202, description = "Event accepted for delivery", body = DispatchAcceptedResponse),
        (status = 400, description = "Malformed event", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "dispatch"
)]
#[tracing::instrument(skip(state, payload), fields(actor = %actor))]
pub async fn dispatch_event(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	payload: Result<Json<DispatchEvent>, JsonRejection>,
) -> impl IntoResponse {
	let Json(event) = match payload {
		Ok(payload) => payload,
		Err(rejection) => {
			return bad_request::<ErrorResponse>("bad_request", rejection.body_text()).into_response();
		}
	};

	if let Err(e) = event.validate() {
		return ServerError::from(e).into_response();
	}

	let accepted_recipients = event.resolved_recipients().len();
	tracing::info!(kind = %event.kind, accepted_recipients, "dispatch event accepted");

	// detached: the report is only logged by the dispatcher
	drop(state.dispatcher.dispatch(event));

	(
		StatusCode::ACCEPTED,
		Json(DispatchAcceptedResponse {
			accepted_recipients,
		}),
	)
		.into_response()
}
