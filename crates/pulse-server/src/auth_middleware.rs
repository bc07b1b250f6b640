// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actor resolution.
//!
//! Authentication happens upstream. The auth layer in front of this service
//! forwards the authenticated user id in a configured header (`x-user-id` by
//! default). [`actor_layer`] turns that header into an [`ActorContext`]
//! request extension, and [`RequireActor`] rejects requests without one.
//!
//! A header whose value is not a valid user id is treated as absent.

use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{request::Parts, HeaderMap, HeaderName, Request},
	middleware::Next,
	response::{IntoResponse, Response},
};
use tracing::instrument;

use pulse_notify_core::UserId;
use pulse_server_api::ErrorResponse;

use crate::api::AppState;
use crate::api_response::unauthorized;

/// Resolved actor for the current request.
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
	pub actor: Option<UserId>,
}

impl ActorContext {
	pub fn from_headers(headers: &HeaderMap, header: &HeaderName) -> Self {
		let actor = headers
			.get(header)
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.and_then(|v| match UserId::parse(v) {
				Ok(id) => Some(id),
				Err(e) => {
					tracing::debug!(error = %e, "ignoring malformed actor header");
					None
				}
			});
		Self { actor }
	}
}

pub async fn actor_layer(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let ctx = ActorContext::from_headers(request.headers(), &state.actor_header);
	request.extensions_mut().insert(ctx);
	next.run(request).await
}

/// Extractor that requires an actor.
///
/// Returns 401 Unauthorized when the request carries no valid actor header.
pub struct RequireActor(pub UserId);

impl<S> FromRequestParts<S> for RequireActor
where
	S: Send + Sync,
{
	type Rejection = Response;

	#[instrument(name = "RequireActor::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let ctx = parts
			.extensions
			.get::<ActorContext>()
			.cloned()
			.unwrap_or_default();

		match ctx.actor {
			Some(actor) => {
				tracing::debug!(user_id = %actor, "actor required: present");
				Ok(RequireActor(actor))
			}
			None => {
				tracing::debug!("actor required: missing");
				Err(unauthorized::<ErrorResponse>("unauthorized", "Authentication required").into_response())
			}
		}
	}
}
