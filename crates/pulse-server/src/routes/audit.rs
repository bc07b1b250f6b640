// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only audit trail listing. There is no endpoint to modify entries.

use axum::{
	extract::{rejection::QueryRejection, Query, State},
	response::IntoResponse,
	Json,
};

use pulse_notify_core::UserId;
use pulse_server_api::{
	AuditEntryResponse, ErrorResponse, ListAuditEntriesParams, ListAuditEntriesResponse,
};
use pulse_server_audit::{AuditAction, AuditEntry};
use pulse_server_db::{AuditQuery, MAX_AUDIT_PAGE_SIZE};

use crate::{
	api::AppState, api_response::bad_request, auth_middleware::RequireActor, error::ServerError,
};

fn build_query(params: ListAuditEntriesParams) -> Result<AuditQuery, String> {
	let action = params
		.action
		.as_deref()
		.map(str::parse::<AuditAction>)
		.transpose()?;
	let actor = params
		.actor
		.as_deref()
		.map(UserId::parse)
		.transpose()
		.map_err(|e| e.to_string())?;
	if let Some(limit) = params.limit {
		if !(1..=MAX_AUDIT_PAGE_SIZE).contains(&limit) {
			return Err(format!("limit must be between 1 and {MAX_AUDIT_PAGE_SIZE}"));
		}
	}
	if params.offset.is_some_and(|o| o < 0) {
		return Err("offset must not be negative".to_string());
	}
	if let (Some(from), Some(to)) = (params.from, params.to) {
		if from > to {
			return Err("'from' must not be after 'to'".to_string());
		}
	}

	Ok(AuditQuery {
		action,
		actor,
		path_prefix: params.path_prefix,
		from: params.from,
		to: params.to,
		limit: params.limit,
		offset: params.offset,
	})
}

fn entry_response(entry: AuditEntry) -> AuditEntryResponse {
	AuditEntryResponse {
		id: entry.id,
		action: entry.action.as_str().to_string(),
		timestamp: entry.timestamp,
		actor_user_id: entry.actor_user_id.map(|id| id.to_string()),
		source_address: entry.source_address,
		request_method: entry.request_method,
		request_path: entry.request_path,
		request_payload: entry.request_payload,
		response_status: entry.response_status,
		response_snapshot: entry.response_snapshot,
	}
}

#[utoipa::path(
    get,
    path = "/audit",
    params(ListAuditEntriesParams),
    responses(
        (status = 200, description = "Matching audit entries, newest first", body = ListAuditEntriesResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "No actor", body = ErrorResponse)
    ),
    tag = "audit"
)]
#[tracing::instrument(skip(state, params), fields(actor = %actor))]
pub async fn list_audit_entries(
	RequireActor(actor): RequireActor,
	State(state): State<AppState>,
	params: Result<Query<ListAuditEntriesParams>, QueryRejection>,
) -> impl IntoResponse {
	let Query(params) = match params {
		Ok(params) => params,
		Err(rejection) => {
			return bad_request::<ErrorResponse>("bad_request", rejection.body_text()).into_response();
		}
	};
	let query = match build_query(params) {
		Ok(query) => query,
		Err(message) => return bad_request::<ErrorResponse>("invalid_filter", message).into_response(),
	};

	match state.audit_repo.list(&query).await {
		Ok((entries, total)) => {
			tracing::debug!(count = entries.len(), total, "audit entries queried");
			Json(ListAuditEntriesResponse {
				entries: entries.into_iter().map(entry_response).collect(),
				total,
			})
			.into_response()
		}
		Err(e) => ServerError::from(e).into_response(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_query_parses_filters() {
		let query = build_query(ListAuditEntriesParams {
			action: Some("delete".to_string()),
			actor: Some("u1".to_string()),
			limit: Some(10),
			..Default::default()
		})
		.unwrap();
		assert_eq!(query.action, Some(AuditAction::Delete));
		assert_eq!(query.actor.unwrap().as_str(), "u1");
		assert_eq!(query.limit, Some(10));
	}

	#[test]
	fn test_build_query_rejects_bad_values() {
		for params in [
			ListAuditEntriesParams {
				action: Some("explode".to_string()),
				..Default::default()
			},
			ListAuditEntriesParams {
				limit: Some(MAX_AUDIT_PAGE_SIZE + 1),
				..Default::default()
			},
			ListAuditEntriesParams {
				offset: Some(-1),
				..Default::default()
			},
			ListAuditEntriesParams {
				actor: Some("not valid".to_string()),
				..Default::default()
			},
		] {
			assert!(build_query(params).is_err());
		}
	}
}
