// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External push delivery.
//!
//! [`PushDeliveryAdapter::send`] is the only entry point the dispatcher uses.
//! It never returns an error: every transport failure is logged with the
//! recipient and reported as [`PushOutcome::Failed`]. There is no retry.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use pulse_notify_core::{PushPayload, PushSubscription, UserId};
use pulse_server_config::PushConfig;

use crate::error::DeliveryError;

#[async_trait]
pub trait PushTransport: Send + Sync {
	async fn send(
		&self,
		subscription: &PushSubscription,
		payload: &PushPayload,
	) -> Result<(), DeliveryError>;
}

/// POSTs the JSON payload to the subscription endpoint.
///
/// Message encryption and VAPID signing are the responsibility of the push
/// gateway behind the endpoint.
pub struct HttpPushTransport {
	client: reqwest::Client,
	ttl: HeaderValue,
}

impl HttpPushTransport {
	pub fn new(config: &PushConfig) -> Result<Self, DeliveryError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}
		Ok(Self {
			client: builder.build()?,
			ttl: HeaderValue::from(config.ttl_secs),
		})
	}
}

#[async_trait]
impl PushTransport for HttpPushTransport {
	async fn send(
		&self,
		subscription: &PushSubscription,
		payload: &PushPayload,
	) -> Result<(), DeliveryError> {
		let url = reqwest::Url::parse(&subscription.endpoint)
			.map_err(|e| DeliveryError::InvalidEndpoint(format!("{}: {e}", subscription.endpoint)))?;
		if !matches!(url.scheme(), "https" | "http") {
			return Err(DeliveryError::InvalidEndpoint(format!(
				"unsupported scheme '{}'",
				url.scheme()
			)));
		}

		let response = self
			.client
			.post(url)
			.header("TTL", self.ttl.clone())
			.header("Urgency", "normal")
			.header(CONTENT_TYPE, "application/json")
			.json(payload)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}
		if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
			return Err(DeliveryError::SubscriptionExpired(status.as_u16()));
		}
		Err(DeliveryError::Rejected(status.as_u16()))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
	Delivered,
	Failed,
	Disabled,
}

pub struct PushDeliveryAdapter {
	transport: Arc<dyn PushTransport>,
	enabled: bool,
}

impl PushDeliveryAdapter {
	pub fn new(transport: Arc<dyn PushTransport>, enabled: bool) -> Self {
		Self { transport, enabled }
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	#[instrument(skip(self, subscription, payload), fields(recipient = %recipient))]
	pub async fn send(
		&self,
		recipient: &UserId,
		subscription: &PushSubscription,
		payload: &PushPayload,
	) -> PushOutcome {
		if !self.enabled {
			return PushOutcome::Disabled;
		}

		match self.transport.send(subscription, payload).await {
			Ok(()) => {
				debug!("push delivered");
				PushOutcome::Delivered
			}
			Err(e @ DeliveryError::SubscriptionExpired(_)) => {
				warn!(channel = "push", error = %e, "push subscription no longer valid");
				PushOutcome::Failed
			}
			Err(e) => {
				warn!(channel = "push", error = %e, "push delivery failed");
				PushOutcome::Failed
			}
		}
	}
}
