// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Failure of a single live or push delivery attempt. Never surfaced to API callers.
#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("live session outbound queue is full")]
	QueueFull,

	#[error("live session is disconnected")]
	Disconnected,

	#[error("push subscription expired (status {0})")]
	SubscriptionExpired(u16),

	#[error("push service rejected delivery with status {0}")]
	Rejected(u16),

	#[error("invalid push endpoint: {0}")]
	InvalidEndpoint(String),

	#[error("push transport error: {0}")]
	Transport(#[from] reqwest::Error),
}
