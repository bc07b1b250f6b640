// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification fan-out for Pulse.
//!
//! - [`ConnectionRegistry`]: which user currently holds a live session
//! - [`PushDeliveryAdapter`]: best-effort delivery through an external push service
//! - [`Dispatcher`]: turns a [`pulse_notify_core::DispatchEvent`] into ledger rows,
//!   live frames and push messages, independently per recipient

pub mod dispatch;
pub mod error;
pub mod push;
pub mod registry;

pub use dispatch::{DispatchReport, Dispatcher};
pub use error::DeliveryError;
pub use push::{HttpPushTransport, PushDeliveryAdapter, PushOutcome, PushTransport};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, RegistryStats};
