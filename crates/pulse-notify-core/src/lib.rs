// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Pulse notification pipeline.
//!
//! This crate is shared by the ledger, the dispatcher and the HTTP layer:
//! - [`UserId`] and [`NotificationId`] identifiers with validation
//! - [`NotificationRecord`], the durable ledger record
//! - [`DispatchEvent`], the post-commit event fanned out to recipients
//! - [`PushSubscription`] and [`PushPayload`] for external push delivery
//! - [`ClientMessage`] / [`ServerMessage`], the live channel wire protocol

pub mod error;
pub mod event;
pub mod ids;
pub mod live;
pub mod notification;
pub mod push;

pub use error::ValidationError;
pub use event::DispatchEvent;
pub use ids::{NotificationId, UserId, MAX_USER_ID_LEN};
pub use live::{ClientMessage, ServerMessage};
pub use notification::{LocalizedText, NewNotification, NotificationRecord};
pub use push::{PushKeys, PushPayload, PushSubscription};
