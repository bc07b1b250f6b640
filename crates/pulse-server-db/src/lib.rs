// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the Pulse server.

pub mod audit;
pub mod error;
pub mod notification;
pub mod pool;
pub mod push_subscription;
pub mod testing;

pub use audit::{AuditQuery, AuditRepository, DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE};
pub use error::{DbError, Result};
pub use notification::{NotificationRepository, NotificationStore};
pub use pool::{create_pool, run_migrations};
pub use push_subscription::{PushSubscriptionRepository, PushSubscriptionStore};
