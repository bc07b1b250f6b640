// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod audit;
mod auth;
mod database;
mod http;
mod live;
mod logging;
mod push;

pub use audit::{AuditConfig, AuditConfigLayer, QueueOverflowPolicy};
pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use live::{LiveConfig, LiveConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use push::{PushConfig, PushConfigLayer};
