// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-user push subscription storage. One subscription per user; a new
//! registration replaces the previous endpoint.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use pulse_notify_core::{PushKeys, PushSubscription, UserId};

use crate::error::Result;
use crate::notification::format_timestamp;

#[async_trait]
pub trait PushSubscriptionStore: Send + Sync {
	async fn upsert(&self, user_id: &UserId, subscription: &PushSubscription) -> Result<()>;
	async fn get(&self, user_id: &UserId) -> Result<Option<PushSubscription>>;
}

#[derive(Clone)]
pub struct PushSubscriptionRepository {
	pool: SqlitePool,
}

impl PushSubscriptionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[derive(sqlx::FromRow)]
struct PushSubscriptionRow {
	endpoint: String,
	p256dh: String,
	auth: String,
}

impl From<PushSubscriptionRow> for PushSubscription {
	fn from(row: PushSubscriptionRow) -> Self {
		PushSubscription {
			endpoint: row.endpoint,
			keys: PushKeys {
				p256dh: row.p256dh,
				auth: row.auth,
			},
		}
	}
}

#[async_trait]
impl PushSubscriptionStore for PushSubscriptionRepository {
	#[instrument(skip(self, subscription))]
	async fn upsert(&self, user_id: &UserId, subscription: &PushSubscription) -> Result<()> {
		let now = format_timestamp(&Utc::now());
		sqlx::query(
			r#"
			INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?)
			ON CONFLICT(user_id) DO UPDATE SET
				endpoint = excluded.endpoint,
				p256dh = excluded.p256dh,
				auth = excluded.auth,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(user_id.as_str())
		.bind(&subscription.endpoint)
		.bind(&subscription.keys.p256dh)
		.bind(&subscription.keys.auth)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user_id, "push subscription stored");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn get(&self, user_id: &UserId) -> Result<Option<PushSubscription>> {
		let row: Option<PushSubscriptionRow> = sqlx::query_as(
			"SELECT endpoint, p256dh, auth FROM push_subscriptions WHERE user_id = ?",
		)
		.bind(user_id.as_str())
		.fetch_optional(&self.pool)
		.await?;
		Ok(row.map(Into::into))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	fn subscription(endpoint: &str) -> PushSubscription {
		PushSubscription {
			endpoint: endpoint.to_string(),
			keys: PushKeys {
				p256dh: "BNcR".to_string(),
				auth: "tBHI".to_string(),
			},
		}
	}

	#[tokio::test]
	async fn test_get_missing_is_none() {
		let repo = PushSubscriptionRepository::new(create_test_pool().await);
		let user = UserId::parse("u1").unwrap();
		assert!(repo.get(&user).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_upsert_replaces_endpoint() {
		let repo = PushSubscriptionRepository::new(create_test_pool().await);
		let user = UserId::parse("u1").unwrap();

		repo.upsert(&user, &subscription("https://push.example/a")).await.unwrap();
		repo.upsert(&user, &subscription("https://push.example/b")).await.unwrap();

		let stored = repo.get(&user).await.unwrap().unwrap();
		assert_eq!(stored.endpoint, "https://push.example/b");
		assert_eq!(stored.keys.auth, "tBHI");
	}
}
