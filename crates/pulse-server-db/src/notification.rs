// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification ledger repository.
//!
//! Records are created once, after which only the read flag changes. Listing
//! is newest first; `created_at` is stored as fixed-width RFC 3339 so text
//! order matches time order, and ties fall back to insertion order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use pulse_notify_core::{LocalizedText, NewNotification, NotificationId, NotificationRecord, UserId};

use crate::error::{DbError, Result};

#[async_trait]
pub trait NotificationStore: Send + Sync {
	async fn create(&self, new: &NewNotification) -> Result<NotificationRecord>;
	async fn get(&self, id: &NotificationId) -> Result<Option<NotificationRecord>>;
	async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<NotificationRecord>>;
	async fn unread_count(&self, user_id: &UserId) -> Result<u64>;
	/// Idempotent. `DbError::NotFound` if the id is unknown.
	async fn mark_read(&self, id: &NotificationId) -> Result<NotificationRecord>;
	/// Idempotent. `DbError::NotFound` if the id is unknown.
	async fn mark_unread(&self, id: &NotificationId) -> Result<NotificationRecord>;
	/// Returns how many records moved from unread to read.
	async fn mark_all_read(&self, user_id: &UserId) -> Result<u64>;
	async fn delete(&self, id: &NotificationId) -> Result<()>;
	async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64>;
}

#[derive(Clone)]
pub struct NotificationRepository {
	pool: SqlitePool,
}

impl NotificationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	async fn set_read(&self, id: &NotificationId, read: bool) -> Result<NotificationRecord> {
		let row: Option<NotificationRow> = sqlx::query_as(
			r#"
			UPDATE notifications SET is_read = ?
			WHERE id = ?
			RETURNING id, recipient_user_id, kind,
				title_en_us, title_zh_hk, title_zh_cn,
				description_en_us, description_zh_hk, description_zh_cn,
				link, is_read, created_at
			"#,
		)
		.bind(read)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.ok_or_else(|| DbError::NotFound(format!("notification {id}")))?
			.try_into()
	}
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid {field}: {e}")))
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
	id: String,
	recipient_user_id: String,
	kind: String,
	title_en_us: String,
	title_zh_hk: String,
	title_zh_cn: String,
	description_en_us: String,
	description_zh_hk: String,
	description_zh_cn: String,
	link: String,
	is_read: bool,
	created_at: String,
}

impl TryFrom<NotificationRow> for NotificationRecord {
	type Error = DbError;

	fn try_from(row: NotificationRow) -> Result<Self> {
		Ok(NotificationRecord {
			id: row
				.id
				.parse()
				.map_err(|e| DbError::Internal(format!("invalid notification id: {e}")))?,
			recipient_user_id: UserId::parse(row.recipient_user_id)
				.map_err(|e| DbError::Internal(e.to_string()))?,
			kind: row.kind,
			title: LocalizedText {
				en_us: row.title_en_us,
				zh_hk: row.title_zh_hk,
				zh_cn: row.title_zh_cn,
			},
			description: LocalizedText {
				en_us: row.description_en_us,
				zh_hk: row.description_zh_hk,
				zh_cn: row.description_zh_cn,
			},
			link: row.link,
			read: row.is_read,
			created_at: parse_timestamp("created_at", &row.created_at)?,
		})
	}
}

const SELECT_COLUMNS: &str = "id, recipient_user_id, kind, \
	title_en_us, title_zh_hk, title_zh_cn, \
	description_en_us, description_zh_hk, description_zh_cn, \
	link, is_read, created_at";

#[async_trait]
impl NotificationStore for NotificationRepository {
	#[instrument(skip(self, new), fields(recipient = %new.recipient_user_id, kind = %new.kind))]
	async fn create(&self, new: &NewNotification) -> Result<NotificationRecord> {
		let record = NotificationRecord {
			id: NotificationId::new(),
			recipient_user_id: new.recipient_user_id.clone(),
			kind: new.kind.clone(),
			title: new.title.clone(),
			description: new.description.clone(),
			link: new.link.clone(),
			read: false,
			// stored at microsecond precision
			created_at: Utc::now().trunc_subsecs(6),
		};

		sqlx::query(
			r#"
			INSERT INTO notifications (
				id, recipient_user_id, kind,
				title_en_us, title_zh_hk, title_zh_cn,
				description_en_us, description_zh_hk, description_zh_cn,
				link, is_read, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
			"#,
		)
		.bind(record.id.to_string())
		.bind(record.recipient_user_id.as_str())
		.bind(&record.kind)
		.bind(&record.title.en_us)
		.bind(&record.title.zh_hk)
		.bind(&record.title.zh_cn)
		.bind(&record.description.en_us)
		.bind(&record.description.zh_hk)
		.bind(&record.description.zh_cn)
		.bind(&record.link)
		.bind(format_timestamp(&record.created_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(notification_id = %record.id, "notification stored");
		Ok(record)
	}

	#[instrument(skip(self))]
	async fn get(&self, id: &NotificationId) -> Result<Option<NotificationRecord>> {
		let sql = format!("SELECT {SELECT_COLUMNS} FROM notifications WHERE id = ?");
		let row: Option<NotificationRow> = sqlx::query_as(&sql)
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;
		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<NotificationRecord>> {
		let sql = format!(
			"SELECT {SELECT_COLUMNS} FROM notifications \
			 WHERE recipient_user_id = ? \
			 ORDER BY created_at DESC, rowid DESC"
		);
		let rows: Vec<NotificationRow> = sqlx::query_as(&sql)
			.bind(user_id.as_str())
			.fetch_all(&self.pool)
			.await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn unread_count(&self, user_id: &UserId) -> Result<u64> {
		let count: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM notifications WHERE recipient_user_id = ? AND is_read = 0",
		)
		.bind(user_id.as_str())
		.fetch_one(&self.pool)
		.await?;
		Ok(count as u64)
	}

	#[instrument(skip(self))]
	async fn mark_read(&self, id: &NotificationId) -> Result<NotificationRecord> {
		self.set_read(id, true).await
	}

	#[instrument(skip(self))]
	async fn mark_unread(&self, id: &NotificationId) -> Result<NotificationRecord> {
		self.set_read(id, false).await
	}

	#[instrument(skip(self))]
	async fn mark_all_read(&self, user_id: &UserId) -> Result<u64> {
		let result = sqlx::query(
			"UPDATE notifications SET is_read = 1 WHERE recipient_user_id = ? AND is_read = 0",
		)
		.bind(user_id.as_str())
		.execute(&self.pool)
		.await?;
		Ok(result.rows_affected())
	}

	#[instrument(skip(self))]
	async fn delete(&self, id: &NotificationId) -> Result<()> {
		let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("notification {id}")));
		}
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64> {
		let result = sqlx::query("DELETE FROM notifications WHERE recipient_user_id = ?")
			.bind(user_id.as_str())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	fn uid(s: &str) -> UserId {
		UserId::parse(s).unwrap()
	}

	fn new_notification(recipient: &str, title: &str) -> NewNotification {
		NewNotification {
			recipient_user_id: uid(recipient),
			kind: "Create Task".to_string(),
			title: LocalizedText::new(title, "標題", "标题"),
			description: LocalizedText::uniform("desc"),
			link: "/project/p1/task/t1".to_string(),
		}
	}

	async fn make_repo() -> NotificationRepository {
		NotificationRepository::new(create_test_pool().await)
	}

	#[tokio::test]
	async fn test_create_and_get() {
		let repo = make_repo().await;
		let created = repo.create(&new_notification("u1", "hello")).await.unwrap();
		assert!(!created.read);

		let fetched = repo.get(&created.id).await.unwrap().unwrap();
		assert_eq!(fetched.id, created.id);
		assert_eq!(fetched.title.zh_hk, "標題");
		assert_eq!(fetched.recipient_user_id, uid("u1"));
		assert_eq!(fetched.created_at, created.created_at);
	}

	#[tokio::test]
	async fn test_list_is_newest_first_and_scoped() {
		let repo = make_repo().await;
		repo.create(&new_notification("u1", "first")).await.unwrap();
		repo.create(&new_notification("u2", "other")).await.unwrap();
		repo.create(&new_notification("u1", "second")).await.unwrap();
		repo.create(&new_notification("u1", "third")).await.unwrap();

		let list = repo.list_for_user(&uid("u1")).await.unwrap();
		let titles: Vec<_> = list.iter().map(|r| r.title.en_us.as_str()).collect();
		assert_eq!(titles, vec!["third", "second", "first"]);
	}

	#[tokio::test]
	async fn test_list_empty_for_unknown_user() {
		let repo = make_repo().await;
		assert!(repo.list_for_user(&uid("nobody")).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_mark_read_then_unread_restores_state() {
		let repo = make_repo().await;
		let created = repo.create(&new_notification("u1", "x")).await.unwrap();

		let read = repo.mark_read(&created.id).await.unwrap();
		assert!(read.read);
		let again = repo.mark_read(&created.id).await.unwrap();
		assert!(again.read);

		let unread = repo.mark_unread(&created.id).await.unwrap();
		assert!(!unread.read);
		assert_eq!(unread.title, created.title);
		assert_eq!(unread.created_at, created.created_at);
	}

	#[tokio::test]
	async fn test_mark_unknown_is_not_found() {
		let repo = make_repo().await;
		let missing = NotificationId::new();
		assert!(matches!(repo.mark_read(&missing).await, Err(DbError::NotFound(_))));
		assert!(matches!(repo.mark_unread(&missing).await, Err(DbError::NotFound(_))));
		assert!(matches!(repo.delete(&missing).await, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn test_mark_all_read_counts_transitions() {
		let repo = make_repo().await;
		let mut ids = Vec::new();
		for i in 0..7 {
			ids.push(repo.create(&new_notification("u1", &format!("n{i}"))).await.unwrap().id);
		}
		repo.mark_read(&ids[0]).await.unwrap();
		repo.mark_read(&ids[1]).await.unwrap();
		repo.create(&new_notification("u2", "other")).await.unwrap();

		assert_eq!(repo.unread_count(&uid("u1")).await.unwrap(), 5);
		assert_eq!(repo.mark_all_read(&uid("u1")).await.unwrap(), 5);
		assert_eq!(repo.mark_all_read(&uid("u1")).await.unwrap(), 0);
		assert_eq!(repo.unread_count(&uid("u1")).await.unwrap(), 0);
		assert_eq!(repo.unread_count(&uid("u2")).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_delete_and_delete_all() {
		let repo = make_repo().await;
		let a = repo.create(&new_notification("u1", "a")).await.unwrap();
		repo.create(&new_notification("u1", "b")).await.unwrap();
		repo.create(&new_notification("u1", "c")).await.unwrap();
		repo.create(&new_notification("u2", "d")).await.unwrap();

		repo.delete(&a.id).await.unwrap();
		assert!(repo.get(&a.id).await.unwrap().is_none());

		assert_eq!(repo.delete_all_for_user(&uid("u1")).await.unwrap(), 2);
		assert_eq!(repo.delete_all_for_user(&uid("u1")).await.unwrap(), 0);
		assert_eq!(repo.list_for_user(&uid("u2")).await.unwrap().len(), 1);
	}

	#[test]
	fn test_timestamp_format_is_fixed_width() {
		let a = format_timestamp(&"2025-01-01T00:00:00Z".parse().unwrap());
		let b = format_timestamp(&"2025-01-01T00:00:00.5Z".parse().unwrap());
		assert_eq!(a.len(), b.len());
		assert!(a < b);
	}
}
