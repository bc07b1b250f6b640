// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-recipient fan-out of dispatch events.
//!
//! For every resolved recipient the ledger row is written first. Live and push
//! delivery only happen once the row exists, and each recipient runs in its own
//! task so a failure for one never affects another.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use pulse_notify_core::{DispatchEvent, PushPayload, ServerMessage, UserId};
use pulse_server_db::{NotificationStore, PushSubscriptionStore};

use crate::push::{PushDeliveryAdapter, PushOutcome};
use crate::registry::ConnectionRegistry;

/// Counters for one dispatched event, summed over its recipients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
	pub recipients: usize,
	pub ledger_written: usize,
	pub ledger_failed: usize,
	pub live_delivered: usize,
	/// Recipient had no live session.
	pub live_skipped: usize,
	pub live_failed: usize,
	pub push_attempted: usize,
	pub push_failed: usize,
	/// Push disabled, no subscription, or subscription lookup failed.
	pub push_skipped: usize,
}

impl DispatchReport {
	fn absorb(&mut self, other: DispatchReport) {
		self.recipients += other.recipients;
		self.ledger_written += other.ledger_written;
		self.ledger_failed += other.ledger_failed;
		self.live_delivered += other.live_delivered;
		self.live_skipped += other.live_skipped;
		self.live_failed += other.live_failed;
		self.push_attempted += other.push_attempted;
		self.push_failed += other.push_failed;
		self.push_skipped += other.push_skipped;
	}
}

#[derive(Clone)]
pub struct Dispatcher {
	ledger: Arc<dyn NotificationStore>,
	subscriptions: Arc<dyn PushSubscriptionStore>,
	registry: Arc<ConnectionRegistry>,
	push: Arc<PushDeliveryAdapter>,
}

impl Dispatcher {
	pub fn new(
		ledger: Arc<dyn NotificationStore>,
		subscriptions: Arc<dyn PushSubscriptionStore>,
		registry: Arc<ConnectionRegistry>,
		push: Arc<PushDeliveryAdapter>,
	) -> Self {
		Self {
			ledger,
			subscriptions,
			registry,
			push,
		}
	}

	/// Fan `event` out in the background.
	///
	/// Returns immediately. The handle resolves once every recipient has been
	/// processed; callers that only need fire-and-forget semantics can drop it.
	pub fn dispatch(&self, event: DispatchEvent) -> JoinHandle<DispatchReport> {
		let dispatcher = self.clone();
		tokio::spawn(async move { dispatcher.run(event).await })
	}

	#[instrument(skip(self, event), fields(kind = %event.kind))]
	async fn run(self, event: DispatchEvent) -> DispatchReport {
		if let Err(e) = event.validate() {
			warn!(error = %e, "discarding invalid dispatch event");
			return DispatchReport::default();
		}

		let recipients = event.resolved_recipients();
		if recipients.is_empty() {
			debug!("dispatch event has no recipients after resolution");
			return DispatchReport::default();
		}

		let event = Arc::new(event);
		let tasks: Vec<(UserId, JoinHandle<DispatchReport>)> = recipients
			.into_iter()
			.map(|recipient| {
				let dispatcher = self.clone();
				let event = Arc::clone(&event);
				let task_recipient = recipient.clone();
				let handle =
					tokio::spawn(async move { dispatcher.deliver_to(&event, task_recipient).await });
				(recipient, handle)
			})
			.collect();

		let mut report = DispatchReport::default();
		for (recipient, task) in tasks {
			match task.await {
				Ok(outcome) => report.absorb(outcome),
				Err(e) => {
					error!(recipient = %recipient, error = %e, "recipient delivery task failed");
					report.recipients += 1;
					report.ledger_failed += 1;
				}
			}
		}

		info!(
			recipients = report.recipients,
			ledger_written = report.ledger_written,
			live_delivered = report.live_delivered,
			push_attempted = report.push_attempted,
			"dispatch complete"
		);
		report
	}

	async fn deliver_to(&self, event: &DispatchEvent, recipient: UserId) -> DispatchReport {
		let mut report = DispatchReport {
			recipients: 1,
			..Default::default()
		};

		let record = match self.ledger.create(&event.notification_for(recipient.clone())).await {
			Ok(record) => {
				report.ledger_written = 1;
				record
			}
			Err(e) => {
				error!(recipient = %recipient, error = %e, "failed to write notification ledger row");
				report.ledger_failed = 1;
				return report;
			}
		};

		let push_task = self.spawn_push(&recipient, PushPayload::from(&record));

		match self.registry.lookup(&recipient) {
			Some(handle) => match handle.deliver(ServerMessage::Notification { data: record }) {
				Ok(()) => report.live_delivered = 1,
				Err(e) => {
					warn!(
						channel = "live",
						recipient = %recipient,
						connection_id = %handle.id(),
						error = %e,
						"live delivery failed"
					);
					report.live_failed = 1;
				}
			},
			None => report.live_skipped = 1,
		}

		match push_task {
			None => report.push_skipped = 1,
			Some(task) => match task.await {
				Ok(PushStep::Skipped) => report.push_skipped = 1,
				Ok(PushStep::Sent(outcome)) => {
					report.push_attempted = 1;
					if matches!(outcome, PushOutcome::Failed) {
						report.push_failed = 1;
					}
				}
				Err(e) => {
					error!(channel = "push", recipient = %recipient, error = %e, "push task failed");
					report.push_attempted = 1;
					report.push_failed = 1;
				}
			},
		}

		report
	}

	/// Subscription lookup and send run off the recipient task, so a slow
	/// store or gateway never holds up the live frame.
	fn spawn_push(&self, recipient: &UserId, payload: PushPayload) -> Option<JoinHandle<PushStep>> {
		if !self.push.is_enabled() {
			return None;
		}

		let subscriptions = Arc::clone(&self.subscriptions);
		let push = Arc::clone(&self.push);
		let recipient = recipient.clone();
		Some(tokio::spawn(async move {
			let subscription = match subscriptions.get(&recipient).await {
				Ok(Some(subscription)) => subscription,
				Ok(None) => return PushStep::Skipped,
				Err(e) => {
					warn!(channel = "push", recipient = %recipient, error = %e, "push subscription lookup failed");
					return PushStep::Skipped;
				}
			};
			PushStep::Sent(push.send(&recipient, &subscription, &payload).await)
		}))
	}
}

enum PushStep {
	/// No subscription, or the lookup failed.
	Skipped,
	Sent(PushOutcome),
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use pulse_notify_core::{
		LocalizedText, NewNotification, NotificationId, NotificationRecord, PushKeys, PushSubscription,
	};
	use pulse_server_db::testing::create_test_pool;
	use pulse_server_db::{DbError, NotificationRepository, PushSubscriptionRepository};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	use crate::error::DeliveryError;
	use crate::push::PushTransport;
	use crate::registry::ConnectionHandle;

	fn uid(s: &str) -> UserId {
		UserId::parse(s).unwrap()
	}

	fn event(recipients: &[&str], actor: Option<&str>) -> DispatchEvent {
		DispatchEvent {
			kind: "Create Task".to_string(),
			recipients: recipients.iter().map(|r| uid(r)).collect(),
			title: LocalizedText::uniform("New task"),
			description: LocalizedText::uniform("t1"),
			link: "/project/p1/task/t1".to_string(),
			actor_user_id: actor.map(uid),
		}
	}

	#[derive(Default)]
	struct CountingTransport {
		sent: AtomicUsize,
		fail: bool,
	}

	#[async_trait]
	impl PushTransport for CountingTransport {
		async fn send(&self, _: &PushSubscription, _: &PushPayload) -> Result<(), DeliveryError> {
			self.sent.fetch_add(1, Ordering::SeqCst);
			if self.fail {
				Err(DeliveryError::Rejected(500))
			} else {
				Ok(())
			}
		}
	}

	/// Ledger that refuses writes for one recipient.
	struct FlakyLedger {
		inner: NotificationRepository,
		fail_for: UserId,
	}

	#[async_trait]
	impl NotificationStore for FlakyLedger {
		async fn create(&self, new: &NewNotification) -> pulse_server_db::Result<NotificationRecord> {
			if new.recipient_user_id == self.fail_for {
				return Err(DbError::Internal("disk full".to_string()));
			}
			self.inner.create(new).await
		}
		async fn get(&self, id: &NotificationId) -> pulse_server_db::Result<Option<NotificationRecord>> {
			self.inner.get(id).await
		}
		async fn list_for_user(&self, user_id: &UserId) -> pulse_server_db::Result<Vec<NotificationRecord>> {
			self.inner.list_for_user(user_id).await
		}
		async fn unread_count(&self, user_id: &UserId) -> pulse_server_db::Result<u64> {
			self.inner.unread_count(user_id).await
		}
		async fn mark_read(&self, id: &NotificationId) -> pulse_server_db::Result<NotificationRecord> {
			self.inner.mark_read(id).await
		}
		async fn mark_unread(&self, id: &NotificationId) -> pulse_server_db::Result<NotificationRecord> {
			self.inner.mark_unread(id).await
		}
		async fn mark_all_read(&self, user_id: &UserId) -> pulse_server_db::Result<u64> {
			self.inner.mark_all_read(user_id).await
		}
		async fn delete(&self, id: &NotificationId) -> pulse_server_db::Result<()> {
			self.inner.delete(id).await
		}
		async fn delete_all_for_user(&self, user_id: &UserId) -> pulse_server_db::Result<u64> {
			self.inner.delete_all_for_user(user_id).await
		}
	}

	struct Harness {
		dispatcher: Dispatcher,
		ledger: NotificationRepository,
		subscriptions: PushSubscriptionRepository,
		registry: Arc<ConnectionRegistry>,
		transport: Arc<CountingTransport>,
	}

	async fn harness(push_fails: bool, flaky_for: Option<&str>) -> Harness {
		let pool = create_test_pool().await;
		let ledger = NotificationRepository::new(pool.clone());
		let subscriptions = PushSubscriptionRepository::new(pool);
		let registry = Arc::new(ConnectionRegistry::new());
		let transport = Arc::new(CountingTransport {
			sent: AtomicUsize::new(0),
			fail: push_fails,
		});
		let store: Arc<dyn NotificationStore> = match flaky_for {
			Some(user) => Arc::new(FlakyLedger {
				inner: ledger.clone(),
				fail_for: uid(user),
			}),
			None => Arc::new(ledger.clone()),
		};
		let dispatcher = Dispatcher::new(
			store,
			Arc::new(subscriptions.clone()),
			Arc::clone(&registry),
			Arc::new(PushDeliveryAdapter::new(transport.clone(), true)),
		);
		Harness {
			dispatcher,
			ledger,
			subscriptions,
			registry,
			transport,
		}
	}

	async fn subscribe(subscriptions: &PushSubscriptionRepository, user: &str) {
		subscriptions
			.upsert(
				&uid(user),
				&PushSubscription {
					endpoint: format!("https://push.example/{user}"),
					keys: PushKeys {
						p256dh: "p".to_string(),
						auth: "a".to_string(),
					},
				},
			)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_live_and_offline_recipients() {
		let h = harness(false, None).await;
		let (handle, mut rx) = ConnectionHandle::channel(uid("u1"), 8);
		h.registry.register(handle);

		let report = h.dispatcher.dispatch(event(&["u1", "u2"], None)).await.unwrap();
		assert_eq!(report.recipients, 2);
		assert_eq!(report.ledger_written, 2);
		assert_eq!(report.live_delivered, 1);
		assert_eq!(report.live_skipped, 1);
		assert_eq!(report.push_attempted, 0);
		assert_eq!(h.transport.sent.load(Ordering::SeqCst), 0);

		let frame = rx.try_recv().unwrap();
		match frame {
			ServerMessage::Notification { data } => {
				assert_eq!(data.recipient_user_id, uid("u1"));
				assert!(!data.read);
				assert_eq!(h.ledger.get(&data.id).await.unwrap().unwrap().id, data.id);
			}
			other => panic!("unexpected frame {other:?}"),
		}

		assert_eq!(h.ledger.list_for_user(&uid("u1")).await.unwrap().len(), 1);
		assert_eq!(h.ledger.list_for_user(&uid("u2")).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_actor_receives_nothing() {
		let h = harness(false, None).await;
		let report = h
			.dispatcher
			.dispatch(event(&["u1", "u2", "u1"], Some("u1")))
			.await
			.unwrap();
		assert_eq!(report.recipients, 1);
		assert!(h.ledger.list_for_user(&uid("u1")).await.unwrap().is_empty());
		assert_eq!(h.ledger.list_for_user(&uid("u2")).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_ledger_failure_is_isolated() {
		let h = harness(false, Some("u2")).await;
		let (handle, mut rx) = ConnectionHandle::channel(uid("u2"), 8);
		h.registry.register(handle);
		subscribe(&h.subscriptions, "u2").await;

		let report = h
			.dispatcher
			.dispatch(event(&["u1", "u2", "u3"], None))
			.await
			.unwrap();
		assert_eq!(report.ledger_written, 2);
		assert_eq!(report.ledger_failed, 1);

		// no row means no live frame and no push for u2
		assert!(rx.try_recv().is_err());
		assert_eq!(h.transport.sent.load(Ordering::SeqCst), 0);
		assert_eq!(h.ledger.list_for_user(&uid("u1")).await.unwrap().len(), 1);
		assert_eq!(h.ledger.list_for_user(&uid("u3")).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_push_failure_keeps_ledger_row() {
		let h = harness(true, None).await;
		subscribe(&h.subscriptions, "u2").await;

		let report = h.dispatcher.dispatch(event(&["u2"], None)).await.unwrap();
		assert_eq!(report.push_attempted, 1);
		assert_eq!(report.push_failed, 1);
		assert_eq!(h.transport.sent.load(Ordering::SeqCst), 1);
		assert_eq!(h.ledger.unread_count(&uid("u2")).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_full_live_queue_does_not_block() {
		let h = harness(false, None).await;
		let (handle, _rx) = ConnectionHandle::channel(uid("u1"), 1);
		handle.deliver(ServerMessage::Pong).unwrap();
		h.registry.register(handle);

		let report = h.dispatcher.dispatch(event(&["u1"], None)).await.unwrap();
		assert_eq!(report.live_failed, 1);
		assert_eq!(report.ledger_written, 1);
	}

	/// Subscription store whose lookups never complete.
	struct StalledSubscriptions;

	#[async_trait]
	impl PushSubscriptionStore for StalledSubscriptions {
		async fn upsert(&self, _: &UserId, _: &PushSubscription) -> pulse_server_db::Result<()> {
			Ok(())
		}
		async fn get(&self, _: &UserId) -> pulse_server_db::Result<Option<PushSubscription>> {
			std::future::pending().await
		}
	}

	/// Gateway that accepts the request and never answers.
	struct StalledTransport;

	#[async_trait]
	impl PushTransport for StalledTransport {
		async fn send(&self, _: &PushSubscription, _: &PushPayload) -> Result<(), DeliveryError> {
			std::future::pending().await
		}
	}

	async fn wait_for_row(ledger: &NotificationRepository, user: &str) {
		tokio::time::timeout(Duration::from_secs(2), async {
			while ledger.list_for_user(&uid(user)).await.unwrap().is_empty() {
				tokio::time::sleep(Duration::from_millis(10)).await;
			}
		})
		.await
		.unwrap_or_else(|_| panic!("no ledger row for {user}"));
	}

	async fn assert_live_frame_despite_stalled_push(
		subscriptions: Arc<dyn PushSubscriptionStore>,
		transport: Arc<dyn PushTransport>,
	) {
		let pool = create_test_pool().await;
		let ledger = NotificationRepository::new(pool);
		let registry = Arc::new(ConnectionRegistry::new());
		let dispatcher = Dispatcher::new(
			Arc::new(ledger.clone()),
			subscriptions,
			Arc::clone(&registry),
			Arc::new(PushDeliveryAdapter::new(transport, true)),
		);
		let (handle, mut rx) = ConnectionHandle::channel(uid("u1"), 8);
		registry.register(handle);

		let task = dispatcher.dispatch(event(&["u1", "u2"], None));

		let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
			.await
			.expect("live frame held up by push")
			.expect("channel closed");
		assert!(matches!(
			frame,
			ServerMessage::Notification { ref data } if data.recipient_user_id == uid("u1")
		));
		wait_for_row(&ledger, "u1").await;
		wait_for_row(&ledger, "u2").await;

		// push never settles, so neither does the report
		assert!(!task.is_finished());
		task.abort();
	}

	#[tokio::test]
	async fn test_stalled_subscription_lookup_does_not_delay_live() {
		assert_live_frame_despite_stalled_push(
			Arc::new(StalledSubscriptions),
			Arc::new(CountingTransport::default()),
		)
		.await;
	}

	#[tokio::test]
	async fn test_stalled_push_gateway_does_not_delay_live() {
		let pool = create_test_pool().await;
		let subscriptions = PushSubscriptionRepository::new(pool);
		subscribe(&subscriptions, "u1").await;
		subscribe(&subscriptions, "u2").await;
		assert_live_frame_despite_stalled_push(Arc::new(subscriptions), Arc::new(StalledTransport)).await;
	}

	#[tokio::test]
	async fn test_invalid_event_is_discarded() {
		let h = harness(false, None).await;
		let mut bad = event(&["u1"], None);
		bad.link = "https://elsewhere".to_string();
		let report = h.dispatcher.dispatch(bad).await.unwrap();
		assert_eq!(report, DispatchReport::default());
		assert!(h.ledger.list_for_user(&uid("u1")).await.unwrap().is_empty());
	}
}
