// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::SendError, error::TrySendError};
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::event::AuditEntry;
use crate::sink::AuditSink;
use pulse_server_config::QueueOverflowPolicy;

#[derive(Default)]
struct Counters {
	enqueued: AtomicU64,
	dropped: AtomicU64,
	published: AtomicU64,
	publish_failures: AtomicU64,
}

/// Point-in-time counters for the audit queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditStats {
	pub enqueued: u64,
	/// Entries that never reached the queue.
	pub dropped: u64,
	pub published: u64,
	pub publish_failures: u64,
}

/// Bounded queue in front of the audit sinks.
///
/// Callers enqueue without waiting on storage; a background task fans each
/// entry out to every sink.
pub struct AuditService {
	tx: mpsc::Sender<AuditEntry>,
	overflow_policy: QueueOverflowPolicy,
	/// Caps the senders parked on a full queue under `Block`.
	waiters: Arc<Semaphore>,
	sinks: Vec<Arc<dyn AuditSink>>,
	counters: Arc<Counters>,
}

impl AuditService {
	/// Must be called from within a tokio runtime.
	pub fn new(
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let queue_capacity = queue_capacity.max(1);
		let (tx, rx) = mpsc::channel(queue_capacity);
		let counters = Arc::new(Counters::default());

		tokio::spawn(Self::background_task(
			rx,
			sinks.clone(),
			Arc::clone(&counters),
		));

		Self {
			tx,
			overflow_policy,
			waiters: Arc::new(Semaphore::new(queue_capacity)),
			sinks,
			counters,
		}
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditEntry>,
		sinks: Vec<Arc<dyn AuditSink>>,
		counters: Arc<Counters>,
	) {
		while let Some(entry) = rx.recv().await {
			let entry = Arc::new(entry);

			for sink in &sinks {
				let sink = Arc::clone(sink);
				let entry = Arc::clone(&entry);
				let counters = Arc::clone(&counters);

				tokio::spawn(async move {
					match sink.publish(entry).await {
						Ok(()) => {
							counters.published.fetch_add(1, Ordering::Relaxed);
						}
						Err(e) => {
							counters.publish_failures.fetch_add(1, Ordering::Relaxed);
							warn!(sink = sink.name(), error = %e, "audit sink publish failed");
						}
					}
				});
			}
		}
	}

	/// Enqueue an entry, reporting why it could not be queued.
	///
	/// - `Block`: when the queue is full, parks the entry in a task that waits
	///   for capacity. At most `queue_capacity` entries wait this way; beyond
	///   that the entry is dropped with [`AuditError::QueueFull`].
	/// - `DropNewest`: fails with [`AuditError::QueueFull`] when the queue is full.
	#[instrument(skip(self, entry), fields(action = %entry.action, path = %entry.request_path))]
	pub fn try_log(&self, entry: AuditEntry) -> AuditResult<()> {
		if self.tx.is_closed() {
			self.counters.dropped.fetch_add(1, Ordering::Relaxed);
			return Err(AuditError::Shutdown);
		}

		match self.overflow_policy {
			QueueOverflowPolicy::Block => match self.tx.try_send(entry) {
				Ok(()) => {
					self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
					Ok(())
				}
				Err(TrySendError::Full(entry)) => {
					let Ok(permit) = Arc::clone(&self.waiters).try_acquire_owned() else {
						self.counters.dropped.fetch_add(1, Ordering::Relaxed);
						return Err(AuditError::QueueFull);
					};
					let tx = self.tx.clone();
					let counters = Arc::clone(&self.counters);
					counters.enqueued.fetch_add(1, Ordering::Relaxed);
					tokio::spawn(async move {
						if tx.send(entry).await.is_err() {
							counters.dropped.fetch_add(1, Ordering::Relaxed);
						}
						drop(permit);
					});
					Ok(())
				}
				Err(TrySendError::Closed(_)) => {
					self.counters.dropped.fetch_add(1, Ordering::Relaxed);
					Err(AuditError::Shutdown)
				}
			},
			QueueOverflowPolicy::DropNewest => match self.tx.try_send(entry) {
				Ok(()) => {
					self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
					Ok(())
				}
				Err(TrySendError::Full(_)) => {
					self.counters.dropped.fetch_add(1, Ordering::Relaxed);
					Err(AuditError::QueueFull)
				}
				Err(TrySendError::Closed(_)) => {
					self.counters.dropped.fetch_add(1, Ordering::Relaxed);
					Err(AuditError::Shutdown)
				}
			},
		}
	}

	/// Returns `true` if the entry was queued, `false` if dropped.
	pub fn log(&self, entry: AuditEntry) -> bool {
		self.try_log(entry).is_ok()
	}

	pub async fn log_blocking(&self, entry: AuditEntry) -> Result<(), SendError<AuditEntry>> {
		self.tx.send(entry).await?;
		self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}

	pub fn stats(&self) -> AuditStats {
		AuditStats {
			enqueued: self.counters.enqueued.load(Ordering::Relaxed),
			dropped: self.counters.dropped.load(Ordering::Relaxed),
			published: self.counters.published.load(Ordering::Relaxed),
			publish_failures: self.counters.publish_failures.load(Ordering::Relaxed),
		}
	}

	/// Number of entries waiting for the background task.
	pub fn queued(&self) -> usize {
		self.tx.max_capacity() - self.tx.capacity()
	}

	/// Names of sinks whose health check fails.
	pub async fn unhealthy_sinks(&self) -> Vec<String> {
		let mut unhealthy = Vec::new();
		for sink in &self.sinks {
			if let Err(e) = sink.health_check().await {
				warn!(sink = sink.name(), error = %e, "audit sink health check failed");
				unhealthy.push(sink.name().to_string());
			}
		}
		unhealthy
	}
}
