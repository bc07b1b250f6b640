// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process registry of live sessions, keyed by user.
//!
//! At most one handle is held per user. Registering a new handle replaces the
//! old one, and deregistration only removes the entry when the stored handle
//! is the one being deregistered, so a session that closes late cannot evict
//! its replacement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};
use uuid::Uuid;

use pulse_notify_core::{ServerMessage, UserId};

use crate::error::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for ConnectionId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Sending half of one live session.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
	id: ConnectionId,
	user_id: UserId,
	tx: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
	pub fn new(user_id: UserId, tx: mpsc::Sender<ServerMessage>) -> Self {
		Self {
			id: ConnectionId::new(),
			user_id,
			tx,
		}
	}

	/// Handle plus the receiver the session drains.
	pub fn channel(user_id: UserId, capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
		let (tx, rx) = mpsc::channel(capacity.max(1));
		(Self::new(user_id, tx), rx)
	}

	pub fn id(&self) -> ConnectionId {
		self.id
	}

	pub fn user_id(&self) -> &UserId {
		&self.user_id
	}

	/// Non-blocking enqueue onto the session's outbound queue.
	pub fn deliver(&self, message: ServerMessage) -> Result<(), DeliveryError> {
		self.tx.try_send(message).map_err(|e| match e {
			TrySendError::Full(_) => DeliveryError::QueueFull,
			TrySendError::Closed(_) => DeliveryError::Disconnected,
		})
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
	pub active: usize,
	pub registrations: u64,
	pub superseded: u64,
	pub stale_deregistrations: u64,
}

#[derive(Default)]
pub struct ConnectionRegistry {
	connections: RwLock<HashMap<UserId, ConnectionHandle>>,
	registrations: AtomicU64,
	superseded: AtomicU64,
	stale_deregistrations: AtomicU64,
}

impl ConnectionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `handle` for its user, returning the handle it replaced.
	pub fn register(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
		let user_id = handle.user_id.clone();
		let connection_id = handle.id;
		let previous = self.connections.write().insert(user_id.clone(), handle);

		self.registrations.fetch_add(1, Ordering::Relaxed);
		if let Some(previous) = &previous {
			self.superseded.fetch_add(1, Ordering::Relaxed);
			info!(
				user_id = %user_id,
				connection_id = %connection_id,
				superseded_connection_id = %previous.id,
				"live session superseded"
			);
		} else {
			debug!(user_id = %user_id, connection_id = %connection_id, "live session registered");
		}
		previous
	}

	/// Remove `handle` if it is still the registered one. Returns whether an entry was removed.
	pub fn deregister(&self, handle: &ConnectionHandle) -> bool {
		let mut connections = self.connections.write();
		match connections.get(&handle.user_id) {
			Some(current) if current.id == handle.id => {
				connections.remove(&handle.user_id);
				drop(connections);
				debug!(user_id = %handle.user_id, connection_id = %handle.id, "live session deregistered");
				true
			}
			_ => {
				drop(connections);
				self.stale_deregistrations.fetch_add(1, Ordering::Relaxed);
				debug!(
					user_id = %handle.user_id,
					connection_id = %handle.id,
					"ignoring deregistration of superseded live session"
				);
				false
			}
		}
	}

	pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
		self.connections.read().get(user_id).cloned()
	}

	pub fn connection_count(&self) -> usize {
		self.connections.read().len()
	}

	pub fn stats(&self) -> RegistryStats {
		RegistryStats {
			active: self.connection_count(),
			registrations: self.registrations.load(Ordering::Relaxed),
			superseded: self.superseded.load(Ordering::Relaxed),
			stale_deregistrations: self.stale_deregistrations.load(Ordering::Relaxed),
		}
	}
}
