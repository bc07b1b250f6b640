// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live channel wire protocol.
//!
//! Clients announce themselves with a `register` message right after the
//! upgrade; the server then pushes `notification` frames as they are
//! dispatched.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::notification::NotificationRecord;

/// Messages sent by a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	Register {
		#[serde(rename = "userId")]
		user_id: UserId,
	},
	Ping,
	Pong,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
	Registered {
		#[serde(rename = "userId")]
		user_id: UserId,
	},
	Notification {
		data: NotificationRecord,
	},
	Ping {
		timestamp: i64,
	},
	Pong,
	Error {
		message: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn register_parses() {
		let msg: ClientMessage =
			serde_json::from_str(r#"{"type":"register","userId":"u1"}"#).unwrap();
		assert_eq!(
			msg,
			ClientMessage::Register {
				user_id: UserId::parse("u1").unwrap()
			}
		);
	}

	#[test]
	fn register_with_invalid_user_is_rejected() {
		assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"register","userId":""}"#).is_err());
	}

	#[test]
	fn ping_frame_shape() {
		let json = serde_json::to_value(ServerMessage::Ping { timestamp: 7 }).unwrap();
		assert_eq!(json, serde_json::json!({"type": "ping", "timestamp": 7}));
	}
}
