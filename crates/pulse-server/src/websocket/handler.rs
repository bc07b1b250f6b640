// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WebSocket session with first-message registration.
//!
//! The client must send `{"type":"register","userId":...}` before
//! `live.registration_timeout` elapses. Once registered the session's outbound
//! queue is published in the [`ConnectionRegistry`] and drained onto the
//! socket until either side closes.
//!
//! [`ConnectionRegistry`]: pulse_server_notify::ConnectionRegistry

use axum::{
	extract::{
		ws::{close_code, CloseFrame, Message, WebSocket},
		State, WebSocketUpgrade,
	},
	response::IntoResponse,
};
use chrono::Utc;
use futures::{
	stream::{SplitSink, SplitStream},
	SinkExt, StreamExt,
};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use pulse_notify_core::{ClientMessage, ServerMessage, UserId};
use pulse_server_notify::ConnectionHandle;

use crate::api::AppState;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum RegistrationError {
	#[error("registration timeout")]
	Timeout,
	#[error("socket closed before registration")]
	Closed,
	#[error("invalid registration: {0}")]
	Invalid(String),
}

#[utoipa::path(
    get,
    path = "/ws",
    tag = "live",
    responses(
        (status = 101, description = "WebSocket connection established"),
        (status = 400, description = "Bad request - invalid upgrade request"),
    )
)]
pub async fn ws_upgrade_handler(
	ws: WebSocketUpgrade,
	State(state): State<AppState>,
) -> impl IntoResponse {
	debug!("live channel upgrade request received");
	ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

fn parse_registration(text: &str) -> Result<UserId, RegistrationError> {
	match serde_json::from_str::<ClientMessage>(text) {
		Ok(ClientMessage::Register { user_id }) => Ok(user_id),
		Ok(_) => Err(RegistrationError::Invalid(
			"first message must be a register message".to_string(),
		)),
		Err(e) => Err(RegistrationError::Invalid(e.to_string())),
	}
}

/// Reply owed to an inbound text frame on a registered session, if any.
fn reply_for(text: &str) -> Option<ServerMessage> {
	match serde_json::from_str::<ClientMessage>(text) {
		Ok(ClientMessage::Ping) => Some(ServerMessage::Pong),
		Ok(ClientMessage::Pong) => None,
		Ok(ClientMessage::Register { .. }) => {
			debug!("ignoring repeated register message");
			None
		}
		Err(e) => Some(ServerMessage::Error {
			message: format!("unrecognized message: {e}"),
		}),
	}
}

async fn await_registration(
	receiver: &mut SplitStream<WebSocket>,
) -> Result<UserId, RegistrationError> {
	loop {
		match receiver.next().await {
			Some(Ok(Message::Text(text))) => return parse_registration(text.as_str()),
			Some(Ok(Message::Binary(data))) => {
				let text = std::str::from_utf8(&data)
					.map_err(|e| RegistrationError::Invalid(e.to_string()))?;
				return parse_registration(text);
			}
			Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
			Some(Ok(Message::Close(_))) | None => return Err(RegistrationError::Closed),
			Some(Err(e)) => {
				debug!(error = %e, "socket error before registration");
				return Err(RegistrationError::Closed);
			}
		}
	}
}

async fn send_message(
	sender: &mut SplitSink<WebSocket, Message>,
	message: &ServerMessage,
) -> Result<(), axum::Error> {
	let json = serde_json::to_string(message).map_err(axum::Error::new)?;
	sender.send(Message::Text(json.into())).await
}

async fn reject(sender: &mut SplitSink<WebSocket, Message>, error: &RegistrationError) {
	let reason = error.to_string();
	let _ = send_message(
		sender,
		&ServerMessage::Error {
			message: reason.clone(),
		},
	)
	.await;
	let _ = sender
		.send(Message::Close(Some(CloseFrame {
			code: close_code::POLICY,
			reason: reason.into(),
		})))
		.await;
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
	let (mut sender, mut receiver) = socket.split();
	let live = state.live_config.clone();

	let registration =
		match tokio::time::timeout(live.registration_timeout, await_registration(&mut receiver)).await
		{
			Ok(result) => result,
			Err(_) => Err(RegistrationError::Timeout),
		};
	let user_id = match registration {
		Ok(user_id) => user_id,
		Err(RegistrationError::Closed) => {
			debug!("live session closed before registering");
			return;
		}
		Err(e) => {
			warn!(error = %e, "live session registration failed");
			reject(&mut sender, &e).await;
			return;
		}
	};

	let (handle, mut outbound) = ConnectionHandle::channel(user_id.clone(), live.queue_capacity);
	state.registry.register(handle.clone());
	info!(user_id = %user_id, connection_id = %handle.id(), "live session registered");

	let registered = ServerMessage::Registered {
		user_id: user_id.clone(),
	};
	if let Err(e) = send_message(&mut sender, &registered).await {
		debug!(error = %e, "failed to acknowledge registration");
		state.registry.deregister(&handle);
		return;
	}

	let mut ping_interval = interval_at(Instant::now() + live.ping_interval, live.ping_interval);
	ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			message = outbound.recv() => {
				let Some(message) = message else { break };
				if let Err(e) = send_message(&mut sender, &message).await {
					debug!(error = %e, "failed to write live frame");
					break;
				}
			}
			_ = ping_interval.tick() => {
				let ping = ServerMessage::Ping { timestamp: Utc::now().timestamp() };
				if let Err(e) = send_message(&mut sender, &ping).await {
					debug!(error = %e, "failed to send ping");
					break;
				}
			}
			inbound = receiver.next() => {
				match inbound {
					Some(Ok(Message::Text(text))) => {
						if let Some(reply) = reply_for(text.as_str()) {
							if send_message(&mut sender, &reply).await.is_err() {
								break;
							}
						}
					}
					Some(Ok(Message::Ping(data))) => {
						if sender.send(Message::Pong(data)).await.is_err() {
							break;
						}
					}
					Some(Ok(Message::Binary(_) | Message::Pong(_))) => {}
					Some(Ok(Message::Close(_))) | None => break,
					Some(Err(e)) => {
						debug!(error = %e, "live socket error");
						break;
					}
				}
			}
		}
	}

	state.registry.deregister(&handle);
	info!(user_id = %user_id, connection_id = %handle.id(), "live session closed");
}
