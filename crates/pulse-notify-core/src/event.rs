// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-commit business events handed to the dispatcher.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::UserId;
use crate::notification::{validate_content, LocalizedText, NewNotification};

/// A state change that should be announced to a set of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DispatchEvent {
	#[serde(rename = "type")]
	pub kind: String,
	pub recipients: Vec<UserId>,
	pub title: LocalizedText,
	pub description: LocalizedText,
	pub link: String,
	#[serde(default)]
	pub actor_user_id: Option<UserId>,
}

impl DispatchEvent {
	pub fn validate(&self) -> Result<(), ValidationError> {
		validate_content(&self.kind, &self.title, &self.link)
	}

	/// Distinct recipients in first-seen order, without the actor.
	#[must_use]
	pub fn resolved_recipients(&self) -> Vec<UserId> {
		let mut seen = HashSet::with_capacity(self.recipients.len());
		self.recipients
			.iter()
			.filter(|r| self.actor_user_id.as_ref() != Some(*r))
			.filter(|r| seen.insert(*r))
			.cloned()
			.collect()
	}

	/// Ledger input for one recipient of this event.
	#[must_use]
	pub fn notification_for(&self, recipient: UserId) -> NewNotification {
		NewNotification {
			recipient_user_id: recipient,
			kind: self.kind.clone(),
			title: self.title.clone(),
			description: self.description.clone(),
			link: self.link.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

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

	#[test]
	fn actor_is_excluded() {
		let e = event(&["u1", "u2", "u3"], Some("u2"));
		assert_eq!(e.resolved_recipients(), vec![uid("u1"), uid("u3")]);
	}

	#[test]
	fn duplicates_collapse_in_order() {
		let e = event(&["u2", "u1", "u2", "u1"], None);
		assert_eq!(e.resolved_recipients(), vec![uid("u2"), uid("u1")]);
	}

	#[test]
	fn deserializes_wire_shape() {
		let json = r#"{
			"type": "Create Task",
			"recipients": ["u1", "u2"],
			"title": {"enUS": "a", "zhHK": "b", "zhCN": "c"},
			"description": {"enUS": "d", "zhHK": "e", "zhCN": "f"},
			"link": "/project/p1/task/t1",
			"actorUserId": "u0"
		}"#;
		let e: DispatchEvent = serde_json::from_str(json).unwrap();
		assert_eq!(e.kind, "Create Task");
		assert_eq!(e.actor_user_id, Some(uid("u0")));
		assert!(e.validate().is_ok());
	}

	#[test]
	fn rejects_empty_recipient_id() {
		let json = r#"{
			"type": "t", "recipients": [""],
			"title": {"enUS": "a", "zhHK": "b", "zhCN": "c"},
			"description": {"enUS": "d", "zhHK": "e", "zhCN": "f"},
			"link": "/x"
		}"#;
		assert!(serde_json::from_str::<DispatchEvent>(json).is_err());
	}

	proptest! {
		#[test]
		fn resolved_recipients_are_distinct_and_exclude_actor(
			ids in proptest::collection::vec("[a-d]", 0..12),
			actor in proptest::option::of("[a-d]"),
		) {
			let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
			let e = event(&refs, actor.as_deref());
			let resolved = e.resolved_recipients();
			let unique: HashSet<_> = resolved.iter().collect();
			prop_assert_eq!(unique.len(), resolved.len());
			if let Some(a) = actor {
				prop_assert!(!resolved.contains(&uid(&a)));
			}
			for r in &resolved {
				prop_assert!(e.recipients.contains(r));
			}
		}
	}
}
