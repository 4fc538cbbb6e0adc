// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event payloads accepted by the collector's `/track` endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::Properties;

/// The kind of an event, matching the `type` field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
	Track,
	Identify,
	Alias,
	Increment,
	Decrement,
}

impl EventKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::Track => "track",
			EventKind::Identify => "identify",
			EventKind::Alias => "alias",
			EventKind::Increment => "increment",
			EventKind::Decrement => "decrement",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A named event with optional properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Properties>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_id: Option<String>,
}

/// Profile traits for an identified user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyPayload {
	pub profile_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Properties>,
}

/// Links a second identifier to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasPayload {
	pub profile_id: String,
	pub alias: String,
}

/// Adjusts a numeric profile property. Used by both increment and decrement.
///
/// When `value` is omitted the collector applies a delta of 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterPayload {
	pub profile_id: String,
	pub property: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<i64>,
}

/// An immutable event, one variant per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Payload {
	Track(TrackPayload),
	Identify(IdentifyPayload),
	Alias(AliasPayload),
	Increment(CounterPayload),
	Decrement(CounterPayload),
}

impl Payload {
	pub fn kind(&self) -> EventKind {
		match self {
			Payload::Track(_) => EventKind::Track,
			Payload::Identify(_) => EventKind::Identify,
			Payload::Alias(_) => EventKind::Alias,
			Payload::Increment(_) => EventKind::Increment,
			Payload::Decrement(_) => EventKind::Decrement,
		}
	}

	pub fn is_identify(&self) -> bool {
		matches!(self, Payload::Identify(_))
	}

	pub fn profile_id(&self) -> Option<&str> {
		match self {
			Payload::Track(p) => p.profile_id.as_deref(),
			Payload::Identify(p) => Some(&p.profile_id),
			Payload::Alias(p) => Some(&p.profile_id),
			Payload::Increment(p) | Payload::Decrement(p) => Some(&p.profile_id),
		}
	}

	/// Fills a missing profile id from `fallback`.
	///
	/// Only track events carry an optional profile id; every other variant
	/// is returned unchanged.
	pub fn with_profile_fallback(self, fallback: Option<&str>) -> Self {
		match self {
			Payload::Track(mut p) => {
				if p.profile_id.is_none() {
					p.profile_id = fallback.map(str::to_string);
				}
				Payload::Track(p)
			}
			other => other,
		}
	}

	/// Encodes the payload in the collector's wire format.
	pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::to_value(self)
	}
}
