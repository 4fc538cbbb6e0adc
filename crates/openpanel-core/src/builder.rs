// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maps tracking calls into [`Payload`] values.
//!
//! The builder only reads a snapshot of client state: the resolved profile id
//! and the global properties. It never mutates anything.

use crate::payload::{AliasPayload, CounterPayload, IdentifyPayload, Payload, TrackPayload};
use crate::properties::Properties;

/// Trait keys lifted out of identify traits into dedicated payload fields.
pub const IDENTIFY_TRAIT_KEYS: [&str; 4] = ["firstName", "lastName", "email", "avatar"];

/// Property key a track call may use to name its own profile.
pub const PROFILE_ID_KEY: &str = "profileId";

/// Builds events from call arguments and a state snapshot.
#[derive(Debug, Clone, Copy)]
pub struct EventBuilder<'a> {
	profile_id: Option<&'a str>,
	global_properties: &'a Properties,
}

impl<'a> EventBuilder<'a> {
	pub fn new(profile_id: Option<&'a str>, global_properties: &'a Properties) -> Self {
		Self {
			profile_id,
			global_properties,
		}
	}

	/// Builds a track event.
	///
	/// Properties are the global properties overlaid with the call
	/// properties. The profile id is taken from a string `profileId` call
	/// property when present, otherwise from the snapshot.
	pub fn track(&self, name: impl Into<String>, properties: Option<Properties>) -> Payload {
		let explicit_profile = properties
			.as_ref()
			.and_then(|p| p.get_str(PROFILE_ID_KEY))
			.map(str::to_string);
		let merged = self.merged(properties);

		Payload::Track(TrackPayload {
			name: name.into(),
			properties: (!merged.is_empty()).then_some(merged),
			profile_id: explicit_profile.or_else(|| self.profile_id.map(str::to_string)),
		})
	}

	/// Builds an identify event.
	///
	/// The well-known trait keys are moved out of the merged map into their
	/// own fields; whatever remains becomes `properties`.
	pub fn identify(&self, profile_id: impl Into<String>, traits: Option<Properties>) -> Payload {
		let mut merged = self.merged(traits);
		let [first_name, last_name, email, avatar] =
			IDENTIFY_TRAIT_KEYS.map(|key| merged.take_string(key));

		Payload::Identify(IdentifyPayload {
			profile_id: profile_id.into(),
			first_name,
			last_name,
			email,
			avatar,
			properties: (!merged.is_empty()).then_some(merged),
		})
	}

	pub fn alias(&self, profile_id: impl Into<String>, alias: impl Into<String>) -> Payload {
		Payload::Alias(AliasPayload {
			profile_id: profile_id.into(),
			alias: alias.into(),
		})
	}

	pub fn increment(
		&self,
		profile_id: impl Into<String>,
		property: impl Into<String>,
		value: Option<i64>,
	) -> Payload {
		Payload::Increment(counter(profile_id, property, value))
	}

	pub fn decrement(
		&self,
		profile_id: impl Into<String>,
		property: impl Into<String>,
		value: Option<i64>,
	) -> Payload {
		Payload::Decrement(counter(profile_id, property, value))
	}

	fn merged(&self, properties: Option<Properties>) -> Properties {
		let base = self.global_properties.clone();
		match properties {
			Some(props) => base.merge(props),
			None => base,
		}
	}
}

fn counter(
	profile_id: impl Into<String>,
	property: impl Into<String>,
	value: Option<i64>,
) -> CounterPayload {
	CounterPayload {
		profile_id: profile_id.into(),
		property: property.into(),
		value,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::Value;

	fn track_properties(payload: &Payload) -> Option<&Properties> {
		match payload {
			Payload::Track(p) => p.properties.as_ref(),
			_ => None,
		}
	}

	#[test]
	fn track_merges_global_properties() {
		let globals = Properties::new().insert("a", 1);
		let builder = EventBuilder::new(None, &globals);

		let event = builder.track("x", Some(Properties::new().insert("b", 2)));
		let props = track_properties(&event).unwrap();

		assert_eq!(props, &Properties::new().insert("a", 1).insert("b", 2));
	}

	#[test]
	fn track_call_properties_override_globals() {
		let globals = Properties::new().insert("a", 1);
		let builder = EventBuilder::new(None, &globals);

		let event = builder.track("x", Some(Properties::new().insert("a", 5)));

		assert_eq!(
			track_properties(&event).unwrap(),
			&Properties::new().insert("a", 5)
		);
	}

	#[test]
	fn track_without_any_properties_omits_them() {
		let globals = Properties::new();
		let event = EventBuilder::new(None, &globals).track("app_opened", None);
		assert!(track_properties(&event).is_none());
	}

	#[test]
	fn track_profile_resolution_order() {
		let globals = Properties::new();

		let from_state = EventBuilder::new(Some("state"), &globals).track("x", None);
		assert_eq!(from_state.profile_id(), Some("state"));

		let explicit = EventBuilder::new(Some("state"), &globals)
			.track("x", Some(Properties::new().insert(PROFILE_ID_KEY, "call")));
		assert_eq!(explicit.profile_id(), Some("call"));

		let absent = EventBuilder::new(None, &globals).track("x", None);
		assert_eq!(absent.profile_id(), None);
	}

	#[test]
	fn track_ignores_non_string_profile_property() {
		let globals = Properties::new();
		let event = EventBuilder::new(Some("state"), &globals)
			.track("x", Some(Properties::new().insert(PROFILE_ID_KEY, 7)));
		assert_eq!(event.profile_id(), Some("state"));
	}

	#[test]
	fn identify_extracts_well_known_traits() {
		let globals = Properties::new().insert("platform", "linux");
		let traits = Properties::new()
			.insert("firstName", "John")
			.insert("lastName", "Doe")
			.insert("email", "john@example.com")
			.insert("avatar", "https://example.com/a.png")
			.insert("plan", "pro");

		let event = EventBuilder::new(None, &globals).identify("user_1", Some(traits));
		let Payload::Identify(p) = event else {
			panic!("expected identify payload");
		};

		assert_eq!(p.profile_id, "user_1");
		assert_eq!(p.first_name.as_deref(), Some("John"));
		assert_eq!(p.last_name.as_deref(), Some("Doe"));
		assert_eq!(p.email.as_deref(), Some("john@example.com"));
		assert_eq!(p.avatar.as_deref(), Some("https://example.com/a.png"));
		assert_eq!(
			p.properties,
			Some(Properties::new().insert("platform", "linux").insert("plan", "pro"))
		);
	}

	#[test]
	fn identify_keeps_non_string_traits_in_properties() {
		let globals = Properties::new();
		let traits = Properties::new().insert("email", false);

		let Payload::Identify(p) = EventBuilder::new(None, &globals).identify("u", Some(traits))
		else {
			panic!("expected identify payload");
		};

		assert!(p.email.is_none());
		assert_eq!(p.properties.unwrap().get("email"), Some(&Value::Bool(false)));
	}

	#[test]
	fn counters_carry_optional_delta() {
		let globals = Properties::new();
		let builder = EventBuilder::new(None, &globals);

		let inc = builder.increment("u", "login_count", None);
		let dec = builder.decrement("u", "credits_remaining", Some(5));

		assert_eq!(
			inc,
			Payload::Increment(CounterPayload {
				profile_id: "u".to_string(),
				property: "login_count".to_string(),
				value: None,
			})
		);
		assert_eq!(
			dec,
			Payload::Decrement(CounterPayload {
				profile_id: "u".to_string(),
				property: "credits_remaining".to_string(),
				value: Some(5),
			})
		);
	}

	proptest! {
		#[test]
		fn merged_track_properties_prefer_call_values(
			globals in proptest::collection::btree_map("[a-e]", 0i64..100, 0..5),
			call in proptest::collection::btree_map("[a-e]", 100i64..200, 0..5),
		) {
			let global_props: Properties = globals.clone().into_iter().collect();
			let call_props: Properties = call.clone().into_iter().collect();

			let event = EventBuilder::new(None, &global_props).track("x", Some(call_props));
			let merged = track_properties(&event).cloned().unwrap_or_default();

			for (k, v) in &call {
				prop_assert_eq!(merged.get(k), Some(&Value::from(*v)));
			}
			for (k, v) in &globals {
				if !call.contains_key(k) {
					prop_assert_eq!(merged.get(k), Some(&Value::from(*v)));
				}
			}
		}
	}
}
