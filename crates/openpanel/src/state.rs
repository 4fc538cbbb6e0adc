// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mutable client state shared by the public verbs and the dispatcher.

use std::sync::{Mutex, MutexGuard, PoisonError};

use openpanel_core::{Payload, Properties};

use crate::config::EventFilter;

/// Global properties merged into every outgoing event. Last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalPropertyStore {
	properties: Properties,
}

impl GlobalPropertyStore {
	pub fn set(&mut self, properties: &Properties) {
		self.properties.extend(properties);
	}

	pub fn clear(&mut self) {
		self.properties.clear();
	}

	pub fn properties(&self) -> &Properties {
		&self.properties
	}
}

/// The mutable part of [`ClientState`].
#[derive(Debug, Default)]
pub struct Session {
	pub profile_id: Option<String>,
	pub global_properties: GlobalPropertyStore,
	pub waiting_for_profile: bool,
}

impl Session {
	/// True when `payload` must wait for an identified profile.
	pub fn gates(&self, payload: &Payload) -> bool {
		self.waiting_for_profile && self.profile_id.is_none() && !payload.is_identify()
	}
}

/// Owned copy of the session fields the event builder reads.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
	pub profile_id: Option<String>,
	pub global_properties: Properties,
}

/// Client state created once per client.
///
/// `disabled` and `filter` are fixed at construction. Everything else lives
/// behind one lock so the profile gate and the pending queue change together.
pub struct ClientState {
	disabled: bool,
	filter: Option<EventFilter>,
	session: Mutex<Session>,
}

impl ClientState {
	pub fn new(disabled: bool, wait_for_profile: bool, filter: Option<EventFilter>) -> Self {
		Self {
			disabled,
			filter,
			session: Mutex::new(Session {
				waiting_for_profile: wait_for_profile,
				..Session::default()
			}),
		}
	}

	pub fn is_disabled(&self) -> bool {
		self.disabled
	}

	/// Applies the filter predicate; events pass when no filter is set.
	pub fn accepts(&self, payload: &Payload) -> bool {
		self.filter.as_ref().map_or(true, |filter| filter(payload))
	}

	/// Locks the session, recovering from poisoning.
	pub fn lock(&self) -> MutexGuard<'_, Session> {
		self.session.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn snapshot(&self) -> StateSnapshot {
		let session = self.lock();
		StateSnapshot {
			profile_id: session.profile_id.clone(),
			global_properties: session.global_properties.properties().clone(),
		}
	}

	pub fn profile_id(&self) -> Option<String> {
		self.lock().profile_id.clone()
	}

	pub fn set_global_properties(&self, properties: &Properties) {
		self.lock().global_properties.set(properties);
	}

	/// Forgets the profile and the global properties.
	pub fn clear(&self) {
		let mut session = self.lock();
		session.profile_id = None;
		session.global_properties.clear();
	}
}
