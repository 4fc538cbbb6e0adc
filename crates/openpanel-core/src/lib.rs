// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the OpenPanel SDK.
//!
//! This crate has no I/O. It provides:
//! - [`Payload`]: the closed set of events the collector accepts
//! - [`Properties`]: a JSON object map used for event properties and traits
//! - [`EventBuilder`]: maps a tracking call plus client state into a [`Payload`]
//!
//! # Wire format
//!
//! Every payload serializes as `{"type": "<kind>", "payload": {...}}` with
//! camelCase field names. Optional fields that are unset are omitted.
//!
//! ```
//! use openpanel_core::{EventBuilder, Properties};
//!
//! let globals = Properties::new().insert("app_version", "1.0.0");
//! let builder = EventBuilder::new(Some("user_123"), &globals);
//! let event = builder.track("button_clicked", Some(Properties::new().insert("page", "checkout")));
//!
//! let json = event.to_json().unwrap();
//! assert_eq!(json["type"], "track");
//! assert_eq!(json["payload"]["profileId"], "user_123");
//! assert_eq!(json["payload"]["properties"]["app_version"], "1.0.0");
//! ```

pub mod builder;
pub mod payload;
pub mod properties;

pub use builder::{EventBuilder, IDENTIFY_TRAIT_KEYS, PROFILE_ID_KEY};
pub use payload::{
	AliasPayload, CounterPayload, EventKind, IdentifyPayload, Payload, TrackPayload,
};
pub use properties::Properties;
