// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust client for OpenPanel product analytics.
//!
//! The client sends track, identify, alias and counter events to an OpenPanel
//! collector. Calls return immediately; each event is delivered by a tracked
//! background task with bounded retry.
//!
//! # Features
//!
//! - Global properties merged into every event
//! - Optional wait-for-profile gate that holds events until `identify`
//! - Event filter and a kill switch (`disabled`)
//! - Configuration from the builder, environment variables or TOML
//!
//! # Example
//!
//! ```no_run
//! use openpanel::{OpenPanel, Properties};
//!
//! # async fn example() -> openpanel::Result<()> {
//! let client = OpenPanel::builder()
//!     .client_id("client_123")
//!     .client_secret("sec_456")
//!     .wait_for_profile(true)
//!     .build()?;
//!
//! client.set_global_properties(Properties::new().insert("app_version", "1.2.0"));
//! client.track("signup_started", Properties::new().insert("plan", "pro"));
//! client.identify("user_42", Properties::new().insert("email", "user@example.com"));
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod queue;
pub mod secret;
pub mod state;
pub mod transport;

pub use client::{OpenPanel, OpenPanelBuilder};
pub use config::{EventFilter, Options, DEFAULT_API_URL};
pub use dispatch::Dispatcher;
pub use error::{OpenPanelError, Result};
pub use lifecycle::{
	AppLifecycle, LifecycleSource, SdkUserAgent, UserAgentProvider, APP_CLOSED, APP_OPENED,
};
pub use queue::PendingQueue;
pub use secret::ClientSecret;
pub use state::{ClientState, StateSnapshot};
pub use transport::{DeliveryOutcome, HttpTransport, Transport, SDK_NAME, SDK_VERSION, TRACK_PATH};

pub use openpanel_core::{
	AliasPayload, CounterPayload, EventBuilder, EventKind, IdentifyPayload, Payload, Properties,
	TrackPayload, PROFILE_ID_KEY,
};
