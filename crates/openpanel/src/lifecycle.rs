// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host platform capabilities injected into the client at construction.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use openpanel_core::Properties;

use crate::client::OpenPanel;
use crate::transport::SDK_VERSION;

/// Event tracked when the first foreground unit starts.
pub const APP_OPENED: &str = "app_opened";
/// Event tracked when the last foreground unit stops.
pub const APP_CLOSED: &str = "app_closed";

/// Supplies the `user-agent` header value.
pub trait UserAgentProvider: Send + Sync {
	fn user_agent(&self) -> String;
}

/// `OpenPanelRust/{version} ({os}; {arch})`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkUserAgent;

impl UserAgentProvider for SdkUserAgent {
	fn user_agent(&self) -> String {
		openpanel_common_http::default_user_agent(SDK_VERSION)
	}
}

impl<F> UserAgentProvider for F
where
	F: Fn() -> String + Send + Sync,
{
	fn user_agent(&self) -> String {
		self()
	}
}

/// A host event source for automatic tracking.
///
/// Called once at build time when `automatic_tracking` is enabled. The
/// source keeps the [`AppLifecycle`] and reports foreground starts and stops
/// to it.
pub trait LifecycleSource: Send + Sync {
	fn attach(&self, lifecycle: AppLifecycle);
}

/// Counts started foreground units and tracks open/close transitions.
#[derive(Clone)]
pub struct AppLifecycle {
	client: OpenPanel,
	started: Arc<AtomicUsize>,
}

impl AppLifecycle {
	pub fn new(client: OpenPanel) -> Self {
		Self {
			client,
			started: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn started(&self) {
		if self.started.fetch_add(1, Ordering::AcqRel) == 0 {
			self.client.track(APP_OPENED, Properties::new());
		}
	}

	/// Unbalanced stops are ignored.
	pub fn stopped(&self) {
		let previous = self
			.started
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
		if previous == Ok(1) {
			self.client.track(APP_CLOSED, Properties::new());
		}
	}

	pub fn active(&self) -> usize {
		self.started.load(Ordering::Acquire)
	}
}
