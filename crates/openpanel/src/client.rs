// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The OpenPanel client and its builder.

use std::sync::Arc;
use std::time::Duration;

use openpanel_core::{EventBuilder, Payload, Properties};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::config::Options;
use crate::dispatch::Dispatcher;
use crate::error::{OpenPanelError, Result};
use crate::lifecycle::{AppLifecycle, LifecycleSource, SdkUserAgent, UserAgentProvider};
use crate::secret::ClientSecret;
use crate::state::ClientState;
use crate::transport::{HttpTransport, Transport};

/// Builder for [`OpenPanel`].
pub struct OpenPanelBuilder {
	options: Options,
	runtime: Option<Handle>,
	transport: Option<Arc<dyn Transport>>,
	user_agent: Arc<dyn UserAgentProvider>,
	lifecycle_source: Option<Arc<dyn LifecycleSource>>,
}

impl Default for OpenPanelBuilder {
	fn default() -> Self {
		Self {
			options: Options::default(),
			runtime: None,
			transport: None,
			user_agent: Arc::new(SdkUserAgent),
			lifecycle_source: None,
		}
	}
}

impl OpenPanelBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces every option at once, for example with [`Options::from_env`].
	pub fn options(mut self, options: Options) -> Self {
		self.options = options;
		self
	}

	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.options.client_id = client_id.into();
		self
	}

	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.options.client_secret = Some(ClientSecret::new(secret));
		self
	}

	/// Overrides the collector URL. Defaults to [`crate::DEFAULT_API_URL`].
	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.options.api_url = Some(url.into());
		self
	}

	/// Holds events until [`OpenPanel::identify`] or [`OpenPanel::ready`].
	pub fn wait_for_profile(mut self, wait: bool) -> Self {
		self.options.wait_for_profile = wait;
		self
	}

	/// Events for which `filter` returns false are dropped.
	pub fn filter<F>(mut self, filter: F) -> Self
	where
		F: Fn(&Payload) -> bool + Send + Sync + 'static,
	{
		self.options.filter = Some(Arc::new(filter));
		self
	}

	pub fn disabled(mut self, disabled: bool) -> Self {
		self.options.disabled = disabled;
		self
	}

	pub fn automatic_tracking(mut self, enabled: bool) -> Self {
		self.options.automatic_tracking = enabled;
		self
	}

	pub fn verbose(mut self, verbose: bool) -> Self {
		self.options.verbose = verbose;
		self
	}

	/// Total attempts per event, including the first.
	pub fn max_retries(mut self, attempts: u32) -> Self {
		self.options.max_retries = attempts;
		self
	}

	pub fn initial_retry_delay(mut self, delay: Duration) -> Self {
		self.options.initial_retry_delay_ms = delay.as_millis() as u64;
		self
	}

	/// Runtime that delivery tasks are spawned on. Defaults to the runtime
	/// `build` is called from.
	pub fn runtime(mut self, handle: Handle) -> Self {
		self.runtime = Some(handle);
		self
	}

	/// Replaces the HTTP transport.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn user_agent_provider(mut self, provider: Arc<dyn UserAgentProvider>) -> Self {
		self.user_agent = provider;
		self
	}

	pub fn lifecycle_source(mut self, source: Arc<dyn LifecycleSource>) -> Self {
		self.lifecycle_source = Some(source);
		self
	}

	pub fn build(self) -> Result<OpenPanel> {
		let options = self.options;
		if options.client_id.trim().is_empty() {
			return Err(OpenPanelError::MissingClientId);
		}

		let runtime = match self.runtime {
			Some(handle) => handle,
			None => Handle::try_current().map_err(|_| OpenPanelError::NoRuntime)?,
		};

		let base_url = options.base_url()?;
		let transport = match self.transport {
			Some(transport) => transport,
			None => {
				let user_agent = self.user_agent.user_agent();
				Arc::new(HttpTransport::new(&options, &user_agent)?) as Arc<dyn Transport>
			}
		};

		let state = Arc::new(ClientState::new(
			options.disabled,
			options.wait_for_profile,
			options.filter.clone(),
		));
		let dispatcher = Dispatcher::new(state, transport, runtime);

		info!(
			base_url = %base_url,
			wait_for_profile = options.wait_for_profile,
			disabled = options.disabled,
			"OpenPanel client initialized"
		);

		let client = OpenPanel {
			inner: Arc::new(ClientInner { dispatcher }),
		};

		if options.automatic_tracking {
			match self.lifecycle_source {
				Some(source) => source.attach(AppLifecycle::new(client.clone())),
				None => warn!("automatic tracking enabled without a lifecycle source"),
			}
		}

		Ok(client)
	}
}

struct ClientInner {
	dispatcher: Dispatcher,
}

/// OpenPanel analytics client.
///
/// Cloning is cheap; clones share one session and one delivery pipeline.
/// Every tracking call returns immediately and delivers in the background.
#[derive(Clone)]
pub struct OpenPanel {
	inner: Arc<ClientInner>,
}

impl OpenPanel {
	pub fn builder() -> OpenPanelBuilder {
		OpenPanelBuilder::new()
	}

	pub fn new(options: Options) -> Result<Self> {
		Self::builder().options(options).build()
	}

	fn state(&self) -> &ClientState {
		self.inner.dispatcher.state()
	}

	fn build_and_send(&self, build: impl FnOnce(&EventBuilder<'_>) -> Payload) {
		let snapshot = self.state().snapshot();
		let builder = EventBuilder::new(snapshot.profile_id.as_deref(), &snapshot.global_properties);
		self.inner.dispatcher.send(build(&builder));
	}

	/// Tracks a named event.
	///
	/// A string `profileId` entry in `properties` overrides the identified
	/// profile for this event.
	pub fn track(&self, name: impl Into<String>, properties: Properties) {
		let name = name.into();
		self.build_and_send(|b| b.track(name, Some(properties)));
	}

	/// Identifies the current user and releases events waiting for a profile.
	///
	/// `firstName`, `lastName`, `email` and `avatar` string traits are sent as
	/// dedicated fields.
	pub fn identify(&self, profile_id: impl Into<String>, traits: Properties) {
		let profile_id = profile_id.into();
		self.inner.dispatcher.identify_profile(&profile_id);
		self.build_and_send(|b| b.identify(profile_id, Some(traits)));
	}

	pub fn alias(&self, profile_id: impl Into<String>, alias: impl Into<String>) {
		let (profile_id, alias) = (profile_id.into(), alias.into());
		self.build_and_send(|b| b.alias(profile_id, alias));
	}

	/// Increments a numeric profile property by `value`, or by one on the
	/// server when `value` is `None`.
	pub fn increment(
		&self,
		profile_id: impl Into<String>,
		property: impl Into<String>,
		value: Option<i64>,
	) {
		let (profile_id, property) = (profile_id.into(), property.into());
		self.build_and_send(|b| b.increment(profile_id, property, value));
	}

	pub fn decrement(
		&self,
		profile_id: impl Into<String>,
		property: impl Into<String>,
		value: Option<i64>,
	) {
		let (profile_id, property) = (profile_id.into(), property.into());
		self.build_and_send(|b| b.decrement(profile_id, property, value));
	}

	/// Merges `properties` into every later event. Later calls overwrite
	/// earlier keys.
	pub fn set_global_properties(&self, properties: Properties) {
		self.state().set_global_properties(&properties);
	}

	/// Forgets the identified profile and the global properties.
	///
	/// Queued events are kept.
	pub fn clear(&self) {
		self.state().clear();
	}

	/// Resubmits queued events.
	pub fn flush(&self) {
		self.inner.dispatcher.flush();
	}

	/// Stops waiting for a profile and sends everything queued so far.
	pub fn ready(&self) {
		self.inner.dispatcher.ready();
	}

	pub fn profile_id(&self) -> Option<String> {
		self.state().profile_id()
	}

	pub fn global_properties(&self) -> Properties {
		self.state().snapshot().global_properties
	}

	/// Events currently held back by the wait-for-profile gate.
	pub fn pending_len(&self) -> usize {
		self.inner.dispatcher.pending_len()
	}

	pub fn is_disabled(&self) -> bool {
		self.state().is_disabled()
	}

	/// Stops accepting events and waits for in-flight deliveries.
	pub async fn shutdown(&self) {
		info!(
			in_flight = self.inner.dispatcher.in_flight(),
			"shutting down OpenPanel client"
		);
		self.inner.dispatcher.shutdown().await;
		info!("OpenPanel client shut down");
	}
}

impl std::fmt::Debug for OpenPanel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OpenPanel")
			.field("profile_id", &self.profile_id())
			.field("pending", &self.pending_len())
			.field("disabled", &self.is_disabled())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dispatch::tests::RecordingTransport;
	use openpanel_core::EventKind;
	use serde_json::{json, Value};

	fn client_with(
		configure: impl FnOnce(OpenPanelBuilder) -> OpenPanelBuilder,
	) -> (OpenPanel, Arc<RecordingTransport>) {
		let transport = Arc::new(RecordingTransport::default());
		let builder = OpenPanel::builder()
			.client_id("client_1")
			.transport(transport.clone());
		(configure(builder).build().unwrap(), transport)
	}

	fn by_type<'a>(bodies: &'a [Value], kind: &str) -> Vec<&'a Value> {
		bodies.iter().filter(|b| b["type"] == kind).collect()
	}

	#[test]
	fn test_build_requires_client_id() {
		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		let result = OpenPanel::builder().runtime(runtime.handle().clone()).build();
		assert!(matches!(result, Err(OpenPanelError::MissingClientId)));

		let result = OpenPanel::builder()
			.client_id("   ")
			.runtime(runtime.handle().clone())
			.build();
		assert!(matches!(result, Err(OpenPanelError::MissingClientId)));
	}

	#[test]
	fn test_build_outside_runtime_fails() {
		let result = OpenPanel::builder().client_id("client_1").build();
		assert!(matches!(result, Err(OpenPanelError::NoRuntime)));
	}

	#[test]
	fn test_build_with_explicit_runtime() {
		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()
			.unwrap();
		let client = OpenPanel::builder()
			.client_id("client_1")
			.runtime(runtime.handle().clone())
			.build()
			.unwrap();
		assert!(!client.is_disabled());
	}

	#[tokio::test]
	async fn test_build_rejects_invalid_api_url() {
		let result = OpenPanel::builder()
			.client_id("client_1")
			.api_url("not a url")
			.build();
		assert!(matches!(result, Err(OpenPanelError::InvalidApiUrl(_))));
	}

	#[tokio::test]
	async fn test_global_properties_merge_into_track() {
		let (client, transport) = client_with(|b| b);
		client.set_global_properties(Properties::new().insert("a", 1));
		client.track("one", Properties::new().insert("b", 2));
		client.track("two", Properties::new().insert("a", 5));
		client.shutdown().await;

		let bodies = transport.bodies();
		let props = |name: &str| {
			bodies
				.iter()
				.find(|b| b["payload"]["name"] == name)
				.map(|b| b["payload"]["properties"].clone())
				.unwrap()
		};
		assert_eq!(props("one"), json!({"a": 1, "b": 2}));
		assert_eq!(props("two"), json!({"a": 5}));
	}

	#[tokio::test]
	async fn test_identify_sets_profile_and_sends_traits() {
		let (client, transport) = client_with(|b| b);
		client.identify(
			"p1",
			Properties::new()
				.insert("firstName", "Ada")
				.insert("email", "ada@example.com")
				.insert("plan", "pro"),
		);
		client.track("after", Properties::new());
		client.shutdown().await;

		assert_eq!(client.profile_id().as_deref(), Some("p1"));
		let bodies = transport.bodies();
		let identify = by_type(&bodies, "identify");
		assert_eq!(identify.len(), 1);
		assert_eq!(identify[0]["payload"]["profileId"], "p1");
		assert_eq!(identify[0]["payload"]["firstName"], "Ada");
		assert_eq!(identify[0]["payload"]["email"], "ada@example.com");
		assert_eq!(identify[0]["payload"]["properties"], json!({"plan": "pro"}));

		let track = by_type(&bodies, "track");
		assert_eq!(track[0]["payload"]["profileId"], "p1");
	}

	#[tokio::test]
	async fn test_track_profile_id_property_overrides_session() {
		let (client, transport) = client_with(|b| b);
		client.identify("p1", Properties::new());
		client.track("x", Properties::new().insert("profileId", "p2"));
		client.shutdown().await;

		let bodies = transport.bodies();
		assert_eq!(by_type(&bodies, "track")[0]["payload"]["profileId"], "p2");
	}

	#[tokio::test]
	async fn test_clear_drops_profile_from_later_events() {
		let (client, transport) = client_with(|b| b);
		client.identify("p1", Properties::new());
		client.set_global_properties(Properties::new().insert("a", 1));
		client.clear();
		client.track("x", Properties::new());
		client.shutdown().await;

		assert!(client.profile_id().is_none());
		assert!(client.global_properties().is_empty());
		let bodies = transport.bodies();
		let track = by_type(&bodies, "track")[0];
		assert!(track["payload"].get("profileId").is_none());
		assert!(track["payload"].get("properties").is_none());
	}

	#[tokio::test]
	async fn test_wait_for_profile_queues_until_identify() {
		let (client, transport) = client_with(|b| b.wait_for_profile(true));
		client.track("a", Properties::new());
		client.track("b", Properties::new());
		assert_eq!(client.pending_len(), 2);

		client.identify("p1", Properties::new());
		assert_eq!(client.pending_len(), 0);
		client.shutdown().await;

		let bodies = transport.bodies();
		assert_eq!(by_type(&bodies, "track").len(), 2);
		assert!(bodies.iter().all(|b| b["payload"]["profileId"] == "p1"));
	}

	#[tokio::test]
	async fn test_counters_and_alias_carry_explicit_profile() {
		let (client, transport) = client_with(|b| b);
		client.alias("p1", "anon_1");
		client.increment("p1", "visits", None);
		client.decrement("p1", "credits", Some(3));
		client.shutdown().await;

		let bodies = transport.bodies();
		assert_eq!(by_type(&bodies, "alias")[0]["payload"]["alias"], "anon_1");
		let increment = by_type(&bodies, "increment")[0];
		assert_eq!(increment["payload"]["property"], "visits");
		assert!(increment["payload"].get("value").is_none());
		assert_eq!(by_type(&bodies, "decrement")[0]["payload"]["value"], 3);
	}

	#[tokio::test]
	async fn test_filter_and_disabled() {
		let (client, transport) =
			client_with(|b| b.filter(|p: &Payload| p.kind() != EventKind::Increment));
		client.increment("p1", "visits", None);
		client.track("kept", Properties::new());
		client.shutdown().await;
		assert_eq!(transport.bodies().len(), 1);

		let (client, transport) = client_with(|b| b.disabled(true));
		assert!(client.is_disabled());
		client.track("x", Properties::new());
		client.identify("p1", Properties::new());
		client.alias("p1", "a");
		client.shutdown().await;
		assert!(transport.bodies().is_empty());
	}

	#[tokio::test]
	async fn test_clones_share_session() {
		let (client, _transport) = client_with(|b| b);
		let other = client.clone();
		other.identify("p1", Properties::new());
		assert_eq!(client.profile_id().as_deref(), Some("p1"));
		client.shutdown().await;
	}
}
