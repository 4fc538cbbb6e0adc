// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client options and their environment / TOML sources.
//!
//! Environment variables:
//!
//! | Variable | Option |
//! |----------|--------|
//! | `OPENPANEL_CLIENT_ID` | `client_id` |
//! | `OPENPANEL_CLIENT_SECRET` / `OPENPANEL_CLIENT_SECRET_FILE` | `client_secret` |
//! | `OPENPANEL_API_URL` | `api_url` |
//! | `OPENPANEL_WAIT_FOR_PROFILE` | `wait_for_profile` |
//! | `OPENPANEL_DISABLED` | `disabled` |
//! | `OPENPANEL_AUTOMATIC_TRACKING` | `automatic_tracking` |
//! | `OPENPANEL_VERBOSE` | `verbose` |

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use openpanel_common_http::{RetryConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
use openpanel_core::Payload;
use serde::Deserialize;

use crate::error::{OpenPanelError, Result};
use crate::secret::ClientSecret;

/// Collector used when no `api_url` is configured.
pub const DEFAULT_API_URL: &str = "https://api.openpanel.dev";

/// Predicate over outgoing events. Returning `false` drops the event.
pub type EventFilter = Arc<dyn Fn(&Payload) -> bool + Send + Sync>;

/// Options recognised by the client.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Options {
	pub client_id: String,
	pub client_secret: Option<ClientSecret>,
	pub api_url: Option<String>,
	/// Hold events until `identify` or `ready` is called.
	pub wait_for_profile: bool,
	#[serde(skip)]
	pub filter: Option<EventFilter>,
	/// Drop every event without sending.
	pub disabled: bool,
	/// Track `app_opened` / `app_closed` from an injected lifecycle source.
	pub automatic_tracking: bool,
	/// Log each HTTP attempt, header and response code.
	pub verbose: bool,
	/// Total delivery attempts per event.
	pub max_retries: u32,
	pub initial_retry_delay_ms: u64,
	pub connect_timeout_ms: u64,
	pub read_timeout_ms: u64,
}

impl Default for Options {
	fn default() -> Self {
		let retry = RetryConfig::default();
		Self {
			client_id: String::new(),
			client_secret: None,
			api_url: None,
			wait_for_profile: false,
			filter: None,
			disabled: false,
			automatic_tracking: false,
			verbose: false,
			max_retries: retry.max_attempts,
			initial_retry_delay_ms: retry.base_delay.as_millis() as u64,
			connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
			read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
		}
	}
}

impl fmt::Debug for Options {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("api_url", &self.api_url)
			.field("wait_for_profile", &self.wait_for_profile)
			.field("filter", &self.filter.as_ref().map(|_| "<fn>"))
			.field("disabled", &self.disabled)
			.field("automatic_tracking", &self.automatic_tracking)
			.field("verbose", &self.verbose)
			.field("max_retries", &self.max_retries)
			.field("initial_retry_delay_ms", &self.initial_retry_delay_ms)
			.finish_non_exhaustive()
	}
}

impl Options {
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			..Self::default()
		}
	}

	/// Loads options from `OPENPANEL_*` environment variables.
	///
	/// Unset variables keep their defaults. A missing client id is reported
	/// when the client is built, not here.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`Options::from_env`] with a custom variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut options = Self::default();
		options.apply_lookup(lookup)?;
		Ok(options)
	}

	/// Overrides fields with any `OPENPANEL_*` values the lookup returns.
	pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(id) = lookup("OPENPANEL_CLIENT_ID") {
			self.client_id = id;
		}
		if let Some(secret) = load_secret(&lookup, "OPENPANEL_CLIENT_SECRET")? {
			self.client_secret = Some(secret);
		}
		if let Some(url) = lookup("OPENPANEL_API_URL") {
			self.api_url = Some(url);
		}
		if let Some(v) = lookup("OPENPANEL_WAIT_FOR_PROFILE") {
			self.wait_for_profile = parse_bool("OPENPANEL_WAIT_FOR_PROFILE", &v)?;
		}
		if let Some(v) = lookup("OPENPANEL_DISABLED") {
			self.disabled = parse_bool("OPENPANEL_DISABLED", &v)?;
		}
		if let Some(v) = lookup("OPENPANEL_AUTOMATIC_TRACKING") {
			self.automatic_tracking = parse_bool("OPENPANEL_AUTOMATIC_TRACKING", &v)?;
		}
		if let Some(v) = lookup("OPENPANEL_VERBOSE") {
			self.verbose = parse_bool("OPENPANEL_VERBOSE", &v)?;
		}
		Ok(())
	}

	pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
		toml::from_str(contents).map_err(|source| OpenPanelError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|source| OpenPanelError::ConfigIo {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&contents, path)
	}

	/// The collector base URL without a trailing slash.
	pub fn base_url(&self) -> Result<String> {
		let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
		let trimmed = raw.trim().trim_end_matches('/');
		reqwest::Url::parse(trimmed).map_err(|e| OpenPanelError::InvalidApiUrl(format!("{raw}: {e}")))?;
		Ok(trimmed.to_string())
	}

	/// Backoff is `initial_retry_delay * 2^(failures - 1)` with no upper bound.
	pub fn retry_config(&self) -> RetryConfig {
		RetryConfig {
			max_attempts: self.max_retries.max(1),
			base_delay: Duration::from_millis(self.initial_retry_delay_ms),
			max_delay: Duration::MAX,
			..RetryConfig::default()
		}
	}

	pub fn connect_timeout(&self) -> Duration {
		Duration::from_millis(self.connect_timeout_ms)
	}

	pub fn read_timeout(&self) -> Duration {
		Duration::from_millis(self.read_timeout_ms)
	}
}

/// `VAR_FILE` wins over `VAR`. One trailing newline is stripped from files.
fn load_secret<F>(lookup: &F, var: &str) -> Result<Option<ClientSecret>>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");
	if let Some(path) = lookup(&file_var) {
		if path.is_empty() {
			return Err(OpenPanelError::config(file_var, "secret file path is empty"));
		}
		let contents = std::fs::read_to_string(&path).map_err(|source| OpenPanelError::ConfigIo {
			path: path.into(),
			source,
		})?;
		let value = contents
			.strip_suffix('\n')
			.map(|s| s.strip_suffix('\r').unwrap_or(s))
			.unwrap_or(&contents);
		return Ok(Some(ClientSecret::new(value)));
	}

	Ok(lookup(var).map(ClientSecret::new))
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(OpenPanelError::config(
			field,
			format!("expected a boolean, got '{other}'"),
		)),
	}
}
