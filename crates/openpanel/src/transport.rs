// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP delivery of single events with bounded retry.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use openpanel_common_http::RetryConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::config::Options;
use crate::error::{OpenPanelError, Result};
use crate::secret::{ClientSecret, REDACTED};

/// Collector path every event is posted to.
pub const TRACK_PATH: &str = "/track";
/// Value of the `openpanel-sdk-name` header.
pub const SDK_NAME: &str = "rust";
/// Value of the `openpanel-sdk-version` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

const CLIENT_ID_HEADER: HeaderName = HeaderName::from_static("openpanel-client-id");
const CLIENT_SECRET_HEADER: HeaderName = HeaderName::from_static("openpanel-client-secret");
const SDK_NAME_HEADER: HeaderName = HeaderName::from_static("openpanel-sdk-name");
const SDK_VERSION_HEADER: HeaderName = HeaderName::from_static("openpanel-sdk-version");

/// Result of delivering one event.
#[derive(Debug)]
pub enum DeliveryOutcome {
	/// The collector answered 2xx with this body.
	Success(String),
	/// Every attempt failed; carries the last error.
	Failure(OpenPanelError),
}

impl DeliveryOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, DeliveryOutcome::Success(_))
	}
}

/// Sends one JSON body to the collector.
///
/// Implementations retry internally and never return an error; the outcome
/// says whether the event made it.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn deliver(
		&self,
		path: &str,
		body: &Value,
		extra_headers: &[(String, String)],
	) -> DeliveryOutcome;
}

/// [`Transport`] over reqwest.
pub struct HttpTransport {
	http_client: Client,
	base_url: String,
	headers: HeaderMap,
	retry_config: RetryConfig,
	verbose: bool,
}

impl HttpTransport {
	pub fn new(options: &Options, user_agent: &str) -> Result<Self> {
		let base_url = options.base_url()?;
		let headers = client_headers(&options.client_id, options.client_secret.as_ref(), user_agent)?;

		let http_client = openpanel_common_http::builder_with_timeouts(
			user_agent,
			options.connect_timeout(),
			options.read_timeout(),
		)
		.build()
		.map_err(OpenPanelError::Network)?;

		Ok(Self {
			http_client,
			base_url,
			headers,
			retry_config: options.retry_config(),
			verbose: options.verbose,
		})
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// The fixed headers sent with every request.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	async fn attempt(
		&self,
		url: &str,
		body: &Value,
		extra_headers: &[(String, String)],
		attempt: u32,
	) -> Result<String> {
		if self.verbose {
			info!(
				url,
				attempt,
				max_attempts = self.retry_config.max_attempts,
				"OpenPanel: sending request"
			);
			for (name, value) in &self.headers {
				info!(header = %name, value = header_for_log(value), "OpenPanel: request header");
			}
			for (name, value) in extra_headers {
				info!(header = %name, value = %value, "OpenPanel: request option header");
			}
		}

		let bytes = serde_json::to_vec(body)?;
		if self.verbose {
			info!(body = %String::from_utf8_lossy(&bytes), "OpenPanel: request body");
		}

		let mut request = self.http_client.post(url).headers(self.headers.clone());
		for (name, value) in extra_headers {
			request = request.header(name.as_str(), value.as_str());
		}

		let response = request.body(bytes).send().await.map_err(|e| {
			if self.verbose {
				info!(error = %e, attempt, "OpenPanel: request failed");
			}
			OpenPanelError::Network(e)
		})?;

		let status = response.status();
		if self.verbose {
			info!(status = status.as_u16(), attempt, "OpenPanel: response code");
		}

		if status.is_success() {
			return Ok(response.text().await?);
		}

		let body = response.text().await.unwrap_or_default();
		if self.verbose {
			info!(status = status.as_u16(), body = %body, "OpenPanel: error response");
		}
		Err(OpenPanelError::Protocol {
			status: status.as_u16(),
			body,
		})
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn deliver(
		&self,
		path: &str,
		body: &Value,
		extra_headers: &[(String, String)],
	) -> DeliveryOutcome {
		let url = format!("{}{}", self.base_url, path);
		let attempts = AtomicU32::new(0);

		let result = openpanel_common_http::retry(&self.retry_config, || {
			let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
			self.attempt(&url, body, extra_headers, attempt)
		})
		.await;

		match result {
			Ok(text) => DeliveryOutcome::Success(text),
			Err(err) => {
				if self.verbose {
					info!(
						url = %url,
						attempts = attempts.load(Ordering::Relaxed),
						"OpenPanel: all attempts failed"
					);
				}
				DeliveryOutcome::Failure(err)
			}
		}
	}
}

fn client_headers(
	client_id: &str,
	client_secret: Option<&ClientSecret>,
	user_agent: &str,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	headers.insert(CLIENT_ID_HEADER, header_value("client_id", client_id)?);
	headers.insert(SDK_NAME_HEADER, HeaderValue::from_static(SDK_NAME));
	headers.insert(SDK_VERSION_HEADER, HeaderValue::from_static(SDK_VERSION));
	headers.insert(USER_AGENT, header_value("user_agent", user_agent)?);
	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	if let Some(secret) = client_secret {
		let mut value = header_value("client_secret", secret.expose())?;
		value.set_sensitive(true);
		headers.insert(CLIENT_SECRET_HEADER, value);
	}

	Ok(headers)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value)
		.map_err(|_| OpenPanelError::config(field, "contains characters not allowed in an HTTP header"))
}

fn header_for_log(value: &HeaderValue) -> &str {
	if value.is_sensitive() {
		REDACTED
	} else {
		value.to_str().unwrap_or("<non-ascii>")
	}
}
