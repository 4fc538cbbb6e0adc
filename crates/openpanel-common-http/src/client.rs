// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client builder with the SDK's timeouts and User-Agent.

use reqwest::ClientBuilder;
use std::time::Duration;

/// Connect timeout applied to every request.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read timeout applied to every request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a client builder with the default timeouts and the given User-Agent.
///
/// # Example
/// ```ignore
/// let client = openpanel_common_http::builder("OpenPanelRust/0.1.0").build()?;
/// ```
pub fn builder(user_agent: impl Into<String>) -> ClientBuilder {
	builder_with_timeouts(user_agent, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
}

/// Creates a client builder with custom connect and read timeouts.
pub fn builder_with_timeouts(
	user_agent: impl Into<String>,
	connect_timeout: Duration,
	read_timeout: Duration,
) -> ClientBuilder {
	reqwest::Client::builder()
		.user_agent(user_agent.into())
		.connect_timeout(connect_timeout)
		.read_timeout(read_timeout)
}

/// Returns the SDK User-Agent for a given SDK version.
///
/// Format: `OpenPanelRust/{version} ({os}; {arch})`
pub fn default_user_agent(sdk_version: &str) -> String {
	format!(
		"OpenPanelRust/{} ({}; {})",
		sdk_version,
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = default_user_agent("1.2.3");
		assert!(ua.starts_with("OpenPanelRust/1.2.3 ("));
		assert!(ua.ends_with(')'));
		assert!(ua.contains(std::env::consts::OS));
	}

	#[test]
	fn builder_produces_client() {
		let client = builder("test-agent/1.0").build();
		assert!(client.is_ok());
	}
}
