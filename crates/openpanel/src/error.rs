// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the OpenPanel SDK.

use std::path::PathBuf;

use openpanel_common_http::RetryableError;
use thiserror::Error;

/// OpenPanel SDK errors.
#[derive(Debug, Error)]
pub enum OpenPanelError {
	/// The required client id was not configured.
	#[error("client id is required")]
	MissingClientId,

	/// The API URL could not be parsed.
	#[error("invalid API URL: {0}")]
	InvalidApiUrl(String),

	/// No tokio runtime was supplied and none is running.
	#[error("no tokio runtime available; call from within a runtime or pass one to the builder")]
	NoRuntime,

	/// A configuration value from the environment or a file is invalid.
	#[error("invalid value for {field}: {message}")]
	Config { field: String, message: String },

	/// A configuration file could not be read.
	#[error("failed to read config file {path}: {source}")]
	ConfigIo {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A configuration file is not valid TOML for [`crate::Options`].
	#[error("TOML parse error in {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Connection, DNS, TLS or timeout failure.
	#[error("HTTP request failed: {0}")]
	Network(#[from] reqwest::Error),

	/// The server answered with a non-2xx status.
	#[error("server error ({status}): {body}")]
	Protocol { status: u16, body: String },

	/// The payload could not be encoded as JSON.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Client has been shut down.
	#[error("client has been shut down")]
	ClientShutdown,
}

impl OpenPanelError {
	pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Config {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Every delivery failure is retried; configuration errors are not.
impl RetryableError for OpenPanelError {
	fn is_retryable(&self) -> bool {
		matches!(
			self,
			OpenPanelError::Network(_)
				| OpenPanelError::Protocol { .. }
				| OpenPanelError::Serialization(_)
		)
	}
}

/// Result type alias for OpenPanel operations.
pub type Result<T> = std::result::Result<T, OpenPanelError>;
