// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacted holder for the OpenPanel client secret.

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Placeholder printed instead of the secret.
pub const REDACTED: &str = "[REDACTED]";

/// The `openpanel-client-secret` value.
///
/// Debug and Display print [`REDACTED`]; the memory is zeroed on drop.
/// Call [`ClientSecret::expose`] to read the value.
///
/// ```
/// use openpanel::ClientSecret;
///
/// let secret = ClientSecret::new("sec_9679b09055dcb5b91597");
/// assert_eq!(format!("{secret}"), "[REDACTED]");
/// assert_eq!(secret.expose(), "sec_9679b09055dcb5b91597");
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct ClientSecret(String);

impl ClientSecret {
	pub fn new(secret: impl Into<String>) -> Self {
		Self(secret.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for ClientSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ClientSecret").field(&REDACTED).finish()
	}
}

impl fmt::Display for ClientSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for ClientSecret {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self)
	}
}
