// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON object map used for event properties, identify traits and global properties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A string-keyed map of JSON values.
///
/// Later writes win on key collision. Key order carries no meaning.
///
/// # Example
///
/// ```
/// use openpanel_core::Properties;
///
/// let props = Properties::new()
///     .insert("button_id", "submit_form")
///     .insert("page", "checkout")
///     .insert("price", 99.99)
///     .insert("is_premium", true);
/// assert_eq!(props.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
	inner: Map<String, Value>,
}

impl Properties {
	pub fn new() -> Self {
		Self { inner: Map::new() }
	}

	/// Inserts a key-value pair (builder style).
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Inserts a key-value pair in place, returning the previous value.
	pub fn set<K, V>(&mut self, key: K, value: V) -> Option<Value>
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into())
	}

	/// Copies every entry of `other` into `self`. Entries from `other` win.
	pub fn extend(&mut self, other: &Properties) {
		for (k, v) in &other.inner {
			self.inner.insert(k.clone(), v.clone());
		}
	}

	/// Consuming variant of [`Properties::extend`].
	pub fn merge(mut self, other: Properties) -> Self {
		self.inner.extend(other.inner);
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	/// Returns the value under `key` if it is a JSON string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.inner.get(key).and_then(Value::as_str)
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.inner.remove(key)
	}

	/// Removes and returns the value under `key` only when it is a string.
	///
	/// Non-string values are left in place.
	pub fn take_string(&mut self, key: &str) -> Option<String> {
		match self.inner.get(key) {
			Some(Value::String(_)) => match self.inner.remove(key) {
				Some(Value::String(s)) => Some(s),
				_ => None,
			},
			_ => None,
		}
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.contains_key(key)
	}

	pub fn clear(&mut self) {
		self.inner.clear();
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.inner.iter()
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}
}

impl From<Properties> for Value {
	fn from(props: Properties) -> Self {
		props.into_value()
	}
}

/// Non-object values convert to an empty map.
impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { inner: map },
			_ => Self::new(),
		}
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self { inner: map }
	}
}

impl<K, V> FromIterator<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			inner: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_new_is_empty() {
		let props = Properties::new();
		assert!(props.is_empty());
		assert_eq!(props.len(), 0);
	}

	#[test]
	fn test_insert_overwrites_existing_key() {
		let props = Properties::new().insert("a", 1).insert("a", 2);
		assert_eq!(props.len(), 1);
		assert_eq!(props.get("a"), Some(&Value::from(2)));
	}

	#[test]
	fn test_extend_other_wins() {
		let mut base = Properties::new().insert("a", 1).insert("b", 2);
		base.extend(&Properties::new().insert("b", 20).insert("c", 3));

		assert_eq!(base.len(), 3);
		assert_eq!(base.get("a"), Some(&Value::from(1)));
		assert_eq!(base.get("b"), Some(&Value::from(20)));
		assert_eq!(base.get("c"), Some(&Value::from(3)));
	}

	#[test]
	fn test_take_string_removes_strings_only() {
		let mut props = Properties::new()
			.insert("email", "john@example.com")
			.insert("avatar", 42);

		assert_eq!(props.take_string("email"), Some("john@example.com".to_string()));
		assert!(!props.contains_key("email"));

		assert_eq!(props.take_string("avatar"), None);
		assert_eq!(props.get("avatar"), Some(&Value::from(42)));

		assert_eq!(props.take_string("missing"), None);
	}

	#[test]
	fn test_from_non_object_value_is_empty() {
		let props = Properties::from(Value::String("nope".to_string()));
		assert!(props.is_empty());
	}

	#[test]
	fn test_serializes_as_plain_object() {
		let props = Properties::new().insert("plan", "pro");
		let json = serde_json::to_value(&props).unwrap();
		assert_eq!(json, serde_json::json!({"plan": "pro"}));
	}

	#[test]
	fn test_from_iterator() {
		let props: Properties = [("a", 1), ("b", 2)].into_iter().collect();
		assert_eq!(props.len(), 2);
		assert_eq!(props.get("b"), Some(&Value::from(2)));
	}

	proptest! {
		#[test]
		fn len_matches_distinct_keys(keys in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
			let distinct: std::collections::HashSet<_> = keys.iter().cloned().collect();
			let mut props = Properties::new();
			for key in &keys {
				props.set(key.clone(), true);
			}
			prop_assert_eq!(props.len(), distinct.len());
		}
	}
}
