// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Events held back until a profile is identified.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use openpanel_core::Payload;

/// Unbounded FIFO of gated events.
///
/// The dispatcher pushes and drains while holding the session lock, so a
/// drain never interleaves with a gate decision.
#[derive(Debug, Default)]
pub struct PendingQueue {
	events: Mutex<VecDeque<Payload>>,
}

impl PendingQueue {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, VecDeque<Payload>> {
		self.events.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn push(&self, payload: Payload) {
		self.lock().push_back(payload);
	}

	/// Removes every queued event, oldest first.
	pub fn drain(&self) -> Vec<Payload> {
		self.lock().drain(..).collect()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Clones the queued events without removing them.
	pub fn snapshot(&self) -> Vec<Payload> {
		self.lock().iter().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use openpanel_core::{EventBuilder, Properties};

	fn named(name: &str) -> Payload {
		EventBuilder::new(None, &Properties::new()).track(name, None)
	}

	fn name_of(payload: &Payload) -> &str {
		match payload {
			Payload::Track(p) => &p.name,
			_ => "",
		}
	}

	#[test]
	fn test_drain_is_fifo_and_empties_queue() {
		let queue = PendingQueue::new();
		for name in ["a", "b", "c"] {
			queue.push(named(name));
		}
		assert_eq!(queue.len(), 3);

		let drained = queue.drain();
		let names: Vec<&str> = drained.iter().map(name_of).collect();
		assert_eq!(names, ["a", "b", "c"]);
		assert!(queue.is_empty());
	}

	#[test]
	fn test_snapshot_keeps_events() {
		let queue = PendingQueue::new();
		queue.push(named("a"));
		assert_eq!(queue.snapshot().len(), 1);
		assert_eq!(queue.len(), 1);
	}

	#[test]
	fn test_concurrent_push_and_drain_lose_nothing() {
		let queue = std::sync::Arc::new(PendingQueue::new());
		let producers: Vec<_> = (0..4)
			.map(|t| {
				let queue = std::sync::Arc::clone(&queue);
				std::thread::spawn(move || {
					for i in 0..250 {
						queue.push(named(&format!("{t}-{i}")));
					}
				})
			})
			.collect();

		let mut drained = Vec::new();
		while producers.iter().any(|h| !h.is_finished()) {
			drained.extend(queue.drain());
		}
		for handle in producers {
			handle.join().unwrap();
		}
		drained.extend(queue.drain());

		assert_eq!(drained.len(), 1000);
		let distinct: std::collections::HashSet<String> =
			drained.iter().map(|p| name_of(p).to_string()).collect();
		assert_eq!(distinct.len(), 1000);
	}
}
