// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event dispatch: policy checks, the wait-for-profile gate and background
//! delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use openpanel_core::Payload;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::error::{OpenPanelError, Result};
use crate::queue::PendingQueue;
use crate::state::ClientState;
use crate::transport::{DeliveryOutcome, Transport, TRACK_PATH};

/// Routes events either into the [`PendingQueue`] or onto the runtime as a
/// tracked delivery task.
pub struct Dispatcher {
	state: Arc<ClientState>,
	queue: PendingQueue,
	transport: Arc<dyn Transport>,
	runtime: Handle,
	tasks: TaskTracker,
	closed: AtomicBool,
}

impl Dispatcher {
	pub fn new(state: Arc<ClientState>, transport: Arc<dyn Transport>, runtime: Handle) -> Self {
		Self {
			state,
			queue: PendingQueue::new(),
			transport,
			runtime,
			tasks: TaskTracker::new(),
			closed: AtomicBool::new(false),
		}
	}

	pub fn state(&self) -> &Arc<ClientState> {
		&self.state
	}

	/// Queues or delivers one event. Never blocks on I/O.
	pub fn send(&self, payload: Payload) {
		if !self.admit(&payload) {
			return;
		}

		// The closed check, the gate and the spawn share the lock with
		// `shutdown`, so no event is queued or spawned after it drains.
		let session = self.state.lock();
		if let Err(err) = self.ensure_open() {
			warn!(event_type = %payload.kind(), error = %err, "dropping event");
			return;
		}
		if session.gates(&payload) {
			self.queue.push(payload);
			debug!(
				pending = self.queue.len(),
				"event queued until a profile is identified"
			);
			return;
		}
		let resolved = payload.with_profile_fallback(session.profile_id.as_deref());
		self.spawn_delivery(resolved);
	}

	/// Resubmits every pending event, oldest first.
	pub fn flush(&self) {
		let drained = {
			let _session = self.state.lock();
			self.queue.drain()
		};
		self.resubmit(drained);
	}

	/// Sets the profile id and resubmits the queue in one step.
	pub fn identify_profile(&self, profile_id: &str) {
		let drained = {
			let mut session = self.state.lock();
			session.profile_id = Some(profile_id.to_string());
			self.queue.drain()
		};
		self.resubmit(drained);
	}

	/// Lifts the wait-for-profile gate and resubmits the queue.
	pub fn ready(&self) {
		let drained = {
			let mut session = self.state.lock();
			session.waiting_for_profile = false;
			self.queue.drain()
		};
		self.resubmit(drained);
	}

	pub fn pending_len(&self) -> usize {
		self.queue.len()
	}

	pub fn pending_snapshot(&self) -> Vec<Payload> {
		self.queue.snapshot()
	}

	/// Number of deliveries still running.
	pub fn in_flight(&self) -> usize {
		self.tasks.len()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	/// Stops accepting events and waits for every in-flight delivery.
	///
	/// Events still gated in the queue are discarded.
	pub async fn shutdown(&self) {
		let abandoned = {
			let _session = self.state.lock();
			if self.closed.swap(true, Ordering::AcqRel) {
				None
			} else {
				Some(self.queue.drain().len())
			}
		};

		if let Some(abandoned) = abandoned {
			if abandoned > 0 {
				warn!(abandoned, "discarding events still waiting for a profile");
			}
			self.tasks.close();
		}
		self.tasks.wait().await;
	}

	/// False for events dropped by the disabled flag or the filter.
	fn admit(&self, payload: &Payload) -> bool {
		if self.state.is_disabled() {
			return false;
		}
		if !self.state.accepts(payload) {
			debug!(event_type = %payload.kind(), "event rejected by filter");
			return false;
		}
		true
	}

	fn ensure_open(&self) -> Result<()> {
		if self.is_closed() {
			return Err(OpenPanelError::ClientShutdown);
		}
		Ok(())
	}

	fn resubmit(&self, events: Vec<Payload>) {
		if !events.is_empty() {
			debug!(count = events.len(), "resubmitting pending events");
		}
		for event in events {
			self.send(event);
		}
	}

	fn spawn_delivery(&self, payload: Payload) {
		let transport = Arc::clone(&self.transport);
		self.tasks.spawn_on(
			async move {
				deliver(transport.as_ref(), payload).await;
			},
			&self.runtime,
		);
	}
}

async fn deliver(transport: &dyn Transport, payload: Payload) -> DeliveryOutcome {
	let kind = payload.kind();
	let body = match payload.to_json() {
		Ok(body) => body,
		Err(err) => {
			error!(event_type = %kind, error = %err, "failed to encode event");
			return DeliveryOutcome::Failure(err.into());
		}
	};

	let outcome = transport.deliver(TRACK_PATH, &body, &[]).await;
	match &outcome {
		DeliveryOutcome::Success(_) => debug!(event_type = %kind, "event delivered"),
		DeliveryOutcome::Failure(err) => {
			error!(event_type = %kind, error = %err, "event delivery failed")
		}
	}
	outcome
}
