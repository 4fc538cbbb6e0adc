// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the OpenPanel SDK.
//!
//! This crate provides:
//! - A pre-configured HTTP client builder with the SDK timeouts
//! - Retry logic with exponential backoff for transient failures

mod client;
mod retry;

pub use client::{
	builder, builder_with_timeouts, default_user_agent, DEFAULT_CONNECT_TIMEOUT,
	DEFAULT_READ_TIMEOUT,
};
pub use retry::{calculate_delay, retry, RetryConfig, RetryableError};
