// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bounded retry with optional exponential backoff and jitter.
//!
//! The executor runs an async operation up to `max_retries + 1` times,
//! sleeping between attempts. Callers supply operations that are safe to
//! invoke repeatedly; nothing here deduplicates side effects.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Default delay ceiling applied when exponential backoff is enabled and no
/// explicit ceiling is configured.
const DEFAULT_EXPONENTIAL_MAX_WAIT: Duration = Duration::from_secs(10);

/// Per-call retry configuration.
///
/// A strategy is immutable for the duration of a [`retry`] call. The
/// effective per-attempt delay is always clamped to the ceiling when one
/// applies.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
	/// Maximum number of retries after the first attempt.
	pub max_retries: u32,
	/// Base delay between attempts.
	pub delay: Duration,
	/// Whether the delay doubles on every failed attempt. When false, a
	/// constant delay (plus jitter) is used.
	pub exponential: bool,
	/// Ceiling for a single inter-attempt delay. `None` means no ceiling
	/// for constant-delay strategies and ten seconds for exponential ones.
	pub max_wait: Option<Duration>,
}

impl Default for RetryStrategy {
	fn default() -> Self {
		Self {
			max_retries: 5,
			delay: Duration::from_secs(1),
			exponential: false,
			max_wait: None,
		}
	}
}

impl RetryStrategy {
	fn ceiling(&self) -> Option<Duration> {
		self
			.max_wait
			.or(self.exponential.then_some(DEFAULT_EXPONENTIAL_MAX_WAIT))
	}

	/// Computes the delay before the retry following failed attempt
	/// `attempt` (zero-based): `delay * 2^attempt` when exponential, plus a
	/// uniform jitter in `[0, delay)`, clamped to the ceiling.
	fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let base_ms = (self.delay.as_millis() as u64).max(1);

		let multiplier = if self.exponential {
			2u64.saturating_pow(attempt)
		} else {
			1
		};

		// Jitter avoids synchronized retries across workloads polling the
		// same service.
		let jitter_ms = fastrand::u64(0..base_ms);
		let delay_ms = base_ms.saturating_mul(multiplier).saturating_add(jitter_ms);

		let delay = Duration::from_millis(delay_ms);
		match self.ceiling() {
			Some(cap) if delay > cap => cap,
			_ => delay,
		}
	}
}

/// Retries `op` according to `strategy`, returning the first success or the
/// most recent error once all attempts are exhausted.
///
/// The error is returned unchanged; this function never substitutes its own
/// error type. `scope` labels the operation in log output.
///
/// # Example
/// ```ignore
/// let response = warden_common_retry::retry("safe.fetch", &strategy, || async {
///     client.get(url.clone()).send().await
/// })
/// .await?;
/// ```
pub async fn retry<T, E, F, Fut>(scope: &str, strategy: &RetryStrategy, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let mut attempt: u32 = 0;

	loop {
		match op().await {
			Ok(value) => {
				if attempt > 0 {
					debug!(scope, attempt = attempt + 1, "operation succeeded after retry");
				}
				return Ok(value);
			}
			Err(err) => {
				if attempt >= strategy.max_retries {
					debug!(
						scope,
						attempts = attempt + 1,
						"retries exhausted, returning last error"
					);
					return Err(err);
				}

				let delay = strategy.delay_for_attempt(attempt);
				debug!(
					scope,
					attempt = attempt + 1,
					of = strategy.max_retries + 1,
					delay_ms = delay.as_millis() as u64,
					"operation failed, backing off"
				);
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	fn quick_strategy(max_retries: u32) -> RetryStrategy {
		RetryStrategy {
			max_retries,
			delay: Duration::from_millis(10),
			exponential: false,
			max_wait: None,
		}
	}

	#[tokio::test]
	async fn test_success_on_first_attempt_returns_immediately() {
		let calls = AtomicU32::new(0);

		let result: Result<u32, &str> = retry("test", &quick_strategy(5), || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(42)
		})
		.await;

		assert_eq!(result, Ok(42));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_succeeds_after_k_failures_with_k_plus_one_invocations() {
		let calls = AtomicU32::new(0);

		let result: Result<&str, &str> = retry("test", &quick_strategy(5), || async {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			if n < 3 {
				Err("transient")
			} else {
				Ok("done")
			}
		})
		.await;

		assert_eq!(result, Ok("done"));
		assert_eq!(calls.load(Ordering::SeqCst), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_exhaustion_returns_last_error_unchanged() {
		let calls = AtomicU32::new(0);

		let result: Result<(), String> = retry("test", &quick_strategy(2), || async {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			Err(format!("failure {n}"))
		})
		.await;

		// max_retries = 2 means three attempts total; the last error wins.
		assert_eq!(result, Err("failure 2".to_string()));
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_zero_retries_runs_once() {
		let calls = AtomicU32::new(0);

		let result: Result<(), &str> = retry("test", &quick_strategy(0), || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Err("nope")
		})
		.await;

		assert_eq!(result, Err("nope"));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_total_sleep_bounded_by_clamped_delays() {
		let strategy = RetryStrategy {
			max_retries: 3,
			delay: Duration::from_millis(20),
			exponential: true,
			max_wait: Some(Duration::from_millis(50)),
		};

		let start = tokio::time::Instant::now();
		let result: Result<(), &str> = retry("test", &strategy, || async { Err("down") }).await;
		let elapsed = start.elapsed();

		assert!(result.is_err());
		// Three inter-attempt sleeps, each clamped to 50ms.
		assert!(
			elapsed <= Duration::from_millis(150),
			"slept {elapsed:?}, expected <= 150ms"
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_constant_delay_sleeps_between_attempts() {
		let strategy = RetryStrategy {
			max_retries: 2,
			delay: Duration::from_millis(100),
			exponential: false,
			max_wait: None,
		};

		let start = tokio::time::Instant::now();
		let _: Result<(), &str> = retry("test", &strategy, || async { Err("down") }).await;
		let elapsed = start.elapsed();

		// Two sleeps of at least the base delay each, jitter < base.
		assert!(elapsed >= Duration::from_millis(200));
		assert!(elapsed < Duration::from_millis(400));
	}

	#[test]
	fn test_default_strategy_values() {
		let strategy = RetryStrategy::default();
		assert_eq!(strategy.max_retries, 5);
		assert_eq!(strategy.delay, Duration::from_secs(1));
		assert!(!strategy.exponential);
		assert_eq!(strategy.max_wait, None);
	}

	#[test]
	fn test_exponential_delay_clamped_to_default_ceiling() {
		let strategy = RetryStrategy {
			max_retries: 10,
			delay: Duration::from_secs(1),
			exponential: true,
			max_wait: None,
		};

		// 2^9 seconds plus jitter is far past the ten second default cap.
		let delay = strategy.delay_for_attempt(9);
		assert_eq!(delay, DEFAULT_EXPONENTIAL_MAX_WAIT);
	}

	#[test]
	fn test_constant_delay_without_ceiling_is_unclamped() {
		let strategy = RetryStrategy {
			max_retries: 10,
			delay: Duration::from_secs(20),
			exponential: false,
			max_wait: None,
		};

		let delay = strategy.delay_for_attempt(0);
		assert!(delay >= Duration::from_secs(20));
		assert!(delay < Duration::from_secs(40));
	}

	#[test]
	fn test_explicit_ceiling_applies_to_constant_delay() {
		let strategy = RetryStrategy {
			max_retries: 3,
			delay: Duration::from_secs(20),
			exponential: false,
			max_wait: Some(Duration::from_secs(5)),
		};

		assert_eq!(strategy.delay_for_attempt(0), Duration::from_secs(5));
	}
}
