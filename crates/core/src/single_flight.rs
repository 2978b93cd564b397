//! Per-key "run once, reuse the result" deduplication of session setups.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use slogin_protocol::Cookie;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::SessionOptions;
use crate::credentials::SessionKey;
use crate::error::Result;
use crate::orchestrator::SessionOutcome;

/// Result of a setup run, kept so later requests for the same key can
/// restore the session into their own browser context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
	pub outcome: SessionOutcome,
	pub cookies: Vec<Cookie>,
}

/// Host-provided single-flight cache around the whole setup routine.
///
/// Concurrent callers with the same key must see `setup` executed once; the
/// others wait for and reuse its result. Failed setups are not cached.
#[async_trait]
pub trait SingleFlight: Send + Sync {
	async fn run_once<'s>(&self, key: &SessionKey, options: &SessionOptions, setup: BoxFuture<'s, Result<SessionSnapshot>>) -> Result<SessionSnapshot>;

	/// Forgets every cached result.
	async fn clear_all(&self);
}

/// [`SingleFlight`] for a single process, one `OnceCell` per key.
#[derive(Debug, Default)]
pub struct InProcessSingleFlight {
	cells: Mutex<HashMap<SessionKey, Arc<OnceCell<SessionSnapshot>>>>,
	runs: AtomicUsize,
}

impl InProcessSingleFlight {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of setups actually executed.
	pub fn runs(&self) -> usize {
		self.runs.load(Ordering::SeqCst)
	}

	pub fn cached_keys(&self) -> usize {
		self.cells.lock().values().filter(|cell| cell.initialized()).count()
	}
}

#[async_trait]
impl SingleFlight for InProcessSingleFlight {
	async fn run_once<'s>(&self, key: &SessionKey, options: &SessionOptions, setup: BoxFuture<'s, Result<SessionSnapshot>>) -> Result<SessionSnapshot> {
		let cell = Arc::clone(self.cells.lock().entry(key.clone()).or_default());
		if let Some(snapshot) = cell.get() {
			debug!(target = "slogin.flight", %key, "reusing cached session");
			return Ok(snapshot.clone());
		}

		let runs = &self.runs;
		let snapshot = cell
			.get_or_try_init(move || async move {
				runs.fetch_add(1, Ordering::SeqCst);
				debug!(
					target = "slogin.flight",
					%key,
					cache_across_specs = options.cache_across_specs,
					"running session setup"
				);
				setup.await
			})
			.await?;
		Ok(snapshot.clone())
	}

	async fn clear_all(&self) {
		self.cells.lock().clear();
		debug!(target = "slogin.flight", "cleared cached sessions");
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::error::SessionError;

	fn key(user: &str) -> SessionKey {
		SessionKey {
			username: user.into(),
			secret: "***".into(),
		}
	}

	fn snapshot() -> SessionSnapshot {
		SessionSnapshot {
			outcome: SessionOutcome::LoggedInFresh,
			cookies: vec![Cookie::new("wordpress_logged_in", "v", "localhost")],
		}
	}

	fn ready() -> BoxFuture<'static, Result<SessionSnapshot>> {
		Box::pin(async { Ok(snapshot()) })
	}

	fn delayed(ms: u64) -> BoxFuture<'static, Result<SessionSnapshot>> {
		Box::pin(async move {
			tokio::time::sleep(Duration::from_millis(ms)).await;
			Ok(snapshot())
		})
	}

	fn failing() -> BoxFuture<'static, Result<SessionSnapshot>> {
		Box::pin(async { Err(SessionError::Browser("crashed".into())) })
	}

	#[tokio::test]
	async fn concurrent_requests_for_one_key_run_setup_once() {
		let flights = InProcessSingleFlight::new();
		let options = SessionOptions::default();
		let k = key("admin");

		let (a, b) = futures::join!(flights.run_once(&k, &options, delayed(20)), flights.run_once(&k, &options, ready()));
		assert_eq!(a.unwrap(), snapshot());
		assert_eq!(b.unwrap(), snapshot());
		assert_eq!(flights.runs(), 1);
	}

	#[tokio::test]
	async fn different_keys_run_independently() {
		let flights = InProcessSingleFlight::new();
		let options = SessionOptions::default();
		flights.run_once(&key("admin"), &options, ready()).await.unwrap();
		flights.run_once(&key("editor"), &options, ready()).await.unwrap();
		assert_eq!(flights.runs(), 2);
		assert_eq!(flights.cached_keys(), 2);
	}

	#[tokio::test]
	async fn failures_are_not_cached() {
		let flights = InProcessSingleFlight::new();
		let options = SessionOptions::default();
		let k = key("admin");

		let failed = flights.run_once(&k, &options, failing()).await;
		assert!(failed.is_err());

		let retried = flights.run_once(&k, &options, ready()).await;
		assert_eq!(retried.unwrap(), snapshot());
		assert_eq!(flights.runs(), 2);
	}

	#[tokio::test]
	async fn clear_all_forces_a_new_run() {
		let flights = InProcessSingleFlight::new();
		let options = SessionOptions::default();
		let k = key("admin");
		flights.run_once(&k, &options, ready()).await.unwrap();

		flights.clear_all().await;
		assert_eq!(flights.cached_keys(), 0);

		flights.run_once(&k, &options, ready()).await.unwrap();
		assert_eq!(flights.runs(), 2);
	}
}
