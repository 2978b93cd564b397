//! Host-facing entry point tying orchestration, single-flight and the guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::browser::BrowserDriver;
use crate::cache_store::CacheStore;
use crate::config::{SCHEMA_VERSION, SessionConfig};
use crate::credentials::Credentials;
use crate::error::{Result, SessionError};
use crate::fs::{SessionFs, TokioFs};
use crate::guard::LandingPageGuard;
use crate::log::SessionLog;
use crate::orchestrator::{SessionOrchestrator, SessionOutcome};
use crate::single_flight::{InProcessSingleFlight, SessionSnapshot, SingleFlight};

/// Establishes reusable login sessions for one configuration.
pub struct SessionLogin {
	config: SessionConfig,
	store: CacheStore,
	flights: Arc<dyn SingleFlight>,
	log: SessionLog,
}

impl SessionLogin {
	/// Validates `config` and binds it to its collaborators.
	pub fn new(config: SessionConfig, fs: Arc<dyn SessionFs>, flights: Arc<dyn SingleFlight>, log: SessionLog) -> Result<Self> {
		config.validate()?;
		let store = CacheStore::new(config.cookies_filepath.clone(), SCHEMA_VERSION, fs);
		Ok(Self {
			config,
			store,
			flights,
			log,
		})
	}

	/// Real filesystem, in-process single-flight, `tracing` step lines.
	pub fn with_defaults(config: SessionConfig) -> Result<Self> {
		let log = SessionLog::tracing(config.verbose_logging);
		Self::new(config, Arc::new(TokioFs), Arc::new(InProcessSingleFlight::new()), log)
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn store(&self) -> &CacheStore {
		&self.store
	}

	/// Leaves `browser` authenticated as `credentials` and on the landing page.
	///
	/// Setup runs at most once per single-flight key; a request that reuses
	/// another request's result gets that run's cookies installed instead.
	pub async fn establish(&self, browser: &dyn BrowserDriver, credentials: &Credentials) -> Result<SessionOutcome> {
		credentials.validate()?;

		let key = credentials.session_key(self.config.obscure_password);
		self.log.step(format_args!("establishing session for {key}"));

		let ran_setup = AtomicBool::new(false);
		let orchestrator = SessionOrchestrator::new(browser, &self.store, &self.config, &self.log);
		let setup = async {
			ran_setup.store(true, Ordering::SeqCst);
			let outcome = orchestrator.run(credentials).await?;
			let cookies = browser.cookies().await?;
			Ok::<_, SessionError>(SessionSnapshot { outcome, cookies })
		};

		let snapshot = self.flights.run_once(&key, &self.config.session_options, Box::pin(setup)).await?;
		if !ran_setup.load(Ordering::SeqCst) {
			debug!(target = "slogin.session", %key, cookies = snapshot.cookies.len(), "restoring reused session");
			for cookie in &snapshot.cookies {
				browser.set_cookie(cookie).await?;
			}
		}

		LandingPageGuard::new(browser, &self.config, &self.log)
			.check(&self.store, self.flights.as_ref())
			.await?;
		Ok(snapshot.outcome)
	}
}
