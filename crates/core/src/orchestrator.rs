//! Session orchestration: restore cached cookies, probe, fall back to a real
//! login, then reconcile and persist the observed session cookies.

use slogin_protocol::Cookie;
use tracing::{debug, info};

use crate::browser::BrowserDriver;
use crate::cache_store::{CacheLookup, CacheStore};
use crate::config::SessionConfig;
use crate::credentials::Credentials;
use crate::error::{Result, SessionError};
use crate::log::SessionLog;
use crate::login::LoginFlow;
use crate::reconcile;
use crate::route::{Location, RouteClassifier};

/// How a setup run produced its authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
	/// Cached cookies were accepted by the probe route.
	Restored,
	/// The login form was used; the cache was reconciled afterwards.
	LoggedInFresh,
}

/// What the probe navigation showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
	Authenticated,
	NeedsLogin,
}

/// Per-run state threaded through every step.
#[derive(Debug)]
struct RunContext<'c> {
	credentials: &'c Credentials,
	initial: CacheLookup,
}

impl RunContext<'_> {
	fn username(&self) -> &str {
		self.credentials.username()
	}
}

/// Outcome of merging fresh browser cookies with the re-read cache.
#[derive(Debug)]
struct Reconciliation {
	merged: Vec<Cookie>,
	reloaded: CacheLookup,
}

/// Drives one setup run against a browser and a cache store.
pub struct SessionOrchestrator<'a> {
	browser: &'a dyn BrowserDriver,
	store: &'a CacheStore,
	config: &'a SessionConfig,
	log: &'a SessionLog,
	routes: RouteClassifier,
}

impl<'a> SessionOrchestrator<'a> {
	pub fn new(browser: &'a dyn BrowserDriver, store: &'a CacheStore, config: &'a SessionConfig, log: &'a SessionLog) -> Self {
		Self {
			browser,
			store,
			config,
			log,
			routes: RouteClassifier::new(&config.site),
		}
	}

	/// Establishes an authenticated session for `credentials`.
	///
	/// Empty credentials fail before any browser or file access. Every other
	/// failure aborts the run and leaves the cache file as it was.
	pub async fn run(&self, credentials: &Credentials) -> Result<SessionOutcome> {
		credentials.validate()?;

		let ctx = self.lookup_cache(credentials).await?;
		if self.probe(&ctx).await? == Probe::Authenticated {
			self.log.step("session restored successfully!");
			info!(target = "slogin.session", username = ctx.username(), "session restored from cache");
			return Ok(SessionOutcome::Restored);
		}

		self.fallback_login(&ctx).await?;
		self.verify_post_login().await?;

		let reconciliation = self.reconcile(&ctx).await?;
		self.persist_if_changed(&ctx, reconciliation).await?;

		info!(target = "slogin.session", username = ctx.username(), "logged in with credentials");
		Ok(SessionOutcome::LoggedInFresh)
	}

	/// Loads the user's cached cookies and installs them into the browser.
	async fn lookup_cache<'c>(&self, credentials: &'c Credentials) -> Result<RunContext<'c>> {
		let initial = self.store.load(credentials.username()).await?;

		if initial.found {
			self.log.step("cookie file found!");
			for cookie in &initial.cookies {
				self.browser.set_cookie(cookie).await?;
			}
			debug!(
				target = "slogin.session",
				username = credentials.username(),
				cookies = initial.cookies.len(),
				"installed cached cookies"
			);
		} else {
			self.log.step("cookie file not found...");
		}

		Ok(RunContext { credentials, initial })
	}

	async fn probe(&self, ctx: &RunContext<'_>) -> Result<Probe> {
		let probe_url = self.config.resolve(&self.config.site.admin_path)?;
		self.browser.navigate(probe_url.as_str()).await?;

		let landed = self.browser.current_url().await?;
		match self.routes.classify_str(&landed)? {
			Location::Admin => Ok(Probe::Authenticated),
			Location::Login => {
				if ctx.initial.found {
					self.log.step("session restoration unsuccessful!");
				}
				Ok(Probe::NeedsLogin)
			}
			Location::Other => Err(SessionError::UnexpectedNavigation { url: landed }),
		}
	}

	async fn fallback_login(&self, ctx: &RunContext<'_>) -> Result<()> {
		self.log.step("logging in...");
		let mut flow = LoginFlow::new(self.browser, &self.config.site, self.config.input_retry, self.log, self.config.obscure_password);
		flow.run(ctx.credentials).await?;
		Ok(())
	}

	async fn verify_post_login(&self) -> Result<()> {
		let landed = self.browser.current_url().await?;
		match self.routes.classify_str(&landed)? {
			Location::Admin => Ok(()),
			_ => Err(SessionError::LoginDidNotReachAdmin { url: landed }),
		}
	}

	/// Merges the browser's session cookies with a fresh read of the cache,
	/// which another user's setup may have rewritten since the first read.
	async fn reconcile(&self, ctx: &RunContext<'_>) -> Result<Reconciliation> {
		let fresh = reconcile::session_cookies(self.browser.cookies().await?, &self.config.site.cookie_prefix);
		let reloaded = self.store.load(ctx.username()).await?;
		let merged = reconcile::merge(&fresh, &reloaded.cookies);

		debug!(
			target = "slogin.session",
			username = ctx.username(),
			fresh = fresh.len(),
			cached = reloaded.cookies.len(),
			merged = merged.len(),
			"reconciled session cookies"
		);
		Ok(Reconciliation { merged, reloaded })
	}

	/// Writes the merged cookies into the user's slot. Returns `true` on write.
	async fn persist_if_changed(&self, ctx: &RunContext<'_>, reconciliation: Reconciliation) -> Result<bool> {
		let Reconciliation { merged, reloaded } = reconciliation;
		if !reconcile::has_changed(&merged, &reloaded.cookies) {
			debug!(target = "slogin.session", username = ctx.username(), "session cache unchanged");
			return Ok(false);
		}

		let mut document = reloaded.document;
		document.set_user_cookies(ctx.username(), merged);
		self.store.save(&document).await?;

		if ctx.initial.found {
			self.log.step("updated cookies file.");
		} else {
			self.log.step("saved new cookies file.");
		}
		Ok(true)
	}
}
