//! Final navigation to the caller's landing page.

use tracing::{info, warn};

use crate::browser::BrowserDriver;
use crate::cache_store::CacheStore;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::log::SessionLog;
use crate::route::{Location, RouteClassifier};
use crate::single_flight::SingleFlight;

/// Visits the landing page and rejects sessions that bounce to the login form.
pub struct LandingPageGuard<'a> {
	browser: &'a dyn BrowserDriver,
	config: &'a SessionConfig,
	log: &'a SessionLog,
	routes: RouteClassifier,
}

impl<'a> LandingPageGuard<'a> {
	pub fn new(browser: &'a dyn BrowserDriver, config: &'a SessionConfig, log: &'a SessionLog) -> Self {
		Self {
			browser,
			config,
			log,
			routes: RouteClassifier::new(&config.site),
		}
	}

	/// Navigates to the configured landing page, if any.
	///
	/// Landing on the login form (when the page itself is not the login form)
	/// clears both the cache file and every single-flight entry before failing
	/// with [`SessionError::LandingPageUnreachable`].
	pub async fn check(&self, store: &CacheStore, flights: &dyn SingleFlight) -> Result<()> {
		let Some(page) = self.config.landing_page.as_deref() else {
			return Ok(());
		};

		let target = self.config.resolve(page)?;
		self.browser.navigate(target.as_str()).await?;

		if self.routes.classify(&target) == Location::Login {
			return Ok(());
		}

		let landed = self.browser.current_url().await?;
		if self.routes.classify_str(&landed)? != Location::Login {
			return Ok(());
		}

		self.log.step(format_args!("landing page {page} redirected to the login page, clearing cached sessions"));
		if let Err(err) = store.invalidate().await {
			warn!(target = "slogin.guard", path = %store.path().display(), error = %err, "failed to clear session cache");
		}
		flights.clear_all().await;
		info!(target = "slogin.guard", %page, %landed, "landing page unreachable");

		Err(SessionError::LandingPageUnreachable { page: page.to_string() })
	}
}
