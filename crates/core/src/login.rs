//! Interactive login through the site's credential form.

use tracing::debug;

use crate::browser::BrowserDriver;
use crate::config::{InputRetry, SiteProfile};
use crate::credentials::Credentials;
use crate::error::{Result, SessionError};
use crate::log::SessionLog;

/// Progress of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
	Idle,
	UsernameEntered,
	PasswordEntered,
	Submitted,
	Success,
	CredentialsRejected,
}

/// Fills and submits the login form once.
///
/// Rejected credentials are reported as [`SessionError::CredentialsRejected`]
/// and never retried.
pub struct LoginFlow<'a> {
	browser: &'a dyn BrowserDriver,
	site: &'a SiteProfile,
	retry: InputRetry,
	log: &'a SessionLog,
	obscure_password: bool,
	state: LoginState,
}

impl<'a> LoginFlow<'a> {
	pub fn new(browser: &'a dyn BrowserDriver, site: &'a SiteProfile, retry: InputRetry, log: &'a SessionLog, obscure_password: bool) -> Self {
		Self {
			browser,
			site,
			retry,
			log,
			obscure_password,
			state: LoginState::Idle,
		}
	}

	pub fn state(&self) -> LoginState {
		self.state
	}

	fn transition(&mut self, next: LoginState) {
		debug!(target = "slogin.login", from = ?self.state, to = ?next, "login state");
		self.state = next;
	}

	/// Runs the form from [`LoginState::Idle`] to [`LoginState::Success`].
	pub async fn run(&mut self, credentials: &Credentials) -> Result<LoginState> {
		let site = self.site;

		self.fill(&site.username_selector, credentials.username(), credentials.username()).await?;
		self.transition(LoginState::UsernameEntered);

		let shown = credentials.display_password(self.obscure_password);
		self.fill(&site.password_selector, credentials.password(), &shown).await?;
		self.transition(LoginState::PasswordEntered);

		self.browser.submit(&site.password_selector).await?;
		self.transition(LoginState::Submitted);

		if self.browser.element_exists(&site.login_error_selector).await? {
			self.transition(LoginState::CredentialsRejected);
			return Err(SessionError::CredentialsRejected {
				username: credentials.username().to_string(),
			});
		}

		self.transition(LoginState::Success);
		Ok(self.state)
	}

	async fn fill(&self, selector: &str, text: &str, shown: &str) -> Result<()> {
		self.clear_until_empty(selector).await?;
		self.log.step(format_args!("typing `{shown}` into {selector}"));
		self.browser.type_text(selector, text).await
	}

	/// Clears `selector` and reads it back, retrying while the field is absent
	/// or still holds content.
	async fn clear_until_empty(&self, selector: &str) -> Result<()> {
		let max_attempts = self.retry.max_attempts.max(1);

		for attempt in 1..=max_attempts {
			if self.browser.element_exists(selector).await? {
				self.browser.clear(selector).await?;
				if self.browser.input_value(selector).await?.is_empty() {
					return Ok(());
				}
				debug!(target = "slogin.login", selector, attempt, "field not empty after clear");
			} else {
				debug!(target = "slogin.login", selector, attempt, "field not present yet");
			}

			if attempt < max_attempts {
				tokio::time::sleep(self.retry.interval()).await;
			}
		}

		Err(SessionError::InputUnstable {
			selector: selector.to_string(),
			attempts: max_attempts,
		})
	}
}
