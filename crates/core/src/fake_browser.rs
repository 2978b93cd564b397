//! In-memory fake of a WordPress-style site and a browser pointed at it.
//!
//! Provides the [`BrowserDriver`] collaborator for tests without launching a
//! browser.
//!
//! # Example
//!
//! ```ignore
//! let site = FakeSite::wordpress();
//! site.add_account("admin", "secret");
//!
//! let browser = site.new_browser();
//! browser.navigate("http://localhost:8080/wp-admin").await?;
//! assert!(browser.current_url().await?.contains("/wp-login.php"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use slogin_protocol::Cookie;
use url::Url;

use crate::browser::BrowserDriver;
use crate::config::SiteProfile;
use crate::error::{Result, SessionError};
use crate::route::path_matches;

const DEFAULT_ORIGIN: &str = "http://localhost:8080/";
const COOKIE_HASH: &str = "5c8e3a";

type SubmitHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct SiteState {
	accounts: HashMap<String, String>,
	sessions: HashMap<String, String>,
	restricted: HashSet<String>,
	redirects: HashMap<String, String>,
	logins: u32,
	after_login: Option<String>,
	on_submit: Option<SubmitHook>,
}

/// Server side of the fake: accounts, live sessions and routing quirks.
///
/// Shared by every [`FakeBrowser`] created from it, so sessions issued to one
/// browser context can be restored into another.
pub struct FakeSite {
	origin: Url,
	profile: SiteProfile,
	state: Mutex<SiteState>,
}

impl FakeSite {
	pub fn new(origin: &str, profile: SiteProfile) -> Result<Arc<Self>> {
		let origin = Url::parse(origin).map_err(|e| SessionError::url(origin, e))?;
		Ok(Arc::new(Self {
			origin,
			profile,
			state: Mutex::new(SiteState::default()),
		}))
	}

	/// Site at `http://localhost:8080/` with the default WordPress profile.
	pub fn wordpress() -> Arc<Self> {
		Arc::new(Self {
			origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
			profile: SiteProfile::default(),
			state: Mutex::new(SiteState::default()),
		})
	}

	pub fn origin(&self) -> &Url {
		&self.origin
	}

	pub fn host(&self) -> String {
		self.origin.host_str().unwrap_or_default().to_string()
	}

	pub fn add_account(&self, username: &str, password: &str) {
		self.state.lock().accounts.insert(username.to_string(), password.to_string());
	}

	/// Makes `path` bounce authenticated visitors to the login form.
	pub fn restrict_page(&self, path: &str) {
		self.state.lock().restricted.insert(path.to_string());
	}

	/// Sends every navigation to `path` to `target` instead.
	pub fn redirect(&self, path: &str, target: &str) {
		self.state.lock().redirects.insert(path.to_string(), target.to_string());
	}

	/// Sends successful logins to `target` instead of the admin dashboard.
	pub fn land_after_login(&self, target: &str) {
		self.state.lock().after_login = Some(target.to_string());
	}

	/// Invalidates every issued session.
	pub fn expire_sessions(&self) {
		self.state.lock().sessions.clear();
	}

	/// Runs `hook` every time a login form is submitted.
	pub fn on_submit(&self, hook: impl Fn() + Send + Sync + 'static) {
		self.state.lock().on_submit = Some(Arc::new(hook));
	}

	/// Number of successful logins so far.
	pub fn login_count(&self) -> u32 {
		self.state.lock().logins
	}

	/// Session cookie the site would issue, named as it names them.
	pub fn logged_in_cookie_name(&self) -> String {
		format!("{}logged_in_{COOKIE_HASH}", self.profile.cookie_prefix)
	}

	pub fn new_browser(self: &Arc<Self>) -> FakeBrowser {
		FakeBrowser {
			site: Arc::clone(self),
			state: Mutex::new(BrowserState::default()),
		}
	}

	fn url(&self, path: &str) -> Url {
		self.origin.join(path).unwrap_or_else(|_| self.origin.clone())
	}

	fn login_redirect(&self, requested: &Url) -> String {
		let mut url = self.url(&self.profile.login_path);
		url.query_pairs_mut().append_pair("redirect_to", requested.as_str()).append_pair("reauth", "1");
		url.to_string()
	}

	fn is_authenticated(&self, jar: &[Cookie]) -> bool {
		let name = self.logged_in_cookie_name();
		let host = self.host();
		let state = self.state.lock();
		jar.iter()
			.any(|c| c.name == name && c.domain == host && state.sessions.contains_key(&c.value))
	}

	/// Where a navigation to `target` ends up for a browser holding `jar`.
	fn route(&self, target: &Url, jar: &[Cookie]) -> String {
		let path = target.path().to_string();
		let (redirect, restricted) = {
			let state = self.state.lock();
			(
				state.redirects.get(&path).cloned(),
				state.restricted.iter().any(|r| path_matches(&path, r)),
			)
		};

		if let Some(redirect) = redirect {
			return redirect;
		}
		if path_matches(&path, &self.profile.admin_path) && (!self.is_authenticated(jar) || restricted) {
			return self.login_redirect(target);
		}
		target.to_string()
	}

	/// Checks a submitted form and issues session cookies on success.
	fn log_in(&self, username: &str, password: &str) -> Option<Vec<Cookie>> {
		let mut state = self.state.lock();
		if state.accounts.get(username).map(String::as_str) != Some(password) {
			return None;
		}
		state.logins += 1;
		let token = format!("{username}|{}|{}", state.logins, COOKIE_HASH);
		state.sessions.insert(token.clone(), username.to_string());

		let host = self.host();
		let prefix = &self.profile.cookie_prefix;
		Some(vec![
			Cookie::new(self.logged_in_cookie_name(), token.clone(), host.clone())
				.with_path("/")
				.with_http_only(true),
			Cookie::new(format!("{prefix}{COOKIE_HASH}"), token, host.clone())
				.with_path(self.profile.admin_path.clone())
				.with_http_only(true),
			Cookie::new("wp-settings-time-1", "1700000000", host).with_path("/"),
		])
	}
}

#[derive(Default)]
struct BrowserState {
	current_url: String,
	jar: Vec<Cookie>,
	fields: HashMap<String, String>,
	login_error: bool,
	sticky_clears: HashMap<String, u32>,
	hidden_checks: HashMap<String, u32>,
	navigations: Vec<String>,
	cookie_sets: usize,
	submissions: usize,
}

impl BrowserState {
	fn upsert_cookie(&mut self, cookie: Cookie) {
		self.jar.retain(|c| !(c.domain == cookie.domain && c.name == cookie.name));
		self.jar.push(cookie);
	}
}

/// One browser context with its own cookie jar, pointed at a [`FakeSite`].
pub struct FakeBrowser {
	site: Arc<FakeSite>,
	state: Mutex<BrowserState>,
}

impl FakeBrowser {
	pub fn site(&self) -> &Arc<FakeSite> {
		&self.site
	}

	/// The next `clears` clears of `selector` leave stale text behind.
	pub fn make_field_sticky(&self, selector: &str, clears: u32) {
		self.state.lock().sticky_clears.insert(selector.to_string(), clears);
	}

	/// `selector` reports as absent for the next `checks` existence checks.
	pub fn hide_field(&self, selector: &str, checks: u32) {
		self.state.lock().hidden_checks.insert(selector.to_string(), checks);
	}

	/// Every URL passed to [`BrowserDriver::navigate`], in order.
	pub fn navigations(&self) -> Vec<String> {
		self.state.lock().navigations.clone()
	}

	pub fn cookie_sets(&self) -> usize {
		self.state.lock().cookie_sets
	}

	pub fn submissions(&self) -> usize {
		self.state.lock().submissions
	}

	pub fn jar(&self) -> Vec<Cookie> {
		self.state.lock().jar.clone()
	}

	pub fn field(&self, selector: &str) -> Option<String> {
		self.state.lock().fields.get(selector).cloned()
	}

	fn on_login_page(&self, url: &str) -> bool {
		Url::parse(url).is_ok_and(|u| path_matches(u.path(), &self.site.profile.login_path))
	}

	fn is_form_field(&self, selector: &str) -> bool {
		let profile = &self.site.profile;
		selector == profile.username_selector || selector == profile.password_selector
	}
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
	async fn navigate(&self, url: &str) -> Result<()> {
		let target = Url::parse(url).map_err(|e| SessionError::url(url, e))?;
		let jar = {
			let mut state = self.state.lock();
			state.navigations.push(url.to_string());
			state.jar.clone()
		};
		let landed = self.site.route(&target, &jar);

		let mut state = self.state.lock();
		state.current_url = landed;
		state.fields.clear();
		state.login_error = false;
		Ok(())
	}

	async fn current_url(&self) -> Result<String> {
		Ok(self.state.lock().current_url.clone())
	}

	async fn set_cookie(&self, cookie: &Cookie) -> Result<()> {
		let mut state = self.state.lock();
		state.cookie_sets += 1;
		state.upsert_cookie(cookie.clone().with_path(cookie.install_path()));
		Ok(())
	}

	async fn cookies(&self) -> Result<Vec<Cookie>> {
		Ok(self.jar())
	}

	async fn element_exists(&self, selector: &str) -> Result<bool> {
		let mut state = self.state.lock();
		if !self.on_login_page(&state.current_url) {
			return Ok(false);
		}
		if selector == self.site.profile.login_error_selector {
			return Ok(state.login_error);
		}
		if !self.is_form_field(selector) {
			return Ok(false);
		}
		if let Some(remaining) = state.hidden_checks.get_mut(selector) {
			if *remaining > 0 {
				*remaining -= 1;
				return Ok(false);
			}
		}
		Ok(true)
	}

	async fn clear(&self, selector: &str) -> Result<()> {
		let mut state = self.state.lock();
		let sticky = match state.sticky_clears.get_mut(selector) {
			Some(remaining) if *remaining > 0 => {
				*remaining -= 1;
				true
			}
			_ => false,
		};
		let value = if sticky { "stale".to_string() } else { String::new() };
		state.fields.insert(selector.to_string(), value);
		Ok(())
	}

	async fn input_value(&self, selector: &str) -> Result<String> {
		Ok(self.field(selector).unwrap_or_default())
	}

	async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
		let mut state = self.state.lock();
		if !self.on_login_page(&state.current_url) || !self.is_form_field(selector) {
			return Err(SessionError::Browser(format!("no input matches `{selector}`")));
		}
		state.fields.entry(selector.to_string()).or_default().push_str(text);
		Ok(())
	}

	async fn submit(&self, _selector: &str) -> Result<()> {
		let (username, password) = {
			let mut state = self.state.lock();
			state.submissions += 1;
			let profile = &self.site.profile;
			(
				state.fields.get(&profile.username_selector).cloned().unwrap_or_default(),
				state.fields.get(&profile.password_selector).cloned().unwrap_or_default(),
			)
		};

		let (hook, after_login) = {
			let site_state = self.site.state.lock();
			(site_state.on_submit.clone(), site_state.after_login.clone())
		};
		if let Some(hook) = hook {
			hook();
		}

		match self.site.log_in(&username, &password) {
			Some(cookies) => {
				let mut state = self.state.lock();
				for cookie in cookies {
					state.upsert_cookie(cookie);
				}
				state.current_url = after_login
					.unwrap_or_else(|| self.site.url(&format!("{}/", self.site.profile.admin_path.trim_end_matches('/'))).to_string());
				state.fields.clear();
				state.login_error = false;
			}
			None => {
				let mut state = self.state.lock();
				state.login_error = true;
				state.fields.remove(&self.site.profile.password_selector);
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn unauthenticated_admin_visit_lands_on_login() {
		let site = FakeSite::wordpress();
		let browser = site.new_browser();
		browser.navigate("http://localhost:8080/wp-admin").await.unwrap();

		let url = browser.current_url().await.unwrap();
		assert!(url.starts_with("http://localhost:8080/wp-login.php?redirect_to="));
	}

	#[tokio::test]
	async fn issued_cookies_authenticate_another_context() {
		let site = FakeSite::wordpress();
		site.add_account("admin", "pw");
		let first = site.new_browser();
		first.navigate("http://localhost:8080/wp-login.php").await.unwrap();
		first.type_text("input[name=log]", "admin").await.unwrap();
		first.type_text("input[name=pwd]", "pw").await.unwrap();
		first.submit("input[name=pwd]").await.unwrap();
		assert_eq!(first.current_url().await.unwrap(), "http://localhost:8080/wp-admin/");

		let second = site.new_browser();
		for cookie in first.jar() {
			second.set_cookie(&cookie).await.unwrap();
		}
		second.navigate("http://localhost:8080/wp-admin/").await.unwrap();
		assert_eq!(second.current_url().await.unwrap(), "http://localhost:8080/wp-admin/");
	}
}
