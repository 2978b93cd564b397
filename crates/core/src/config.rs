//! Session-login configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration for a local WordPress install on port 8080.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SessionError};

/// Default location of the persisted session cache.
pub const DEFAULT_COOKIES_FILEPATH: &str = ".session-login-cookies.json";

/// Version stamped into every cache document this build writes.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BASE_URL: &str = "http://localhost:8080/";
const DEFAULT_ADMIN_PATH: &str = "/wp-admin";
const DEFAULT_LOGIN_PATH: &str = "/wp-login.php";

/// Options recognised by [`SessionLogin`](crate::SessionLogin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
	/// Origin the site routes are resolved against.
	pub base_url: String,
	pub cookies_filepath: PathBuf,
	/// Emit step-by-step `session-login:` lines.
	pub verbose_logging: bool,
	/// Final navigation target. `None` skips the final navigation.
	pub landing_page: Option<String>,
	/// Mask the password in log lines and in the single-flight key.
	pub obscure_password: bool,
	pub session_options: SessionOptions,
	pub site: SiteProfile,
	pub input_retry: InputRetry,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			cookies_filepath: PathBuf::from(DEFAULT_COOKIES_FILEPATH),
			verbose_logging: false,
			landing_page: Some(DEFAULT_ADMIN_PATH.to_string()),
			obscure_password: true,
			session_options: SessionOptions::default(),
			site: SiteProfile::default(),
			input_retry: InputRetry::default(),
		}
	}
}

impl SessionConfig {
	/// Loads a JSON configuration file. Missing fields take their defaults.
	pub fn from_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&content)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks values serde cannot: URL syntax, route shape and retry bounds.
	pub fn validate(&self) -> Result<()> {
		self.base_url()?;
		for (field, route) in [("site.adminPath", &self.site.admin_path), ("site.loginPath", &self.site.login_path)] {
			if !route.starts_with('/') {
				return Err(SessionError::Configuration(format!("{field} must be an absolute path, got `{route}`")));
			}
		}
		if self.input_retry.max_attempts == 0 {
			return Err(SessionError::Configuration("inputRetry.maxAttempts must be at least 1".into()));
		}
		if self.cookies_filepath.as_os_str().is_empty() {
			return Err(SessionError::Configuration("cookiesFilepath must not be empty".into()));
		}
		Ok(())
	}

	pub fn base_url(&self) -> Result<Url> {
		Url::parse(&self.base_url).map_err(|e| SessionError::url(&self.base_url, e))
	}

	/// Resolves a route or absolute URL against [`Self::base_url`].
	pub fn resolve(&self, route: &str) -> Result<Url> {
		self.base_url()?.join(route).map_err(|e| SessionError::url(route, e))
	}
}

/// Forwarded untouched to the single-flight collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
	#[serde(default = "default_true")]
	pub cache_across_specs: bool,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			cache_across_specs: true,
			extra: serde_json::Map::new(),
		}
	}
}

fn default_true() -> bool {
	true
}

/// Routes, cookie naming and form selectors of the target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteProfile {
	/// Protected route used as the canary for restored cookies.
	pub admin_path: String,
	pub login_path: String,
	/// Only cookies whose name starts with this prefix are cached.
	pub cookie_prefix: String,
	pub username_selector: String,
	pub password_selector: String,
	/// Present on the login page only after rejected credentials.
	pub login_error_selector: String,
}

impl Default for SiteProfile {
	fn default() -> Self {
		Self {
			admin_path: DEFAULT_ADMIN_PATH.to_string(),
			login_path: DEFAULT_LOGIN_PATH.to_string(),
			cookie_prefix: "wordpress_".to_string(),
			username_selector: "input[name=log]".to_string(),
			password_selector: "input[name=pwd]".to_string(),
			login_error_selector: "#login_error".to_string(),
		}
	}
}

/// Bounds for the clear-and-verify loop run before typing into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputRetry {
	pub interval_ms: u64,
	pub max_attempts: u32,
}

impl Default for InputRetry {
	fn default() -> Self {
		Self {
			interval_ms: 250,
			max_attempts: 5,
		}
	}
}

impl InputRetry {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}
