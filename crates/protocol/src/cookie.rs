//! Cookie shape shared by the browser collaborator and the cache file.

use serde::{Deserialize, Serialize};

/// A browser cookie as captured from, or installed into, a browser context.
///
/// `(domain, name)` identifies a cookie. `path` is only meaningful when a
/// cookie is handed to the browser; the canonical cached form omits it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	pub domain: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	#[serde(default)]
	pub http_only: bool,
	#[serde(default)]
	pub secure: bool,
}

impl Cookie {
	/// Creates a cookie with no path and both security flags unset.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: domain.into(),
			path: None,
			http_only: false,
			secure: false,
		}
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn with_http_only(mut self, http_only: bool) -> Self {
		self.http_only = http_only;
		self
	}

	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	/// Returns the cached form of this cookie: every field except `path`.
	pub fn canonical(&self) -> Self {
		Self { path: None, ..self.clone() }
	}

	/// Path to use when installing the cookie into a browser.
	pub fn install_path(&self) -> &str {
		self.path.as_deref().unwrap_or("/")
	}
}
