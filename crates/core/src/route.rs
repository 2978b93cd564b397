//! Classification of browser addresses into admin, login or elsewhere.

use url::Url;

use crate::config::SiteProfile;
use crate::error::{Result, SessionError};

/// Where a navigation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
	/// Inside the protected admin area.
	Admin,
	/// On the login form.
	Login,
	Other,
}

/// Returns `true` when `path` is `route` or lies beneath it.
///
/// `/wp-admin` matches `/wp-admin`, `/wp-admin/` and `/wp-admin/users.php`,
/// but not `/wp-admin-legacy` or `/blog/wp-admin`.
pub fn path_matches(path: &str, route: &str) -> bool {
	let route = route.trim_end_matches('/');
	match path.strip_prefix(route) {
		Some(rest) => rest.is_empty() || rest.starts_with('/'),
		None => false,
	}
}

/// Classifies parsed URLs by path against the site's admin and login routes.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
	admin_path: String,
	login_path: String,
}

impl RouteClassifier {
	pub fn new(site: &SiteProfile) -> Self {
		Self {
			admin_path: site.admin_path.clone(),
			login_path: site.login_path.clone(),
		}
	}

	pub fn classify(&self, url: &Url) -> Location {
		let path = url.path();
		if path_matches(path, &self.admin_path) {
			Location::Admin
		} else if path_matches(path, &self.login_path) {
			Location::Login
		} else {
			Location::Other
		}
	}

	/// Parses and classifies an address reported by the browser.
	pub fn classify_str(&self, url: &str) -> Result<Location> {
		let parsed = Url::parse(url).map_err(|e| SessionError::url(url, e))?;
		Ok(self.classify(&parsed))
	}
}
