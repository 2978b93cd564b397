//! Browser-automation collaborator.
//!
//! The orchestrator never talks to a browser engine directly. Everything it
//! needs is expressed here: navigation, the current address, cookie access and
//! a handful of form primitives keyed by CSS selector.

use async_trait::async_trait;
use slogin_protocol::Cookie;

use crate::error::Result;

#[async_trait]
pub trait BrowserDriver: Send + Sync {
	/// Navigates to an absolute URL and waits for the resulting page to load.
	async fn navigate(&self, url: &str) -> Result<()>;

	/// Address of the current page after any redirects.
	async fn current_url(&self) -> Result<String>;

	/// Installs `cookie` using its domain, install path and security flags.
	async fn set_cookie(&self, cookie: &Cookie) -> Result<()>;

	/// Every cookie visible to the browser context.
	async fn cookies(&self) -> Result<Vec<Cookie>>;

	async fn element_exists(&self, selector: &str) -> Result<bool>;

	async fn clear(&self, selector: &str) -> Result<()>;

	/// Current value of an input element.
	async fn input_value(&self, selector: &str) -> Result<String>;

	async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

	/// Activates the element's form, as pressing Enter in it would, and waits
	/// for the resulting navigation.
	async fn submit(&self, selector: &str) -> Result<()>;
}
