//! [`BrowserDriver`] over the W3C WebDriver HTTP protocol.
//!
//! Talks to any WebDriver server (chromedriver, geckodriver, Selenium) with
//! plain JSON requests; one instance owns one WebDriver session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use slogin::{BrowserDriver, Result, SessionError};
use slogin_protocol::Cookie;
use tracing::debug;
use url::Url;

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ENTER_KEY: &str = "\u{E007}";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const SUBMIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// New-session capabilities for `browser_name`.
pub fn capabilities(browser_name: &str, headless: bool) -> Value {
	let mut always_match = json!({ "browserName": browser_name });
	if headless {
		match browser_name {
			"chrome" => always_match["goog:chromeOptions"] = json!({ "args": ["--headless=new"] }),
			"firefox" => always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] }),
			_ => {}
		}
	}
	json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Extracts `value` from a WebDriver response body, mapping error payloads.
pub fn response_value(success: bool, mut body: Value) -> Result<Value> {
	let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);
	if success {
		return Ok(value);
	}
	let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
	let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
	Err(SessionError::Browser(format!("webdriver {error}: {message}")))
}

/// Element reference ids from a `Find Elements` response.
pub fn element_ids(value: &Value) -> Vec<String> {
	value
		.as_array()
		.map(|elements| {
			elements
				.iter()
				.filter_map(|e| e.get(ELEMENT_KEY).and_then(Value::as_str).map(String::from))
				.collect()
		})
		.unwrap_or_default()
}

/// Request body for `Add Cookie`.
pub fn cookie_payload(cookie: &Cookie) -> Value {
	json!({
		"cookie": {
			"name": cookie.name,
			"value": cookie.value,
			"domain": cookie.domain,
			"path": cookie.install_path(),
			"httpOnly": cookie.http_only,
			"secure": cookie.secure,
		}
	})
}

fn ensure_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	url
}

fn browser_err(context: &str, err: impl std::fmt::Display) -> SessionError {
	SessionError::Browser(format!("{context}: {err}"))
}

/// A live WebDriver session.
pub struct WebDriverBrowser {
	client: Client,
	session_url: Url,
	origin: Url,
}

impl WebDriverBrowser {
	/// Opens a session on `server`. `origin` is visited before cookies are
	/// installed, since WebDriver only accepts cookies for the current document.
	pub async fn start(server: &str, browser_name: &str, headless: bool, origin: Url) -> Result<Self> {
		let server = Url::parse(server).map_err(|e| browser_err(&format!("invalid WebDriver URL `{server}`"), e))?;
		let server = ensure_trailing_slash(server);
		let client = Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| browser_err("failed to create HTTP client", e))?;

		let session_endpoint = server.join("session").map_err(|e| browser_err("invalid WebDriver URL", e))?;
		let response = client
			.post(session_endpoint)
			.json(&capabilities(browser_name, headless))
			.send()
			.await
			.map_err(|e| browser_err(&format!("failed to reach WebDriver at {server}"), e))?;
		let success = response.status().is_success();
		let body: Value = response.json().await.map_err(|e| browser_err("invalid WebDriver response", e))?;
		let value = response_value(success, body)?;

		let session_id = value
			.get("sessionId")
			.and_then(Value::as_str)
			.ok_or_else(|| SessionError::Browser("WebDriver did not return a session id".into()))?;
		let session_url = server
			.join(&format!("session/{session_id}/"))
			.map_err(|e| browser_err("invalid WebDriver session URL", e))?;

		debug!(target = "slogin.webdriver", %session_url, browser = browser_name, headless, "webdriver session started");
		Ok(Self {
			client,
			session_url,
			origin,
		})
	}

	/// Ends the WebDriver session, closing the browser.
	pub async fn close(self) -> Result<()> {
		let response = self
			.client
			.delete(self.session_url.clone())
			.send()
			.await
			.map_err(|e| browser_err("failed to close WebDriver session", e))?;
		debug!(target = "slogin.webdriver", status = %response.status(), "webdriver session closed");
		Ok(())
	}

	async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
		let url = self.session_url.join(path).map_err(|e| browser_err("invalid WebDriver command", e))?;
		let mut request = self.client.request(method.clone(), url);
		if let Some(body) = body {
			request = request.json(&body);
		}
		let response = request.send().await.map_err(|e| browser_err(&format!("{method} {path} failed"), e))?;
		let success = response.status().is_success();
		let body: Value = response.json().await.map_err(|e| browser_err("invalid WebDriver response", e))?;
		response_value(success, body)
	}

	async fn find_all(&self, selector: &str) -> Result<Vec<String>> {
		let value = self
			.command(Method::POST, "elements", Some(json!({ "using": "css selector", "value": selector })))
			.await?;
		Ok(element_ids(&value))
	}

	async fn find(&self, selector: &str) -> Result<String> {
		self.find_all(selector)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| SessionError::Browser(format!("no element matches `{selector}`")))
	}

	async fn ready_state(&self) -> Result<String> {
		let value = self
			.command(Method::POST, "execute/sync", Some(json!({ "script": "return document.readyState", "args": [] })))
			.await?;
		Ok(value.as_str().unwrap_or_default().to_string())
	}
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
	async fn navigate(&self, url: &str) -> Result<()> {
		self.command(Method::POST, "url", Some(json!({ "url": url }))).await?;
		Ok(())
	}

	async fn current_url(&self) -> Result<String> {
		let value = self.command(Method::GET, "url", None).await?;
		value
			.as_str()
			.map(String::from)
			.ok_or_else(|| SessionError::Browser("WebDriver returned a non-string URL".into()))
	}

	async fn set_cookie(&self, cookie: &Cookie) -> Result<()> {
		let current = self.current_url().await?;
		if !current.starts_with("http") {
			self.navigate(self.origin.as_str()).await?;
		}
		self.command(Method::POST, "cookie", Some(cookie_payload(cookie))).await?;
		Ok(())
	}

	async fn cookies(&self) -> Result<Vec<Cookie>> {
		let value = self.command(Method::GET, "cookie", None).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn element_exists(&self, selector: &str) -> Result<bool> {
		Ok(!self.find_all(selector).await?.is_empty())
	}

	async fn clear(&self, selector: &str) -> Result<()> {
		let id = self.find(selector).await?;
		self.command(Method::POST, &format!("element/{id}/clear"), Some(json!({}))).await?;
		Ok(())
	}

	async fn input_value(&self, selector: &str) -> Result<String> {
		let id = self.find(selector).await?;
		let value = self.command(Method::GET, &format!("element/{id}/property/value"), None).await?;
		Ok(value.as_str().unwrap_or_default().to_string())
	}

	async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
		let id = self.find(selector).await?;
		self.command(Method::POST, &format!("element/{id}/value"), Some(json!({ "text": text })))
			.await?;
		Ok(())
	}

	/// Presses Enter in the field, then waits until the page has navigated
	/// away and finished loading.
	async fn submit(&self, selector: &str) -> Result<()> {
		let before = self.current_url().await?;
		self.type_text(selector, ENTER_KEY).await?;

		let deadline = tokio::time::Instant::now() + SUBMIT_TIMEOUT;
		loop {
			tokio::time::sleep(SUBMIT_POLL_INTERVAL).await;
			let navigated = self.current_url().await? != before;
			if (navigated || tokio::time::Instant::now() >= deadline) && self.ready_state().await? == "complete" {
				return Ok(());
			}
		}
	}
}
