//! `slogin show` and `slogin clear`: inspect and edit the session cache file.

use anyhow::{Context, Result, bail};
use slogin::{Cookie, SCHEMA_VERSION, SessionCacheDocument, SessionConfig, SessionLogin};
use tracing::debug;

use crate::cli::ShowFormat;

const VALUE_WIDTH: usize = 37;

pub async fn show(config: &SessionConfig, format: ShowFormat) -> Result<()> {
	let path = &config.cookies_filepath;
	let content = match tokio::fs::read_to_string(path).await {
		Ok(content) => content,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			println!("No session cache at {}", path.display());
			return Ok(());
		}
		Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
	};
	if content.trim().is_empty() {
		println!("Session cache {} is empty", path.display());
		return Ok(());
	}
	let document: SessionCacheDocument =
		serde_json::from_str(&content).with_context(|| format!("{} is not a valid session cache", path.display()))?;

	match format {
		ShowFormat::Json => println!("{}", String::from_utf8(document.to_pretty_json()?)?),
		ShowFormat::Table => print_document(&document, &path.display().to_string()),
	}
	if document.schema_version != SCHEMA_VERSION {
		eprintln!(
			"note: written by version {}, this build ({SCHEMA_VERSION}) will ignore it and log in again",
			document.schema_version
		);
	}
	Ok(())
}

pub async fn clear(config: &SessionConfig, user: Option<&str>) -> Result<()> {
	let session = SessionLogin::with_defaults(config.clone()).context("invalid session configuration")?;
	let store = session.store();

	let Some(user) = user else {
		store.invalidate().await?;
		println!("Cleared all cached sessions in {}", store.path().display());
		return Ok(());
	};

	let mut document = match store.load_document().await? {
		Ok(document) => document,
		Err(miss) => {
			debug!(target = "slogin.cache", reason = %miss, "nothing to clear");
			println!("No cached session for {user}");
			return Ok(());
		}
	};
	if !document.remove_user(user) {
		println!("No cached session for {user}");
		return Ok(());
	}
	store.save(&document).await?;
	println!("Cleared cached session for {user}");
	Ok(())
}

fn print_document(document: &SessionCacheDocument, path: &str) {
	println!("Session cache: {path} (version {})", document.schema_version);
	if document.users_cookies.is_empty() {
		println!("  (no users)");
		return;
	}
	for (user, cookies) in &document.users_cookies {
		println!();
		println!("USER {user}");
		print_cookies_table(cookies);
	}
}

fn print_cookies_table(cookies: &[Cookie]) {
	if cookies.is_empty() {
		println!("  (no cookies)");
		return;
	}

	println!("{:<36} {:<40} {:<20} FLAGS", "NAME", "VALUE", "DOMAIN");
	println!("{}", "-".repeat(104));
	for cookie in cookies {
		println!("{:<36} {:<40} {:<20} {}", cookie.name, truncate(&cookie.value), cookie.domain, flags(cookie));
	}
	println!("Total: {} cookies", cookies.len());
}

fn truncate(value: &str) -> String {
	if value.chars().count() > VALUE_WIDTH {
		let head: String = value.chars().take(VALUE_WIDTH).collect();
		format!("{head}...")
	} else {
		value.to_string()
	}
}

fn flags(cookie: &Cookie) -> String {
	let flags: Vec<&str> = [(cookie.http_only, "httpOnly"), (cookie.secure, "secure")]
		.into_iter()
		.filter_map(|(set, name)| set.then_some(name))
		.collect();
	if flags.is_empty() { "-".to_string() } else { flags.join(",") }
}
