//! `slogin login`: establish a session in a WebDriver-controlled browser.

use anyhow::{Context, Result};
use slogin::{BrowserDriver, Credentials, SessionConfig, SessionLogin, SessionOutcome};
use tracing::{info, warn};

use crate::cli::LoginArgs;
use crate::webdriver::WebDriverBrowser;

pub async fn run(config: SessionConfig, args: LoginArgs) -> Result<()> {
	let session = SessionLogin::with_defaults(config).context("invalid session configuration")?;
	let origin = session.config().base_url()?;
	let credentials = Credentials::new(args.username, args.password);

	let browser = WebDriverBrowser::start(&args.webdriver, args.browser.as_str(), !args.headed, origin).await?;
	let result = session.establish(&browser, &credentials).await;
	let final_url = match &result {
		Ok(_) => browser.current_url().await.ok(),
		Err(_) => None,
	};

	if let Err(err) = browser.close().await {
		warn!(target = "slogin", error = %err, "failed to close browser");
	}

	let outcome = result?;
	let summary = match outcome {
		SessionOutcome::Restored => "session restored from cache",
		SessionOutcome::LoggedInFresh => "logged in and cached session",
	};
	info!(target = "slogin", user = credentials.username(), ?outcome, "session established");
	match final_url {
		Some(url) => println!("{summary} ({url})"),
		None => println!("{summary}"),
	}
	println!("cache: {}", session.store().path().display());
	Ok(())
}
