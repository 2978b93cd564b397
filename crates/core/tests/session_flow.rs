// End-to-end session setup tests: orchestrator, reconciliation, persistence
// and the landing-page guard against the fake site and an in-memory disk.

use std::path::Path;
use std::sync::Arc;

use slogin::fake_browser::{FakeBrowser, FakeSite};
use slogin::{
	BrowserDriver, CacheStore, Cookie, Credentials, InProcessSingleFlight, InputRetry, MemoryFs, RecordingSink, SCHEMA_VERSION,
	SessionCacheDocument, SessionConfig, SessionError, SessionLog, SessionLogin, SessionOrchestrator, SessionOutcome,
};

const CACHE_PATH: &str = ".session-login-cookies.json";
const PASSWORD: &str = "correct horse";

struct Harness {
	site: Arc<FakeSite>,
	fs: Arc<MemoryFs>,
	sink: RecordingSink,
	config: SessionConfig,
}

impl Harness {
	fn new() -> Self {
		let site = FakeSite::wordpress();
		site.add_account("admin", PASSWORD);
		site.add_account("editor", "editor-pass");
		Self {
			site,
			fs: Arc::new(MemoryFs::new()),
			sink: RecordingSink::new(),
			config: SessionConfig {
				verbose_logging: true,
				input_retry: InputRetry { interval_ms: 1, max_attempts: 3 },
				..Default::default()
			},
		}
	}

	fn log(&self) -> SessionLog {
		SessionLog::new(self.config.verbose_logging, Arc::new(self.sink.clone()))
	}

	/// A fresh "test process": new single-flight cache, same disk and site.
	fn session_login(&self) -> SessionLogin {
		SessionLogin::new(self.config.clone(), self.fs.clone(), Arc::new(InProcessSingleFlight::new()), self.log()).unwrap()
	}

	fn store(&self) -> CacheStore {
		CacheStore::new(CACHE_PATH, SCHEMA_VERSION, self.fs.clone())
	}

	fn document(&self) -> SessionCacheDocument {
		let bytes = self.fs.contents(Path::new(CACHE_PATH)).expect("cache file should exist");
		serde_json::from_slice(&bytes).unwrap()
	}

	async fn establish(&self, browser: &FakeBrowser, username: &str, password: &str) -> Result<SessionOutcome, SessionError> {
		self.session_login().establish(browser, &Credentials::new(username, password)).await
	}

	fn logged(&self, needle: &str) -> bool {
		self.sink.lines().iter().any(|line| line.contains(needle))
	}
}

#[tokio::test]
async fn first_run_logs_in_and_saves_session_cookies() {
	let h = Harness::new();
	let browser = h.site.new_browser();

	let outcome = h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::LoggedInFresh);
	assert_eq!(h.fs.write_count(), 1);
	assert!(h.logged("cookie file not found..."));
	assert!(h.logged("saved new cookies file."));

	let doc = h.document();
	assert_eq!(doc.schema_version, SCHEMA_VERSION);
	let cookies = doc.user_cookies("admin").unwrap();
	assert_eq!(cookies.len(), 2);
	assert!(cookies.iter().all(|c| c.name.starts_with("wordpress_") && c.path.is_none() && c.http_only));
	assert_eq!(cookies[0].name, h.site.logged_in_cookie_name());
}

#[tokio::test]
async fn second_run_restores_without_logging_in_or_writing() {
	let h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();

	let browser = h.site.new_browser();
	let outcome = h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::Restored);
	assert_eq!(h.fs.write_count(), 1);
	assert_eq!(h.site.login_count(), 1);
	assert_eq!(browser.submissions(), 0);
	assert_eq!(browser.cookie_sets(), 2);
	assert!(h.logged("session restored successfully!"));
}

#[tokio::test]
async fn expired_session_falls_back_to_login_and_updates_cache() {
	let h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();
	let before = h.document().user_cookies("admin").unwrap().to_vec();
	h.site.expire_sessions();

	let browser = h.site.new_browser();
	let outcome = h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::LoggedInFresh);
	assert_eq!(h.site.login_count(), 2);
	assert_eq!(h.fs.write_count(), 2);
	assert!(h.logged("session restoration unsuccessful!"));
	assert!(h.logged("updated cookies file."));

	let after = h.document().user_cookies("admin").unwrap().to_vec();
	assert_eq!(after.len(), before.len());
	assert_ne!(after[0].value, before[0].value);
}

#[tokio::test]
async fn orchestrator_rerun_on_an_authenticated_browser_is_a_no_op() {
	let h = Harness::new();
	let browser = h.site.new_browser();
	let store = h.store();
	let log = h.log();
	let orchestrator = SessionOrchestrator::new(&browser, &store, &h.config, &log);
	let creds = Credentials::new("admin", PASSWORD);

	assert_eq!(orchestrator.run(&creds).await.unwrap(), SessionOutcome::LoggedInFresh);
	let writes = h.fs.write_count();

	assert_eq!(orchestrator.run(&creds).await.unwrap(), SessionOutcome::Restored);
	assert_eq!(h.fs.write_count(), writes);
}

#[tokio::test]
async fn version_mismatch_forces_login_and_rewrites_with_current_version() {
	let h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();

	let mut stale = h.document();
	stale.schema_version = "0.0.0-old".into();
	h.fs.insert(CACHE_PATH, stale.to_pretty_json().unwrap());

	let browser = h.site.new_browser();
	let outcome = h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::LoggedInFresh);
	assert_eq!(browser.cookie_sets(), 0, "stale cookies must not be installed");
	assert_eq!(h.document().schema_version, SCHEMA_VERSION);
}

#[tokio::test]
async fn corrupt_cache_file_heals_itself() {
	let h = Harness::new();
	h.fs.insert(CACHE_PATH, "{\"schemaVersion\": ");

	let outcome = h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::LoggedInFresh);
	assert!(h.document().user_cookies("admin").is_some());
}

#[tokio::test]
async fn empty_credentials_fail_before_touching_browser_or_disk() {
	let h = Harness::new();
	let browser = h.site.new_browser();

	for (user, pass) in [("", PASSWORD), ("admin", "")] {
		let err = h.establish(&browser, user, pass).await.unwrap_err();
		assert!(matches!(err, SessionError::Configuration(_)), "got {err:?}");
	}

	assert_eq!(h.fs.read_count(), 0);
	assert_eq!(h.fs.write_count(), 0);
	assert!(browser.navigations().is_empty());
}

#[tokio::test]
async fn probe_landing_elsewhere_is_unexpected_navigation() {
	let h = Harness::new();
	h.site.redirect("/wp-admin", "http://localhost:8080/maintenance.html");

	let err = h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap_err();

	assert!(matches!(err, SessionError::UnexpectedNavigation { ref url } if url.ends_with("/maintenance.html")));
	assert_eq!(h.fs.write_count(), 0);
}

#[tokio::test]
async fn login_that_does_not_reach_admin_is_fatal() {
	let h = Harness::new();
	h.site.land_after_login("http://localhost:8080/welcome/");

	let err = h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap_err();

	assert!(matches!(err, SessionError::LoginDidNotReachAdmin { .. }));
	assert_eq!(h.fs.write_count(), 0);
}

#[tokio::test]
async fn rejected_credentials_leave_cache_untouched() {
	let h = Harness::new();
	h.establish(&h.site.new_browser(), "editor", "editor-pass").await.unwrap();
	let before = h.fs.contents(Path::new(CACHE_PATH));

	let err = h.establish(&h.site.new_browser(), "admin", "wrong").await.unwrap_err();

	assert!(matches!(err, SessionError::CredentialsRejected { .. }));
	assert_eq!(h.fs.contents(Path::new(CACHE_PATH)), before);
	assert_eq!(h.fs.write_count(), 1);
}

#[tokio::test]
async fn other_users_written_mid_run_are_preserved() {
	let h = Harness::new();
	let fs = h.fs.clone();
	h.site.on_submit(move || {
		let mut doc = SessionCacheDocument::empty(SCHEMA_VERSION);
		doc.set_user_cookies("editor", vec![Cookie::new("wordpress_logged_in_5c8e3a", "editor|9", "localhost")]);
		fs.insert(CACHE_PATH, doc.to_pretty_json().unwrap());
	});

	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();

	let doc = h.document();
	assert_eq!(doc.user_cookies("editor").unwrap()[0].value, "editor|9");
	assert_eq!(doc.user_cookies("admin").unwrap().len(), 2);
}

#[tokio::test]
async fn landing_page_bouncing_to_login_clears_cached_sessions() {
	let mut h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();
	h.establish(&h.site.new_browser(), "editor", "editor-pass").await.unwrap();

	h.site.restrict_page("/wp-admin/users.php");
	h.config.landing_page = Some("/wp-admin/users.php".into());

	let err = h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap_err();

	assert!(matches!(err, SessionError::LandingPageUnreachable { ref page } if page == "/wp-admin/users.php"));
	assert!(err.to_string().contains("/wp-admin/users.php"));
	let store = h.store();
	assert!(!store.load("admin").await.unwrap().found);
	assert!(!store.load("editor").await.unwrap().found);
}

#[tokio::test]
async fn guard_failure_also_forgets_single_flight_results() {
	let mut h = Harness::new();
	h.site.restrict_page("/wp-admin/options.php");
	h.config.landing_page = Some("/wp-admin/options.php".into());
	let flights = Arc::new(InProcessSingleFlight::new());
	let login = SessionLogin::new(h.config.clone(), h.fs.clone(), flights.clone(), h.log()).unwrap();

	let err = login.establish(&h.site.new_browser(), &Credentials::new("admin", PASSWORD)).await.unwrap_err();

	assert!(matches!(err, SessionError::LandingPageUnreachable { .. }));
	assert_eq!(flights.runs(), 1);
	assert_eq!(flights.cached_keys(), 0);
}

#[tokio::test]
async fn login_page_as_landing_page_skips_the_guard() {
	let mut h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();
	h.config.landing_page = Some("/wp-login.php".into());

	let browser = h.site.new_browser();
	let outcome = h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(outcome, SessionOutcome::Restored);
	assert!(browser.current_url().await.unwrap().ends_with("/wp-login.php"));
	assert!(h.store().load("admin").await.unwrap().found);
}

#[tokio::test]
async fn no_landing_page_skips_final_navigation() {
	let mut h = Harness::new();
	h.config.landing_page = None;
	let browser = h.site.new_browser();

	h.establish(&browser, "admin", PASSWORD).await.unwrap();

	assert_eq!(browser.navigations(), vec!["http://localhost:8080/wp-admin".to_string()]);
}

#[tokio::test]
async fn reused_single_flight_result_restores_cookies_into_new_browser() {
	let h = Harness::new();
	let flights = Arc::new(InProcessSingleFlight::new());
	let login = SessionLogin::new(h.config.clone(), h.fs.clone(), flights.clone(), h.log()).unwrap();
	let creds = Credentials::new("admin", PASSWORD);

	login.establish(&h.site.new_browser(), &creds).await.unwrap();
	let second = h.site.new_browser();
	let outcome = login.establish(&second, &creds).await.unwrap();

	assert_eq!(outcome, SessionOutcome::LoggedInFresh);
	assert_eq!(flights.runs(), 1);
	assert_eq!(h.site.login_count(), 1);
	assert!(second.cookie_sets() > 0);
	assert_eq!(second.current_url().await.unwrap(), "http://localhost:8080/wp-admin");
}

#[tokio::test]
async fn password_never_appears_in_log_lines_when_obscured() {
	let h = Harness::new();
	h.establish(&h.site.new_browser(), "admin", PASSWORD).await.unwrap();

	let lines = h.sink.lines();
	assert!(!lines.is_empty());
	assert!(lines.iter().all(|line| !line.contains(PASSWORD)));
	assert!(h.logged("establishing session for admin:*************"));
}
