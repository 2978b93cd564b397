//! Session-cookie reuse for browser end-to-end tests.
//!
//! A login through a web form is slow. This crate caches the session cookies
//! observed after a login in a JSON file keyed by username, restores them into
//! a fresh browser context on the next run, verifies through a protected
//! "canary" route that the restored cookies still authenticate, and only then
//! falls back to filling in the login form.
//!
//! The browser, the filesystem, step logging and the per-key single-flight
//! cache are collaborators behind traits ([`BrowserDriver`], [`SessionFs`],
//! [`LineSink`], [`SingleFlight`]); [`fake_browser`] and [`MemoryFs`] back the
//! tests.

pub mod browser;
pub mod cache_store;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fake_browser;
pub mod fs;
pub mod guard;
pub mod log;
pub mod login;
pub mod orchestrator;
pub mod reconcile;
pub mod route;
pub mod session;
pub mod single_flight;

pub use browser::BrowserDriver;
pub use cache_store::{CacheLookup, CacheMiss, CacheStore};
pub use config::{InputRetry, SCHEMA_VERSION, SessionConfig, SessionOptions, SiteProfile};
pub use credentials::{Credentials, SessionKey};
pub use error::{Result, SessionError};
pub use fs::{MemoryFs, SessionFs, TokioFs};
pub use guard::LandingPageGuard;
pub use log::{LineSink, RecordingSink, SessionLog, TracingSink};
pub use login::{LoginFlow, LoginState};
pub use orchestrator::{SessionOrchestrator, SessionOutcome};
pub use route::{Location, RouteClassifier};
pub use session::SessionLogin;
pub use single_flight::{InProcessSingleFlight, SessionSnapshot, SingleFlight};
pub use slogin_protocol::{Cookie, SessionCacheDocument};
