//! Error types for session establishment.

use thiserror::Error;

/// Fatal conditions that abort a session setup run.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("login credentials for `{username}` are incorrect")]
	CredentialsRejected { username: String },

	/// The probe route resolved to neither the admin area nor the login form.
	#[error("unexpected address after probe navigation: {url}")]
	UnexpectedNavigation { url: String },

	#[error("login did not reach the admin area, ended on {url}")]
	LoginDidNotReachAdmin { url: String },

	#[error("landing page {page} redirected to the login page; cached sessions were cleared")]
	LandingPageUnreachable { page: String },

	#[error("input `{selector}` could not be cleared after {attempts} attempts")]
	InputUnstable { selector: String, attempts: u32 },

	#[error("browser error: {0}")]
	Browser(String),

	#[error("invalid URL `{input}`: {source}")]
	Url {
		input: String,
		#[source]
		source: url::ParseError,
	},

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl SessionError {
	pub(crate) fn url(input: &str, source: url::ParseError) -> Self {
		Self::Url {
			input: input.to_string(),
			source,
		}
	}
}

pub type Result<T> = std::result::Result<T, SessionError>;
