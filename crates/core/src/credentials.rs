//! Login credentials and the identity key derived from them.

use std::fmt;

use crate::error::{Result, SessionError};

const MASK_CHAR: char = '*';

/// Username and password for one login. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	/// The real password, for typing into the login form only.
	pub fn password(&self) -> &str {
		&self.password
	}

	/// Fails with [`SessionError::Configuration`] when either part is empty.
	pub fn validate(&self) -> Result<()> {
		if self.username.is_empty() {
			return Err(SessionError::Configuration("No username supplied!".into()));
		}
		if self.password.is_empty() {
			return Err(SessionError::Configuration("No password supplied!".into()));
		}
		Ok(())
	}

	/// Password as it may appear in logs.
	pub fn display_password(&self, obscure: bool) -> String {
		if obscure { mask(&self.password) } else { self.password.clone() }
	}

	/// Identity used to dedupe concurrent setups for the same login.
	pub fn session_key(&self, obscure: bool) -> SessionKey {
		SessionKey {
			username: self.username.clone(),
			secret: self.display_password(obscure),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &mask(&self.password))
			.finish()
	}
}

/// Replaces every character of `value` with a mask character.
pub fn mask(value: &str) -> String {
	std::iter::repeat_n(MASK_CHAR, value.chars().count()).collect()
}

/// Single-flight key: the username and the (possibly masked) password.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
	pub username: String,
	pub secret: String,
}

impl fmt::Display for SessionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.username, self.secret)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mask_preserves_character_count() {
		assert_eq!(mask("hunter2"), "*******");
		assert_eq!(mask("pässwörd"), "********");
		assert_eq!(mask(""), "");
	}

	#[test]
	fn debug_never_shows_password() {
		let creds = Credentials::new("admin", "s3cret");
		let debug = format!("{creds:?}");
		assert!(debug.contains("admin"));
		assert!(!debug.contains("s3cret"));
		assert!(debug.contains("******"));
	}

	#[test]
	fn session_key_masks_when_obscured() {
		let creds = Credentials::new("admin", "s3cret");
		assert_eq!(creds.session_key(true).to_string(), "admin:******");
		assert_eq!(creds.session_key(false).to_string(), "admin:s3cret");
	}

	#[test]
	fn empty_parts_are_configuration_errors() {
		let err = Credentials::new("", "pw").validate().unwrap_err();
		assert!(err.to_string().contains("No username supplied"));

		let err = Credentials::new("admin", "").validate().unwrap_err();
		assert!(err.to_string().contains("No password supplied"));

		assert!(Credentials::new("admin", "pw").validate().is_ok());
	}
}
