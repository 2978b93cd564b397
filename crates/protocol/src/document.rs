//! The session-cache document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cookie::Cookie;

/// On-disk session cache: per-username cookie lists tagged with the version
/// of the tool that wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCacheDocument {
	pub schema_version: String,
	#[serde(default)]
	pub users_cookies: BTreeMap<String, Vec<Cookie>>,
}

impl SessionCacheDocument {
	/// Creates a document with no users for `schema_version`.
	pub fn empty(schema_version: impl Into<String>) -> Self {
		Self {
			schema_version: schema_version.into(),
			users_cookies: BTreeMap::new(),
		}
	}

	/// Returns the stored cookies for `username`, if the user has an entry.
	pub fn user_cookies(&self, username: &str) -> Option<&[Cookie]> {
		self.users_cookies.get(username).map(Vec::as_slice)
	}

	/// Replaces the cookie list for `username`, leaving other users untouched.
	pub fn set_user_cookies(&mut self, username: impl Into<String>, cookies: Vec<Cookie>) {
		self.users_cookies.insert(username.into(), cookies);
	}

	/// Removes `username`'s entry. Returns `true` if one existed.
	pub fn remove_user(&mut self, username: &str) -> bool {
		self.users_cookies.remove(username).is_some()
	}

	/// Serializes with 4-space indentation.
	pub fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>> {
		let mut buf = Vec::new();
		let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
		let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
		self.serialize(&mut ser)?;
		Ok(buf)
	}
}
