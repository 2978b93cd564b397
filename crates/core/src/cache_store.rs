//! Loading, version gating and saving of the session-cache document.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use slogin_protocol::{Cookie, SessionCacheDocument};
use tracing::debug;

use crate::error::Result;
use crate::fs::SessionFs;

/// Why a cache file could not supply a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMiss {
	Missing,
	Empty,
	Malformed(String),
	VersionMismatch { found: String },
}

impl fmt::Display for CacheMiss {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Missing => f.write_str("file does not exist"),
			Self::Empty => f.write_str("file is empty"),
			Self::Malformed(err) => write!(f, "file is not a valid cache document ({err})"),
			Self::VersionMismatch { found } => write!(f, "file was written by version {found}"),
		}
	}
}

/// Parses `bytes` into a document written by `expected_version`.
pub fn parse_document(bytes: &[u8], expected_version: &str) -> std::result::Result<SessionCacheDocument, CacheMiss> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Err(CacheMiss::Empty);
	}
	let document: SessionCacheDocument = serde_json::from_slice(bytes).map_err(|e| CacheMiss::Malformed(e.to_string()))?;
	if document.schema_version != expected_version {
		return Err(CacheMiss::VersionMismatch {
			found: document.schema_version,
		});
	}
	Ok(document)
}

/// Result of looking up one user in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
	/// The user's stored cookies, empty unless `found`.
	pub cookies: Vec<Cookie>,
	/// The full multi-user document, or an empty current-version one.
	pub document: SessionCacheDocument,
	pub found: bool,
}

/// The session-cache file at one path, for one schema version.
#[derive(Clone)]
pub struct CacheStore {
	path: PathBuf,
	schema_version: String,
	fs: Arc<dyn SessionFs>,
}

impl CacheStore {
	pub fn new(path: impl Into<PathBuf>, schema_version: impl Into<String>, fs: Arc<dyn SessionFs>) -> Self {
		Self {
			path: path.into(),
			schema_version: schema_version.into(),
			fs,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn schema_version(&self) -> &str {
		&self.schema_version
	}

	fn empty_document(&self) -> SessionCacheDocument {
		SessionCacheDocument::empty(self.schema_version.clone())
	}

	/// Reads the document, treating every unusable file as absent.
	pub async fn load_document(&self) -> Result<std::result::Result<SessionCacheDocument, CacheMiss>> {
		let Some(bytes) = self.fs.read(&self.path).await? else {
			return Ok(Err(CacheMiss::Missing));
		};
		Ok(parse_document(&bytes, &self.schema_version))
	}

	/// Looks up `username`'s cookies.
	///
	/// A missing, empty, malformed or version-mismatched file, or a document
	/// without the user, yields `found = false`. Only I/O failures other than
	/// "not found" are errors.
	pub async fn load(&self, username: &str) -> Result<CacheLookup> {
		let document = match self.load_document().await? {
			Ok(document) => document,
			Err(miss) => {
				debug!(target = "slogin.cache", path = %self.path.display(), reason = %miss, "session cache unavailable");
				return Ok(CacheLookup {
					cookies: Vec::new(),
					document: self.empty_document(),
					found: false,
				});
			}
		};

		match document.user_cookies(username) {
			Some(cookies) => Ok(CacheLookup {
				cookies: cookies.to_vec(),
				document,
				found: true,
			}),
			None => {
				debug!(target = "slogin.cache", path = %self.path.display(), %username, "no cached cookies for user");
				Ok(CacheLookup {
					cookies: Vec::new(),
					document,
					found: false,
				})
			}
		}
	}

	/// Overwrites the file with `document`.
	pub async fn save(&self, document: &SessionCacheDocument) -> Result<()> {
		let bytes = document.to_pretty_json()?;
		self.fs.write(&self.path, &bytes).await?;
		debug!(
			target = "slogin.cache",
			path = %self.path.display(),
			users = document.users_cookies.len(),
			"session cache written"
		);
		Ok(())
	}

	/// Replaces the file with an empty current-version document.
	pub async fn invalidate(&self) -> Result<()> {
		self.save(&self.empty_document()).await
	}
}

impl fmt::Debug for CacheStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CacheStore")
			.field("path", &self.path)
			.field("schema_version", &self.schema_version)
			.finish()
	}
}
