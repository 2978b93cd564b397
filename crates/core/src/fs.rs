//! Filesystem collaborator used by the cache store.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

/// Byte-level file access.
#[async_trait]
pub trait SessionFs: Send + Sync {
	/// Reads `path`, returning `None` when it does not exist.
	async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

	/// Replaces the contents of `path`, creating it (and its parent directory) if absent.
	async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// [`SessionFs`] backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFs;

#[async_trait]
impl SessionFs for TokioFs {
	async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
		match tokio::fs::read(path).await {
			Ok(bytes) => Ok(Some(bytes)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}
		tokio::fs::write(path, contents).await?;
		Ok(())
	}
}

/// In-memory [`SessionFs`] that counts operations.
#[derive(Debug, Default)]
pub struct MemoryFs {
	files: Mutex<HashMap<PathBuf, Vec<u8>>>,
	reads: AtomicUsize,
	writes: AtomicUsize,
}

impl MemoryFs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds a file without counting it as a write.
	pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
		self.files.lock().insert(path.into(), contents.into());
	}

	pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
		self.files.lock().get(path).cloned()
	}

	pub fn read_count(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl SessionFs for MemoryFs {
	async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
		self.reads.fetch_add(1, Ordering::SeqCst);
		Ok(self.contents(path))
	}

	async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		self.files.lock().insert(path.to_path_buf(), contents.to_vec());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[tokio::test]
	async fn tokio_fs_reports_missing_file_as_none() {
		let temp = TempDir::new().unwrap();
		let read = TokioFs.read(&temp.path().join("absent.json")).await.unwrap();
		assert!(read.is_none());
	}

	#[tokio::test]
	async fn tokio_fs_creates_parent_directories() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("nested").join("cache.json");

		TokioFs.write(&path, b"{}").await.unwrap();
		assert_eq!(TokioFs.read(&path).await.unwrap().as_deref(), Some(b"{}".as_slice()));
	}

	#[tokio::test]
	async fn memory_fs_counts_writes_but_not_seeds() {
		let fs = MemoryFs::new();
		fs.insert("a.json", "seed");
		assert_eq!(fs.write_count(), 0);

		fs.write(Path::new("a.json"), b"new").await.unwrap();
		assert_eq!(fs.write_count(), 1);
		assert_eq!(fs.contents(Path::new("a.json")).unwrap(), b"new");
	}
}
