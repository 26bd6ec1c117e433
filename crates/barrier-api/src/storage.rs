//! [`FileStorage`] backed by a local directory.

use std::{
  io,
  path::{Component, Path, PathBuf},
};

use barrier_core::files::FileStorage;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// Stores case files under `root`, creating directories on demand.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
  root: PathBuf,
}

impl LocalFileStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve a storage-relative path, refusing anything that would escape
  /// the root.
  fn resolve(&self, path: &str) -> io::Result<PathBuf> {
    let relative = Path::new(path);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("storage path {path:?} is not relative"),
      ));
    }
    Ok(self.root.join(relative))
  }
}

impl FileStorage for LocalFileStorage {
  type Error = io::Error;

  async fn store(&self, path: &str, bytes: &[u8]) -> io::Result<bool> {
    let full = self.resolve(path)?;
    if let Some(parent) = full.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&full).await {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
      Err(e) => return Err(e),
    };
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(true)
  }

  async fn delete(&self, path: &str) -> io::Result<bool> {
    let full = self.resolve(path)?;
    match tokio::fs::remove_file(&full).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn store_then_delete() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(dir.path());

    assert!(storage.store("casefiles/1/a.pdf", b"%PDF-1.4").await.unwrap());
    let on_disk = std::fs::read(dir.path().join("casefiles/1/a.pdf")).unwrap();
    assert_eq!(on_disk, b"%PDF-1.4");

    assert!(storage.delete("casefiles/1/a.pdf").await.unwrap());
    assert!(!storage.delete("casefiles/1/a.pdf").await.unwrap());
  }

  #[tokio::test]
  async fn never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(dir.path());

    assert!(storage.store("casefiles/1/a.pdf", b"first").await.unwrap());
    assert!(!storage.store("casefiles/1/a.pdf", b"second").await.unwrap());
    let on_disk = std::fs::read(dir.path().join("casefiles/1/a.pdf")).unwrap();
    assert_eq!(on_disk, b"first");
  }

  #[tokio::test]
  async fn rejects_escaping_paths() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(dir.path());
    assert!(storage.store("../outside.txt", b"x").await.is_err());
    assert!(storage.store("/etc/passwd", b"x").await.is_err());
  }
}
