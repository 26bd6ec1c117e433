//! Physical storage for case file bytes.

use std::future::Future;

/// Stores and removes files by storage-relative path.
///
/// Record and file lifecycles are decoupled: removing a path that no longer
/// exists is not an error and reports `false`. Storing never replaces an
/// existing file; a taken path reports `false` and leaves it untouched.
pub trait FileStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns whether the bytes were written; `false` when `path` is taken.
  fn store<'a>(
    &'a self,
    path: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns whether a file was actually removed.
  fn delete<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
