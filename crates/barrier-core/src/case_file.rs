//! Binary attachments owned by a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditInfo;

/// Metadata for a new attachment. The bytes themselves go to
/// [`FileStorage`](crate::files::FileStorage) under [`storage_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCaseFile {
  pub case:           i64,
  pub name:           String,
  pub path:           String,
  #[serde(default)]
  pub from_requester: bool,
  #[serde(default)]
  pub final_letter:   bool,
  /// Username of the staff member who uploaded the file; `None` for public
  /// submissions.
  pub uploader:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFile {
  pub id:          i64,
  #[serde(flatten)]
  pub data:        NewCaseFile,
  pub uploaded_at: DateTime<Utc>,
  pub audit:       AuditInfo,
}

/// Reduce a client-supplied filename to a single safe path component.
pub fn sanitize_filename(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() {
    "upload".to_owned()
  } else {
    cleaned.to_owned()
  }
}

/// The `n`th alternative for a taken filename: `letter.pdf` becomes
/// `letter_1.pdf`, `letter_2.pdf` and so on. `n == 0` is the name itself.
pub fn numbered_name(name: &str, n: u32) -> String {
  if n == 0 {
    return name.to_owned();
  }
  match name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{n}.{ext}"),
    _ => format!("{name}_{n}"),
  }
}

/// Storage-relative path for an upload. Anonymous uploads land in a
/// `requester/` sub-directory of the case folder.
pub fn storage_path(case_id: i64, filename: &str, anonymous: bool) -> String {
  let name = sanitize_filename(filename);
  if anonymous {
    format!("casefiles/{case_id}/requester/{name}")
  } else {
    format!("casefiles/{case_id}/{name}")
  }
}

/// The attachment to send with a case's determination notice.
///
/// When several files are flagged as the final letter, the most recently
/// uploaded one wins, and among equal upload times the highest id.
pub fn select_final_letter(files: &[CaseFile]) -> Option<&CaseFile> {
  files
    .iter()
    .filter(|f| f.data.final_letter)
    .max_by_key(|f| (f.uploaded_at, f.id))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn file(id: i64, final_letter: bool, day: u32) -> CaseFile {
    let at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
    CaseFile {
      id,
      data: NewCaseFile {
        case: 1,
        name: format!("f{id}.pdf"),
        path: format!("casefiles/1/f{id}.pdf"),
        from_requester: false,
        final_letter,
        uploader: Some("analyst1".into()),
      },
      uploaded_at: at,
      audit: AuditInfo::created(at, None),
    }
  }

  #[test]
  fn anonymous_uploads_go_to_requester_dir() {
    assert_eq!(storage_path(9, "map.pdf", false), "casefiles/9/map.pdf");
    assert_eq!(
      storage_path(9, "map.pdf", true),
      "casefiles/9/requester/map.pdf"
    );
  }

  #[test]
  fn filenames_cannot_escape_the_case_dir() {
    assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_filename("C:\\maps\\my map.png"), "my_map.png");
    assert_eq!(sanitize_filename(".."), "upload");
    assert_eq!(sanitize_filename(""), "upload");
  }

  #[test]
  fn taken_names_get_a_numeric_suffix() {
    assert_eq!(numbered_name("letter.pdf", 0), "letter.pdf");
    assert_eq!(numbered_name("letter.pdf", 2), "letter_2.pdf");
    assert_eq!(numbered_name("map.tar.gz", 1), "map.tar_1.gz");
    assert_eq!(numbered_name("upload", 1), "upload_1");
  }

  #[test]
  fn final_letter_prefers_latest_upload() {
    let files = vec![file(1, true, 5), file(2, false, 9), file(3, true, 7)];
    assert_eq!(select_final_letter(&files).map(|f| f.id), Some(3));
  }

  #[test]
  fn final_letter_ties_break_on_id() {
    let files = vec![file(4, true, 5), file(2, true, 5)];
    assert_eq!(select_final_letter(&files).map(|f| f.id), Some(4));
  }

  #[test]
  fn no_final_letter_flagged() {
    assert!(select_final_letter(&[file(1, false, 1)]).is_none());
  }
}
